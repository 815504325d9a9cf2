use std::cmp::Ordering;

use crate::types::{Condition, Fact, RuleError, Value};

/// Recursive evaluation of a condition tree against one subject.
///
/// Pure and deterministic. And/Or short-circuit left to right over the
/// stored child order; since predicates have no side effects the result is
/// identical to full evaluation. Errors propagate instead of collapsing to
/// `false`.
pub(crate) fn evaluate(cond: &Condition, fact: &dyn Fact) -> Result<bool, RuleError> {
    match cond {
        Condition::Equal { target } => Ok(equals(fact, target)),
        Condition::NotEqual { target } => Ok(!equals(fact, target)),

        Condition::GreaterThan { threshold } => {
            ordered(fact, threshold, |ord| ord == Ordering::Greater)
        }
        Condition::GreaterThanOrEqual { threshold } => {
            ordered(fact, threshold, |ord| ord != Ordering::Less)
        }
        Condition::LessThan { threshold } => ordered(fact, threshold, |ord| ord == Ordering::Less),
        Condition::LessThanOrEqual { threshold } => {
            ordered(fact, threshold, |ord| ord != Ordering::Greater)
        }
        Condition::Between { min, max } => {
            Ok(ordered(fact, min, |ord| ord != Ordering::Less)?
                && ordered(fact, max, |ord| ord != Ordering::Greater)?)
        }

        Condition::Contains { keyword } => Ok(text(fact)?.is_some_and(|s| s.contains(keyword))),
        Condition::NotContains { keyword } => Ok(text(fact)?.is_none_or(|s| !s.contains(keyword))),
        Condition::StartsWith { prefix } => Ok(text(fact)?.is_some_and(|s| s.starts_with(prefix))),
        Condition::NotStartsWith { prefix } => {
            Ok(text(fact)?.is_none_or(|s| !s.starts_with(prefix)))
        }
        Condition::EndsWith { suffix } => Ok(text(fact)?.is_some_and(|s| s.ends_with(suffix))),
        Condition::NotEndsWith { suffix } => Ok(text(fact)?.is_none_or(|s| !s.ends_with(suffix))),

        Condition::IsNull => Ok(is_null(fact)),
        Condition::IsNotNull => Ok(!is_null(fact)),

        Condition::And(children) => {
            for child in children {
                if !evaluate(child, fact)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Condition::Or(children) => {
            for child in children {
                if evaluate(child, fact)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Condition::Not(inner) => Ok(!evaluate(inner, fact)?),

        Condition::Field { extract, inner } => {
            let value = extract.call(fact)?;
            evaluate(inner, &value)
        }
        Condition::FieldByName { field, inner } => {
            // A null subject fails the field test rather than erroring,
            // mirroring how a null object has no fields to speak of.
            if matches!(fact.scalar(), Some(Value::Null)) {
                return Ok(false);
            }
            let obj = fact
                .object()
                .ok_or_else(|| RuleError::field_not_found(field, describe(fact)))?;
            let resolved = crate::resolve::resolve(obj, field)?;
            evaluate(inner, resolved)
        }
    }
}

fn equals(fact: &dyn Fact, target: &Value) -> bool {
    match fact.scalar() {
        Some(subject) => subject.equal_to(target),
        // A structured object is never equal to a scalar parameter.
        None => false,
    }
}

fn is_null(fact: &dyn Fact) -> bool {
    // A present object is not null, whatever its fields hold.
    matches!(fact.scalar(), Some(Value::Null))
}

fn ordered(
    fact: &dyn Fact,
    threshold: &Value,
    accept: fn(Ordering) -> bool,
) -> Result<bool, RuleError> {
    let subject = fact
        .scalar()
        .ok_or_else(|| ordering_mismatch(threshold, describe(fact)))?;
    match subject.partial_cmp_value(threshold) {
        Some(ord) => Ok(accept(ord)),
        None => Err(ordering_mismatch(threshold, subject.kind().to_owned())),
    }
}

fn ordering_mismatch(threshold: &Value, actual: String) -> RuleError {
    RuleError::mismatch(
        format!("value orderable against {}", threshold.kind()),
        actual,
    )
}

/// The subject for string predicates: `None` for the null subject,
/// `Some` for a string, an error for everything else.
fn text(fact: &dyn Fact) -> Result<Option<String>, RuleError> {
    match fact.scalar() {
        Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(RuleError::mismatch("string", other.kind())),
        None => Err(RuleError::mismatch("string", describe(fact))),
    }
}

fn describe(fact: &dyn Fact) -> String {
    if let Some(obj) = fact.object() {
        return format!("object '{}'", obj.type_name());
    }
    match fact.scalar() {
        Some(v) => v.kind().to_owned(),
        None => "opaque subject".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
    use std::sync::{Arc, LazyLock};

    use super::*;
    use crate::types::{Object, TypeDef, TypeDefBuilder};

    struct User {
        name: String,
        age: i64,
        status: String,
        score: f64,
    }

    impl Fact for User {
        fn scalar(&self) -> Option<Value> {
            None
        }

        fn object(&self) -> Option<Object<'_>> {
            static DEF: LazyLock<TypeDef> = LazyLock::new(|| {
                TypeDefBuilder::new("User")
                    .field("name", |u: &User| &u.name)
                    .field("age", |u: &User| &u.age)
                    .field("status", |u: &User| &u.status)
                    .field("score", |u: &User| &u.score)
                    .build()
            });
            Some(Object::new(self, &DEF))
        }
    }

    fn user() -> User {
        User {
            name: "ZZZ3".into(),
            age: 25,
            status: "active".into(),
            score: 88.5,
        }
    }

    // ---- Equality ----

    #[test]
    fn equal_and_not_equal() {
        let eq = Condition::equal(18_i64);
        assert!(eq.evaluate(&18_i64).unwrap());
        assert!(!eq.evaluate(&17_i64).unwrap());
        assert!(Condition::not_equal(18_i64).evaluate(&17_i64).unwrap());
    }

    #[test]
    fn equal_is_null_safe() {
        assert!(Condition::Equal {
            target: Value::Null
        }
        .evaluate(&Value::Null)
        .unwrap());
        assert!(!Condition::equal(5_i64).evaluate(&Value::Null).unwrap());
        assert!(Condition::not_equal(5_i64).evaluate(&Value::Null).unwrap());
    }

    #[test]
    fn equal_crosses_int_and_float() {
        assert!(Condition::equal(10_i64).evaluate(&10.0_f64).unwrap());
    }

    #[test]
    fn equal_on_object_subject_is_false_not_error() {
        assert!(!Condition::equal(5_i64).evaluate(&user()).unwrap());
        assert!(Condition::not_equal(5_i64).evaluate(&user()).unwrap());
    }

    // ---- Ordering ----

    #[test]
    fn ordering_operators() {
        assert!(Condition::greater_than(18_i64).evaluate(&25_i64).unwrap());
        assert!(!Condition::greater_than(18_i64).evaluate(&18_i64).unwrap());
        assert!(Condition::greater_than_or_equal(18_i64)
            .evaluate(&18_i64)
            .unwrap());
        assert!(Condition::less_than(10_i64).evaluate(&9_i64).unwrap());
        assert!(Condition::less_than_or_equal(10_i64)
            .evaluate(&10_i64)
            .unwrap());
    }

    #[test]
    fn ordering_is_lexicographic_for_strings() {
        assert!(Condition::greater_than("apple").evaluate(&"banana").unwrap());
        assert!(!Condition::less_than("apple").evaluate(&"banana").unwrap());
    }

    #[test]
    fn ordering_crosses_int_and_float() {
        assert!(Condition::greater_than(10_i64).evaluate(&10.5_f64).unwrap());
        assert!(Condition::less_than(10.5_f64).evaluate(&10_i64).unwrap());
    }

    #[test]
    fn ordering_on_null_is_a_type_error() {
        let err = Condition::greater_than(18_i64)
            .evaluate(&Value::Null)
            .unwrap_err();
        assert!(matches!(err, RuleError::TypeMismatch { .. }));
    }

    #[test]
    fn ordering_on_bool_is_a_type_error() {
        let err = Condition::greater_than(true).evaluate(&true).unwrap_err();
        assert!(matches!(err, RuleError::TypeMismatch { .. }));
    }

    #[test]
    fn ordering_across_kinds_is_a_type_error() {
        let err = Condition::greater_than(18_i64)
            .evaluate(&"eighteen")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "type mismatch: expected value orderable against int, found string"
        );
    }

    // ---- Between ----

    #[test]
    fn between_is_inclusive_at_both_ends() {
        let cond = Condition::between(5_i64, 15_i64);
        assert!(cond.evaluate(&5_i64).unwrap());
        assert!(cond.evaluate(&15_i64).unwrap());
        assert!(cond.evaluate(&10_i64).unwrap());
        assert!(!cond.evaluate(&16_i64).unwrap());
        assert!(!cond.evaluate(&4_i64).unwrap());
    }

    #[test]
    fn between_with_inverted_bounds_is_always_false() {
        let cond = Condition::between(15_i64, 5_i64);
        assert!(!cond.evaluate(&10_i64).unwrap());
    }

    // ---- String predicates ----

    #[test]
    fn contains_family() {
        assert!(Condition::contains("Z").evaluate(&"ZZZ3").unwrap());
        assert!(!Condition::contains("Q").evaluate(&"ZZZ3").unwrap());
        assert!(Condition::not_contains("Q").evaluate(&"ZZZ3").unwrap());
        assert!(!Condition::not_contains("Z").evaluate(&"ZZZ3").unwrap());
    }

    #[test]
    fn prefix_and_suffix_families() {
        assert!(Condition::starts_with("Hello")
            .evaluate(&"Hello world!")
            .unwrap());
        assert!(Condition::not_starts_with("world")
            .evaluate(&"Hello world!")
            .unwrap());
        assert!(Condition::ends_with("3").evaluate(&"ZZZ3").unwrap());
        assert!(Condition::not_ends_with("Z").evaluate(&"ZZZ3").unwrap());
    }

    #[test]
    fn null_subject_propagation() {
        assert!(!Condition::contains("x").evaluate(&Value::Null).unwrap());
        assert!(Condition::not_contains("x").evaluate(&Value::Null).unwrap());
        assert!(!Condition::starts_with("x").evaluate(&Value::Null).unwrap());
        assert!(Condition::not_starts_with("x")
            .evaluate(&Value::Null)
            .unwrap());
        assert!(!Condition::ends_with("x").evaluate(&Value::Null).unwrap());
        assert!(Condition::not_ends_with("x").evaluate(&Value::Null).unwrap());
    }

    #[test]
    fn null_propagation_through_option() {
        assert!(!Condition::contains("x").evaluate(&None::<String>).unwrap());
        assert!(Condition::not_contains("x")
            .evaluate(&None::<String>)
            .unwrap());
    }

    #[test]
    fn empty_argument_matches_every_string() {
        assert!(Condition::contains("").evaluate(&"anything").unwrap());
        assert!(Condition::starts_with("").evaluate(&"anything").unwrap());
        assert!(Condition::ends_with("").evaluate(&"").unwrap());
        // The empty argument is not null: a null subject still fails.
        assert!(!Condition::contains("").evaluate(&Value::Null).unwrap());
    }

    #[test]
    fn string_predicate_on_non_string_is_a_type_error() {
        let err = Condition::contains("1").evaluate(&123_i64).unwrap_err();
        assert_eq!(err.to_string(), "type mismatch: expected string, found int");
    }

    // ---- Null checks ----

    #[test]
    fn is_null_and_is_not_null() {
        assert!(Condition::is_null().evaluate(&Value::Null).unwrap());
        assert!(!Condition::is_null().evaluate(&0_i64).unwrap());
        assert!(Condition::is_not_null().evaluate(&0_i64).unwrap());
        assert!(!Condition::is_not_null().evaluate(&Value::Null).unwrap());
    }

    #[test]
    fn a_present_object_is_not_null() {
        assert!(!Condition::is_null().evaluate(&user()).unwrap());
        assert!(Condition::is_not_null().evaluate(&user()).unwrap());
    }

    #[test]
    fn a_missing_option_is_null() {
        assert!(Condition::is_null().evaluate(&None::<i64>).unwrap());
        assert!(Condition::is_not_null().evaluate(&Some(3_i64)).unwrap());
    }

    // ---- Composites ----

    #[test]
    fn empty_groups() {
        assert!(Condition::all(vec![]).evaluate(&1_i64).unwrap());
        assert!(!Condition::any(vec![]).evaluate(&1_i64).unwrap());
    }

    #[test]
    fn and_requires_every_child() {
        let cond = Condition::greater_than(5_i64).and(Condition::less_than(10_i64));
        assert!(cond.evaluate(&7_i64).unwrap());
        assert!(!cond.evaluate(&12_i64).unwrap());
    }

    #[test]
    fn or_requires_any_child() {
        let cond = Condition::equal(1_i64).or(Condition::equal(2_i64));
        assert!(cond.evaluate(&2_i64).unwrap());
        assert!(!cond.evaluate(&3_i64).unwrap());
    }

    #[test]
    fn not_inverts() {
        let cond = !Condition::equal(5_i64);
        assert!(cond.evaluate(&6_i64).unwrap());
        assert!(!cond.evaluate(&5_i64).unwrap());
    }

    fn counting_probe(calls: &Arc<AtomicUsize>) -> Condition {
        let calls = Arc::clone(calls);
        Condition::extract(
            move |f| {
                calls.fetch_add(1, AtomicOrdering::SeqCst);
                Ok(f.scalar().unwrap_or(Value::Null))
            },
            Condition::is_not_null(),
        )
    }

    #[test]
    fn and_short_circuits_after_a_false_child() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cond = Condition::equal(999_i64).and(counting_probe(&calls));
        assert!(!cond.evaluate(&1_i64).unwrap());
        assert_eq!(calls.load(AtomicOrdering::SeqCst), 0);
    }

    #[test]
    fn or_short_circuits_after_a_true_child() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cond = Condition::equal(1_i64).or(counting_probe(&calls));
        assert!(cond.evaluate(&1_i64).unwrap());
        assert_eq!(calls.load(AtomicOrdering::SeqCst), 0);
    }

    #[test]
    fn non_decisive_children_all_run() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cond = Condition::equal(1_i64).and(counting_probe(&calls));
        assert!(cond.evaluate(&1_i64).unwrap());
        assert_eq!(calls.load(AtomicOrdering::SeqCst), 1);
    }

    // ---- Field access ----

    #[test]
    fn field_by_name_resolves_and_delegates() {
        let cond = Condition::field("age", Condition::greater_than(18_i64));
        assert!(cond.evaluate(&user()).unwrap());

        let cond = Condition::field("age", Condition::greater_than(30_i64));
        assert!(!cond.evaluate(&user()).unwrap());
    }

    #[test]
    fn field_by_name_reads_floats_and_strings() {
        assert!(Condition::field("score", Condition::greater_than(80.0_f64))
            .evaluate(&user())
            .unwrap());
        assert!(Condition::field("status", Condition::equal("active"))
            .evaluate(&user())
            .unwrap());
    }

    #[test]
    fn field_on_null_subject_is_false() {
        let cond = Condition::field("age", Condition::greater_than(18_i64));
        assert!(!cond.evaluate(&None::<User>).unwrap());
        assert!(!cond.evaluate(&Value::Null).unwrap());
    }

    #[test]
    fn missing_field_is_an_error_not_false() {
        let cond = Condition::field("salary", Condition::greater_than(0_i64));
        let err = cond.evaluate(&user()).unwrap_err();
        assert_eq!(err.to_string(), "field 'salary' not found on type 'User'");
    }

    #[test]
    fn field_on_scalar_subject_is_an_error() {
        let cond = Condition::field("age", Condition::greater_than(0_i64));
        let err = cond.evaluate(&42_i64).unwrap_err();
        assert_eq!(err.to_string(), "field 'age' not found on type 'int'");
    }

    #[test]
    fn errors_propagate_through_composites() {
        let cond = Condition::field("salary", Condition::greater_than(0_i64))
            .and(Condition::field("age", Condition::greater_than(18_i64)));
        assert!(cond.evaluate(&user()).is_err());
    }

    #[test]
    fn typed_extractor_reads_a_field() {
        let cond = Condition::field_with(
            |u: &User| Value::from(u.age),
            Condition::greater_than_or_equal(18_i64),
        );
        assert!(cond.evaluate(&user()).unwrap());
    }

    #[test]
    fn typed_extractor_on_wrong_type_is_an_error() {
        let cond = Condition::field_with(|u: &User| Value::from(u.age), Condition::is_not_null());
        let err = cond.evaluate(&7_i64).unwrap_err();
        assert!(matches!(err, RuleError::TypeMismatch { .. }));
    }

    #[test]
    fn nested_field_conditions() {
        // AND(age > 18, OR(name contains Z, name contains L), NOT(status == banned))
        let cond = Condition::field("age", Condition::greater_than(18_i64))
            .and(
                Condition::field("name", Condition::contains("Z"))
                    .or(Condition::field("name", Condition::contains("L"))),
            )
            .and(!Condition::field("status", Condition::equal("banned")));
        assert!(cond.evaluate(&user()).unwrap());

        let banned = User {
            status: "banned".into(),
            ..user()
        };
        assert!(!cond.evaluate(&banned).unwrap());
    }
}
