use std::any::Any;
use std::fmt;
use std::ops::Not;
use std::sync::Arc;

use super::error::RuleError;
use super::fact::Fact;
use super::value::Value;

/// A predicate node, leaf or composite, over an evaluation subject.
///
/// Trees are immutable after construction and safe to evaluate from many
/// threads at once. Every variant except [`Condition::Field`] has a stable
/// place in the portable JSON form (see [`Condition::to_json`]).
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Null-safe structural equality against a target value.
    Equal { target: Value },
    /// Null-safe structural inequality.
    NotEqual { target: Value },
    /// Strict ordering: subject > threshold.
    GreaterThan { threshold: Value },
    /// Non-strict ordering: subject >= threshold.
    GreaterThanOrEqual { threshold: Value },
    /// Strict ordering: subject < threshold.
    LessThan { threshold: Value },
    /// Non-strict ordering: subject <= threshold.
    LessThanOrEqual { threshold: Value },
    /// min <= subject <= max, inclusive at both ends.
    Between { min: Value, max: Value },
    /// Substring test. A null subject never contains anything.
    Contains { keyword: String },
    /// Negated substring test. True on a null subject.
    NotContains { keyword: String },
    /// Prefix test. False on a null subject.
    StartsWith { prefix: String },
    /// Negated prefix test. True on a null subject.
    NotStartsWith { prefix: String },
    /// Suffix test. False on a null subject.
    EndsWith { suffix: String },
    /// Negated suffix test. True on a null subject.
    NotEndsWith { suffix: String },
    /// Subject is the null value. A present object is not null.
    IsNull,
    /// Subject is anything but the null value.
    IsNotNull,
    /// True iff every child is true; short-circuits on the first false.
    /// Empty is vacuously true.
    And(Vec<Condition>),
    /// True iff any child is true; short-circuits on the first true.
    /// Empty is false.
    Or(Vec<Condition>),
    /// Negation of the single child.
    Not(Box<Condition>),
    /// Applies an extractor function, then the inner condition on its
    /// result. Has no portable representation.
    Field {
        extract: Extractor,
        inner: Box<Condition>,
    },
    /// Resolves a named field off the subject at evaluation time, then
    /// delegates to the inner condition.
    FieldByName {
        field: String,
        inner: Box<Condition>,
    },
}

/// Type-erased extractor carried by [`Condition::Field`].
///
/// Compared by identity: two extractors are equal only when they are the
/// same allocation.
#[derive(Clone)]
pub struct Extractor(Arc<dyn Fn(&dyn Fact) -> Result<Value, RuleError> + Send + Sync>);

impl Extractor {
    pub(crate) fn call(&self, fact: &dyn Fact) -> Result<Value, RuleError> {
        (self.0)(fact)
    }
}

impl fmt::Debug for Extractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Extractor(..)")
    }
}

impl PartialEq for Extractor {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Condition {
    #[must_use]
    pub fn equal(target: impl Into<Value>) -> Condition {
        Condition::Equal {
            target: target.into(),
        }
    }

    #[must_use]
    pub fn not_equal(target: impl Into<Value>) -> Condition {
        Condition::NotEqual {
            target: target.into(),
        }
    }

    #[must_use]
    pub fn greater_than(threshold: impl Into<Value>) -> Condition {
        Condition::GreaterThan {
            threshold: threshold.into(),
        }
    }

    #[must_use]
    pub fn greater_than_or_equal(threshold: impl Into<Value>) -> Condition {
        Condition::GreaterThanOrEqual {
            threshold: threshold.into(),
        }
    }

    #[must_use]
    pub fn less_than(threshold: impl Into<Value>) -> Condition {
        Condition::LessThan {
            threshold: threshold.into(),
        }
    }

    #[must_use]
    pub fn less_than_or_equal(threshold: impl Into<Value>) -> Condition {
        Condition::LessThanOrEqual {
            threshold: threshold.into(),
        }
    }

    #[must_use]
    pub fn between(min: impl Into<Value>, max: impl Into<Value>) -> Condition {
        Condition::Between {
            min: min.into(),
            max: max.into(),
        }
    }

    #[must_use]
    pub fn contains(keyword: impl Into<String>) -> Condition {
        Condition::Contains {
            keyword: keyword.into(),
        }
    }

    #[must_use]
    pub fn not_contains(keyword: impl Into<String>) -> Condition {
        Condition::NotContains {
            keyword: keyword.into(),
        }
    }

    #[must_use]
    pub fn starts_with(prefix: impl Into<String>) -> Condition {
        Condition::StartsWith {
            prefix: prefix.into(),
        }
    }

    #[must_use]
    pub fn not_starts_with(prefix: impl Into<String>) -> Condition {
        Condition::NotStartsWith {
            prefix: prefix.into(),
        }
    }

    #[must_use]
    pub fn ends_with(suffix: impl Into<String>) -> Condition {
        Condition::EndsWith {
            suffix: suffix.into(),
        }
    }

    #[must_use]
    pub fn not_ends_with(suffix: impl Into<String>) -> Condition {
        Condition::NotEndsWith {
            suffix: suffix.into(),
        }
    }

    #[must_use]
    pub fn is_null() -> Condition {
        Condition::IsNull
    }

    #[must_use]
    pub fn is_not_null() -> Condition {
        Condition::IsNotNull
    }

    /// Conjunction over an explicit child list.
    #[must_use]
    pub fn all(children: Vec<Condition>) -> Condition {
        Condition::And(children)
    }

    /// Disjunction over an explicit child list.
    #[must_use]
    pub fn any(children: Vec<Condition>) -> Condition {
        Condition::Or(children)
    }

    /// Applies `inner` to the named field of the subject, resolved at
    /// evaluation time through the field cache.
    #[must_use]
    pub fn field(name: impl Into<String>, inner: Condition) -> Condition {
        Condition::FieldByName {
            field: name.into(),
            inner: Box::new(inner),
        }
    }

    /// Applies `inner` to whatever the extractor pulls off the subject.
    /// The resulting tree cannot be serialized.
    #[must_use]
    pub fn extract(
        extract: impl Fn(&dyn Fact) -> Result<Value, RuleError> + Send + Sync + 'static,
        inner: Condition,
    ) -> Condition {
        Condition::Field {
            extract: Extractor(Arc::new(extract)),
            inner: Box::new(inner),
        }
    }

    /// Typed form of [`Condition::extract`]: downcasts the subject to `T`
    /// and applies the getter. Evaluating against anything that is not a
    /// `T` fails with a type mismatch.
    #[must_use]
    pub fn field_with<T: Any>(
        get: impl Fn(&T) -> Value + Send + Sync + 'static,
        inner: Condition,
    ) -> Condition {
        Condition::extract(
            move |fact: &dyn Fact| {
                let expected = std::any::type_name::<T>();
                let obj = fact.object().ok_or_else(|| {
                    let actual = fact
                        .scalar()
                        .map_or("object without field table", |v| v.kind());
                    RuleError::mismatch(expected, actual)
                })?;
                let t = obj
                    .instance()
                    .downcast_ref::<T>()
                    .ok_or_else(|| RuleError::mismatch(expected, obj.type_name()))?;
                Ok(get(t))
            },
            inner,
        )
    }

    /// Conjunction with another condition. Flattens when `self` is
    /// already an And, so chains stay a single level deep.
    #[must_use]
    pub fn and(self, other: Condition) -> Condition {
        match self {
            Condition::And(mut children) => {
                children.push(other);
                Condition::And(children)
            }
            first => Condition::And(vec![first, other]),
        }
    }

    /// Disjunction with another condition. Flattens when `self` is
    /// already an Or.
    #[must_use]
    pub fn or(self, other: Condition) -> Condition {
        match self {
            Condition::Or(mut children) => {
                children.push(other);
                Condition::Or(children)
            }
            first => Condition::Or(vec![first, other]),
        }
    }

    /// Evaluates this tree against a subject.
    ///
    /// Programmer errors (missing field, type mismatch) surface as `Err`
    /// and are never folded into a `false` result.
    pub fn evaluate(&self, fact: &dyn Fact) -> Result<bool, RuleError> {
        crate::evaluate::evaluate(self, fact)
    }

    /// Encodes this tree in the portable discriminator-tagged JSON form.
    pub fn to_json(&self) -> Result<String, RuleError> {
        crate::serial::encode(self)
    }

    /// Pretty-printed variant of [`Condition::to_json`].
    pub fn to_json_pretty(&self) -> Result<String, RuleError> {
        crate::serial::encode_pretty(self)
    }

    /// Decodes a tree from the portable JSON form. Unknown properties are
    /// ignored; unknown tags and missing parameters are errors.
    pub fn from_json(text: &str) -> Result<Condition, RuleError> {
        crate::serial::decode(text)
    }
}

impl Not for Condition {
    type Output = Condition;

    fn not(self) -> Condition {
        Condition::Not(Box::new(self))
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, children: &[Condition], sep: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            write!(f, "{sep}")?;
        }
        write!(f, "{child}")?;
    }
    write!(f, ")")
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Equal { target } => write!(f, "== {target}"),
            Condition::NotEqual { target } => write!(f, "!= {target}"),
            Condition::GreaterThan { threshold } => write!(f, "> {threshold}"),
            Condition::GreaterThanOrEqual { threshold } => write!(f, ">= {threshold}"),
            Condition::LessThan { threshold } => write!(f, "< {threshold}"),
            Condition::LessThanOrEqual { threshold } => write!(f, "<= {threshold}"),
            Condition::Between { min, max } => write!(f, "between {min} and {max}"),
            Condition::Contains { keyword } => write!(f, "contains \"{keyword}\""),
            Condition::NotContains { keyword } => write!(f, "not contains \"{keyword}\""),
            Condition::StartsWith { prefix } => write!(f, "starts with \"{prefix}\""),
            Condition::NotStartsWith { prefix } => write!(f, "not starts with \"{prefix}\""),
            Condition::EndsWith { suffix } => write!(f, "ends with \"{suffix}\""),
            Condition::NotEndsWith { suffix } => write!(f, "not ends with \"{suffix}\""),
            Condition::IsNull => write!(f, "is null"),
            Condition::IsNotNull => write!(f, "is not null"),
            Condition::And(children) if children.is_empty() => write!(f, "(true)"),
            Condition::And(children) => write_joined(f, children, " AND "),
            Condition::Or(children) if children.is_empty() => write!(f, "(false)"),
            Condition::Or(children) => write_joined(f, children, " OR "),
            Condition::Not(inner) => write!(f, "(NOT {inner})"),
            Condition::Field { inner, .. } => write!(f, "<extracted> {inner}"),
            Condition::FieldByName { field, inner } => write!(f, "{field} {inner}"),
        }
    }
}
