
use proptest::prelude::*;
use strategies::{arb_case, arb_group_case, arb_scalar, GenCase};
use tenet::Condition;

// ---- Invariant 1: negation inverts the verdict ----
//
// NOT flips whatever its child decides, and flipping twice lands back on
// the original verdict. Holds for every well-typed subject/tree pair.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn negation_inverts_the_verdict(case in arb_case()) {
        let GenCase { subject, tree } = case;
        let negated = !tree.clone();
        prop_assert_eq!(
            negated.evaluate(&subject).unwrap(),
            !tree.evaluate(&subject).unwrap()
        );
    }

    #[test]
    fn double_negation_is_identity(case in arb_case()) {
        let GenCase { subject, tree } = case;
        let doubled = !!tree.clone();
        prop_assert_eq!(
            doubled.evaluate(&subject).unwrap(),
            tree.evaluate(&subject).unwrap()
        );
    }
}

// ---- Invariant 2: groups are all/any over their children ----
//
// And agrees with evaluating every child and requiring all of them; Or
// agrees with requiring at least one. Empty groups fall out of the same
// rule: all([]) is true, any([]) is false.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn and_agrees_with_all((subject, children) in arb_group_case()) {
        let expected = children
            .iter()
            .all(|child| child.evaluate(&subject).unwrap());
        let group = Condition::And(children);
        prop_assert_eq!(group.evaluate(&subject).unwrap(), expected);
    }

    #[test]
    fn or_agrees_with_any((subject, children) in arb_group_case()) {
        let expected = children
            .iter()
            .any(|child| child.evaluate(&subject).unwrap());
        let group = Condition::Or(children);
        prop_assert_eq!(group.evaluate(&subject).unwrap(), expected);
    }
}

// ---- Invariant 3: evaluation is deterministic ----
proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn repeated_evaluation_agrees(case in arb_case()) {
        let GenCase { subject, tree } = case;
        let first = tree.evaluate(&subject).unwrap();
        for _ in 0..5 {
            prop_assert_eq!(tree.evaluate(&subject).unwrap(), first);
        }
    }
}

// ---- Invariant 4: the wire round trip changes nothing ----
//
// Every generated tree is built from serializable nodes, so encoding
// must succeed, decoding must reproduce the same tree, and the decoded
// tree must reach the same verdict on the same subject.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn round_trip_preserves_the_tree(case in arb_case()) {
        let GenCase { subject, tree } = case;
        let json = tree.to_json().unwrap();
        let decoded = Condition::from_json(&json).unwrap();
        prop_assert_eq!(&decoded, &tree);
        prop_assert_eq!(
            decoded.evaluate(&subject).unwrap(),
            tree.evaluate(&subject).unwrap()
        );
    }
}

// ---- Invariant 5: decisive children stop the scan ----
//
// Once a child settles the group, later children are never consulted.
// The trailing ordering leaf would reject null, bool, and string
// subjects, so an Ok verdict on every scalar proves it never ran.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn and_stops_at_the_first_false(subject in arb_scalar()) {
        let rule = Condition::And(vec![
            Condition::Or(vec![]),
            Condition::greater_than(0_i64),
        ]);
        prop_assert!(!rule.evaluate(&subject).unwrap());
    }

    #[test]
    fn or_stops_at_the_first_true(subject in arb_scalar()) {
        let rule = Condition::Or(vec![
            Condition::And(vec![]),
            Condition::greater_than(0_i64),
        ]);
        prop_assert!(rule.evaluate(&subject).unwrap());
    }
}
