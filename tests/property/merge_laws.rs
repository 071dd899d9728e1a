//! Property-based tests for merge laws

use proptest::prelude::*;
use treemeld::{merge, ListStrategy, NonePolicy, PolicyConfig, TypeMismatchPolicy, Value};

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        (-1.0e6f64..1.0e6).prop_map(Value::from),
        "[a-z]{0,6}".prop_map(Value::from),
    ]
}

/// Trees of bounded depth; every record shares one schema.
fn tree() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(4, 48, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Sequence),
            prop::collection::vec(("[a-d]", inner.clone()), 0..4)
                .prop_map(|entries| Value::mapping(entries)),
            prop::collection::vec(("[a-d]", inner), 0..4)
                .prop_map(|fields| Value::record("Node", fields)),
        ]
    })
}

fn any_policy() -> impl Strategy<Value = PolicyConfig> {
    (
        prop_oneof![
            Just(ListStrategy::Concatenate),
            Just(ListStrategy::Replace),
            Just(ListStrategy::ElementWise),
        ],
        prop_oneof![Just(NonePolicy::SkipNone), Just(NonePolicy::AllowNone)],
        prop_oneof![
            Just(TypeMismatchPolicy::Error),
            Just(TypeMismatchPolicy::SkipOnMismatch),
            Just(TypeMismatchPolicy::ForceOverride),
        ],
    )
        .prop_map(|(list, none, mismatch)| PolicyConfig::new(list, none, mismatch, 50))
}

/// Merging a tree with itself returns it unchanged when lists do not grow
#[test]
fn test_idempotence_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(tree(), any_policy()), |(tree, policy)| {
            prop_assume!(policy.list_strategy != ListStrategy::Concatenate);
            let merged = merge(&tree, &tree, &policy).unwrap();
            prop_assert_eq!(merged, tree);
            Ok(())
        })
        .unwrap();
}

/// A null override never changes the base under SkipNone
#[test]
fn test_left_identity_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(tree(), any_policy()), |(tree, policy)| {
            let policy = policy.with_none_policy(NonePolicy::SkipNone);
            prop_assert_eq!(merge(&tree, &Value::Null, &policy).unwrap(), tree);
            Ok(())
        })
        .unwrap();
}

/// Inputs are identical before and after a merge, whatever the outcome
#[test]
fn test_inputs_unchanged_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(tree(), tree(), any_policy()), |(left, right, policy)| {
            let left_snapshot = left.clone();
            let right_snapshot = right.clone();

            let first = merge(&left, &right, &policy);
            let second = merge(&left, &right, &policy);

            prop_assert_eq!(&left, &left_snapshot);
            prop_assert_eq!(&right, &right_snapshot);
            prop_assert_eq!(first, second);
            Ok(())
        })
        .unwrap();
}

/// Without an Error policy and with a single record schema, merging never fails
#[test]
fn test_lenient_policies_are_total() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(tree(), tree(), any_policy()), |(left, right, policy)| {
            prop_assume!(policy.type_mismatch_policy != TypeMismatchPolicy::Error);
            prop_assert!(merge(&left, &right, &policy).is_ok());
            Ok(())
        })
        .unwrap();
}

/// Concatenation keeps every element of both sides in order
#[test]
fn test_concatenate_preserves_elements() {
    let mut runner = proptest::test_runner::TestRunner::default();
    let sides = (
        prop::collection::vec(tree(), 0..5),
        prop::collection::vec(tree(), 0..5),
    );

    runner
        .run(&sides, |(left, right)| {
            let merged = merge(
                &Value::Sequence(left.clone()),
                &Value::Sequence(right.clone()),
                &PolicyConfig::DEFAULT,
            )
            .unwrap();

            let expected: Vec<Value> = left.into_iter().chain(right).collect();
            prop_assert_eq!(merged, Value::Sequence(expected));
            Ok(())
        })
        .unwrap();
}
