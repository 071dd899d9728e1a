//! Integration tests for structured record and typed model merging

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use treemeld::{
    merge_configs, merge_configs_with_schemas, merge_models, merge_typed, ExpectedKind,
    FieldConstraint, FieldRule, ListStrategy, Mapping, MergeErrorKind, MergeModel, NonePolicy,
    PolicyConfig, Record, RecordSchema, Scalar, SchemaRegistry, TypeMismatchPolicy, Value,
};

fn registry() -> SchemaRegistry {
    SchemaRegistry::new()
        .with(
            RecordSchema::new("SpecContext")
                .field(
                    FieldRule::required("name")
                        .with(FieldConstraint::Kind(ExpectedKind::String))
                        .with(FieldConstraint::NonEmpty),
                )
                .field(FieldRule::required("level").with(FieldConstraint::IntegerRange {
                    min: Some(0),
                    max: Some(10),
                }))
                .field(
                    FieldRule::optional("status").with(FieldConstraint::OneOf(vec![
                        Scalar::from("draft"),
                        Scalar::from("approved"),
                    ])),
                )
                .field(FieldRule::optional("owner").with(FieldConstraint::Kind(
                    ExpectedKind::Record("Owner".to_string()),
                ))),
        )
        .with(
            RecordSchema::new("Owner")
                .field(FieldRule::required("email").with(FieldConstraint::MaxLength(32))),
        )
}

fn context(fields: Vec<(&str, Value)>) -> Record {
    Record::new("SpecContext", fields.into_iter().collect::<Mapping>())
}

#[test]
fn test_parent_child_context_merge() {
    let parent = context(vec![
        ("name", "parent".into()),
        ("level", 1.into()),
        ("owner", Value::record("Owner", [("email", "a@example.com")])),
    ]);
    let child = context(vec![("level", 2.into()), ("status", "approved".into())]);

    let merged = merge_models(&parent, &child, &registry(), &PolicyConfig::DEFAULT).unwrap();
    assert_eq!(merged.schema(), "SpecContext");
    assert_eq!(merged.get("name"), Some(&Value::from("parent")));
    assert_eq!(merged.get("level"), Some(&Value::from(2)));
    assert_eq!(merged.get("status"), Some(&Value::from("approved")));
}

#[test]
fn test_structural_errors_skip_validation() {
    // The right side breaks the schema too, but only the structural conflict is reported.
    let parent = context(vec![("name", "p".into()), ("level", 1.into())]);
    let child = context(vec![("level", "high".into()), ("status", "bogus".into())]);

    let err = merge_models(&parent, &child, &registry(), &PolicyConfig::DEFAULT).unwrap_err();
    assert_eq!(err.len(), 1);
    assert_eq!(err.first().kind, MergeErrorKind::TypeMismatch);
    assert_eq!(err.first().path.to_string(), "$.level");
}

#[test]
fn test_post_merge_validation_error() {
    let parent = context(vec![("name", "p".into()), ("level", 1.into())]);
    let child = context(vec![("level", 11.into())]);

    let err = merge_models(&parent, &child, &registry(), &PolicyConfig::DEFAULT).unwrap_err();
    assert_eq!(err.len(), 1);
    assert_eq!(err.first().kind, MergeErrorKind::PostMergeValidationError);
    assert_eq!(err.first().message, "11 is above maximum 10");
}

#[test]
fn test_force_override_then_validation_catches_shape() {
    let force = PolicyConfig::DEFAULT.with_type_mismatch_policy(TypeMismatchPolicy::ForceOverride);
    let parent = context(vec![
        ("name", "p".into()),
        ("level", 1.into()),
        ("owner", Value::record("Owner", [("email", "a@example.com")])),
    ]);
    let child = context(vec![("owner", Value::from("nobody"))]);

    let err = merge_models(&parent, &child, &registry(), &force).unwrap_err();
    assert_eq!(err.first().kind, MergeErrorKind::PostMergeValidationError);
    assert_eq!(err.first().path.to_string(), "$.owner");
}

#[test]
fn test_nested_record_validated() {
    let long_email = "someone.with.a.very.long.name@example.com";
    let parent = context(vec![
        ("name", "p".into()),
        ("level", 1.into()),
        ("owner", Value::record("Owner", [("email", "a@example.com")])),
    ]);
    let child = context(vec![("owner", Value::record("Owner", [("email", long_email)]))]);

    let err = merge_models(&parent, &child, &registry(), &PolicyConfig::DEFAULT).unwrap_err();
    assert_eq!(err.first().path.to_string(), "$.owner.email");
}

#[test]
fn test_allow_none_removes_required_field() {
    let allow = PolicyConfig::DEFAULT.with_none_policy(NonePolicy::AllowNone);
    let parent = context(vec![("name", "p".into()), ("level", 1.into())]);
    let child = context(vec![("name", Value::Null)]);

    let err = merge_models(&parent, &child, &registry(), &allow).unwrap_err();
    assert_eq!(err.first().kind, MergeErrorKind::PostMergeValidationError);
    assert_eq!(err.first().path.to_string(), "$.name");

    let merged = merge_models(&parent, &child, &registry(), &PolicyConfig::DEFAULT).unwrap();
    assert_eq!(merged.get("name"), Some(&Value::from("p")));
}

#[test]
fn test_different_record_type_regardless_of_policy() {
    let parent = context(vec![("name", "p".into()), ("level", 1.into())]);
    let other = Record::new("Owner", Mapping::from_iter([("email", "x@example.com")]));
    let force = PolicyConfig::DEFAULT.with_type_mismatch_policy(TypeMismatchPolicy::ForceOverride);

    let err = merge_models(&parent, &other, &registry(), &force).unwrap_err();
    assert_eq!(err.len(), 1);
    assert_eq!(err.first().kind, MergeErrorKind::DifferentRecordType);
}

#[test]
fn test_config_merge_revalidates_nested_records() {
    let base = Value::mapping([
        ("name", Value::from("service")),
        ("owner", Value::record("Owner", [("email", "a@example.com")])),
    ]);
    let overlay = Value::mapping([("owner", Value::record("Owner", [("bogus", 1)]))]);

    // Structure alone merges cleanly.
    let merged = merge_configs(&base, &overlay, &PolicyConfig::DEFAULT).unwrap();
    assert_eq!(merged.get("owner").and_then(|o| o.get("bogus")), Some(&Value::from(1)));

    let err =
        merge_configs_with_schemas(&base, &overlay, &registry(), &PolicyConfig::DEFAULT)
            .unwrap_err();
    assert_eq!(err.len(), 1);
    assert_eq!(err.first().kind, MergeErrorKind::PostMergeValidationError);
    assert_eq!(err.first().path.to_string(), "$.owner.bogus");
}

#[test]
fn test_config_merge_with_valid_nested_records() {
    let base = Value::mapping([("owner", Value::record("Owner", [("email", "a@example.com")]))]);
    let overlay = Value::mapping([("owner", Value::record("Owner", [("email", "b@example.com")]))]);

    let merged =
        merge_configs_with_schemas(&base, &overlay, &registry(), &PolicyConfig::DEFAULT).unwrap();
    assert_eq!(
        merged.get("owner").and_then(|o| o.get("email")),
        Some(&Value::from("b@example.com"))
    );
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct AgentProfile {
    agent_id: String,
    system_prompt: Option<String>,
    #[serde(default)]
    tools: Vec<String>,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
}

impl MergeModel for AgentProfile {
    const SCHEMA: &'static str = "AgentProfile";

    fn validate(&self) -> Result<(), String> {
        if self.agent_id.trim().is_empty() {
            return Err("agent_id must not be blank".to_string());
        }
        Ok(())
    }
}

#[test]
fn test_typed_profile_merge() {
    let base = AgentProfile {
        agent_id: "writer".to_string(),
        system_prompt: Some("You write docs.".to_string()),
        tools: vec!["read".to_string()],
        metadata: BTreeMap::from([("tier".to_string(), "1".to_string())]),
    };
    let overlay = AgentProfile {
        agent_id: "writer".to_string(),
        system_prompt: None,
        tools: vec!["write".to_string()],
        metadata: BTreeMap::from([("region".to_string(), "eu".to_string())]),
    };

    let merged = merge_typed(&base, &overlay, &PolicyConfig::DEFAULT).unwrap();
    assert_eq!(merged.system_prompt.as_deref(), Some("You write docs."));
    assert_eq!(merged.tools, vec!["read", "write"]);
    assert_eq!(merged.metadata.len(), 2);

    let replace = PolicyConfig::DEFAULT.with_list_strategy(ListStrategy::Replace);
    let merged = merge_typed(&base, &overlay, &replace).unwrap();
    assert_eq!(merged.tools, vec!["write"]);
}

#[test]
fn test_typed_validation_failure() {
    let base = AgentProfile {
        agent_id: "writer".to_string(),
        system_prompt: None,
        tools: Vec::new(),
        metadata: BTreeMap::new(),
    };
    let overlay = AgentProfile {
        agent_id: "  ".to_string(),
        ..base.clone()
    };

    let err = merge_typed(&base, &overlay, &PolicyConfig::DEFAULT).unwrap_err();
    assert_eq!(err.first().kind, MergeErrorKind::PostMergeValidationError);
    assert!(err.first().message.contains("agent_id must not be blank"));
}
