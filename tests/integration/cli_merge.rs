//! Integration tests for the treemeld binary

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn run(workspace: &Path, args: &[&str]) -> Output {
    run_with_env(workspace, &[], args)
}

fn run_with_env(workspace: &Path, vars: &[(&str, &str)], args: &[&str]) -> Output {
    let bin = env!("CARGO_BIN_EXE_treemeld");
    Command::new(bin)
        .env("HOME", workspace.join("home"))
        .env("XDG_CONFIG_HOME", workspace.join("xdg"))
        .env_remove("TREEMELD_LOG")
        .env_remove("TREEMELD_LOG_OUTPUT")
        .env_remove("TREEMELD_LOG_FORMAT")
        .env_remove("TREEMELD_MERGE__LIST_STRATEGY")
        .env_remove("TREEMELD_MERGE__MAX_DEPTH")
        .envs(vars.iter().copied())
        .arg("--workspace")
        .arg(workspace)
        .args(args)
        .output()
        .expect("failed to run treemeld")
}

#[test]
fn test_merge_json_documents() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    fs::write(dir.join("base.json"), r#"{"a": 1, "list": [1], "nested": {"x": true}}"#).unwrap();
    fs::write(dir.join("child.json"), r#"{"list": [2], "nested": {"y": "z"}}"#).unwrap();

    let output = run(
        dir,
        &[
            "merge",
            dir.join("base.json").to_str().unwrap(),
            dir.join("child.json").to_str().unwrap(),
        ],
    );
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let merged: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        merged,
        serde_json::json!({"a": 1, "list": [1, 2], "nested": {"x": true, "y": "z"}})
    );
}

#[test]
fn test_stdout_log_output_does_not_mix_with_document() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    fs::write(dir.join("base.json"), r#"{"a": 1}"#).unwrap();
    fs::write(dir.join("child.json"), r#"{"b": 2}"#).unwrap();

    let output = run_with_env(
        dir,
        &[("TREEMELD_LOG_OUTPUT", "stdout"), ("TREEMELD_LOG", "debug")],
        &[
            "merge",
            dir.join("base.json").to_str().unwrap(),
            dir.join("child.json").to_str().unwrap(),
        ],
    );
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let merged: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(merged, serde_json::json!({"a": 1, "b": 2}));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Merge completed"));
}

#[test]
fn test_merge_toml_with_policy_flags() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    fs::write(dir.join("base.toml"), "tags = [\"a\"]\n[limits]\nmax = 1\n").unwrap();
    fs::write(dir.join("child.toml"), "tags = [\"b\"]\n[limits]\nmax = 2\n").unwrap();

    let output = run(
        dir,
        &[
            "merge",
            dir.join("base.toml").to_str().unwrap(),
            dir.join("child.toml").to_str().unwrap(),
            "--list-strategy",
            "replace",
            "--output",
            "toml",
        ],
    );
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let merged: toml::Table = toml::from_str(&String::from_utf8_lossy(&output.stdout)).unwrap();
    assert_eq!(merged["tags"], toml::Value::Array(vec![toml::Value::String("b".into())]));
    assert_eq!(merged["limits"]["max"], toml::Value::Integer(2));
}

#[test]
fn test_merge_conflict_reports_paths() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    fs::write(dir.join("base.json"), r#"{"a": {"b": 1}, "c": "x"}"#).unwrap();
    fs::write(dir.join("child.json"), r#"{"a": [1], "c": 2}"#).unwrap();

    let output = run(
        dir,
        &[
            "merge",
            dir.join("base.json").to_str().unwrap(),
            dir.join("child.json").to_str().unwrap(),
        ],
    );
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("TypeMismatch"));
    assert!(stderr.contains("$.a"));
    assert!(stderr.contains("$.c"));
}

#[test]
fn test_policy_command_reads_workspace_config() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    fs::create_dir_all(dir.join("config")).unwrap();
    fs::write(
        dir.join("config").join("config.toml"),
        "[merge]\nnone_policy = \"allow_none\"\n",
    )
    .unwrap();

    let output = run(dir, &["policy", "--max-depth", "9"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        "list_strategy=concatenate none_policy=allow_none type_mismatch_policy=error max_depth=9"
    );
}

#[test]
fn test_invalid_depth_flag() {
    let temp_dir = TempDir::new().unwrap();
    let output = run(temp_dir.path(), &["policy", "--max-depth=0"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("InvalidPolicyConfig"));
}
