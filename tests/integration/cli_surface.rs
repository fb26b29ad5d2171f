use predicates::prelude::*;
use tempfile::TempDir;

use crate::common::TestEnv;

#[test]
fn test_help_lists_command_groups() {
    let env = TestEnv::new();
    let project = TempDir::new().unwrap();

    env.apimtool(project.path(), &["--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("apim"))
        .stdout(predicate::str::contains("template"))
        .stdout(predicate::str::contains("parse"));
}

#[test]
fn test_unknown_protocol_is_rejected_by_parser() {
    let env = TestEnv::new();
    let project = TempDir::new().unwrap();

    env.apimtool(
        project.path(),
        &["template", "backend", "create", "--env", "dev", "--backend-id", "a", "--url", "https://x", "--protocol", "grpc"],
    )
    .assert()
    .failure()
    .code(2)
    .stderr(predicate::str::contains("grpc"));
}

#[test]
fn test_unknown_output_mode_is_rejected_by_parser() {
    let env = TestEnv::new();
    let project = TempDir::new().unwrap();

    env.apimtool(project.path(), &["apim", "backend", "list", "-g", "rg", "-n", "svc", "--option", "json"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_live_command_without_subscription_fails_with_hint() {
    let env = TestEnv::new();
    let project = TempDir::new().unwrap();

    env.apimtool(project.path(), &["apim", "backend", "list", "-g", "rg", "-n", "svc"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("APIMTOOL_AZURE_SUBSCRIPTION_ID"));
}

#[test]
fn test_explicit_missing_config_file_fails() {
    let env = TestEnv::new();
    let project = TempDir::new().unwrap();
    let missing = project.path().join("nope.toml");

    env.apimtool(
        project.path(),
        &["--config", missing.to_str().unwrap(), "template", "backend", "delete", "--env", "dev", "--backend-id", "a"],
    )
    .assert()
    .failure()
    .stderr(predicate::str::contains("nope.toml"));
}
