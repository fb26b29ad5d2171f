use apimtool::test_utils::{ProjectFixture, SINGLE_BACKEND_TEMPLATE};
use predicates::prelude::*;

use crate::common::TestEnv;

fn create_args<'a>(id: &'a str, url: &'a str, protocol: &'a str) -> Vec<&'a str> {
    vec!["template", "backend", "create", "--env", "dev", "--backend-id", id, "--url", url, "--protocol", protocol]
}

#[test]
fn test_create_appends_backend() {
    let env = TestEnv::new();
    let project = ProjectFixture::new("dev").with_template("dev", SINGLE_BACKEND_TEMPLATE);

    env.apimtool(project.root(), &create_args("svc-b", "https://10.0.0.2:8443", "soap"))
        .assert()
        .success()
        .stdout(predicate::str::contains("svc-b"));

    let doc: serde_json::Value = serde_json::from_str(&project.read_template("dev")).unwrap();
    let resources = doc["resources"].as_array().unwrap();
    assert_eq!(resources.len(), 2);
    assert_eq!(resources[1]["name"], "[concat(parameters('ApimServiceName'), '/svc-b')]");
    assert_eq!(resources[1]["properties"]["url"], "https://10.0.0.2:8443");
    assert_eq!(resources[1]["properties"]["protocol"], "soap");
    assert_eq!(resources[1]["apiVersion"], "2021-01-01-preview");
}

#[test]
fn test_create_same_endpoint_fails_and_keeps_file() {
    let env = TestEnv::new();
    let project = ProjectFixture::new("dev").with_template("dev", SINGLE_BACKEND_TEMPLATE);

    env.apimtool(project.root(), &create_args("svc-b", "https://10.0.0.1", "http"))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Duplicate backend endpoint"))
        .stderr(predicate::str::contains("svc-a"));

    assert_eq!(project.read_template("dev"), SINGLE_BACKEND_TEMPLATE);
}

#[test]
fn test_same_url_with_other_protocol_is_accepted() {
    let env = TestEnv::new();
    let project = ProjectFixture::new("dev").with_template("dev", SINGLE_BACKEND_TEMPLATE);

    env.apimtool(project.root(), &create_args("svc-a-soap", "https://10.0.0.1", "soap")).assert().success();
    assert!(project.read_template("dev").contains("svc-a-soap"));
}

#[test]
fn test_create_duplicate_id_fails() {
    let env = TestEnv::new();
    let project = ProjectFixture::new("dev").with_template("dev", SINGLE_BACKEND_TEMPLATE);

    env.apimtool(project.root(), &create_args("svc-a", "https://10.0.0.9", "http"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Duplicate backend id"));

    assert_eq!(project.read_template("dev"), SINGLE_BACKEND_TEMPLATE);
}

#[test]
fn test_create_invalid_id_fails() {
    let env = TestEnv::new();
    let project = ProjectFixture::new("dev").with_template("dev", SINGLE_BACKEND_TEMPLATE);

    env.apimtool(project.root(), &create_args("bad/id", "https://10.0.0.9", "http"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid backend id"));
}

#[test]
fn test_missing_template_is_not_found() {
    let env = TestEnv::new();
    let project = ProjectFixture::new("dev");

    env.apimtool(project.root(), &create_args("svc-b", "https://10.0.0.2", "http"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));

    assert!(!project.template_path("dev").exists());
}

#[test]
fn test_delete_removes_backend() {
    let env = TestEnv::new();
    let project = ProjectFixture::new("dev").with_template("dev", SINGLE_BACKEND_TEMPLATE);

    env.apimtool(project.root(), &["template", "backend", "delete", "--env", "dev", "--backend-id", "svc-a"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted"));

    let doc: serde_json::Value = serde_json::from_str(&project.read_template("dev")).unwrap();
    assert!(doc["resources"].as_array().unwrap().is_empty());
    assert_eq!(doc["contentVersion"], "1.0.0.0");
}

#[test]
fn test_file_path_overrides_environment_template() {
    let env = TestEnv::new();
    let project = ProjectFixture::new("dev");
    let custom = project.root().join("custom.template.json");
    std::fs::write(&custom, SINGLE_BACKEND_TEMPLATE).unwrap();

    let mut args = create_args("svc-b", "https://10.0.0.2", "http");
    args.extend(["--file-path", custom.to_str().unwrap()]);
    env.apimtool(project.root(), &args).assert().success();

    assert!(std::fs::read_to_string(&custom).unwrap().contains("svc-b"));
    assert!(!project.template_path("dev").exists());
}
