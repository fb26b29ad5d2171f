use apimtool::test_utils::{ORDERS_API_CONFIG, ProjectFixture, SINGLE_BACKEND_TEMPLATE};
use predicates::prelude::*;
use tempfile::TempDir;

use crate::common::TestEnv;

const PARSE: &[&str] = &["parse", "-g", "rg", "-n", "apim-dev", "--env", "dev", "--api-id", "orders"];

#[test]
fn test_missing_layout_fails_before_network() {
    let env = TestEnv::new();
    let project = TempDir::new().unwrap();

    env.apimtool(project.path(), PARSE)
        .env("APIMTOOL_AZURE_SUBSCRIPTION_ID", "00000000-0000-0000-0000-000000000000")
        .env("APIMTOOL_AZURE_ACCESS_TOKEN", "token")
        .env("APIMTOOL_MANAGEMENT_ENDPOINT", "http://127.0.0.1:9")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Project directories"))
        .stderr(predicate::str::contains("apim-dev"));
}

#[test]
fn test_missing_api_config_is_reported() {
    let env = TestEnv::new();
    let project = ProjectFixture::new("dev").with_template("dev", SINGLE_BACKEND_TEMPLATE);

    env.apimtool(project.root(), PARSE)
        .assert()
        .failure()
        .stderr(predicate::str::contains("API config"))
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_malformed_api_config_is_reported() {
    let env = TestEnv::new();
    let project = ProjectFixture::new("dev")
        .with_template("dev", SINGLE_BACKEND_TEMPLATE)
        .with_api_config("dev", "orders", r#"{ "apiname": "orders", "operations": [] }"#);

    env.apimtool(project.root(), PARSE)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Malformed document"));
}

#[test]
fn test_valid_project_without_subscription_stops_at_config() {
    let env = TestEnv::new();
    let project = ProjectFixture::new("dev")
        .with_template("dev", SINGLE_BACKEND_TEMPLATE)
        .with_api_config("dev", "orders", ORDERS_API_CONFIG);

    env.apimtool(project.root(), PARSE)
        .assert()
        .failure()
        .stderr(predicate::str::contains("APIMTOOL_AZURE_SUBSCRIPTION_ID"));

    assert!(!project.layout().api_output_dir("dev", "orders").exists());
}
