//! Shared helpers for the apimtool integration suite
//!
//! Every invocation runs with a temporary `HOME`, no Azure environment
//! variables and colours disabled, so a developer's own login or config
//! never leaks into a test.

#![allow(dead_code)]

use assert_cmd::Command;
use std::path::Path;
use tempfile::TempDir;

const AZURE_ENV: &[&str] = &[
    "APIMTOOL_AZURE_SUBSCRIPTION_ID",
    "AZURE_SUBSCRIPTION_ID",
    "APIMTOOL_AZURE_LOCATION",
    "APIMTOOL_AZURE_ACCESS_TOKEN",
    "APIMTOOL_MANAGEMENT_ENDPOINT",
    "RUST_LOG",
];

/// An isolated home directory plus a command builder bound to it.
pub struct TestEnv {
    home: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            home: TempDir::new().unwrap(),
        }
    }

    pub fn home(&self) -> &Path {
        self.home.path()
    }

    /// `apimtool --project-dir <project> <args...>`
    pub fn apimtool(&self, project: &Path, args: &[&str]) -> Command {
        let mut cmd = Command::cargo_bin("apimtool").unwrap();
        for key in AZURE_ENV {
            cmd.env_remove(key);
        }
        cmd.env("HOME", self.home.path())
            .env("NO_COLOR", "1")
            .env("CLICOLOR", "0")
            .arg("--project-dir")
            .arg(project)
            .args(args);
        cmd
    }
}
