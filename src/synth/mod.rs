//! Artifact synthesis for the API Management DevOps Resource Kit
//!
//! From one per-API config and a resolved backend id, three files are written
//! into the API's output directory:
//!
//! | File | Content |
//! |---|---|
//! | `<apiname>.csv` | one `name,method,url` row per operation, no header |
//! | `apiPolicyHeaders.xml` | inbound policy routing to the backend |
//! | `config.yaml` | Resource Kit deployment config |
//!
//! Each write is independent: a failed artifact is recorded in the
//! [`SynthesisReport`] and the remaining ones are still attempted. Existing
//! files are overwritten.

use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::core::{ApimError, Result};
use crate::models::{ApiConfig, DeploymentConfig, InboundPolicy, TagStyle};
use crate::utils::fs::{ensure_dir, write_text_file};

/// Policy file name.
pub const POLICY_FILE: &str = "apiPolicyHeaders.xml";
/// Deployment config file name.
pub const CONFIG_FILE: &str = "config.yaml";

/// Rendering options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SynthesisOptions {
    /// Shape of `tags` in `config.yaml`
    pub tag_style: TagStyle,
}

/// The three generated artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// `<apiname>.csv`
    OperationsCsv,
    /// `apiPolicyHeaders.xml`
    PolicyXml,
    /// `config.yaml`
    DeploymentYaml,
}

impl ArtifactKind {
    /// File name of the artifact for `api_name`.
    #[must_use]
    pub fn file_name(self, api_name: &str) -> String {
        match self {
            Self::OperationsCsv => format!("{api_name}.csv"),
            Self::PolicyXml => POLICY_FILE.to_string(),
            Self::DeploymentYaml => CONFIG_FILE.to_string(),
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::OperationsCsv => "operations CSV",
            Self::PolicyXml => "policy XML",
            Self::DeploymentYaml => "deployment YAML",
        })
    }
}

/// Result of writing one artifact.
#[derive(Debug)]
pub struct ArtifactOutcome {
    /// Which artifact
    pub kind: ArtifactKind,
    /// Target path
    pub path: PathBuf,
    /// Write result
    pub result: Result<()>,
}

/// Per-artifact results of [`synthesize`], in write order.
#[derive(Debug)]
pub struct SynthesisReport {
    /// Output directory
    pub output_dir: PathBuf,
    /// One outcome per artifact
    pub outcomes: Vec<ArtifactOutcome>,
}

impl SynthesisReport {
    /// Whether every artifact was written.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    /// Paths of the artifacts that were written.
    #[must_use]
    pub fn written(&self) -> Vec<&Path> {
        self.outcomes.iter().filter(|o| o.result.is_ok()).map(|o| o.path.as_path()).collect()
    }

    /// Fold failures into a single [`ApimError::ArtifactWrite`].
    ///
    /// # Errors
    ///
    /// When at least one artifact failed.
    pub fn into_result(self) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        let mut failures = Vec::new();
        for outcome in self.outcomes {
            match outcome.result {
                Ok(()) => written.push(outcome.path),
                Err(e) => failures.push(format!("{} ({}): {e}", outcome.kind, outcome.path.display())),
            }
        }
        if failures.is_empty() {
            Ok(written)
        } else {
            Err(ApimError::ArtifactWrite {
                failures,
            })
        }
    }
}

/// Write the three artifacts for `api` into `output_dir`.
///
/// `resolved_id` may be a comma-joined list of ids; the policy routes to the
/// first one.
///
/// # Errors
///
/// Only when `output_dir` cannot be created. Artifact failures are reported
/// in the returned [`SynthesisReport`].
pub fn synthesize(
    output_dir: &Path,
    api: &ApiConfig,
    resolved_id: &str,
    service_name: &str,
    options: SynthesisOptions,
) -> Result<SynthesisReport> {
    ensure_dir(output_dir)?;

    let backend_id = first_backend_id(resolved_id);
    let artifacts = [
        (ArtifactKind::OperationsCsv, Ok(render_operations_csv(api))),
        (ArtifactKind::PolicyXml, Ok(render_policy_xml(api, backend_id))),
        (ArtifactKind::DeploymentYaml, render_deployment_yaml(api, service_name, options.tag_style)),
    ];

    let outcomes = artifacts
        .into_iter()
        .map(|(kind, content)| {
            let path = output_dir.join(kind.file_name(&api.api_name));
            let result = content.and_then(|content| write_text_file(&path, &content));
            match &result {
                Ok(()) => info!("Wrote {} to {}", kind, path.display()),
                Err(e) => warn!("Failed to write {} to {}: {}", kind, path.display(), e),
            }
            ArtifactOutcome {
                kind,
                path,
                result,
            }
        })
        .collect();

    Ok(SynthesisReport {
        output_dir: output_dir.to_path_buf(),
        outcomes,
    })
}

/// First entry of a comma-joined id list.
#[must_use]
pub fn first_backend_id(resolved_id: &str) -> &str {
    resolved_id.split(',').next().unwrap_or_default().trim()
}

/// Operations as CSV rows, no header.
#[must_use]
pub fn render_operations_csv(api: &ApiConfig) -> String {
    let mut csv = String::new();
    for op in &api.operations {
        let row = [op.name.as_str(), op.method.as_str(), op.url.as_str()]
            .iter()
            .map(|field| csv_field(field))
            .collect::<Vec<_>>()
            .join(",");
        csv.push_str(&row);
        csv.push('\n');
    }
    csv
}

// Leading whitespace and a lone `\.` are quoted as well.
fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\r', '\n']) || field.starts_with(char::is_whitespace) || field == r"\." {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Inbound policy XML routing to `backend_id`.
#[must_use]
pub fn render_policy_xml(api: &ApiConfig, backend_id: &str) -> String {
    InboundPolicy::new(backend_id, api.policies.set_headers.clone()).to_xml()
}

/// Deployment config YAML.
///
/// # Errors
///
/// [`ApimError::YamlError`] when serialization fails.
pub fn render_deployment_yaml(api: &ApiConfig, service_name: &str, tag_style: TagStyle) -> Result<String> {
    let config = DeploymentConfig::for_api(api, service_name, tag_style);
    Ok(serde_yaml::to_string(&config)?)
}
