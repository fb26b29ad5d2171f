//! Configuration for apimtool
//!
//! Two pieces of configuration are passed explicitly to every command:
//!
//! - [`AppConfig`] - how to reach the control plane (subscription, endpoint,
//!   token, timeouts)
//! - [`ProjectLayout`] - where the project documents live on disk
//!
//! # Configuration File (`~/.apimtool/config.toml`)
//!
//! Optional. A different file can be passed with `--config`.
//!
//! ```toml
//! subscription_id = "00000000-0000-0000-0000-000000000000"
//! location = "southeastasia"
//! request_timeout_secs = 30
//! ```
//!
//! # Environment Overrides
//!
//! Environment variables win over the file:
//!
//! | Variable | Field |
//! |---|---|
//! | `APIMTOOL_AZURE_SUBSCRIPTION_ID` (fallback `AZURE_SUBSCRIPTION_ID`) | `subscription_id` |
//! | `APIMTOOL_AZURE_LOCATION` | `location` |
//! | `APIMTOOL_AZURE_ACCESS_TOKEN` | `access_token` |
//! | `APIMTOOL_MANAGEMENT_ENDPOINT` | `management_endpoint` |
//!
//! # Project Layout
//!
//! ```text
//! <project>/
//! ├── apis/<env>/<api-id>.json
//! └── apim-<env>/
//!     ├── sources/<apiname>/          generated artifacts
//!     └── templates/backends.template.json
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::debug;

use crate::core::ApimError;

/// Default Azure Resource Manager endpoint.
pub const DEFAULT_MANAGEMENT_ENDPOINT: &str = "https://management.azure.com";
/// API Management REST API version used for every control-plane call.
pub const DEFAULT_API_VERSION: &str = "2021-08-01";
/// File name of the backend template.
pub const BACKEND_TEMPLATE_FILE: &str = "backends.template.json";

const fn default_request_timeout_secs() -> u64 {
    30
}

const fn default_token_timeout_secs() -> u64 {
    60
}

fn default_management_endpoint() -> String {
    DEFAULT_MANAGEMENT_ENDPOINT.to_string()
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

/// Control-plane settings.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    /// Azure subscription holding the APIM services
    #[serde(default)]
    pub subscription_id: Option<String>,

    /// Azure region, reported in diagnostics
    #[serde(default)]
    pub location: Option<String>,

    /// ARM endpoint, without trailing slash
    #[serde(default = "default_management_endpoint")]
    pub management_endpoint: String,

    /// `api-version` query parameter
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Bearer token; when absent one is requested from the Azure CLI
    #[serde(default)]
    pub access_token: Option<String>,

    /// Timeout of every HTTP request, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Timeout of the `az account get-access-token` call, in seconds
    #[serde(default = "default_token_timeout_secs")]
    pub token_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            subscription_id: None,
            location: None,
            management_endpoint: default_management_endpoint(),
            api_version: default_api_version(),
            access_token: None,
            request_timeout_secs: default_request_timeout_secs(),
            token_timeout_secs: default_token_timeout_secs(),
        }
    }
}

// Tokens never reach logs.
impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("subscription_id", &self.subscription_id)
            .field("location", &self.location)
            .field("management_endpoint", &self.management_endpoint)
            .field("api_version", &self.api_version)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("token_timeout_secs", &self.token_timeout_secs)
            .finish()
    }
}

impl AppConfig {
    /// Load the config file (explicit path or the default location) and apply
    /// environment overrides.
    ///
    /// A missing file at the default location is not an error. A missing file
    /// passed explicitly is.
    ///
    /// # Errors
    ///
    /// The file cannot be read or is not valid TOML.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, |key| std::env::var(key).ok()).await
    }

    /// Same as [`AppConfig::load`] with an injectable environment lookup.
    ///
    /// # Errors
    ///
    /// See [`AppConfig::load`].
    pub async fn load_with_env<F>(path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => Self::load_from(path).await?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load_from(&path).await?,
                _ => Self::default(),
            },
        };
        config.apply_env(lookup);
        debug!("Effective configuration: {:?}", config);
        Ok(config)
    }

    /// Parse a config file.
    ///
    /// # Errors
    ///
    /// The file cannot be read or is not valid TOML.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&content)
            .map_err(ApimError::from)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// `~/.apimtool/config.toml`, `None` when the home directory is unknown.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".apimtool").join("config.toml"))
    }

    /// Overlay non-empty environment values.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(sub) = get("APIMTOOL_AZURE_SUBSCRIPTION_ID").or_else(|| get("AZURE_SUBSCRIPTION_ID")) {
            self.subscription_id = Some(sub);
        }
        if let Some(location) = get("APIMTOOL_AZURE_LOCATION") {
            self.location = Some(location);
        }
        if let Some(token) = get("APIMTOOL_AZURE_ACCESS_TOKEN") {
            self.access_token = Some(token);
        }
        if let Some(endpoint) = get("APIMTOOL_MANAGEMENT_ENDPOINT") {
            self.management_endpoint = endpoint;
        }
        self.management_endpoint = self.management_endpoint.trim_end_matches('/').to_string();
    }

    /// The subscription id, required by every control-plane call.
    ///
    /// # Errors
    ///
    /// [`ApimError::ConfigError`] when no subscription is configured.
    pub fn require_subscription(&self) -> crate::core::Result<&str> {
        self.subscription_id.as_deref().filter(|s| !s.trim().is_empty()).ok_or_else(|| {
            ApimError::ConfigError {
                message: "APIMTOOL_AZURE_SUBSCRIPTION_ID is not set".to_string(),
            }
        })
    }

    /// HTTP request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Azure CLI token timeout.
    #[must_use]
    pub const fn token_timeout(&self) -> Duration {
        Duration::from_secs(self.token_timeout_secs)
    }
}

/// On-disk locations of project documents, rooted at the project directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    /// Layout rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
        }
    }

    /// Project root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `apis/<env>`
    #[must_use]
    pub fn api_config_dir(&self, env: &str) -> PathBuf {
        self.root.join("apis").join(env)
    }

    /// `apis/<env>/<api-id>.json`
    #[must_use]
    pub fn api_config_path(&self, env: &str, api_id: &str) -> PathBuf {
        self.api_config_dir(env).join(format!("{api_id}.json"))
    }

    /// `apim-<env>`
    #[must_use]
    pub fn env_dir(&self, env: &str) -> PathBuf {
        self.root.join(format!("apim-{env}"))
    }

    /// `apim-<env>/templates`
    #[must_use]
    pub fn templates_dir(&self, env: &str) -> PathBuf {
        self.env_dir(env).join("templates")
    }

    /// `apim-<env>/templates/backends.template.json`
    #[must_use]
    pub fn backend_template_path(&self, env: &str) -> PathBuf {
        self.templates_dir(env).join(BACKEND_TEMPLATE_FILE)
    }

    /// `apim-<env>/sources`
    #[must_use]
    pub fn sources_dir(&self, env: &str) -> PathBuf {
        self.env_dir(env).join("sources")
    }

    /// `apim-<env>/sources/<apiname>`
    #[must_use]
    pub fn api_output_dir(&self, env: &str, api_name: &str) -> PathBuf {
        self.sources_dir(env).join(api_name)
    }

    /// Verify the directories the synthesis pipeline reads from and writes to.
    ///
    /// # Errors
    ///
    /// [`ApimError::NotFound`] naming every missing directory.
    pub fn check(&self, env: &str) -> crate::core::Result<()> {
        let missing: Vec<String> =
            [self.api_config_dir(env), self.sources_dir(env), self.templates_dir(env)]
                .iter()
                .filter(|dir| !dir.is_dir())
                .map(|dir| dir.display().to_string())
                .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ApimError::not_found(format!("Project directories {}", missing.join(", "))))
        }
    }
}
