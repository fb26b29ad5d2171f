//! Per-API configuration document (`apis/<env>/<api-id>.json`).
//!
//! The document is authored by hand (or by another tool) and only read here.
//! Keys follow the established file format (`apiname`, `backend-url`,
//! `set-headers`); camelCase spellings are accepted as aliases.
//!
//! ```json
//! {
//!   "apiname": "digital-trading",
//!   "env": "dev",
//!   "tags": ["trading", "public"],
//!   "policies": {
//!     "backend-url": "https://10.0.0.1/trading",
//!     "set-headers": [{ "name": "X-Env", "value": "dev" }]
//!   },
//!   "operations": [{ "name": "get-quote", "method": "GET", "url": "/quote" }]
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::core::{ApimError, Result};

/// Parsed per-API configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API name; also the suffix and output directory name
    #[serde(rename = "apiname", alias = "apiName", default)]
    pub api_name: String,

    /// Environment the config belongs to
    #[serde(rename = "env", alias = "environment", default)]
    pub environment: String,

    /// Tags in declaration order
    #[serde(default)]
    pub tags: Vec<String>,

    /// Policy settings
    #[serde(default)]
    pub policies: ApiPolicies,

    /// Operations in declaration order
    #[serde(default)]
    pub operations: Vec<ApiOperation>,
}

/// The `policies` block of an API config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiPolicies {
    /// URL of the upstream service the API routes to
    #[serde(rename = "backend-url", alias = "backendURL", alias = "backendUrl", default)]
    pub backend_url: String,

    /// Headers set on every inbound request
    #[serde(rename = "set-headers", alias = "setHeaders", default)]
    pub set_headers: Vec<HeaderSetting>,
}

/// One header override.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderSetting {
    /// Header name
    pub name: String,
    /// Header value
    pub value: String,
}

/// One API operation row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiOperation {
    /// Operation name
    pub name: String,
    /// HTTP method
    pub method: String,
    /// URL template
    pub url: String,
}

impl ApiConfig {
    /// Check the fields the synthesis pipeline cannot do without.
    ///
    /// # Errors
    ///
    /// [`ApimError::MalformedDocument`] when `apiname` or `backend-url` is
    /// empty, or when the document declares no operations.
    pub fn validate(&self, path: &str) -> Result<()> {
        if self.api_name.trim().is_empty() {
            return Err(ApimError::malformed(path, "missing required field 'apiname'"));
        }
        if self.policies.backend_url.trim().is_empty() {
            return Err(ApimError::malformed(path, "missing required field 'policies.backend-url'"));
        }
        if self.operations.is_empty() {
            return Err(ApimError::malformed(path, "no operations declared"));
        }
        Ok(())
    }
}
