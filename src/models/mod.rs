//! Shared data models for apimtool operations
//!
//! This module provides the structures passed between the remote directory,
//! the reconciler, the template layer and the CLI commands:
//!
//! - [`Backend`], [`Api`], [`Operation`] as listed by the control plane
//! - [`Protocol`] for backend protocols
//! - [`ServiceScope`] identifying one APIM service
//! - [`ServiceArgs`] shared by every command that talks to a service
//! - [`api_config`], [`policy`] and [`deploy_config`] documents

pub mod api_config;
pub mod deploy_config;
pub mod policy;

use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use api_config::{ApiConfig, ApiOperation, ApiPolicies, HeaderSetting};
pub use deploy_config::{DeployApiConfig, DeploymentConfig, TagStyle, Tags};
pub use policy::InboundPolicy;

/// Backend protocol as understood by APIM.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Plain HTTP/REST backend
    #[default]
    Http,
    /// SOAP backend
    Soap,
}

impl Protocol {
    /// Wire value used by ARM and the template file.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Soap => "soap",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "soap" => Ok(Self::Soap),
            other => Err(format!("unknown backend protocol '{other}' (expected http or soap)")),
        }
    }
}

/// A backend entity as reported by the control plane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Backend {
    /// Backend id, unique within a service
    pub name: String,
    /// Absolute endpoint URL
    pub url: String,
    /// Backend protocol
    pub protocol: Protocol,
}

/// An API registered in the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Api {
    /// API id (resource name)
    pub name: String,
    /// Display name shown in the portal
    pub display_name: String,
    /// Accepted protocols (`https`, `http`, ...)
    pub protocols: Vec<String>,
    /// URL suffix
    pub path: String,
    /// Web service URL configured on the API itself
    pub service_url: String,
}

/// An operation of an API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// Operation id
    pub name: String,
    /// HTTP method
    pub method: String,
    /// URL template relative to the API path
    pub url_template: String,
}

/// Identifies one APIM service inside the configured subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceScope {
    /// Azure resource group
    pub resource_group: String,
    /// APIM service name
    pub service_name: String,
}

impl ServiceScope {
    /// Create a scope for `resource_group`/`service_name`.
    pub fn new(resource_group: impl Into<String>, service_name: impl Into<String>) -> Self {
        Self {
            resource_group: resource_group.into(),
            service_name: service_name.into(),
        }
    }
}

impl fmt::Display for ServiceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.resource_group, self.service_name)
    }
}

/// Resource group and service name arguments shared by service commands.
#[derive(Debug, Clone, Args)]
pub struct ServiceArgs {
    /// Resource group containing the API Management service
    #[arg(short = 'g', long = "resource-group")]
    pub resource_group: String,

    /// Name of the API Management service
    #[arg(short = 'n', long = "service-name")]
    pub service_name: String,
}

impl ServiceArgs {
    /// Convert the arguments into a [`ServiceScope`].
    #[must_use]
    pub fn scope(&self) -> ServiceScope {
        ServiceScope::new(&self.resource_group, &self.service_name)
    }
}
