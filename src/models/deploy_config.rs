//! Deployment config for the API Management DevOps Resource Kit (`config.yaml`).

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::ApiConfig;

/// Config format version expected by the Resource Kit extractor/creator.
pub const CONFIG_VERSION: &str = "0.0.1";
/// OpenAPI document path, relative to the generated sources directory.
pub const OPEN_API_SPEC_PATH: &str = "./swagger.json";
/// Policy path, relative to the generated sources directory.
pub const POLICY_PATH: &str = "./apiPolicyHeaders.xml";
/// Subscription key header name.
pub const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
/// Subscription key query parameter name.
pub const SUBSCRIPTION_KEY_QUERY: &str = "subscription-key";

/// How tags are emitted in the generated YAML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TagStyle {
    /// YAML sequence of strings
    #[default]
    Sequence,
    /// Single comma-separated string, for consumers that expect a scalar
    Joined,
}

/// Tags in either emitted shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Tags {
    /// Structured sequence
    List(Vec<String>),
    /// Comma-joined scalar
    Joined(String),
}

impl Tags {
    /// Build tags from `tags` in the requested style.
    #[must_use]
    pub fn from_style(tags: &[String], style: TagStyle) -> Self {
        match style {
            TagStyle::Sequence => Self::List(tags.to_vec()),
            TagStyle::Joined => Self::Joined(tags.join(",")),
        }
    }
}

/// Top-level deployment config document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentConfig {
    /// Config format version
    pub version: String,
    /// Target APIM service name
    pub apim_service_name: String,
    /// API entries (this tool emits exactly one)
    pub apis: Vec<DeployApiConfig>,
    /// Where the Resource Kit writes generated templates
    pub output_location: String,
}

/// One API entry of the deployment config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployApiConfig {
    /// API name
    pub name: String,
    /// Path of the OpenAPI document
    pub open_api_spec: String,
    /// Path of the policy document
    pub policy: String,
    /// URL suffix
    pub suffix: String,
    /// Accepted protocols
    pub protocols: String,
    /// API revision
    pub revision: u32,
    /// Authentication settings
    pub authentication_settings: AuthenticationSettings,
    /// Subscription key parameter names
    pub subscription_key_parameter_names: SubscriptionKeyParameterNames,
    /// API tags
    pub tags: Tags,
}

/// `authenticationSettings` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationSettings {
    /// Whether callers must present a subscription key
    pub subscription_key_required: bool,
}

/// `subscriptionKeyParameterNames` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionKeyParameterNames {
    /// Header carrying the key
    pub header: String,
    /// Query parameter carrying the key
    pub query: String,
}

impl DeploymentConfig {
    /// Build the config for one API deployed to `service_name`.
    #[must_use]
    pub fn for_api(api: &ApiConfig, service_name: &str, tag_style: TagStyle) -> Self {
        let entry = DeployApiConfig {
            name: api.api_name.clone(),
            open_api_spec: OPEN_API_SPEC_PATH.to_string(),
            policy: POLICY_PATH.to_string(),
            suffix: api.api_name.clone(),
            protocols: "https".to_string(),
            revision: 1,
            authentication_settings: AuthenticationSettings {
                subscription_key_required: false,
            },
            subscription_key_parameter_names: SubscriptionKeyParameterNames {
                header: SUBSCRIPTION_KEY_HEADER.to_string(),
                query: SUBSCRIPTION_KEY_QUERY.to_string(),
            },
            tags: Tags::from_style(&api.tags, tag_style),
        };

        Self {
            version: CONFIG_VERSION.to_string(),
            apim_service_name: service_name.to_string(),
            apis: vec![entry],
            output_location: format!("../../templates/apis/{}", api.api_name),
        }
    }
}
