//! ARM template document holding APIM backend resources.
//!
//! Only the fields this tool reads or writes are typed. Everything else in the
//! file (extra parameters, outputs, variables, resource tags, backend
//! descriptions, ...) is captured in `extra` maps so a load/save cycle keeps it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::name_codec::{decode_backend_id, encode_backend_id};
use crate::models::{Backend, Protocol};

/// `$schema` written when a template is created from scratch.
pub const TEMPLATE_SCHEMA: &str =
    "https://schema.management.azure.com/schemas/2019-04-01/deploymentTemplate.json#";
/// `contentVersion` written when a template is created from scratch.
pub const TEMPLATE_CONTENT_VERSION: &str = "1.0.0.0";
/// ARM resource type of an APIM backend.
pub const BACKEND_RESOURCE_TYPE: &str = "Microsoft.ApiManagement/service/backends";
/// API version pinned for backend resources.
pub const BACKEND_API_VERSION: &str = "2021-01-01-preview";

/// The `backends.template.json` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendTemplate {
    /// Template schema URL
    #[serde(rename = "$schema", default)]
    pub schema: String,

    /// Template content version; required
    #[serde(rename = "contentVersion")]
    pub content_version: String,

    /// Template parameters
    #[serde(default)]
    pub parameters: TemplateParameters,

    /// Backend resources in file order
    #[serde(default)]
    pub resources: Vec<BackendResource>,

    /// Unrecognised top-level fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `parameters` block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateParameters {
    /// The service name parameter referenced by every resource name
    #[serde(rename = "ApimServiceName")]
    pub apim_service_name: ParameterSpec,

    /// Other declared parameters
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for TemplateParameters {
    fn default() -> Self {
        Self {
            apim_service_name: ParameterSpec {
                kind: "string".to_string(),
                extra: Map::new(),
            },
            extra: Map::new(),
        }
    }
}

/// A single template parameter declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    /// Parameter type (`string`)
    #[serde(rename = "type")]
    pub kind: String,

    /// Default values, metadata, ...
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One APIM backend resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendResource {
    /// Backend properties
    pub properties: BackendProperties,

    /// Templated name embedding the backend id
    pub name: String,

    /// ARM resource type
    #[serde(rename = "type")]
    pub resource_type: String,

    /// ARM API version
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Unrecognised resource fields (dependsOn, tags, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `properties` of a backend resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendProperties {
    /// Credentials block; written empty
    #[serde(default)]
    pub credentials: BackendCredentials,

    /// TLS validation block; written disabled
    #[serde(default)]
    pub tls: BackendTls,

    /// Endpoint URL
    pub url: String,

    /// Backend protocol
    pub protocol: Protocol,

    /// Unrecognised properties (description, title, proxy, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `properties.credentials`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendCredentials {
    /// Query parameters added to backend calls
    #[serde(default)]
    pub query: Map<String, Value>,

    /// Headers added to backend calls
    #[serde(default)]
    pub header: Map<String, Value>,

    /// Certificates, authorization, ...
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `properties.tls`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendTls {
    /// Validate the certificate chain
    #[serde(default)]
    pub validate_certificate_chain: bool,

    /// Validate the certificate name
    #[serde(default)]
    pub validate_certificate_name: bool,

    /// Unrecognised TLS settings
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BackendTemplate {
    /// An empty template with the standard header.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            schema: TEMPLATE_SCHEMA.to_string(),
            content_version: TEMPLATE_CONTENT_VERSION.to_string(),
            parameters: TemplateParameters::default(),
            resources: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Build a template declaring every backend in `backends`, in order.
    #[must_use]
    pub fn from_backends(backends: &[Backend]) -> Self {
        let mut template = Self::empty();
        template.resources = backends
            .iter()
            .map(|b| BackendResource::new(&b.name, &b.url, b.protocol))
            .collect();
        template
    }

    /// Decoded ids of all resources, skipping names that do not decode.
    #[must_use]
    pub fn backend_ids(&self) -> Vec<String> {
        self.resources.iter().filter_map(BackendResource::backend_id).collect()
    }
}

impl BackendResource {
    /// Canonical backend resource: empty credentials, TLS validation disabled.
    #[must_use]
    pub fn new(id: &str, url: &str, protocol: Protocol) -> Self {
        Self {
            properties: BackendProperties {
                credentials: BackendCredentials::default(),
                tls: BackendTls::default(),
                url: url.to_string(),
                protocol,
                extra: Map::new(),
            },
            name: encode_backend_id(id),
            resource_type: BACKEND_RESOURCE_TYPE.to_string(),
            api_version: BACKEND_API_VERSION.to_string(),
            extra: Map::new(),
        }
    }

    /// Backend id decoded from the templated name.
    #[must_use]
    pub fn backend_id(&self) -> Option<String> {
        decode_backend_id(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = r#"{
        "$schema": "https://schema.management.azure.com/schemas/2019-04-01/deploymentTemplate.json#",
        "contentVersion": "1.0.0.0",
        "parameters": {
            "ApimServiceName": { "type": "string" },
            "Location": { "type": "string", "defaultValue": "southeastasia" }
        },
        "resources": [
            {
                "properties": {
                    "credentials": { "query": {}, "header": {} },
                    "tls": { "validateCertificateChain": false, "validateCertificateName": false },
                    "url": "https://10.0.0.1",
                    "protocol": "http",
                    "description": "kept"
                },
                "name": "[concat(parameters('ApimServiceName'), '/svc-a')]",
                "type": "Microsoft.ApiManagement/service/backends",
                "apiVersion": "2021-01-01-preview",
                "dependsOn": []
            }
        ],
        "outputs": {}
    }"#;

    #[test]
    fn test_parse_and_decode() {
        let template: BackendTemplate = serde_json::from_str(TEMPLATE).unwrap();
        assert_eq!(template.content_version, "1.0.0.0");
        assert_eq!(template.resources.len(), 1);
        assert_eq!(template.backend_ids(), vec!["svc-a"]);
        assert_eq!(template.resources[0].properties.protocol, Protocol::Http);
    }

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let template: BackendTemplate = serde_json::from_str(TEMPLATE).unwrap();
        let value = serde_json::to_value(&template).unwrap();
        assert_eq!(value["outputs"], serde_json::json!({}));
        assert_eq!(value["parameters"]["Location"]["defaultValue"], "southeastasia");
        assert_eq!(value["resources"][0]["dependsOn"], serde_json::json!([]));
        assert_eq!(value["resources"][0]["properties"]["description"], "kept");
    }

    #[test]
    fn test_missing_content_version_fails() {
        let err = serde_json::from_str::<BackendTemplate>(r#"{ "resources": [] }"#).unwrap_err();
        assert!(err.to_string().contains("contentVersion"));
    }

    #[test]
    fn test_canonical_resource_shape() {
        let value = serde_json::to_value(BackendResource::new("svc-b", "https://10.0.0.2", Protocol::Soap))
            .unwrap();
        assert_eq!(value["name"], "[concat(parameters('ApimServiceName'), '/svc-b')]");
        assert_eq!(value["type"], BACKEND_RESOURCE_TYPE);
        assert_eq!(value["apiVersion"], BACKEND_API_VERSION);
        assert_eq!(value["properties"]["protocol"], "soap");
        assert_eq!(value["properties"]["credentials"], serde_json::json!({ "query": {}, "header": {} }));
        assert_eq!(value["properties"]["tls"]["validateCertificateChain"], false);
        assert_eq!(value["properties"]["tls"]["validateCertificateName"], false);
    }

    #[test]
    fn test_from_backends() {
        let template = BackendTemplate::from_backends(&[
            Backend {
                name: "a".to_string(),
                url: "https://a".to_string(),
                protocol: Protocol::Http,
            },
            Backend {
                name: "b".to_string(),
                url: "https://b".to_string(),
                protocol: Protocol::Soap,
            },
        ]);
        assert_eq!(template.schema, TEMPLATE_SCHEMA);
        assert_eq!(template.parameters.apim_service_name.kind, "string");
        assert_eq!(template.backend_ids(), vec!["a", "b"]);
    }
}
