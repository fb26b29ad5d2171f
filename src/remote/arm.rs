//! [`RemoteDirectory`] backed by the Azure Resource Manager REST API.
//!
//! Every request targets
//! `{endpoint}/subscriptions/{sub}/resourceGroups/{rg}/providers/Microsoft.ApiManagement/service/{svc}/...`
//! with the configured `api-version`. List responses are paged with
//! `nextLink`, which already carries every query parameter.

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use super::RemoteDirectory;
use super::credential::resolve_access_token;
use crate::config::AppConfig;
use crate::core::{ApimError, Result};
use crate::models::{Api, Backend, Operation, Protocol, ServiceScope};
use crate::reconcile::{BackendFilter, normalize_url};
use crate::template::BackendResource;
use crate::template::document::BackendProperties;

const MAX_ERROR_BODY: usize = 512;

/// One page of an ARM collection.
#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    value: Vec<T>,
    #[serde(rename = "nextLink", default)]
    next_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Resource<P> {
    name: String,
    properties: P,
}

#[derive(Debug, Deserialize)]
struct BackendContract {
    #[serde(default)]
    url: String,
    #[serde(default)]
    protocol: String,
}

/// PUT body of a backend. Carries the same properties a template resource
/// declares: empty credentials and disabled TLS validation.
#[derive(Debug, Serialize)]
struct BackendBody {
    properties: BackendProperties,
}

impl BackendBody {
    fn new(id: &str, url: &str, protocol: Protocol) -> Self {
        Self {
            properties: BackendResource::new(id, url, protocol).properties,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiContract {
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    protocols: Vec<String>,
    #[serde(default)]
    path: String,
    #[serde(default)]
    service_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationContract {
    #[serde(default)]
    method: String,
    #[serde(default)]
    url_template: String,
}

#[derive(Debug, Deserialize)]
struct PolicyContract {
    #[serde(default)]
    value: String,
}

/// ARM REST client for APIM services of one subscription.
#[derive(Clone)]
pub struct ArmDirectory {
    http: reqwest::Client,
    endpoint: Url,
    subscription_id: String,
    api_version: String,
}

impl ArmDirectory {
    /// Build a client from configuration, acquiring a token when needed.
    ///
    /// # Errors
    ///
    /// [`ApimError::ConfigError`] without a subscription or with a bad
    /// endpoint, [`ApimError::RemoteUnavailable`] when no token is available.
    pub async fn connect(config: &AppConfig) -> Result<Self> {
        config.require_subscription()?;
        let token = resolve_access_token(config).await?;
        Self::with_token(config, &token)
    }

    /// Build a client using `token` as bearer token.
    ///
    /// # Errors
    ///
    /// See [`ArmDirectory::connect`].
    pub fn with_token(config: &AppConfig, token: &str) -> Result<Self> {
        let subscription_id = config.require_subscription()?.to_string();
        let endpoint = Url::parse(&config.management_endpoint).map_err(|e| ApimError::ConfigError {
            message: format!("invalid management endpoint '{}': {e}", config.management_endpoint),
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("apimtool/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let auth = HeaderValue::from_str(&format!("Bearer {}", token.trim())).map_err(|e| {
            ApimError::ConfigError {
                message: format!("invalid access token: {e}"),
            }
        })?;
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ApimError::ConfigError {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        debug!(
            "ARM directory for subscription {} at {} (location: {})",
            subscription_id,
            endpoint,
            config.location.as_deref().unwrap_or("unset")
        );
        Ok(Self {
            http,
            endpoint,
            subscription_id,
            api_version: config.api_version.clone(),
        })
    }

    fn service_url(&self, scope: &ServiceScope, tail: &[&str]) -> Result<Url> {
        let mut url = self.endpoint.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| ApimError::ConfigError {
                message: format!("management endpoint '{}' cannot be a base URL", self.endpoint),
            })?;
            segments.pop_if_empty().extend([
                "subscriptions",
                self.subscription_id.as_str(),
                "resourceGroups",
                scope.resource_group.as_str(),
                "providers",
                "Microsoft.ApiManagement",
                "service",
                scope.service_name.as_str(),
            ]);
            segments.extend(tail);
        }
        url.query_pairs_mut().append_pair("api-version", &self.api_version);
        Ok(url)
    }

    async fn send(&self, operation: &str, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = request.send().await.map_err(|e| ApimError::remote(operation, e))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        Err(ApimError::remote(operation, status_reason(status, response).await))
    }

    async fn fetch_all<T: DeserializeOwned>(&self, operation: &str, first: Url) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut next = Some(first.to_string());
        let mut pages = 0_usize;

        while let Some(url) = next.take() {
            debug!("GET {}", url);
            let response = self.send(operation, self.http.get(&url)).await?;
            let page: Page<T> =
                response.json().await.map_err(|e| ApimError::remote(operation, e))?;
            items.extend(page.value);
            next = page.next_link.filter(|link| !link.is_empty());
            pages += 1;
        }

        debug!("{}: {} item(s) in {} page(s)", operation, items.len(), pages);
        Ok(items)
    }
}

async fn status_reason(status: StatusCode, response: reqwest::Response) -> String {
    let body = response.text().await.unwrap_or_default();
    let body = body.trim();
    if body.is_empty() {
        status.to_string()
    } else {
        let truncated: String = body.chars().take(MAX_ERROR_BODY).collect();
        format!("{status}: {truncated}")
    }
}

/// The service must echo the requested name and endpoint.
fn check_created(id: &str, url: &str, created: &Backend) -> Result<()> {
    if !created.name.eq_ignore_ascii_case(id) {
        return Err(ApimError::remote(
            "create backend",
            format!("service returned backend '{}' instead of '{id}'", created.name),
        ));
    }
    let same_endpoint = match (normalize_url(url), normalize_url(&created.url)) {
        (Ok(wanted), Ok(got)) => wanted == got,
        _ => false,
    };
    if !same_endpoint {
        return Err(ApimError::remote(
            "create backend",
            format!("backend '{}' was created with URL '{}' instead of '{url}'", created.name, created.url),
        ));
    }
    Ok(())
}

fn parse_protocol(name: &str, raw: &str) -> Protocol {
    raw.parse().unwrap_or_else(|e| {
        warn!("Backend '{}': {}; treating as http", name, e);
        Protocol::Http
    })
}

#[async_trait]
impl RemoteDirectory for ArmDirectory {
    async fn list_backends(
        &self,
        scope: &ServiceScope,
        filter: &BackendFilter,
    ) -> Result<Vec<Backend>> {
        let mut url = self.service_url(scope, &["backends"])?;
        if let Some(expr) = filter.to_odata() {
            url.query_pairs_mut().append_pair("$filter", &expr);
        }

        let rows: Vec<Resource<BackendContract>> = self.fetch_all("list backends", url).await?;
        Ok(rows
            .into_iter()
            .map(|r| Backend {
                protocol: parse_protocol(&r.name, &r.properties.protocol),
                url: r.properties.url,
                name: r.name,
            })
            .collect())
    }

    async fn list_apis(&self, scope: &ServiceScope, display_filter: &str) -> Result<Vec<Api>> {
        let mut url = self.service_url(scope, &["apis"])?;
        if !display_filter.is_empty() {
            let expr = format!(
                "contains(properties/displayName, '{}')",
                display_filter.replace('\'', "''")
            );
            url.query_pairs_mut().append_pair("$filter", &expr);
        }

        let rows: Vec<Resource<ApiContract>> = self.fetch_all("list APIs", url).await?;
        Ok(rows
            .into_iter()
            .map(|r| Api {
                name: r.name,
                display_name: r.properties.display_name,
                protocols: r.properties.protocols,
                path: r.properties.path,
                service_url: r.properties.service_url.unwrap_or_default(),
            })
            .collect())
    }

    async fn list_operations(&self, scope: &ServiceScope, api_id: &str) -> Result<Vec<Operation>> {
        let url = self.service_url(scope, &["apis", api_id, "operations"])?;
        let operation = format!("list operations of {api_id}");
        let rows: Vec<Resource<OperationContract>> = self.fetch_all(&operation, url).await?;
        Ok(rows
            .into_iter()
            .map(|r| Operation {
                name: r.name,
                method: r.properties.method,
                url_template: r.properties.url_template,
            })
            .collect())
    }

    async fn get_api_policy(&self, scope: &ServiceScope, api_id: &str) -> Result<Option<String>> {
        let mut url = self.service_url(scope, &["apis", api_id, "policies", "policy"])?;
        url.query_pairs_mut().append_pair("format", "rawxml");
        let operation = format!("get policy of {api_id}");

        debug!("GET {}", url);
        let response =
            self.http.get(url).send().await.map_err(|e| ApimError::remote(&operation, e))?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ApimError::remote(&operation, status_reason(status, response).await));
        }

        let policy: Resource<PolicyContract> =
            response.json().await.map_err(|e| ApimError::remote(&operation, e))?;
        Ok(Some(policy.properties.value).filter(|xml| !xml.trim().is_empty()))
    }

    async fn create_or_update_backend(
        &self,
        scope: &ServiceScope,
        id: &str,
        url: &str,
        protocol: Protocol,
    ) -> Result<Backend> {
        let target = self.service_url(scope, &["backends", id])?;
        let body = BackendBody::new(id, url, protocol);

        debug!("PUT {}", target);
        let response = self.send("create backend", self.http.put(target).json(&body)).await?;
        let created: Resource<BackendContract> =
            response.json().await.map_err(|e| ApimError::remote("create backend", e))?;
        let backend = Backend {
            protocol: parse_protocol(&created.name, &created.properties.protocol),
            url: created.properties.url,
            name: created.name,
        };
        check_created(id, url, &backend)?;
        Ok(backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> ArmDirectory {
        let config = AppConfig {
            subscription_id: Some("sub-1".to_string()),
            ..AppConfig::default()
        };
        ArmDirectory::with_token(&config, "token").unwrap()
    }

    #[test]
    fn test_service_url_layout() {
        let url = directory()
            .service_url(&ServiceScope::new("rg-dev", "apim-dev"), &["apis", "orders", "operations"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://management.azure.com/subscriptions/sub-1/resourceGroups/rg-dev/providers/\
             Microsoft.ApiManagement/service/apim-dev/apis/orders/operations?api-version=2021-08-01"
        );
    }

    #[test]
    fn test_with_token_requires_subscription() {
        let err = ArmDirectory::with_token(&AppConfig::default(), "token").err();
        assert!(matches!(err, Some(ApimError::ConfigError { .. })));
    }

    #[test]
    fn test_backend_body_matches_template_properties() {
        let body = serde_json::to_value(BackendBody::new("svc-a", "https://10.0.0.1", Protocol::Soap)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "properties": {
                    "credentials": { "query": {}, "header": {} },
                    "tls": { "validateCertificateChain": false, "validateCertificateName": false },
                    "url": "https://10.0.0.1",
                    "protocol": "soap"
                }
            })
        );
    }

    #[test]
    fn test_check_created_rejects_mismatches() {
        let created = Backend {
            name: "svc-a".to_string(),
            url: "https://10.0.0.1/".to_string(),
            protocol: Protocol::Http,
        };
        assert!(check_created("svc-a", "https://10.0.0.1", &created).is_ok());
        assert!(check_created("SVC-A", "https://10.0.0.1:443/x", &created).is_ok());

        let err = check_created("svc-b", "https://10.0.0.1", &created).unwrap_err();
        assert!(err.to_string().contains("instead of 'svc-b'"));
        assert!(matches!(
            check_created("svc-a", "https://10.0.0.2", &created),
            Err(ApimError::RemoteUnavailable { .. })
        ));
    }

    #[test]
    fn test_page_parsing() {
        let page: Page<Resource<BackendContract>> = serde_json::from_str(
            r#"{ "value": [{ "id": "/x", "name": "svc-a",
                 "properties": { "url": "https://10.0.0.1", "protocol": "soap", "title": null } }],
                 "nextLink": "https://next" }"#,
        )
        .unwrap();
        assert_eq!(page.value[0].name, "svc-a");
        assert_eq!(parse_protocol("svc-a", &page.value[0].properties.protocol), Protocol::Soap);
        assert_eq!(page.next_link.as_deref(), Some("https://next"));

        let last: Page<Resource<ApiContract>> = serde_json::from_str(r#"{ "value": [] }"#).unwrap();
        assert!(last.next_link.is_none());
    }
}
