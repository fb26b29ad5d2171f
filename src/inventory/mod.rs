//! API inventory: APIs enriched with the backend their policy routes to
//!
//! For every API of a service the inventory fetches, concurrently:
//!
//! 1. the API policy, to read the `set-backend-service` backend id
//! 2. the URL of that backend
//! 3. the API's operations
//!
//! Results are collected with [`futures::future::join_all`], so the output
//! keeps the listing order. Enrichment is best effort: a failed policy,
//! backend or operation lookup is logged and leaves the field empty. Only a
//! failure to list the APIs themselves is an error.

use futures::future::join_all;
use tracing::{debug, warn};

use crate::core::Result;
use crate::models::policy::extract_backend_id;
use crate::models::{Api, Operation, ServiceScope};
use crate::reconcile::backend_url_from_id;
use crate::remote::RemoteDirectory;

/// One API with its routing and operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiDetail {
    /// The API as listed
    pub api: Api,
    /// Backend id from the API policy; empty without `set-backend-service`
    pub backend_policy_id: String,
    /// URL of that backend; `[u1,u2]` when the id is ambiguous
    pub backend_policy_url: String,
    /// Operations in listing order
    pub operations: Vec<Operation>,
}

/// List APIs whose display name contains `display_filter` and enrich each.
///
/// # Errors
///
/// The directory's error when the API listing fails.
pub async fn collect_api_details(
    directory: &dyn RemoteDirectory,
    scope: &ServiceScope,
    display_filter: &str,
) -> Result<Vec<ApiDetail>> {
    let apis = directory.list_apis(scope, display_filter).await?;
    debug!("Enriching {} API(s) of {}", apis.len(), scope);

    let details = join_all(apis.into_iter().map(|api| enrich(directory, scope, api))).await;
    Ok(details)
}

async fn enrich(directory: &dyn RemoteDirectory, scope: &ServiceScope, api: Api) -> ApiDetail {
    let routing = async {
        let policy = match directory.get_api_policy(scope, &api.name).await {
            Ok(policy) => policy,
            Err(e) => {
                warn!("API '{}': {}", api.name, e);
                None
            }
        };
        let id = policy.as_deref().and_then(extract_backend_id).unwrap_or_default();

        let url = match backend_url_from_id(directory, scope, &id).await {
            Ok(url) => url.unwrap_or_default(),
            Err(e) => {
                warn!("API '{}': {}", api.name, e);
                String::new()
            }
        };
        (id, url)
    };

    let operations = async {
        directory.list_operations(scope, &api.name).await.unwrap_or_else(|e| {
            warn!("API '{}': {}", api.name, e);
            Vec::new()
        })
    };

    let ((backend_policy_id, backend_policy_url), operations) = futures::join!(routing, operations);
    ApiDetail {
        api,
        backend_policy_id,
        backend_policy_url,
        operations,
    }
}

/// APIs routed to the given backend.
///
/// With both an id and a URL, both must match; with one of them, that one
/// must match; with neither, nothing matches. Empty strings count as absent.
#[must_use]
pub fn filter_dependents<'a>(
    details: &'a [ApiDetail],
    backend_id: Option<&str>,
    url: Option<&str>,
) -> Vec<&'a ApiDetail> {
    let backend_id = backend_id.filter(|s| !s.is_empty());
    let url = url.filter(|s| !s.is_empty());

    details
        .iter()
        .filter(|d| match (backend_id, url) {
            (Some(id), Some(url)) => d.backend_policy_id == id && d.backend_policy_url == url,
            (Some(id), None) => d.backend_policy_id == id,
            (None, Some(url)) => d.backend_policy_url == url,
            (None, None) => false,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Backend, Protocol};
    use crate::test_utils::InMemoryDirectory;

    fn scope() -> ServiceScope {
        ServiceScope::new("rg", "svc")
    }

    fn api(name: &str) -> Api {
        Api {
            name: name.to_string(),
            display_name: name.to_uppercase(),
            ..Api::default()
        }
    }

    fn policy(id: &str) -> String {
        format!("<policies><inbound><base /><set-backend-service backend-id=\"{id}\" /></inbound></policies>")
    }

    fn directory() -> InMemoryDirectory {
        InMemoryDirectory::new()
            .with_apis(&scope(), vec![api("orders"), api("payments"), api("static")])
            .with_backends(
                &scope(),
                vec![Backend {
                    name: "svc-a".to_string(),
                    url: "https://10.0.0.1".to_string(),
                    protocol: Protocol::Http,
                }],
            )
            .with_policy(&scope(), "orders", &policy("svc-a"))
            .with_policy(&scope(), "payments", &policy("svc-a"))
            .with_operations(
                &scope(),
                "orders",
                vec![Operation {
                    name: "list".to_string(),
                    method: "GET".to_string(),
                    url_template: "/orders".to_string(),
                }],
            )
    }

    #[tokio::test]
    async fn test_collect_keeps_listing_order_and_enriches() {
        let details = collect_api_details(&directory(), &scope(), "").await.unwrap();
        let names: Vec<_> = details.iter().map(|d| d.api.name.as_str()).collect();
        assert_eq!(names, vec!["orders", "payments", "static"]);

        assert_eq!(details[0].backend_policy_id, "svc-a");
        assert_eq!(details[0].backend_policy_url, "https://10.0.0.1");
        assert_eq!(details[0].operations.len(), 1);
        assert!(details[2].backend_policy_id.is_empty());
        assert!(details[2].backend_policy_url.is_empty());
    }

    #[tokio::test]
    async fn test_collect_applies_display_filter() {
        let details = collect_api_details(&directory(), &scope(), "PAY").await.unwrap();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].api.name, "payments");
    }

    #[tokio::test]
    async fn test_enrichment_failures_are_not_fatal() {
        let directory = directory().failing("get policy").failing("list operations");
        let details = collect_api_details(&directory, &scope(), "").await.unwrap();
        assert_eq!(details.len(), 3);
        assert!(details.iter().all(|d| d.backend_policy_id.is_empty() && d.operations.is_empty()));
    }

    #[tokio::test]
    async fn test_listing_failure_is_fatal() {
        let directory = directory().failing("list APIs");
        assert!(collect_api_details(&directory, &scope(), "").await.is_err());
    }

    #[test]
    fn test_filter_dependents() {
        let details = vec![
            ApiDetail {
                api: api("a"),
                backend_policy_id: "svc-a".to_string(),
                backend_policy_url: "https://1".to_string(),
                ..ApiDetail::default()
            },
            ApiDetail {
                api: api("b"),
                backend_policy_id: "svc-b".to_string(),
                backend_policy_url: "https://1".to_string(),
                ..ApiDetail::default()
            },
        ];

        let names = |found: Vec<&ApiDetail>| found.iter().map(|d| d.api.name.clone()).collect::<Vec<_>>();
        assert_eq!(names(filter_dependents(&details, Some("svc-a"), None)), vec!["a"]);
        assert_eq!(names(filter_dependents(&details, None, Some("https://1"))), vec!["a", "b"]);
        assert_eq!(names(filter_dependents(&details, Some("svc-b"), Some("https://1"))), vec!["b"]);
        assert!(filter_dependents(&details, Some("svc-b"), Some("https://2")).is_empty());
        assert!(filter_dependents(&details, None, None).is_empty());
        assert!(filter_dependents(&details, Some(""), Some("")).is_empty());
    }
}
