//! Backend reconciliation between the control plane and the local template
//!
//! Backend identity is the endpoint's scheme, host and port. Paths, queries
//! and credentials in a URL are ignored, so `https://host:8080/a?x=1` and
//! `https://host:8080/b` refer to the same backend.
//!
//! [`reconcile`] answers the question "does a backend for this URL already
//! exist?". The answer is only yes when BOTH the live service and the local
//! template declare one; a backend known to only one side is treated as new.
//!
//! Remote lookups filter with `url=<normalized url>` and then keep only the
//! backends whose own URL normalizes to the same value, since the control
//! plane matches by substring. When that finds nothing the full listing is
//! scanned, because the substring match is case-sensitive on the stored URL.

pub mod filter;

use tracing::{debug, warn};
use url::Url;

use crate::core::{ApimError, Result};
use crate::models::{Backend, ServiceScope};
use crate::remote::RemoteDirectory;
use crate::template::BackendTemplate;

pub use filter::{BackendFilter, FilterField};

/// Outcome of [`reconcile`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchVerdict {
    /// Both the service and the template declare a backend for the URL
    pub exists: bool,
    /// The chosen backend id; empty when `exists` is false
    pub id: String,
    /// Other remote ids bound to the same endpoint
    pub alternatives: Vec<String>,
}

impl MatchVerdict {
    fn new_backend() -> Self {
        Self::default()
    }
}

/// Reduce `url` to `scheme://host[:port]`.
///
/// The port is kept only when it is explicit and not the scheme default.
///
/// # Errors
///
/// [`ApimError::InvalidUrl`] when the URL does not parse or has no host.
pub fn normalize_url(url: &str) -> Result<String> {
    let parsed = Url::parse(url.trim()).map_err(|e| ApimError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    let host = parsed.host_str().filter(|h| !h.is_empty()).ok_or_else(|| ApimError::InvalidUrl {
        url: url.to_string(),
        reason: "missing host".to_string(),
    })?;

    // `Url::port` is already `None` for the scheme's default port.
    Ok(match parsed.port() {
        Some(port) => format!("{}://{}:{}", parsed.scheme(), host, port),
        None => format!("{}://{}", parsed.scheme(), host),
    })
}

/// Ids of every template resource bound to the endpoint of `url`, in
/// document order.
///
/// Resources whose own URL does not parse are skipped with a warning. An
/// unparseable `url` matches nothing.
#[must_use]
pub fn find_local_backend_ids(doc: &BackendTemplate, url: &str) -> Vec<String> {
    let target = match normalize_url(url) {
        Ok(target) => target,
        Err(e) => {
            warn!("{}", e);
            return Vec::new();
        }
    };

    doc.resources
        .iter()
        .filter(|resource| match normalize_url(&resource.properties.url) {
            Ok(candidate) => candidate == target,
            Err(e) => {
                warn!("Skipping template resource '{}': {}", resource.name, e);
                false
            }
        })
        .filter_map(|resource| resource.backend_id())
        .collect()
}

/// First template resource bound to the endpoint of `url`.
#[must_use]
pub fn find_local_backend_id(doc: &BackendTemplate, url: &str) -> Option<String> {
    find_local_backend_ids(doc, url).into_iter().next()
}

/// Ids of every live backend bound to the endpoint of `url`, in listing order.
///
/// # Errors
///
/// [`ApimError::InvalidUrl`] for an unparseable `url`, or the directory's
/// error (typically [`ApimError::RemoteUnavailable`]).
pub async fn find_remote_backend_ids(
    directory: &dyn RemoteDirectory,
    scope: &ServiceScope,
    url: &str,
) -> Result<Vec<String>> {
    let target = normalize_url(url)?;
    let filter = BackendFilter::url(target.clone());
    debug!("Looking up backends in {} with filter {}", scope, filter);

    let ids = bound_to(directory.list_backends(scope, &filter).await?, &target);
    if !ids.is_empty() {
        return Ok(ids);
    }

    // The service filter is a case-sensitive substring match on the stored
    // URL, so `https://Api.Example.com` escapes `url=https://api.example.com`.
    debug!("No backend in {} matched filter {}; scanning every backend", scope, filter);
    Ok(bound_to(directory.list_backends(scope, &BackendFilter::all()).await?, &target))
}

fn bound_to(backends: Vec<Backend>, target: &str) -> Vec<String> {
    backends
        .into_iter()
        .filter(|b| normalize_url(&b.url).is_ok_and(|candidate| candidate == target))
        .map(|b| b.name)
        .collect()
}

/// Live backend id for `url`.
///
/// A single match yields its id; several matches yield the comma-joined list
/// (`a,b`); no match yields `None`.
///
/// # Errors
///
/// See [`find_remote_backend_ids`].
pub async fn find_remote_backend_id(
    directory: &dyn RemoteDirectory,
    scope: &ServiceScope,
    url: &str,
) -> Result<Option<String>> {
    let ids = find_remote_backend_ids(directory, scope, url).await?;
    Ok(if ids.is_empty() { None } else { Some(ids.join(",")) })
}

/// URL of the live backend named `id`.
///
/// The name filter is a substring match: several matches yield `[u1,u2]`.
/// An empty id yields `None` without calling the directory.
///
/// # Errors
///
/// The directory's error.
pub async fn backend_url_from_id(
    directory: &dyn RemoteDirectory,
    scope: &ServiceScope,
    id: &str,
) -> Result<Option<String>> {
    if id.is_empty() {
        return Ok(None);
    }

    let backends = directory.list_backends(scope, &BackendFilter::name(id)).await?;
    Ok(match backends.as_slice() {
        [] => None,
        [single] => Some(single.url.clone()),
        many => Some(format!(
            "[{}]",
            many.iter().map(|b| b.url.as_str()).collect::<Vec<_>>().join(",")
        )),
    })
}

/// Decide whether a backend for `url` already exists.
///
/// # Errors
///
/// [`ApimError::InvalidUrl`] for an unparseable `url`; remote failures are
/// propagated unchanged.
pub async fn reconcile(
    directory: &dyn RemoteDirectory,
    doc: &BackendTemplate,
    scope: &ServiceScope,
    url: &str,
) -> Result<MatchVerdict> {
    normalize_url(url)?;

    let local = find_local_backend_ids(doc, url);
    let mut remote = find_remote_backend_ids(directory, scope, url).await?;
    debug!("Reconciling {}: local {:?}, remote {:?}", url, local, remote);

    if local.is_empty() || remote.is_empty() {
        return Ok(MatchVerdict::new_backend());
    }

    let id = remote.remove(0);
    if !remote.is_empty() {
        warn!(
            "Endpoint {} is bound to several backends in {}; using '{}' (also: {})",
            url,
            scope,
            id,
            remote.join(", ")
        );
    }
    if !local.contains(&id) {
        warn!("Backend '{}' is live but the template declares {} for {}", id, local.join(", "), url);
    }

    Ok(MatchVerdict {
        exists: true,
        id,
        alternatives: remote,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Protocol;
    use crate::template::BackendResource;
    use crate::test_utils::InMemoryDirectory;

    fn scope() -> ServiceScope {
        ServiceScope::new("rg", "svc")
    }

    fn backend(name: &str, url: &str) -> Backend {
        Backend {
            name: name.to_string(),
            url: url.to_string(),
            protocol: Protocol::Http,
        }
    }

    fn doc(resources: &[(&str, &str)]) -> BackendTemplate {
        let mut doc = BackendTemplate::empty();
        for (id, url) in resources {
            doc.resources.push(BackendResource::new(id, url, Protocol::Http));
        }
        doc
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("https://10.0.0.1/a/b?x=1").unwrap(), "https://10.0.0.1");
        assert_eq!(normalize_url("https://host:443/").unwrap(), "https://host");
        assert_eq!(normalize_url("http://host:80").unwrap(), "http://host");
        assert_eq!(normalize_url("https://host:8080/a").unwrap(), "https://host:8080");
        assert_eq!(normalize_url("HTTPS://User:pw@Host.Example/x").unwrap(), "https://host.example");
        assert!(matches!(normalize_url("not a url"), Err(ApimError::InvalidUrl { .. })));
        assert!(normalize_url("").is_err());
    }

    #[test]
    fn test_find_local_ignores_path() {
        let doc = doc(&[("svc-a", "https://10.0.0.1")]);
        assert_eq!(
            find_local_backend_id(&doc, "https://10.0.0.1/ignored/path").as_deref(),
            Some("svc-a")
        );
    }

    #[test]
    fn test_find_local_empty_document() {
        assert_eq!(find_local_backend_id(&BackendTemplate::empty(), "https://10.0.0.1"), None);
    }

    #[test]
    fn test_find_local_all_matches_in_order_and_skips_bad_urls() {
        let doc = doc(&[
            ("a", "https://h:8080/one"),
            ("broken", "::::"),
            ("b", "https://h:8080/two"),
            ("c", "https://h:9090"),
        ]);
        assert_eq!(find_local_backend_ids(&doc, "https://h:8080"), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_find_remote_single_and_multiple() {
        let directory = InMemoryDirectory::new().with_backends(
            &scope(),
            vec![
                backend("a", "https://10.0.0.1/x"),
                backend("b", "https://10.0.0.1/y"),
                backend("c", "https://10.0.0.10"),
            ],
        );

        let ids = find_remote_backend_ids(&directory, &scope(), "https://10.0.0.1").await.unwrap();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(
            find_remote_backend_id(&directory, &scope(), "https://10.0.0.1").await.unwrap().as_deref(),
            Some("a,b")
        );
        assert_eq!(
            find_remote_backend_id(&directory, &scope(), "https://10.0.0.10").await.unwrap().as_deref(),
            Some("c")
        );
        assert_eq!(find_remote_backend_id(&directory, &scope(), "https://9.9.9.9").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_backend_url_from_id() {
        let directory = InMemoryDirectory::new().with_backends(
            &scope(),
            vec![backend("orders", "https://o"), backend("orders-v2", "https://o2"), backend("pay", "https://p")],
        );
        assert_eq!(
            backend_url_from_id(&directory, &scope(), "pay").await.unwrap().as_deref(),
            Some("https://p")
        );
        assert_eq!(
            backend_url_from_id(&directory, &scope(), "orders").await.unwrap().as_deref(),
            Some("[https://o,https://o2]")
        );
        assert_eq!(backend_url_from_id(&directory, &scope(), "").await.unwrap(), None);
        assert_eq!(backend_url_from_id(&directory, &scope(), "none").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_reconcile_requires_both_sides() {
        let local_only = doc(&[("svc-a", "https://10.0.0.1")]);
        let empty_remote = InMemoryDirectory::new();
        let verdict = reconcile(&empty_remote, &local_only, &scope(), "https://10.0.0.1").await.unwrap();
        assert_eq!(verdict, MatchVerdict::default());

        let remote_only = InMemoryDirectory::new().with_backends(&scope(), vec![backend("svc-a", "https://10.0.0.1")]);
        let verdict =
            reconcile(&remote_only, &BackendTemplate::empty(), &scope(), "https://10.0.0.1").await.unwrap();
        assert!(!verdict.exists);
        assert!(verdict.id.is_empty());
    }

    #[tokio::test]
    async fn test_reconcile_ignores_path_and_query() {
        let doc = doc(&[("svc-a", "https://host:8080/a?x=1")]);
        let directory = InMemoryDirectory::new().with_backends(&scope(), vec![backend("svc-a", "https://host:8080/b")]);

        for url in ["https://host:8080/a?x=1", "https://host:8080/b"] {
            let verdict = reconcile(&directory, &doc, &scope(), url).await.unwrap();
            assert!(verdict.exists);
            assert_eq!(verdict.id, "svc-a");
        }
    }

    #[tokio::test]
    async fn test_reconcile_matches_mixed_case_hosts() {
        let doc = doc(&[("svc-a", "https://Api.Example.com")]);
        let directory =
            InMemoryDirectory::new().with_backends(&scope(), vec![backend("svc-a", "https://Api.Example.com")]);

        let verdict = reconcile(&directory, &doc, &scope(), "https://Api.Example.com/orders").await.unwrap();
        assert!(verdict.exists);
        assert_eq!(verdict.id, "svc-a");

        let ids = find_remote_backend_ids(&directory, &scope(), "https://api.example.com:443").await.unwrap();
        assert_eq!(ids, vec!["svc-a"]);
    }

    #[tokio::test]
    async fn test_reconcile_picks_first_remote_match() {
        let doc = doc(&[("b", "https://10.0.0.1")]);
        let directory = InMemoryDirectory::new().with_backends(
            &scope(),
            vec![backend("a", "https://10.0.0.1"), backend("b", "https://10.0.0.1/v2")],
        );
        let verdict = reconcile(&directory, &doc, &scope(), "https://10.0.0.1").await.unwrap();
        assert!(verdict.exists);
        assert_eq!(verdict.id, "a");
        assert_eq!(verdict.alternatives, vec!["b"]);
    }

    #[tokio::test]
    async fn test_reconcile_propagates_remote_failure() {
        let doc = doc(&[("svc-a", "https://10.0.0.1")]);
        let directory = InMemoryDirectory::new().failing("list backends");
        let err = reconcile(&directory, &doc, &scope(), "https://10.0.0.1").await.unwrap_err();
        assert!(matches!(err, ApimError::RemoteUnavailable { .. }));
    }
}
