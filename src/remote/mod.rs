//! Access to the live APIM control plane
//!
//! [`RemoteDirectory`] is the seam between the reconciliation logic and the
//! network. The production implementation is [`ArmDirectory`], which talks to
//! the Azure Resource Manager REST API; tests use the in-memory directory from
//! `test_utils`.
//!
//! All listing filters are applied server-side as OData `contains`
//! expressions. Implementations never retry.

pub mod arm;
pub mod credential;

use async_trait::async_trait;

use crate::core::Result;
use crate::models::{Api, Backend, Operation, Protocol, ServiceScope};
use crate::reconcile::BackendFilter;

pub use arm::ArmDirectory;
pub use credential::resolve_access_token;

/// Read/write view of the backends and APIs of APIM services.
#[async_trait]
pub trait RemoteDirectory: Send + Sync {
    /// List backends matching `filter`, following pagination.
    ///
    /// An empty filter lists every backend.
    async fn list_backends(&self, scope: &ServiceScope, filter: &BackendFilter)
    -> Result<Vec<Backend>>;

    /// List APIs whose display name contains `display_filter` (all when empty).
    async fn list_apis(&self, scope: &ServiceScope, display_filter: &str) -> Result<Vec<Api>>;

    /// List the operations of one API.
    async fn list_operations(&self, scope: &ServiceScope, api_id: &str) -> Result<Vec<Operation>>;

    /// Fetch the raw policy XML of one API, `None` when it has no policy.
    async fn get_api_policy(&self, scope: &ServiceScope, api_id: &str) -> Result<Option<String>>;

    /// Create the backend `id`, or update it when it exists.
    async fn create_or_update_backend(
        &self,
        scope: &ServiceScope,
        id: &str,
        url: &str,
        protocol: Protocol,
    ) -> Result<Backend>;
}
