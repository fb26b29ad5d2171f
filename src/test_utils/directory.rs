//! In-memory [`RemoteDirectory`] for tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::core::{ApimError, Result};
use crate::models::{Api, Backend, Operation, Protocol, ServiceScope};
use crate::reconcile::BackendFilter;
use crate::remote::RemoteDirectory;

#[derive(Debug, Default, Clone)]
struct ServiceState {
    backends: Vec<Backend>,
    apis: Vec<Api>,
    operations: HashMap<String, Vec<Operation>>,
    policies: HashMap<String, String>,
}

/// A fake control plane keyed by `resource_group/service_name`.
///
/// Filters behave like the real service: substring matches on the filtered
/// property. Operations named with [`InMemoryDirectory::failing`] return
/// [`ApimError::RemoteUnavailable`].
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    services: Mutex<HashMap<String, ServiceState>>,
    failing: Vec<String>,
}

impl InMemoryDirectory {
    /// Empty directory: every listing is empty.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn edit(self, scope: &ServiceScope, f: impl FnOnce(&mut ServiceState)) -> Self {
        {
            let mut services = self.services.lock().unwrap_or_else(PoisonError::into_inner);
            f(services.entry(scope.to_string()).or_default());
        }
        self
    }

    /// Seed backends of `scope`.
    #[must_use]
    pub fn with_backends(self, scope: &ServiceScope, backends: Vec<Backend>) -> Self {
        self.edit(scope, |s| s.backends.extend(backends))
    }

    /// Seed APIs of `scope`.
    #[must_use]
    pub fn with_apis(self, scope: &ServiceScope, apis: Vec<Api>) -> Self {
        self.edit(scope, |s| s.apis.extend(apis))
    }

    /// Seed operations of one API.
    #[must_use]
    pub fn with_operations(self, scope: &ServiceScope, api_id: &str, operations: Vec<Operation>) -> Self {
        self.edit(scope, |s| {
            s.operations.insert(api_id.to_string(), operations);
        })
    }

    /// Seed the policy XML of one API.
    #[must_use]
    pub fn with_policy(self, scope: &ServiceScope, api_id: &str, xml: &str) -> Self {
        self.edit(scope, |s| {
            s.policies.insert(api_id.to_string(), xml.to_string());
        })
    }

    /// Make `operation` fail ("list backends", "list APIs", "list operations",
    /// "get policy", "create backend").
    #[must_use]
    pub fn failing(mut self, operation: &str) -> Self {
        self.failing.push(operation.to_string());
        self
    }

    /// Current backends of `scope`.
    #[must_use]
    pub fn backends(&self, scope: &ServiceScope) -> Vec<Backend> {
        self.read(scope, |s| s.backends.clone())
    }

    fn check(&self, operation: &str) -> Result<()> {
        if self.failing.iter().any(|f| f == operation) {
            Err(ApimError::remote(operation, "simulated failure"))
        } else {
            Ok(())
        }
    }

    fn read<T>(&self, scope: &ServiceScope, f: impl FnOnce(&ServiceState) -> T) -> T {
        let services = self.services.lock().unwrap_or_else(PoisonError::into_inner);
        let empty = ServiceState::default();
        f(services.get(&scope.to_string()).unwrap_or(&empty))
    }
}

#[async_trait]
impl RemoteDirectory for InMemoryDirectory {
    async fn list_backends(&self, scope: &ServiceScope, filter: &BackendFilter) -> Result<Vec<Backend>> {
        self.check("list backends")?;
        Ok(self.read(scope, |s| {
            s.backends.iter().filter(|b| filter.matches(&b.name, &b.url)).cloned().collect()
        }))
    }

    async fn list_apis(&self, scope: &ServiceScope, display_filter: &str) -> Result<Vec<Api>> {
        self.check("list APIs")?;
        Ok(self.read(scope, |s| {
            s.apis.iter().filter(|a| a.display_name.contains(display_filter)).cloned().collect()
        }))
    }

    async fn list_operations(&self, scope: &ServiceScope, api_id: &str) -> Result<Vec<Operation>> {
        self.check("list operations")?;
        Ok(self.read(scope, |s| s.operations.get(api_id).cloned().unwrap_or_default()))
    }

    async fn get_api_policy(&self, scope: &ServiceScope, api_id: &str) -> Result<Option<String>> {
        self.check("get policy")?;
        Ok(self.read(scope, |s| s.policies.get(api_id).cloned()))
    }

    async fn create_or_update_backend(
        &self,
        scope: &ServiceScope,
        id: &str,
        url: &str,
        protocol: Protocol,
    ) -> Result<Backend> {
        self.check("create backend")?;
        let backend = Backend {
            name: id.to_string(),
            url: url.to_string(),
            protocol,
        };
        let mut services = self.services.lock().unwrap_or_else(PoisonError::into_inner);
        let state = services.entry(scope.to_string()).or_default();
        match state.backends.iter_mut().find(|b| b.name == id) {
            Some(existing) => *existing = backend.clone(),
            None => state.backends.push(backend.clone()),
        }
        Ok(backend)
    }
}
