//! In-memory edits of a [`BackendTemplate`].
//!
//! Both operations take the document by reference and return a new one, so a
//! rejected edit can never leave a half-modified document behind.

use tracing::debug;

use super::document::{BackendResource, BackendTemplate};
use super::name_codec::validate_backend_id;
use crate::core::{ApimError, Result};
use crate::models::Protocol;
use crate::reconcile::normalize_url;

/// Append a canonical backend resource for `id`.
///
/// # Errors
///
/// - [`ApimError::InvalidBackendId`] when `id` cannot be encoded
/// - [`ApimError::InvalidUrl`] when `url` is not an absolute URL
/// - [`ApimError::DuplicateEndpoint`] when a resource with the same protocol
///   is already bound to the endpoint (scheme, host and port) of `url`
/// - [`ApimError::DuplicateId`] when a resource already decodes to `id`
pub fn add_backend(
    doc: &BackendTemplate,
    id: &str,
    url: &str,
    protocol: Protocol,
) -> Result<BackendTemplate> {
    validate_backend_id(id)?;
    let target = normalize_url(url)?;

    // Resources with an unparseable URL cannot collide with a valid endpoint.
    if let Some(existing) = doc.resources.iter().find(|r| {
        r.properties.protocol == protocol
            && normalize_url(&r.properties.url).is_ok_and(|candidate| candidate == target)
    }) {
        return Err(ApimError::DuplicateEndpoint {
            url: url.to_string(),
            protocol,
            existing_id: existing.backend_id().unwrap_or_default(),
        });
    }

    if doc.resources.iter().any(|r| r.backend_id().as_deref() == Some(id)) {
        return Err(ApimError::DuplicateId {
            id: id.to_string(),
        });
    }

    let mut updated = doc.clone();
    updated.resources.push(BackendResource::new(id, url, protocol));
    debug!("Added backend '{}' ({} {})", id, protocol, url);
    Ok(updated)
}

/// Drop every resource whose decoded id equals `id`.
///
/// Removing an id that is not declared returns an identical document.
#[must_use]
pub fn remove_backend_by_id(doc: &BackendTemplate, id: &str) -> BackendTemplate {
    let mut updated = doc.clone();
    updated.resources.retain(|r| r.backend_id().as_deref() != Some(id));
    let removed = doc.resources.len() - updated.resources.len();
    debug!("Removed {} resource(s) for backend '{}'", removed, id);
    updated
}
