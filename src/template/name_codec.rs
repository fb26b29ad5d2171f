//! Backend id encoding inside ARM resource names.
//!
//! ARM templates do not store the backend id as a plain field. It is
//! interpolated into the resource name expression:
//!
//! ```text
//! [concat(parameters('ApimServiceName'), '/svc-a')]
//! ```
//!
//! Decoding takes the last single-quoted literal and strips every `/`.

use regex::Regex;

use crate::core::{ApimError, Result};

/// Template parameter holding the APIM service name.
pub const SERVICE_NAME_PARAMETER: &str = "ApimServiceName";

/// Recover the backend id from a templated resource name.
///
/// Returns `None` when the name has no quoted segment or the last segment is
/// empty once `/` characters are removed.
pub fn decode_backend_id(templated_name: &str) -> Option<String> {
    let re = Regex::new(r"'(.*?)'").ok()?;
    let last = re.captures_iter(templated_name).filter_map(|c| c.get(1)).last()?;
    let id: String = last.as_str().chars().filter(|c| *c != '/').collect();
    if id.is_empty() { None } else { Some(id) }
}

/// Build the templated resource name for `id`.
#[must_use]
pub fn encode_backend_id(id: &str) -> String {
    format!("[concat(parameters('{SERVICE_NAME_PARAMETER}'), '/{id}')]")
}

/// Reject ids that would not survive an encode/decode round trip.
///
/// # Errors
///
/// [`ApimError::InvalidBackendId`] for empty ids or ids containing `/`, `'`
/// or whitespace.
pub fn validate_backend_id(id: &str) -> Result<()> {
    let reason = if id.is_empty() {
        Some("id is empty")
    } else if id.contains('/') {
        Some("id contains '/'")
    } else if id.contains('\'') || id.contains('"') {
        Some("id contains a quote")
    } else if id.chars().any(char::is_whitespace) {
        Some("id contains whitespace")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(ApimError::InvalidBackendId {
            id: id.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}
