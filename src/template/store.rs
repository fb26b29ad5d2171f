//! Loading and persisting project documents.
//!
//! [`TemplateStore`] owns one `backends.template.json` path. The template is
//! read once per command, edited in memory by the [`mutator`](super::mutator)
//! functions and written back wholesale with an atomic rename.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::document::BackendTemplate;
use super::mutator;
use crate::core::{ApimError, Result};
use crate::models::{ApiConfig, Protocol};
use crate::reconcile::normalize_url;
use crate::utils::fs::{read_text_file, write_json_file};

/// Reads and writes one backend template file.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    path: PathBuf,
}

impl TemplateStore {
    /// Create a store for the template at `path`. Nothing is read yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
        }
    }

    /// Path of the template file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the template file exists.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load and validate the template.
    ///
    /// Duplicate ids or endpoints already present in the file are reported
    /// as warnings; they are only rejected when a new backend is added.
    ///
    /// # Errors
    ///
    /// - [`ApimError::NotFound`] when the file does not exist
    /// - [`ApimError::MalformedDocument`] on a JSON error, an empty
    ///   `contentVersion`, or a resource name that does not decode to an id
    pub fn load(&self) -> Result<BackendTemplate> {
        let path_str = self.path.display().to_string();
        let content = match read_text_file(&self.path) {
            Ok(content) => content,
            Err(ApimError::IoError(e)) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ApimError::not_found(format!("Template file {path_str}")));
            }
            Err(e) => return Err(e),
        };

        let doc: BackendTemplate =
            serde_json::from_str(&content).map_err(|e| ApimError::malformed(&path_str, e))?;

        if doc.content_version.trim().is_empty() {
            return Err(ApimError::malformed(&path_str, "'contentVersion' is empty"));
        }

        let mut ids = HashSet::new();
        let mut endpoints = HashSet::new();
        for resource in &doc.resources {
            let Some(id) = resource.backend_id() else {
                return Err(ApimError::malformed(
                    &path_str,
                    format!("resource name '{}' does not contain a backend id", resource.name),
                ));
            };
            if !ids.insert(id.clone()) {
                warn!("{} declares backend id '{}' more than once", path_str, id);
            }
            let url = &resource.properties.url;
            let endpoint = (normalize_url(url).unwrap_or_else(|_| url.clone()), resource.properties.protocol);
            if !endpoints.insert(endpoint) {
                warn!(
                    "{} declares endpoint {} ({}) more than once",
                    path_str, resource.properties.url, resource.properties.protocol
                );
            }
        }

        debug!("Loaded {} backend resource(s) from {}", doc.resources.len(), path_str);
        Ok(doc)
    }

    /// Atomically replace the template file with `doc`.
    ///
    /// # Errors
    ///
    /// Serialization or IO failure.
    pub fn save(&self, doc: &BackendTemplate) -> Result<()> {
        write_json_file(&self.path, doc)?;
        info!("Wrote {} backend resource(s) to {}", doc.resources.len(), self.path.display());
        Ok(())
    }

    /// Load, add a backend, save. Nothing is written when the add is rejected.
    ///
    /// # Errors
    ///
    /// Load errors and every error of [`mutator::add_backend`].
    pub fn add_backend(&self, id: &str, url: &str, protocol: Protocol) -> Result<BackendTemplate> {
        let doc = self.load()?;
        let updated = mutator::add_backend(&doc, id, url, protocol)?;
        self.save(&updated)?;
        Ok(updated)
    }

    /// Load, remove every resource for `id`, save.
    ///
    /// Returns the number of removed resources. The file is left untouched
    /// when nothing matched.
    ///
    /// # Errors
    ///
    /// Load or save errors.
    pub fn remove_backend(&self, id: &str) -> Result<usize> {
        let doc = self.load()?;
        let updated = mutator::remove_backend_by_id(&doc, id);
        let removed = doc.resources.len() - updated.resources.len();
        if removed > 0 {
            self.save(&updated)?;
        } else {
            debug!("Backend '{}' not declared in {}", id, self.path.display());
        }
        Ok(removed)
    }
}

/// Read and validate a per-API config document.
///
/// # Errors
///
/// [`ApimError::NotFound`] when the file is missing,
/// [`ApimError::MalformedDocument`] when it fails to parse or lacks a
/// required field.
pub fn load_api_config(path: &Path) -> Result<ApiConfig> {
    let path_str = path.display().to_string();
    let content = match read_text_file(path) {
        Ok(content) => content,
        Err(ApimError::IoError(e)) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ApimError::not_found(format!("API config {path_str}")));
        }
        Err(e) => return Err(e),
    };

    let config: ApiConfig =
        serde_json::from_str(&content).map_err(|e| ApimError::malformed(&path_str, e))?;
    config.validate(&path_str)?;
    debug!("Loaded API config '{}' with {} operation(s)", config.api_name, config.operations.len());
    Ok(config)
}
