//! Local backend template handling
//!
//! The declarative side of reconciliation lives in an ARM template,
//! `apim-<env>/templates/backends.template.json`, with one resource per APIM
//! backend. This module covers that file end to end:
//!
//! - [`name_codec`] - backend id <-> templated resource name
//! - [`document`] - typed template with unknown-field preservation
//! - [`mutator`] - add/remove backends without breaking id or endpoint uniqueness
//! - [`store`] - load, validate and atomically save documents
//!
//! # Example
//!
//! ```rust,no_run
//! use apimtool::models::Protocol;
//! use apimtool::template::TemplateStore;
//!
//! # fn example() -> apimtool::core::Result<()> {
//! let store = TemplateStore::new("apim-dev/templates/backends.template.json");
//! store.add_backend("orders", "https://10.0.0.7", Protocol::Http)?;
//! # Ok(())
//! # }
//! ```

pub mod document;
pub mod mutator;
pub mod name_codec;
pub mod store;

pub use document::{BackendResource, BackendTemplate};
pub use mutator::{add_backend, remove_backend_by_id};
pub use name_codec::{decode_backend_id, encode_backend_id, validate_backend_id};
pub use store::{TemplateStore, load_api_config};
