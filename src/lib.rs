//! apimtool - Azure API Management backend reconciliation
//!
//! A command-line tool that keeps two views of APIM *backends* consistent:
//! the live state of a service, read through the ARM control-plane API, and
//! the declarative state held in a local `backends.template.json` plus one
//! JSON config per API. From that reconciliation it generates the artifacts
//! the API Management DevOps Resource Kit deploys.
//!
//! # Project Layout
//!
//! ```text
//! <project>/
//! ├── apis/<env>/<api-id>.json                  per-API config (input)
//! └── apim-<env>/
//!     ├── templates/backends.template.json      backend template (edited)
//!     └── sources/<apiname>/                    generated artifacts
//!         ├── <apiname>.csv
//!         ├── apiPolicyHeaders.xml
//!         └── config.yaml
//! ```
//!
//! # Modules
//!
//! - [`template`] - template document, id codec, duplicate-safe mutation, persistence
//! - [`reconcile`] - URL normalization, backend filters, local/remote lookup
//! - [`remote`] - the `RemoteDirectory` trait and its ARM REST client
//! - [`inventory`] - concurrent per-API enrichment and dependency filtering
//! - [`synth`] - CSV, policy XML and deployment YAML generation
//! - [`models`] - backends, APIs, operations and the per-API documents
//! - [`config`] - `AppConfig` and `ProjectLayout`
//! - [`core`] - the [`core::ApimError`] taxonomy and user-facing error context
//! - [`cli`] - the clap command tree
//! - [`utils`] - atomic file writes and JSON helpers
//!
//! # Command-Line Usage
//!
//! ```bash
//! # Inspect a service
//! apimtool apim backend list -g rg-dev -n apim-dev
//! apimtool apim api list -g rg-dev -n apim-dev --option list
//!
//! # Snapshot live backends, then edit the template
//! apimtool template backend export -g rg-dev -n apim-dev --file-path apim-dev/templates
//! apimtool template backend create --env dev --backend-id orders --url https://10.0.0.1 --protocol http
//!
//! # Generate artifacts for one API
//! apimtool parse -g rg-dev -n apim-dev --env dev --api-id orders
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod inventory;
pub mod models;
pub mod reconcile;
pub mod remote;
pub mod synth;
pub mod template;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
