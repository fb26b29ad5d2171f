//! Core types for apimtool
//!
//! Holds the error taxonomy shared by every module: [`ApimError`] for precise
//! handling in code and [`ErrorContext`] for what the CLI shows to users.
//!
//! # Propagation
//!
//! Core functions return [`Result`] (an alias over [`ApimError`]). The CLI
//! works with `anyhow::Result`, adds file/command context with
//! `anyhow::Context`, and converts the final error with
//! [`user_friendly_error`] before exiting with a non-zero status.

pub mod error;

pub use error::{ApimError, ErrorContext, Result, user_friendly_error};
