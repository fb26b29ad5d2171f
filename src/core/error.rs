//! Error handling for apimtool
//!
//! This module provides the error types and user-friendly error reporting for
//! apimtool. The error system follows two principles:
//! 1. **Strongly-typed errors** so callers can branch on the failure mode
//!    (a missing backend means "create", a duplicate means "pick another id")
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Architecture
//!
//! - [`ApimError`] - Enumerated error types for every failure in the core
//! - [`ErrorContext`] - Wrapper that adds details and a suggestion for display
//!
//! # Error Categories
//!
//! - **Lookup**: [`ApimError::NotFound`]
//! - **Template invariants**: [`ApimError::DuplicateEndpoint`], [`ApimError::DuplicateId`],
//!   [`ApimError::InvalidBackendId`]
//! - **Remote directory**: [`ApimError::RemoteUnavailable`], [`ApimError::Cancelled`]
//! - **Documents**: [`ApimError::MalformedDocument`], [`ApimError::InvalidUrl`]
//! - **Artifacts and files**: [`ApimError::ArtifactWrite`], [`ApimError::IoError`]
//!
//! Reconciliation and mutation errors are always returned to the caller. The
//! CLI layer converts them with [`user_friendly_error`] and picks the exit code.
//!
//! # Examples
//!
//! ```rust,ignore
//! use apimtool::core::{ApimError, user_friendly_error};
//!
//! let err = ApimError::DuplicateId { id: "svc-a".to_string() };
//! let ctx = user_friendly_error(anyhow::Error::from(err));
//! ctx.display(); // colored error, details and suggestion on stderr
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

use crate::models::Protocol;

/// Result alias used by the core modules.
pub type Result<T, E = ApimError> = std::result::Result<T, E>;

/// The main error type for apimtool operations
///
/// Each variant maps to one failure mode of the reconciliation and synthesis
/// pipeline. `NotFound` is not fatal in itself: it signals the "create" path
/// to callers that know how to handle it.
#[derive(Error, Debug)]
pub enum ApimError {
    /// No matching backend, API or file
    #[error("{what} not found")]
    NotFound {
        /// Human-readable description of what was looked up
        what: String,
    },

    /// A template resource already declares the same URL and protocol
    #[error("Duplicate backend endpoint {url} ({protocol}) at backend id '{existing_id}'")]
    DuplicateEndpoint {
        /// The endpoint URL that is already declared
        url: String,
        /// The protocol of the existing resource
        protocol: Protocol,
        /// Decoded id of the resource that owns the endpoint
        existing_id: String,
    },

    /// A template resource already decodes to the same backend id
    #[error("Duplicate backend id '{id}'")]
    DuplicateId {
        /// The conflicting backend id
        id: String,
    },

    /// The backend id cannot be embedded in a templated resource name
    #[error("Invalid backend id '{id}': {reason}")]
    InvalidBackendId {
        /// The rejected id
        id: String,
        /// Why it was rejected
        reason: String,
    },

    /// A URL could not be parsed or has no host
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// The URL as supplied
        url: String,
        /// Parser message
        reason: String,
    },

    /// A control-plane call failed
    #[error("Remote directory unavailable during {operation}: {reason}")]
    RemoteUnavailable {
        /// The remote operation that failed (e.g. "list backends")
        operation: String,
        /// Status line or transport error
        reason: String,
    },

    /// A template or configuration document failed to parse or lacks a
    /// required field
    #[error("Malformed document {path}: {reason}")]
    MalformedDocument {
        /// Path of the offending document
        path: String,
        /// Parse error or missing field
        reason: String,
    },

    /// One or more synthesized artifacts could not be written
    #[error("Failed to write {count} artifact(s): {joined}", count = failures.len(), joined = failures.join("; "))]
    ArtifactWrite {
        /// One message per failed artifact
        failures: Vec<String>,
    },

    /// Invalid or incomplete tool configuration
    #[error("Configuration error: {message}")]
    ConfigError {
        /// What is missing or wrong
        message: String,
    },

    /// The command was interrupted before completion
    #[error("Operation cancelled")]
    Cancelled,

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML serialization error
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ApimError {
    /// Shorthand for [`ApimError::NotFound`].
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound {
            what: what.into(),
        }
    }

    /// Shorthand for [`ApimError::RemoteUnavailable`].
    pub fn remote(operation: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::RemoteUnavailable {
            operation: operation.into(),
            reason: reason.to_string(),
        }
    }

    /// Shorthand for [`ApimError::MalformedDocument`].
    pub fn malformed(path: impl fmt::Display, reason: impl fmt::Display) -> Self {
        Self::MalformedDocument {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error only signals that nothing matched.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Error context wrapper that provides user-friendly error information
///
/// Combines an [`ApimError`] with optional details and a suggestion. The CLI
/// prints it with [`ErrorContext::display`].
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: ApimError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no details or suggestion.
    #[must_use]
    pub const fn new(error: ApimError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error (printed in green).
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining the error (printed in yellow).
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error context to stderr with terminal colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`] with actionable suggestions
///
/// [`ApimError`] values get tailored suggestions; IO errors get filesystem
/// guidance; anything else is shown with its full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let error = match error.downcast::<ApimError>() {
        Ok(apim_error) => return create_error_context(apim_error),
        Err(other) => other,
    };

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(ApimError::Other(error.to_string()))
                    .with_suggestion("Check file ownership and permissions of the project directory")
                    .with_details("apimtool could not read or write one of its files");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(ApimError::Other(error.to_string()))
                    .with_suggestion("Check that the file or directory exists and the path is correct");
            }
            _ => {}
        }
    }

    // Generic error - include the full error chain for better diagnostics
    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(ApimError::Other(message))
}

fn create_error_context(error: ApimError) -> ErrorContext {
    match &error {
        ApimError::NotFound { .. } => ErrorContext::new(error)
            .with_suggestion("Check the resource group, service name and filter values"),

        ApimError::DuplicateEndpoint { existing_id, .. } => {
            let suggestion = format!(
                "Reuse backend '{existing_id}' or choose a different URL/protocol pair"
            );
            ErrorContext::new(error)
                .with_suggestion(suggestion)
                .with_details("Each URL and protocol pair may only be declared once in backends.template.json")
        }

        ApimError::DuplicateId { .. } => ErrorContext::new(error)
            .with_suggestion("Choose a different --backend-id or delete the existing entry first"),

        ApimError::InvalidBackendId { .. } => ErrorContext::new(error)
            .with_suggestion("Backend ids must be non-empty and must not contain '/' or quotes"),

        ApimError::InvalidUrl { .. } => ErrorContext::new(error)
            .with_suggestion("Pass an absolute URL such as https://10.0.0.1:8080"),

        ApimError::RemoteUnavailable { .. } => ErrorContext::new(error)
            .with_suggestion("Check your Azure login ('az login'), subscription id and network access")
            .with_details("No local file was modified because the control-plane call failed"),

        ApimError::MalformedDocument { .. } => ErrorContext::new(error)
            .with_suggestion("Fix the JSON syntax or add the missing field, then re-run the command")
            .with_details("backends.template.json needs 'contentVersion'; API configs need 'apiname' and at least one operation"),

        ApimError::ArtifactWrite { .. } => ErrorContext::new(error)
            .with_suggestion("Check permissions on the output directory and re-run; artifacts that were written are kept")
            .with_details("Each artifact is written independently"),

        ApimError::ConfigError { .. } => ErrorContext::new(error)
            .with_suggestion("Set APIMTOOL_AZURE_SUBSCRIPTION_ID or add subscription_id to ~/.apimtool/config.toml"),

        ApimError::Cancelled => ErrorContext::new(error)
            .with_details("In-flight lookups were abandoned and no template change was committed"),

        ApimError::IoError(_) => ErrorContext::new(error)
            .with_suggestion("Check that the project directories exist and are writable"),

        ApimError::JsonError(_) | ApimError::YamlError(_) | ApimError::TomlError(_) => {
            ErrorContext::new(error)
                .with_suggestion("Check the syntax of the file being read")
        }

        ApimError::Other(_) => ErrorContext::new(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_endpoint_message() {
        let err = ApimError::DuplicateEndpoint {
            url: "https://10.0.0.1".to_string(),
            protocol: Protocol::Http,
            existing_id: "svc-a".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("https://10.0.0.1"));
        assert!(msg.contains("http"));
        assert!(msg.contains("svc-a"));
    }

    #[test]
    fn test_artifact_write_counts_failures() {
        let err = ApimError::ArtifactWrite {
            failures: vec!["csv: denied".to_string(), "xml: denied".to_string()],
        };
        assert_eq!(err.to_string(), "Failed to write 2 artifact(s): csv: denied; xml: denied");
    }

    #[test]
    fn test_user_friendly_error_keeps_apim_error() {
        let ctx = user_friendly_error(anyhow::Error::from(ApimError::DuplicateId {
            id: "svc-a".to_string(),
        }));
        assert!(matches!(ctx.error, ApimError::DuplicateId { .. }));
        assert!(ctx.suggestion.is_some());
    }

    #[test]
    fn test_user_friendly_error_generic_chain() {
        let err = anyhow::anyhow!("root").context("outer");
        let ctx = user_friendly_error(err);
        let rendered = ctx.to_string();
        assert!(rendered.contains("outer"));
        assert!(rendered.contains("Caused by"));
        assert!(rendered.contains("root"));
    }

    #[test]
    fn test_is_not_found() {
        assert!(ApimError::not_found("backend").is_not_found());
        assert!(!ApimError::Cancelled.is_not_found());
    }
}
