//! Error types for the webhook security crate.
//!
//! This module contains error types used for configuration validation and
//! for managing the background replay-cache sweep. Verification failures
//! have their own type, [`VerificationError`](crate::webhooks::VerificationError),
//! because they are reported through a result value rather than returned.
//!
//! # Error Handling
//!
//! All configuration constructors return `Result<T, ConfigError>` to enable
//! fail-fast validation. Error messages are designed to be clear and actionable.
//!
//! # Example
//!
//! ```rust
//! use webhook_security::{ConfigError, WebhookSecret};
//!
//! let result = WebhookSecret::new("");
//! assert!(matches!(result, Err(ConfigError::EmptySecret)));
//! ```

use thiserror::Error;

/// Errors that can occur while building configuration.
///
/// Each variant provides a clear, actionable error message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Webhook secret cannot be empty.
    #[error("Webhook secret cannot be empty. Please provide the signing secret issued by the provider.")]
    EmptySecret,

    /// Hash algorithm name is not supported.
    #[error("Unsupported hash algorithm '{name}'. Expected one of: sha1, sha256, sha384, sha512.")]
    UnsupportedAlgorithm {
        /// The algorithm name that was provided.
        name: String,
    },

    /// A required field is missing.
    #[error("Missing required field: '{field}'. This field must be set before building the configuration.")]
    MissingRequiredField {
        /// The name of the missing field.
        field: &'static str,
    },

    /// Replay cache capacity must be at least one entry.
    #[error("Replay cache size must be greater than zero.")]
    InvalidCacheSize,

    /// A duration setting was zero.
    #[error("Invalid duration for '{field}': must be greater than zero.")]
    InvalidDuration {
        /// The name of the offending setting.
        field: &'static str,
    },
}

/// Errors that can occur when starting the background replay-cache sweep.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SweepError {
    /// `start()` was called outside of a Tokio runtime.
    #[error("Cannot start replay cache sweep: no Tokio runtime is running on this thread.")]
    NoRuntime,
}
