//! Verification failure reasons.
//!
//! [`VerificationError`] is never returned from
//! [`WebhookSecurity::verify`](crate::WebhookSecurity::verify); it is folded
//! into the `error` field of a [`WebhookVerification`](super::WebhookVerification).
//! Display strings are stable because callers match on them.

use thiserror::Error;

/// Reason a webhook failed verification.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerificationError {
    /// The computed digest does not match the supplied signature.
    #[error("Signature mismatch")]
    SignatureMismatch,

    /// The provider's signature envelope could not be parsed.
    #[error("Invalid signature format")]
    InvalidSignatureFormat,

    /// A separately supplied timestamp is not an integer.
    #[error("Invalid timestamp format")]
    InvalidTimestamp,

    /// The event timestamp is further from the current time than allowed.
    #[error("Timestamp outside tolerance")]
    TimestampOutsideTolerance {
        /// The timestamp carried by the request.
        timestamp: i64,
    },

    /// Signature and timestamp are valid but this provider/timestamp pair
    /// was already consumed.
    #[error("Possible replay attack detected")]
    ReplayDetected {
        /// The timestamp carried by the request.
        timestamp: i64,
    },

    /// The scheme needs a timestamp header and none was supplied.
    #[error("Timestamp required for {provider} verification")]
    MissingTimestamp {
        /// Display name of the provider.
        provider: &'static str,
    },

    /// Any other failure.
    #[error("{message}")]
    Internal {
        /// Description of the failure.
        message: String,
    },
}

impl VerificationError {
    /// Returns the request timestamp carried by this error, if any.
    #[must_use]
    pub const fn timestamp(&self) -> Option<i64> {
        match self {
            Self::TimestampOutsideTolerance { timestamp } | Self::ReplayDetected { timestamp } => {
                Some(*timestamp)
            }
            _ => None,
        }
    }
}
