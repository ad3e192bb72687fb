//! Result types returned by [`WebhookSecurity`](crate::WebhookSecurity).

use serde::Serialize;

use super::VerificationError;

/// Outcome of verifying one inbound webhook.
///
/// Serializes to the JSON shape HTTP handlers usually log or return:
///
/// ```rust
/// use webhook_security::WebhookVerification;
///
/// let verification = WebhookVerification::valid("slack", Some(1_700_000_000));
/// let json = serde_json::to_value(&verification).unwrap();
/// assert_eq!(json["isValid"], true);
/// assert_eq!(json["provider"], "slack");
/// assert_eq!(json["timestamp"], 1_700_000_000);
/// assert!(json.get("error").is_none());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookVerification {
    is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<i64>,
}

impl WebhookVerification {
    /// Creates a successful verification.
    #[must_use]
    pub fn valid(provider: impl Into<String>, timestamp: Option<i64>) -> Self {
        Self {
            is_valid: true,
            error: None,
            provider: provider.into(),
            timestamp,
        }
    }

    /// Creates a failed verification from its reason.
    ///
    /// Timestamps carried by the error (replay and tolerance failures) are
    /// echoed in the result.
    #[must_use]
    pub fn invalid(provider: impl Into<String>, error: &VerificationError) -> Self {
        Self {
            is_valid: false,
            error: Some(error.to_string()),
            provider: provider.into(),
            timestamp: error.timestamp(),
        }
    }

    /// Returns whether the webhook is authentic, fresh, and not replayed.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// Returns the failure reason, if verification failed.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Returns the provider name from the request's config.
    #[must_use]
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Returns the event timestamp (epoch seconds) for timestamped providers.
    #[must_use]
    pub const fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }
}

/// Replay-cache occupancy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Number of entries currently held.
    pub size: usize,
    /// Capacity before FIFO eviction kicks in.
    pub max_size: usize,
}
