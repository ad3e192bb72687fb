//! Per-request webhook verification settings.

use serde::Deserialize;

use super::newtypes::{HashAlgorithm, WebhookSecret};
use crate::error::ConfigError;

/// Settings describing how a single inbound webhook is verified.
///
/// A `WebhookConfig` names the provider (which selects the signature scheme),
/// carries the shared secret, and optionally overrides the hash algorithm
/// used by the generic scheme and the timestamp tolerance used by the
/// timestamped schemes (Stripe and Slack).
///
/// # Deserialization
///
/// Configs can be loaded from JSON, which is handy when secrets are kept in
/// a per-integration settings store:
///
/// ```rust
/// use webhook_security::WebhookConfig;
///
/// let config: WebhookConfig = serde_json::from_str(
///     r#"{"provider": "stripe", "secret": "whsec_123", "timestampTolerance": 120}"#,
/// ).unwrap();
/// assert_eq!(config.provider(), "stripe");
/// assert_eq!(config.timestamp_tolerance(), Some(120));
/// ```
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookConfig {
    provider: String,
    secret: WebhookSecret,
    #[serde(default)]
    algorithm: HashAlgorithm,
    #[serde(default)]
    timestamp_tolerance: Option<u64>,
}

impl WebhookConfig {
    /// Creates a new builder for constructing a `WebhookConfig`.
    #[must_use]
    pub fn builder() -> WebhookConfigBuilder {
        WebhookConfigBuilder::new()
    }

    /// Returns the provider name as supplied.
    #[must_use]
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Returns the signing secret.
    #[must_use]
    pub const fn secret(&self) -> &WebhookSecret {
        &self.secret
    }

    /// Returns the hash algorithm for the generic scheme.
    #[must_use]
    pub const fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Returns the timestamp tolerance override in seconds, if set.
    #[must_use]
    pub const fn timestamp_tolerance(&self) -> Option<u64> {
        self.timestamp_tolerance
    }
}

/// Builder for constructing [`WebhookConfig`] instances.
///
/// `provider` and `secret` are required.
///
/// # Example
///
/// ```rust
/// use webhook_security::{HashAlgorithm, WebhookConfig, WebhookSecret};
///
/// let config = WebhookConfig::builder()
///     .provider("acme")
///     .secret(WebhookSecret::new("s3cr3t").unwrap())
///     .algorithm(HashAlgorithm::Sha512)
///     .build()
///     .unwrap();
///
/// assert_eq!(config.algorithm(), HashAlgorithm::Sha512);
/// assert_eq!(config.timestamp_tolerance(), None);
/// ```
#[derive(Debug, Default)]
pub struct WebhookConfigBuilder {
    provider: Option<String>,
    secret: Option<WebhookSecret>,
    algorithm: Option<HashAlgorithm>,
    timestamp_tolerance: Option<u64>,
}

impl WebhookConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the provider name (required).
    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the signing secret (required).
    #[must_use]
    pub fn secret(mut self, secret: WebhookSecret) -> Self {
        self.secret = Some(secret);
        self
    }

    /// Sets the hash algorithm used by the generic scheme.
    #[must_use]
    pub const fn algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = Some(algorithm);
        self
    }

    /// Sets the allowed clock skew, in seconds, for timestamped schemes.
    #[must_use]
    pub const fn timestamp_tolerance(mut self, seconds: u64) -> Self {
        self.timestamp_tolerance = Some(seconds);
        self
    }

    /// Builds the [`WebhookConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] if `provider` or `secret`
    /// is not set.
    pub fn build(self) -> Result<WebhookConfig, ConfigError> {
        let provider = self
            .provider
            .filter(|p| !p.trim().is_empty())
            .ok_or(ConfigError::MissingRequiredField { field: "provider" })?;
        let secret = self
            .secret
            .ok_or(ConfigError::MissingRequiredField { field: "secret" })?;

        Ok(WebhookConfig {
            provider,
            secret,
            algorithm: self.algorithm.unwrap_or_default(),
            timestamp_tolerance: self.timestamp_tolerance,
        })
    }
}
