//! The webhook verification component.
//!
//! [`WebhookSecurity`] ties together the provider [`SchemeRegistry`], the
//! timestamp tolerance window, and the [`ReplayCache`]. It is an explicit,
//! constructed value: the HTTP layer that owns it decides its lifetime and
//! whether the background sweep runs.
//!
//! # Verification order
//!
//! For every call to [`WebhookSecurity::verify`]:
//!
//! 1. The provider name selects a scheme (unknown names use generic HMAC).
//! 2. The scheme extracts the envelope timestamp, if it has one.
//! 3. A timestamp must fall within the tolerance window.
//! 4. The signature is checked in constant time.
//! 5. A timestamp must not have been seen before for this provider.
//!
//! Replay bookkeeping only happens for requests whose signature is valid, so
//! forged requests cannot fill the cache.
//!
//! # Redelivery
//!
//! Replay keys are `"<provider>-<timestamp>"`. A provider retry that re-sends
//! the identical signed request is therefore rejected as a replay. Callers
//! that need redelivery must dedupe on the provider's event id themselves.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use super::replay::ReplayCache;
use super::schemes::{normalize, SchemeRegistry, SignatureScheme, SignedRequest};
use super::types::{CacheStats, WebhookVerification};
use super::VerificationError;
use crate::config::{SecurityConfig, WebhookConfig};
use crate::error::SweepError;

/// Verifies inbound webhooks and guards against replays.
///
/// # Example
///
/// ```rust
/// use webhook_security::signing::compute_signature_hex;
/// use webhook_security::{SecurityConfig, WebhookConfig, WebhookSecret, WebhookSecurity};
///
/// let security = WebhookSecurity::new(SecurityConfig::default());
/// let config = WebhookConfig::builder()
///     .provider("hubspot")
///     .secret(WebhookSecret::new("s3cr3t").unwrap())
///     .build()
///     .unwrap();
///
/// let payload = br#"{"objectId":123}"#;
/// let signature = compute_signature_hex(payload, b"s3cr3t");
///
/// let result = security.verify(payload, &signature, &config, None);
/// assert!(result.is_valid());
/// assert_eq!(result.provider(), "hubspot");
/// ```
#[derive(Debug)]
pub struct WebhookSecurity {
    config: SecurityConfig,
    schemes: SchemeRegistry,
    cache: Arc<ReplayCache>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl WebhookSecurity {
    /// Creates a component with the built-in provider schemes.
    ///
    /// The background sweep is not started; call [`start`](Self::start).
    #[must_use]
    pub fn new(config: SecurityConfig) -> Self {
        Self::with_registry(config, SchemeRegistry::builtin())
    }

    /// Creates a component with a custom scheme registry.
    #[must_use]
    pub fn with_registry(config: SecurityConfig, schemes: SchemeRegistry) -> Self {
        let cache = Arc::new(ReplayCache::new(config.max_entries()));
        Self {
            config,
            schemes,
            cache,
            sweeper: Mutex::new(None),
        }
    }

    /// Registers an additional provider scheme.
    ///
    /// # Example
    ///
    /// ```rust
    /// use webhook_security::signing::Encoding;
    /// use webhook_security::webhooks::{HmacScheme, SignaturePrefix, SignatureScheme};
    /// use webhook_security::{SecurityConfig, WebhookSecurity};
    ///
    /// let security = WebhookSecurity::new(SecurityConfig::default()).with_scheme(
    ///     "intercom",
    ///     HmacScheme::sha256("X-Hub-Signature", Encoding::Hex, SignaturePrefix::Required("sha256=")),
    /// );
    /// assert_eq!(security.scheme("intercom").signature_header(), "X-Hub-Signature");
    /// ```
    #[must_use]
    pub fn with_scheme(mut self, provider: &str, scheme: impl SignatureScheme + 'static) -> Self {
        self.schemes.insert(provider, Arc::new(scheme));
        self
    }

    /// Returns the component's settings.
    #[must_use]
    pub const fn config(&self) -> &SecurityConfig {
        &self.config
    }

    /// Returns the scheme that verifies `provider`.
    #[must_use]
    pub fn scheme(&self, provider: &str) -> &dyn SignatureScheme {
        self.schemes.resolve(provider)
    }

    /// Verifies one inbound webhook.
    ///
    /// # Arguments
    ///
    /// * `payload` - The raw request body
    /// * `signature` - Value of the provider's signature header
    /// * `config` - Provider, secret, and algorithm settings
    /// * `timestamp` - Value of a separate timestamp header (Slack)
    ///
    /// Never fails: every problem is reported through the returned
    /// [`WebhookVerification`], including a panic inside a custom scheme.
    /// Emits one log record per call.
    ///
    /// Slack's timestamp is signed exactly as received, so header values
    /// with surrounding whitespace are not normalized.
    #[must_use]
    pub fn verify(
        &self,
        payload: &[u8],
        signature: &str,
        config: &WebhookConfig,
        timestamp: Option<&str>,
    ) -> WebhookVerification {
        let provider = config.provider();
        let request = SignedRequest {
            payload,
            signature,
            timestamp,
        };

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.check(&request, config)))
            .unwrap_or_else(|cause| {
                Err(VerificationError::Internal {
                    message: panic_message(cause.as_ref()),
                })
            });

        match outcome {
            Ok(timestamp) => {
                tracing::info!(provider, "Webhook signature verified");
                WebhookVerification::valid(provider, timestamp)
            }
            Err(error) => {
                tracing::error!(provider, error = %error, "Webhook verification failed");
                WebhookVerification::invalid(provider, &error)
            }
        }
    }

    fn check(
        &self,
        request: &SignedRequest<'_>,
        config: &WebhookConfig,
    ) -> Result<Option<i64>, VerificationError> {
        let provider = normalize(config.provider());
        let scheme = self.schemes.resolve(&provider);

        let timestamp = scheme.timestamp(request)?;
        if let Some(ts) = timestamp {
            let tolerance = config
                .timestamp_tolerance()
                .unwrap_or_else(|| self.config.default_tolerance());
            if !within_tolerance(ts, now(), tolerance) {
                return Err(VerificationError::TimestampOutsideTolerance { timestamp: ts });
            }
        }

        scheme.verify(request, config)?;

        if let Some(ts) = timestamp {
            if !self.cache.check_and_insert(format!("{provider}-{ts}"), ts) {
                return Err(VerificationError::ReplayDetected { timestamp: ts });
            }
        }

        Ok(timestamp)
    }

    /// Returns whether `ip` appears verbatim in `whitelist`.
    ///
    /// No CIDR ranges or address normalization: `"10.0.0.1"` does not match
    /// `"10.0.0.0/24"` or `"::ffff:10.0.0.1"`.
    #[must_use]
    pub fn validate_ip<S: AsRef<str>>(ip: &str, whitelist: &[S]) -> bool {
        whitelist.iter().any(|allowed| allowed.as_ref() == ip)
    }

    /// Returns whether `timestamp` (epoch seconds) is within `tolerance`
    /// seconds of now, in either direction.
    ///
    /// A `None` tolerance uses the configured default (300 seconds unless
    /// overridden).
    #[must_use]
    pub fn validate_timestamp(&self, timestamp: i64, tolerance: Option<u64>) -> bool {
        let tolerance = tolerance.unwrap_or_else(|| self.config.default_tolerance());
        within_tolerance(timestamp, now(), tolerance)
    }

    /// Returns replay-cache occupancy.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            size: self.cache.len(),
            max_size: self.cache.max_entries(),
        }
    }

    /// Forgets every replay key. Intended for tests and operator tooling.
    pub fn clear_cache(&self) {
        self.cache.clear();
        tracing::info!("Webhook replay cache cleared");
    }

    /// Runs one sweep of the replay cache now, returning the entries left.
    ///
    /// This is the same routine the background task runs on each tick.
    pub fn cleanup_expired(&self) -> usize {
        sweep_expired(&self.cache, &self.config)
    }

    /// Starts the periodic background sweep on the current Tokio runtime.
    ///
    /// Calling `start` while the sweep is already running does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`SweepError::NoRuntime`] when called outside a Tokio runtime.
    pub fn start(&self) -> Result<(), SweepError> {
        let mut sweeper = self.sweeper.lock().unwrap_or_else(PoisonError::into_inner);
        if sweeper.as_ref().is_some_and(|task| !task.is_finished()) {
            return Ok(());
        }

        let runtime = Handle::try_current().map_err(|_| SweepError::NoRuntime)?;
        let cache = Arc::clone(&self.cache);
        let config = self.config.clone();

        *sweeper = Some(runtime.spawn(async move {
            let mut interval = tokio::time::interval(config.sweep_interval());
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                sweep_expired(&cache, &config);
            }
        }));

        tracing::debug!(
            interval_secs = self.config.sweep_interval().as_secs(),
            "Webhook replay cache sweep started"
        );
        Ok(())
    }

    /// Stops the background sweep if it is running.
    pub fn stop(&self) {
        let task = self
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.abort();
            tracing::debug!("Webhook replay cache sweep stopped");
        }
    }

    /// Returns whether the background sweep is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}

impl Default for WebhookSecurity {
    fn default() -> Self {
        Self::new(SecurityConfig::default())
    }
}

impl Drop for WebhookSecurity {
    fn drop(&mut self) {
        if let Some(task) = self
            .sweeper
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            task.abort();
        }
    }
}

// Verify WebhookSecurity is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<WebhookSecurity>();
};

fn sweep_expired(cache: &ReplayCache, config: &SecurityConfig) -> usize {
    let remaining = cache.sweep(now(), config.max_age().as_secs());
    tracing::info!(remaining_entries = remaining, "Webhook replay cache cleanup");
    remaining
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|msg| (*msg).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "Signature scheme panicked".to_string())
}

fn within_tolerance(timestamp: i64, now: i64, tolerance: u64) -> bool {
    now.abs_diff(timestamp) <= tolerance
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WebhookSecret;
    use crate::signing::{compute_hmac, compute_signature_hex};
    use crate::HashAlgorithm;
    use std::time::Duration;

    fn config(provider: &str, secret: &str) -> WebhookConfig {
        WebhookConfig::builder()
            .provider(provider)
            .secret(WebhookSecret::new(secret).unwrap())
            .build()
            .unwrap()
    }

    fn stripe_header(payload: &[u8], secret: &str, timestamp: i64) -> String {
        let mut signed = format!("{timestamp}.").into_bytes();
        signed.extend_from_slice(payload);
        let sig = compute_signature_hex(&signed, secret.as_bytes());
        format!("t={timestamp},v1={sig}")
    }

    #[test]
    fn test_within_tolerance_is_symmetric_and_inclusive() {
        assert!(within_tolerance(1_000, 1_300, 300));
        assert!(within_tolerance(1_300, 1_000, 300));
        assert!(!within_tolerance(1_000, 1_301, 300));
        assert!(!within_tolerance(i64::MIN, i64::MAX, 300));
    }

    #[test]
    fn test_verify_returns_provider_as_supplied() {
        let security = WebhookSecurity::default();
        let sig = compute_signature_hex(b"x", b"k");
        let result = security.verify(b"x", &sig, &config("HubSpot", "k"), None);
        assert!(result.is_valid());
        assert_eq!(result.provider(), "HubSpot");
    }

    #[test]
    fn test_replay_key_uses_normalized_provider() {
        let security = WebhookSecurity::default();
        let ts = now();
        let header = stripe_header(b"{}", "whsec", ts);

        assert!(security
            .verify(b"{}", &header, &config("stripe", "whsec"), None)
            .is_valid());
        let second = security.verify(b"{}", &header, &config("STRIPE", "whsec"), None);
        assert_eq!(second.error(), Some("Possible replay attack detected"));
        assert!(security.cache.contains(&format!("stripe-{ts}")));
    }

    #[test]
    fn test_tolerance_checked_before_signature() {
        let security = WebhookSecurity::default();
        let stale = now() - 1_000;
        let header = format!("t={stale},v1=deadbeef");

        let result = security.verify(b"{}", &header, &config("stripe", "whsec"), None);
        assert_eq!(result.error(), Some("Timestamp outside tolerance"));
        assert_eq!(result.timestamp(), Some(stale));
    }

    #[test]
    fn test_config_tolerance_overrides_default() {
        let security = WebhookSecurity::default();
        let ts = now() - 1_000;
        let header = stripe_header(b"{}", "whsec", ts);
        let cfg = WebhookConfig::builder()
            .provider("stripe")
            .secret(WebhookSecret::new("whsec").unwrap())
            .timestamp_tolerance(2_000)
            .build()
            .unwrap();

        let result = security.verify(b"{}", &header, &cfg, None);
        assert!(result.is_valid());
        assert_eq!(result.timestamp(), Some(ts));
    }

    #[test]
    fn test_invalid_signature_does_not_consume_replay_key() {
        let security = WebhookSecurity::default();
        let ts = now();
        let forged = format!("t={ts},v1={}", "0".repeat(64));

        let result = security.verify(b"{}", &forged, &config("stripe", "whsec"), None);
        assert_eq!(result.error(), Some("Signature mismatch"));
        assert_eq!(security.cache_stats().size, 0);

        let genuine = stripe_header(b"{}", "whsec", ts);
        assert!(security
            .verify(b"{}", &genuine, &config("stripe", "whsec"), None)
            .is_valid());
    }

    #[test]
    fn test_generic_provider_has_no_replay_bookkeeping() {
        let security = WebhookSecurity::default();
        let sig = hex::encode(compute_hmac(HashAlgorithm::Sha256, b"k", &[b"same"]));
        let cfg = config("acme", "k");

        assert!(security.verify(b"same", &sig, &cfg, None).is_valid());
        assert!(security.verify(b"same", &sig, &cfg, None).is_valid());
        assert_eq!(security.cache_stats().size, 0);
    }

    #[derive(Debug)]
    struct PanickingScheme;

    impl SignatureScheme for PanickingScheme {
        fn signature_header(&self) -> &'static str {
            "X-Broken-Signature"
        }

        fn verify(
            &self,
            request: &SignedRequest<'_>,
            _config: &WebhookConfig,
        ) -> Result<(), VerificationError> {
            let byte = request.signature.as_bytes()[100];
            if byte == 0 {
                Ok(())
            } else {
                Err(VerificationError::SignatureMismatch)
            }
        }
    }

    #[test]
    fn test_with_scheme_routes_provider_to_registered_scheme() {
        use crate::signing::Encoding;
        use crate::webhooks::{HmacScheme, SignaturePrefix};

        let security = WebhookSecurity::default().with_scheme(
            "Intercom",
            HmacScheme::sha256(
                "X-Hub-Signature",
                Encoding::Hex,
                SignaturePrefix::Required("sha256="),
            ),
        );
        let cfg = config("intercom", "k");
        let bare = compute_signature_hex(b"{}", b"k");

        assert!(security
            .verify(b"{}", &format!("sha256={bare}"), &cfg, None)
            .is_valid());
        // A bare digest would pass the generic fallback but not this scheme.
        assert_eq!(
            security.verify(b"{}", &bare, &cfg, None).error(),
            Some("Signature mismatch")
        );
        assert_eq!(
            security.scheme("INTERCOM").signature_header(),
            "X-Hub-Signature"
        );
    }

    #[test]
    fn test_panicking_scheme_reported_as_internal_error() {
        let security = WebhookSecurity::default().with_scheme("broken", PanickingScheme);
        let cfg = config("broken", "k");

        let result = security.verify(b"x", "short", &cfg, None);

        assert!(!result.is_valid());
        assert_eq!(result.provider(), "broken");
        let message = result.error().unwrap();
        assert!(message.contains("index out of bounds"), "{message}");
        assert_eq!(security.cache_stats().size, 0);
    }

    #[test]
    fn test_panic_message_falls_back_for_opaque_payloads() {
        assert_eq!(panic_message(&"boom"), "boom");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42_u8), "Signature scheme panicked");
    }

    #[test]
    fn test_validate_ip_exact_match_only() {
        let whitelist = ["10.0.0.1", "192.168.1.10"];
        assert!(WebhookSecurity::validate_ip("10.0.0.1", &whitelist));
        assert!(!WebhookSecurity::validate_ip("10.0.0.2", &whitelist));
        assert!(!WebhookSecurity::validate_ip("10.0.0.1 ", &whitelist));
        assert!(!WebhookSecurity::validate_ip("10.0.0.1", &[] as &[&str]));

        let owned = vec!["::1".to_string()];
        assert!(WebhookSecurity::validate_ip("::1", &owned));
    }

    #[test]
    fn test_validate_timestamp_default_and_custom_tolerance() {
        let security = WebhookSecurity::default();
        let current = now();
        assert!(security.validate_timestamp(current, None));
        assert!(security.validate_timestamp(current - 200, None));
        assert!(!security.validate_timestamp(current - 400, None));
        assert!(security.validate_timestamp(current - 400, Some(500)));
        assert!(!security.validate_timestamp(current + 400, None));
    }

    #[test]
    fn test_clear_cache_resets_replay_state() {
        let security = WebhookSecurity::default();
        let header = stripe_header(b"{}", "whsec", now());
        let cfg = config("stripe", "whsec");

        assert!(security.verify(b"{}", &header, &cfg, None).is_valid());
        security.clear_cache();
        assert_eq!(security.cache_stats().size, 0);
        assert!(security.verify(b"{}", &header, &cfg, None).is_valid());
    }

    #[test]
    fn test_start_outside_runtime_fails() {
        let security = WebhookSecurity::default();
        assert_eq!(security.start(), Err(SweepError::NoRuntime));
        assert!(!security.is_running());
    }

    #[tokio::test]
    async fn test_start_and_stop_are_idempotent() {
        let security = WebhookSecurity::default();
        assert!(security.start().is_ok());
        assert!(security.start().is_ok());
        assert!(security.is_running());

        security.stop();
        security.stop();
        assert!(!security.is_running());
    }

    #[tokio::test]
    async fn test_background_sweep_removes_expired_entries() {
        let config = SecurityConfig::builder()
            .sweep_interval(Duration::from_millis(20))
            .build()
            .unwrap();
        let security = WebhookSecurity::new(config);
        security
            .cache
            .check_and_insert("stripe-1".to_string(), now() - 601);
        security
            .cache
            .check_and_insert("stripe-2".to_string(), now());
        security.start().unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(security.cache_stats().size, 1);
        assert!(security.cache.contains("stripe-2"));
        security.stop();
    }
}
