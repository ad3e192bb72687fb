//! Provider signature schemes.
//!
//! Each webhook provider defines its own string to sign, digest encoding,
//! and signature envelope. A [`SignatureScheme`] captures one such
//! definition, and a [`SchemeRegistry`] maps provider names to schemes.
//! Supporting a new provider means registering a new scheme; dispatch code
//! does not change.
//!
//! Freshness and replay checks are not done here. Schemes only report the
//! timestamp their envelope carries via [`SignatureScheme::timestamp`], and
//! [`WebhookSecurity`](crate::WebhookSecurity) applies the tolerance window
//! and replay cache uniformly.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::config::{HashAlgorithm, WebhookConfig};
use crate::signing::{compute_hmac, constant_time_compare, Encoding};

use super::VerificationError;

// ============================================================================
// Header Constants
// ============================================================================

/// Header carrying HubSpot's hex HMAC-SHA256 signature.
pub const HEADER_HUBSPOT_SIGNATURE: &str = "X-HubSpot-Signature";

/// Header carrying Shopify's base64 HMAC-SHA256 signature.
pub const HEADER_SHOPIFY_HMAC: &str = "X-Shopify-Hmac-SHA256";

/// Header carrying Stripe's `t=<ts>,v1=<sig>` envelope.
pub const HEADER_STRIPE_SIGNATURE: &str = "Stripe-Signature";

/// Header carrying `sha256=<hex>` signatures (Meta/WhatsApp and GitHub).
pub const HEADER_HUB_SIGNATURE_256: &str = "X-Hub-Signature-256";

/// Header carrying Slack's `v0=<hex>` signature.
pub const HEADER_SLACK_SIGNATURE: &str = "X-Slack-Signature";

/// Header carrying the request timestamp Slack signs over.
pub const HEADER_SLACK_TIMESTAMP: &str = "X-Slack-Request-Timestamp";

/// Header carrying the Mailchimp relay signature.
pub const HEADER_MAILCHIMP_SIGNATURE: &str = "X-Mailchimp-Signature";

/// Header carrying the Salesforce outbound-message signature.
pub const HEADER_SALESFORCE_SIGNATURE: &str = "X-Salesforce-Signature";

/// Header expected for providers without a dedicated scheme.
pub const HEADER_WEBHOOK_SIGNATURE: &str = "X-Webhook-Signature";

// ============================================================================
// SignedRequest
// ============================================================================

/// The parts of an inbound request that take part in verification.
#[derive(Clone, Copy, Debug)]
pub struct SignedRequest<'a> {
    /// Raw request body, exactly as received.
    pub payload: &'a [u8],
    /// Value of the provider's signature header.
    pub signature: &'a str,
    /// Value of a separate timestamp header, for providers that use one.
    pub timestamp: Option<&'a str>,
}

// ============================================================================
// SignatureScheme
// ============================================================================

/// A provider-specific signature verification strategy.
pub trait SignatureScheme: Send + Sync + fmt::Debug {
    /// Name of the HTTP header the signature arrives in.
    fn signature_header(&self) -> &'static str;

    /// Name of a separate timestamp header, if the scheme uses one.
    fn timestamp_header(&self) -> Option<&'static str> {
        None
    }

    /// Extracts the event timestamp (epoch seconds) from the request.
    ///
    /// Schemes that return `Some` are subject to the tolerance window and
    /// replay detection.
    ///
    /// # Errors
    ///
    /// Returns an error if the envelope or timestamp cannot be parsed, or a
    /// required timestamp is missing.
    fn timestamp(&self, request: &SignedRequest<'_>) -> Result<Option<i64>, VerificationError> {
        let _ = request;
        Ok(None)
    }

    /// Checks the request signature against the configured secret.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError::SignatureMismatch`] when the signature
    /// does not match, or a format error when it cannot be parsed.
    fn verify(
        &self,
        request: &SignedRequest<'_>,
        config: &WebhookConfig,
    ) -> Result<(), VerificationError>;
}

/// How a signature header relates to the encoded digest.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignaturePrefix {
    /// The header is the bare encoded digest.
    None,
    /// The prefix is removed if present; a bare digest is also accepted.
    Optional(&'static str),
    /// The header must be the prefix followed by the digest.
    Required(&'static str),
}

/// HMAC over the raw payload with a fixed encoding and envelope.
///
/// Covers HubSpot, Shopify, WhatsApp, Mailchimp, Salesforce, GitHub and the
/// generic fallback. A `None` algorithm defers to [`WebhookConfig::algorithm`].
#[derive(Clone, Debug)]
pub struct HmacScheme {
    header: &'static str,
    algorithm: Option<HashAlgorithm>,
    encoding: Encoding,
    prefix: SignaturePrefix,
}

impl HmacScheme {
    /// Creates an HMAC-SHA256 scheme.
    #[must_use]
    pub const fn sha256(header: &'static str, encoding: Encoding, prefix: SignaturePrefix) -> Self {
        Self {
            header,
            algorithm: Some(HashAlgorithm::Sha256),
            encoding,
            prefix,
        }
    }

    /// Creates the fallback scheme: hex digest with the config's algorithm.
    #[must_use]
    pub const fn generic() -> Self {
        Self {
            header: HEADER_WEBHOOK_SIGNATURE,
            algorithm: None,
            encoding: Encoding::Hex,
            prefix: SignaturePrefix::None,
        }
    }
}

impl SignatureScheme for HmacScheme {
    fn signature_header(&self) -> &'static str {
        self.header
    }

    fn verify(
        &self,
        request: &SignedRequest<'_>,
        config: &WebhookConfig,
    ) -> Result<(), VerificationError> {
        let algorithm = self.algorithm.unwrap_or_else(|| config.algorithm());
        let digest = compute_hmac(algorithm, config.secret().as_ref(), &[request.payload]);
        let expected = self.encoding.encode(&digest);

        let matches = match self.prefix {
            SignaturePrefix::None => constant_time_compare(&expected, request.signature),
            SignaturePrefix::Optional(prefix) => {
                let provided = request
                    .signature
                    .strip_prefix(prefix)
                    .unwrap_or(request.signature);
                constant_time_compare(&expected, provided)
            }
            SignaturePrefix::Required(prefix) => {
                constant_time_compare(&format!("{prefix}{expected}"), request.signature)
            }
        };

        if matches {
            Ok(())
        } else {
            Err(VerificationError::SignatureMismatch)
        }
    }
}

// ============================================================================
// Stripe
// ============================================================================

/// Stripe: `t=<ts>,v1=<hex>` over `"{t}.{payload}"`.
///
/// During secret rolling Stripe sends one `v1` entry per active secret; the
/// request verifies if any of them matches. Unknown schemes such as `v0`
/// are ignored.
#[derive(Clone, Copy, Debug, Default)]
pub struct StripeScheme;

#[derive(Debug, PartialEq, Eq)]
struct StripeHeader<'a> {
    timestamp_raw: &'a str,
    timestamp: i64,
    signatures: Vec<&'a str>,
}

impl<'a> StripeHeader<'a> {
    fn parse(header: &'a str) -> Result<Self, VerificationError> {
        let mut timestamp_raw = None;
        let mut signatures = Vec::new();

        for item in header.split(',') {
            let Some((key, value)) = item.trim().split_once('=') else {
                continue;
            };
            match key {
                "t" => timestamp_raw = Some(value),
                "v1" => signatures.push(value),
                _ => {}
            }
        }

        let timestamp_raw = timestamp_raw.ok_or(VerificationError::InvalidSignatureFormat)?;
        if signatures.is_empty() {
            return Err(VerificationError::InvalidSignatureFormat);
        }
        let timestamp = timestamp_raw
            .parse()
            .map_err(|_| VerificationError::InvalidSignatureFormat)?;

        Ok(Self {
            timestamp_raw,
            timestamp,
            signatures,
        })
    }
}

impl SignatureScheme for StripeScheme {
    fn signature_header(&self) -> &'static str {
        HEADER_STRIPE_SIGNATURE
    }

    fn timestamp(&self, request: &SignedRequest<'_>) -> Result<Option<i64>, VerificationError> {
        StripeHeader::parse(request.signature).map(|header| Some(header.timestamp))
    }

    fn verify(
        &self,
        request: &SignedRequest<'_>,
        config: &WebhookConfig,
    ) -> Result<(), VerificationError> {
        let header = StripeHeader::parse(request.signature)?;
        let digest = compute_hmac(
            HashAlgorithm::Sha256,
            config.secret().as_ref(),
            &[header.timestamp_raw.as_bytes(), b".", request.payload],
        );
        let expected = Encoding::Hex.encode(&digest);

        // Compare against every candidate so the loop length does not depend
        // on which entry matched.
        let matched = header
            .signatures
            .iter()
            .fold(false, |found, candidate| {
                constant_time_compare(&expected, candidate) | found
            });

        if matched {
            Ok(())
        } else {
            Err(VerificationError::SignatureMismatch)
        }
    }
}

// ============================================================================
// Slack
// ============================================================================

/// Slack: `v0=<hex>` over `"v0:{ts}:{payload}"`, timestamp in its own header.
#[derive(Clone, Copy, Debug, Default)]
pub struct SlackScheme;

impl SlackScheme {
    const VERSION: &'static str = "v0";

    fn raw_timestamp<'a>(request: &SignedRequest<'a>) -> Result<&'a str, VerificationError> {
        request
            .timestamp
            .filter(|ts| !ts.trim().is_empty())
            .ok_or(VerificationError::MissingTimestamp { provider: "Slack" })
    }
}

impl SignatureScheme for SlackScheme {
    fn signature_header(&self) -> &'static str {
        HEADER_SLACK_SIGNATURE
    }

    fn timestamp_header(&self) -> Option<&'static str> {
        Some(HEADER_SLACK_TIMESTAMP)
    }

    fn timestamp(&self, request: &SignedRequest<'_>) -> Result<Option<i64>, VerificationError> {
        let raw = Self::raw_timestamp(request)?;
        raw.parse()
            .map(Some)
            .map_err(|_| VerificationError::InvalidTimestamp)
    }

    fn verify(
        &self,
        request: &SignedRequest<'_>,
        config: &WebhookConfig,
    ) -> Result<(), VerificationError> {
        let raw = Self::raw_timestamp(request)?;
        let digest = compute_hmac(
            HashAlgorithm::Sha256,
            config.secret().as_ref(),
            &[
                Self::VERSION.as_bytes(),
                b":",
                raw.as_bytes(),
                b":",
                request.payload,
            ],
        );
        let expected = format!("{}={}", Self::VERSION, Encoding::Hex.encode(&digest));

        if constant_time_compare(&expected, request.signature) {
            Ok(())
        } else {
            Err(VerificationError::SignatureMismatch)
        }
    }
}

// ============================================================================
// SchemeRegistry
// ============================================================================

/// Maps lowercase provider names to signature schemes.
///
/// Lookups are case-insensitive. Names without a registered scheme resolve to
/// the fallback, a generic HMAC check using the config's hash algorithm.
#[derive(Clone, Debug)]
pub struct SchemeRegistry {
    schemes: HashMap<String, Arc<dyn SignatureScheme>>,
    fallback: Arc<dyn SignatureScheme>,
}

impl SchemeRegistry {
    /// Creates a registry with no named schemes, only the generic fallback.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            schemes: HashMap::new(),
            fallback: Arc::new(HmacScheme::generic()),
        }
    }

    /// Creates a registry with every built-in provider.
    #[must_use]
    pub fn builtin() -> Self {
        use SignaturePrefix::{Optional, Required};

        Self::empty()
            .with(
                "hubspot",
                HmacScheme::sha256(HEADER_HUBSPOT_SIGNATURE, Encoding::Hex, SignaturePrefix::None),
            )
            .with(
                "shopify",
                HmacScheme::sha256(HEADER_SHOPIFY_HMAC, Encoding::Base64, SignaturePrefix::None),
            )
            .with("stripe", StripeScheme)
            .with(
                "whatsapp",
                HmacScheme::sha256(HEADER_HUB_SIGNATURE_256, Encoding::Hex, Optional("sha256=")),
            )
            .with("slack", SlackScheme)
            .with(
                "mailchimp",
                HmacScheme::sha256(
                    HEADER_MAILCHIMP_SIGNATURE,
                    Encoding::Hex,
                    SignaturePrefix::None,
                ),
            )
            .with(
                "salesforce",
                HmacScheme::sha256(
                    HEADER_SALESFORCE_SIGNATURE,
                    Encoding::Base64,
                    SignaturePrefix::None,
                ),
            )
            .with(
                "github",
                HmacScheme::sha256(HEADER_HUB_SIGNATURE_256, Encoding::Hex, Required("sha256=")),
            )
    }

    /// Registers `scheme` under `provider`, replacing any previous entry.
    #[must_use]
    pub fn with(mut self, provider: &str, scheme: impl SignatureScheme + 'static) -> Self {
        self.insert(provider, Arc::new(scheme));
        self
    }

    /// Registers a shared scheme under `provider`.
    pub fn insert(&mut self, provider: &str, scheme: Arc<dyn SignatureScheme>) {
        self.schemes.insert(normalize(provider), scheme);
    }

    /// Returns the scheme for `provider`, or the fallback.
    #[must_use]
    pub fn resolve(&self, provider: &str) -> &dyn SignatureScheme {
        self.schemes
            .get(&normalize(provider))
            .unwrap_or(&self.fallback)
            .as_ref()
    }

    /// Returns whether `provider` has a dedicated scheme.
    #[must_use]
    pub fn contains(&self, provider: &str) -> bool {
        self.schemes.contains_key(&normalize(provider))
    }

    /// Returns the registered provider names in sorted order.
    #[must_use]
    pub fn providers(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for SchemeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Canonical form of a provider name used for lookups and replay keys.
pub(crate) fn normalize(provider: &str) -> String {
    provider.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WebhookSecret;
    use crate::signing::{compute_signature_base64, compute_signature_hex};

    fn config(provider: &str, secret: &str) -> WebhookConfig {
        WebhookConfig::builder()
            .provider(provider)
            .secret(WebhookSecret::new(secret).unwrap())
            .build()
            .unwrap()
    }

    fn request<'a>(payload: &'a [u8], signature: &'a str) -> SignedRequest<'a> {
        SignedRequest {
            payload,
            signature,
            timestamp: None,
        }
    }

    #[test]
    fn test_builtin_registry_lists_all_providers() {
        let registry = SchemeRegistry::builtin();
        assert_eq!(
            registry.providers(),
            vec![
                "github",
                "hubspot",
                "mailchimp",
                "salesforce",
                "shopify",
                "slack",
                "stripe",
                "whatsapp"
            ]
        );
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let registry = SchemeRegistry::builtin();
        assert!(registry.contains("Stripe"));
        assert_eq!(
            registry.resolve(" SLACK ").signature_header(),
            HEADER_SLACK_SIGNATURE
        );
    }

    #[test]
    fn test_unknown_provider_resolves_to_generic() {
        let registry = SchemeRegistry::builtin();
        assert!(!registry.contains("acme"));
        assert_eq!(
            registry.resolve("acme").signature_header(),
            HEADER_WEBHOOK_SIGNATURE
        );
    }

    #[test]
    fn test_hmac_scheme_hex_without_prefix() {
        let scheme = HmacScheme::sha256("X-Test", Encoding::Hex, SignaturePrefix::None);
        let sig = compute_signature_hex(b"body", b"secret");
        assert!(scheme.verify(&request(b"body", &sig), &config("t", "secret")).is_ok());
        assert_eq!(
            scheme.verify(&request(b"body", &sig), &config("t", "other")),
            Err(VerificationError::SignatureMismatch)
        );
    }

    #[test]
    fn test_hmac_scheme_base64() {
        let scheme = HmacScheme::sha256("X-Test", Encoding::Base64, SignaturePrefix::None);
        let sig = compute_signature_base64(b"body", b"secret");
        assert!(scheme.verify(&request(b"body", &sig), &config("t", "secret")).is_ok());
    }

    #[test]
    fn test_optional_prefix_accepts_bare_and_prefixed() {
        let scheme =
            HmacScheme::sha256("X-Test", Encoding::Hex, SignaturePrefix::Optional("sha256="));
        let bare = compute_signature_hex(b"body", b"secret");
        let prefixed = format!("sha256={bare}");
        let cfg = config("whatsapp", "secret");

        assert!(scheme.verify(&request(b"body", &bare), &cfg).is_ok());
        assert!(scheme.verify(&request(b"body", &prefixed), &cfg).is_ok());
    }

    #[test]
    fn test_required_prefix_rejects_bare_digest() {
        let scheme =
            HmacScheme::sha256("X-Test", Encoding::Hex, SignaturePrefix::Required("sha256="));
        let bare = compute_signature_hex(b"body", b"secret");
        let cfg = config("github", "secret");

        assert_eq!(
            scheme.verify(&request(b"body", &bare), &cfg),
            Err(VerificationError::SignatureMismatch)
        );
        let prefixed = format!("sha256={bare}");
        assert!(scheme.verify(&request(b"body", &prefixed), &cfg).is_ok());
    }

    #[test]
    fn test_generic_scheme_uses_config_algorithm() {
        let scheme = HmacScheme::generic();
        let cfg = WebhookConfig::builder()
            .provider("acme")
            .secret(WebhookSecret::new("secret").unwrap())
            .algorithm(HashAlgorithm::Sha512)
            .build()
            .unwrap();
        let sig = hex::encode(compute_hmac(HashAlgorithm::Sha512, b"secret", &[b"body"]));

        assert!(scheme.verify(&request(b"body", &sig), &cfg).is_ok());

        let sha256_sig = compute_signature_hex(b"body", b"secret");
        assert!(scheme.verify(&request(b"body", &sha256_sig), &cfg).is_err());
    }

    #[test]
    fn test_stripe_header_parsing() {
        let header = StripeHeader::parse("t=1700000000,v1=abc,v0=old,v1=def").unwrap();
        assert_eq!(header.timestamp, 1_700_000_000);
        assert_eq!(header.timestamp_raw, "1700000000");
        assert_eq!(header.signatures, vec!["abc", "def"]);
    }

    #[test]
    fn test_stripe_header_rejects_malformed_envelopes() {
        for header in ["", "v1=abc", "t=123", "t=abc,v1=def", "garbage", "t=,v1=x"] {
            assert_eq!(
                StripeHeader::parse(header),
                Err(VerificationError::InvalidSignatureFormat),
                "header {header:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_stripe_accepts_any_matching_v1() {
        let digest = compute_hmac(HashAlgorithm::Sha256, b"whsec", &[b"123.{}"]);
        let good = hex::encode(digest);
        let header = format!("t=123,v1={},v1={good}", "0".repeat(64));
        let req = request(b"{}", &header);

        assert_eq!(StripeScheme.timestamp(&req), Ok(Some(123)));
        assert!(StripeScheme.verify(&req, &config("stripe", "whsec")).is_ok());
    }

    #[test]
    fn test_slack_requires_timestamp() {
        let req = request(b"body", "v0=abc");
        assert_eq!(
            SlackScheme.timestamp(&req),
            Err(VerificationError::MissingTimestamp { provider: "Slack" })
        );
        assert_eq!(
            SlackScheme.verify(&req, &config("slack", "secret")),
            Err(VerificationError::MissingTimestamp { provider: "Slack" })
        );
    }

    #[test]
    fn test_slack_rejects_non_numeric_timestamp() {
        let req = SignedRequest {
            payload: b"body",
            signature: "v0=abc",
            timestamp: Some("yesterday"),
        };
        assert_eq!(
            SlackScheme.timestamp(&req),
            Err(VerificationError::InvalidTimestamp)
        );
    }

    #[test]
    fn test_slack_timestamp_is_signed_verbatim() {
        let digest = compute_hmac(HashAlgorithm::Sha256, b"secret", &[b"v0:42:body"]);
        let signature = format!("v0={}", hex::encode(digest));
        let padded = SignedRequest {
            payload: b"body",
            signature: &signature,
            timestamp: Some(" 42 "),
        };
        let blank = SignedRequest {
            timestamp: Some("   "),
            ..padded
        };

        assert_eq!(
            SlackScheme.timestamp(&padded),
            Err(VerificationError::InvalidTimestamp)
        );
        assert_eq!(
            SlackScheme.verify(&padded, &config("slack", "secret")),
            Err(VerificationError::SignatureMismatch)
        );
        assert_eq!(
            SlackScheme.timestamp(&blank),
            Err(VerificationError::MissingTimestamp { provider: "Slack" })
        );
    }

    #[test]
    fn test_slack_signs_versioned_base_string() {
        let digest = compute_hmac(HashAlgorithm::Sha256, b"secret", &[b"v0:42:body"]);
        let signature = format!("v0={}", hex::encode(digest));
        let req = SignedRequest {
            payload: b"body",
            signature: &signature,
            timestamp: Some("42"),
        };

        assert_eq!(SlackScheme.timestamp(&req), Ok(Some(42)));
        assert!(SlackScheme.verify(&req, &config("slack", "secret")).is_ok());
        assert_eq!(SlackScheme.timestamp_header(), Some(HEADER_SLACK_TIMESTAMP));
    }

    #[test]
    fn test_custom_scheme_registration_overrides_builtin() {
        #[derive(Debug)]
        struct AlwaysValid;

        impl SignatureScheme for AlwaysValid {
            fn signature_header(&self) -> &'static str {
                "X-Always"
            }

            fn verify(
                &self,
                _request: &SignedRequest<'_>,
                _config: &WebhookConfig,
            ) -> Result<(), VerificationError> {
                Ok(())
            }
        }

        let registry = SchemeRegistry::builtin().with("HubSpot", AlwaysValid);
        assert_eq!(registry.resolve("hubspot").signature_header(), "X-Always");
    }
}
