//! Inbound webhook verification.
//!
//! # Overview
//!
//! - [`WebhookSecurity`]: verifies requests and owns the replay cache
//! - [`WebhookVerification`]: the outcome of one verification
//! - [`VerificationError`]: why a verification failed
//! - [`SchemeRegistry`] / [`SignatureScheme`]: provider signature strategies
//! - [`ReplayCache`]: bounded FIFO record of consumed timestamps
//!
//! # Supported providers
//!
//! | Provider | Header | Scheme |
//! |---|---|---|
//! | `hubspot` | `X-HubSpot-Signature` | HMAC-SHA256, hex |
//! | `shopify` | `X-Shopify-Hmac-SHA256` | HMAC-SHA256, base64 |
//! | `stripe` | `Stripe-Signature` | `t=..,v1=..` over `"{t}.{payload}"`, hex |
//! | `whatsapp` | `X-Hub-Signature-256` | HMAC-SHA256, hex, optional `sha256=` |
//! | `slack` | `X-Slack-Signature` | `v0=` over `"v0:{ts}:{payload}"`, hex |
//! | `mailchimp` | `X-Mailchimp-Signature` | HMAC-SHA256, hex |
//! | `salesforce` | `X-Salesforce-Signature` | HMAC-SHA256, base64 |
//! | `github` | `X-Hub-Signature-256` | HMAC-SHA256, hex, `sha256=` required |
//! | anything else | `X-Webhook-Signature` | HMAC with the config's algorithm, hex |
//!
//! Stripe and Slack carry timestamps and are subject to the tolerance window
//! and replay detection.
//!
//! # Example
//!
//! ```rust
//! use webhook_security::signing::compute_signature_hex;
//! use webhook_security::{WebhookConfig, WebhookSecret, WebhookSecurity};
//!
//! let security = WebhookSecurity::default();
//! let config = WebhookConfig::builder()
//!     .provider("github")
//!     .secret(WebhookSecret::new("abc").unwrap())
//!     .build()
//!     .unwrap();
//!
//! let signature = format!("sha256={}", compute_signature_hex(b"ping", b"abc"));
//! assert!(security.verify(b"ping", &signature, &config, None).is_valid());
//!
//! let tampered = security.verify(b"pong", &signature, &config, None);
//! assert_eq!(tampered.error(), Some("Signature mismatch"));
//! ```
//!
//! # Thread Safety
//!
//! `WebhookSecurity` is `Send + Sync`; share it behind an `Arc` across
//! request handlers.

mod errors;
mod replay;
mod schemes;
mod types;
mod verification;

pub use errors::VerificationError;
pub use replay::ReplayCache;
pub use schemes::{
    HmacScheme, SchemeRegistry, SignaturePrefix, SignatureScheme, SignedRequest, SlackScheme,
    StripeScheme, HEADER_HUBSPOT_SIGNATURE, HEADER_HUB_SIGNATURE_256, HEADER_MAILCHIMP_SIGNATURE,
    HEADER_SALESFORCE_SIGNATURE, HEADER_SHOPIFY_HMAC, HEADER_SLACK_SIGNATURE,
    HEADER_SLACK_TIMESTAMP, HEADER_STRIPE_SIGNATURE, HEADER_WEBHOOK_SIGNATURE,
};
pub use types::{CacheStats, WebhookVerification};
pub use verification::WebhookSecurity;
