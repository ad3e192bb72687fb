//! # Webhook Security
//!
//! Signature verification and replay protection for inbound third-party
//! webhooks.
//!
//! ## Overview
//!
//! This crate provides:
//! - Provider-specific signature checks for HubSpot, Shopify, Stripe,
//!   WhatsApp, Slack, Mailchimp, Salesforce and GitHub, plus a generic HMAC
//!   fallback, via [`WebhookSecurity::verify`]
//! - Timestamp tolerance windows for providers that sign a timestamp
//! - A bounded, FIFO-evicting replay cache with a periodic background sweep
//! - Constant-time signature comparison throughout
//! - Type-safe configuration via [`SecurityConfig`] and [`WebhookConfig`]
//!
//! The crate does not parse HTTP. The calling handler passes the raw body
//! and the relevant header values, then decides the response from the
//! returned [`WebhookVerification`].
//!
//! ## Quick Start
//!
//! ```rust
//! use webhook_security::{SecurityConfig, WebhookConfig, WebhookSecret, WebhookSecurity};
//!
//! let security = WebhookSecurity::new(SecurityConfig::default());
//!
//! let config = WebhookConfig::builder()
//!     .provider("slack")
//!     .secret(WebhookSecret::new("slack-signing-secret").unwrap())
//!     .build()
//!     .unwrap();
//!
//! // Slack requires the X-Slack-Request-Timestamp header value.
//! let result = security.verify(b"token=abc", "v0=deadbeef", &config, None);
//! assert!(!result.is_valid());
//! assert_eq!(result.error(), Some("Timestamp required for Slack verification"));
//! ```
//!
//! ## Background Sweep
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use webhook_security::{SecurityConfig, WebhookSecurity};
//!
//! let security = Arc::new(WebhookSecurity::new(SecurityConfig::default()));
//! security.start()?; // inside a Tokio runtime
//! // ... serve requests ...
//! security.stop();
//! ```
//!
//! ## Design Principles
//!
//! - **No global state**: each `WebhookSecurity` owns its replay cache
//! - **Never throws**: verification failures are values, not errors
//! - **Fail-fast validation**: configuration newtypes validate on construction
//! - **Thread-safe**: all public types are `Send + Sync`

pub mod config;
pub mod error;
pub mod signing;
pub mod webhooks;

// Re-export public types at crate root for convenience
pub use config::{
    HashAlgorithm, SecurityConfig, SecurityConfigBuilder, WebhookConfig, WebhookConfigBuilder,
    WebhookSecret,
};
pub use error::{ConfigError, SweepError};
pub use webhooks::{CacheStats, VerificationError, WebhookSecurity, WebhookVerification};
