//! Configuration types for webhook verification.
//!
//! # Overview
//!
//! The main types in this module are:
//!
//! - [`SecurityConfig`]: settings for the replay cache and its background sweep
//! - [`SecurityConfigBuilder`]: a builder for [`SecurityConfig`]
//! - [`WebhookConfig`]: per-request provider, secret, and algorithm settings
//! - [`WebhookSecret`]: a validated secret newtype with masked debug output
//! - [`HashAlgorithm`]: hash function for the generic HMAC scheme
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use webhook_security::SecurityConfig;
//!
//! let config = SecurityConfig::builder()
//!     .max_entries(5_000)
//!     .sweep_interval(Duration::from_secs(60))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.max_entries(), 5_000);
//! assert_eq!(config.max_age(), Duration::from_secs(600));
//! ```

mod newtypes;
mod webhook;

pub use newtypes::{HashAlgorithm, WebhookSecret};
pub use webhook::{WebhookConfig, WebhookConfigBuilder};

use std::time::Duration;

use crate::error::ConfigError;

/// Settings for a [`WebhookSecurity`](crate::WebhookSecurity) instance.
///
/// # Defaults
///
/// - `max_entries`: 1000 replay-cache entries
/// - `sweep_interval`: 5 minutes
/// - `max_age`: 600 seconds
/// - `default_tolerance`: 300 seconds
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SecurityConfig {
    max_entries: usize,
    sweep_interval: Duration,
    max_age: Duration,
    default_tolerance: u64,
}

impl SecurityConfig {
    /// Default replay-cache capacity.
    pub const DEFAULT_MAX_ENTRIES: usize = 1000;
    /// Default interval between background sweeps.
    pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);
    /// Default age after which a replay-cache entry is swept.
    pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(10 * 60);
    /// Default timestamp tolerance in seconds.
    pub const DEFAULT_TOLERANCE_SECS: u64 = 300;

    /// Creates a new builder for constructing a `SecurityConfig`.
    #[must_use]
    pub fn builder() -> SecurityConfigBuilder {
        SecurityConfigBuilder::new()
    }

    /// Returns the replay-cache capacity.
    #[must_use]
    pub const fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Returns the interval between background sweeps.
    #[must_use]
    pub const fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }

    /// Returns the age after which replay-cache entries are swept.
    #[must_use]
    pub const fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Returns the timestamp tolerance used when a `WebhookConfig` sets none.
    #[must_use]
    pub const fn default_tolerance(&self) -> u64 {
        self.default_tolerance
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_entries: Self::DEFAULT_MAX_ENTRIES,
            sweep_interval: Self::DEFAULT_SWEEP_INTERVAL,
            max_age: Self::DEFAULT_MAX_AGE,
            default_tolerance: Self::DEFAULT_TOLERANCE_SECS,
        }
    }
}

// Verify config types are Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<SecurityConfig>();
    assert_send_sync::<WebhookConfig>();
};

/// Builder for constructing [`SecurityConfig`] instances.
///
/// Every field is optional; unset fields take the defaults listed on
/// [`SecurityConfig`].
#[derive(Debug, Default)]
pub struct SecurityConfigBuilder {
    max_entries: Option<usize>,
    sweep_interval: Option<Duration>,
    max_age: Option<Duration>,
    default_tolerance: Option<u64>,
}

impl SecurityConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the replay-cache capacity.
    #[must_use]
    pub const fn max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }

    /// Sets the interval between background sweeps.
    #[must_use]
    pub const fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = Some(interval);
        self
    }

    /// Sets the age after which replay-cache entries are swept.
    #[must_use]
    pub const fn max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    /// Sets the default timestamp tolerance in seconds.
    #[must_use]
    pub const fn default_tolerance(mut self, seconds: u64) -> Self {
        self.default_tolerance = Some(seconds);
        self
    }

    /// Builds the [`SecurityConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidCacheSize`] for a zero capacity and
    /// [`ConfigError::InvalidDuration`] for a zero sweep interval or max age.
    pub fn build(self) -> Result<SecurityConfig, ConfigError> {
        let max_entries = self
            .max_entries
            .unwrap_or(SecurityConfig::DEFAULT_MAX_ENTRIES);
        if max_entries == 0 {
            return Err(ConfigError::InvalidCacheSize);
        }

        let sweep_interval = self
            .sweep_interval
            .unwrap_or(SecurityConfig::DEFAULT_SWEEP_INTERVAL);
        if sweep_interval.is_zero() {
            return Err(ConfigError::InvalidDuration {
                field: "sweep_interval",
            });
        }

        let max_age = self.max_age.unwrap_or(SecurityConfig::DEFAULT_MAX_AGE);
        if max_age.is_zero() {
            return Err(ConfigError::InvalidDuration { field: "max_age" });
        }

        Ok(SecurityConfig {
            max_entries,
            sweep_interval,
            max_age,
            default_tolerance: self
                .default_tolerance
                .unwrap_or(SecurityConfig::DEFAULT_TOLERANCE_SECS),
        })
    }
}
