//! Validated newtype wrappers for configuration values.
//!
//! This module provides type-safe wrappers around secret material and
//! algorithm names. Invalid values are rejected with clear error messages.

use crate::error::ConfigError;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A validated webhook signing secret.
///
/// The secret is an opaque byte string issued by the webhook provider. This
/// newtype ensures it is non-empty and masks its value in debug output to
/// prevent accidental exposure in logs.
///
/// # Security
///
/// The `Debug` implementation displays only `WebhookSecret(*****)`. The type
/// deliberately does not implement `Serialize`.
///
/// # Example
///
/// ```rust
/// use webhook_security::WebhookSecret;
///
/// let secret = WebhookSecret::new("whsec_abc").unwrap();
/// assert_eq!(secret.as_ref(), b"whsec_abc");
/// assert_eq!(format!("{:?}", secret), "WebhookSecret(*****)");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct WebhookSecret(Vec<u8>);

impl WebhookSecret {
    const GENERATED_LENGTH: usize = 32;

    /// Creates a new validated secret from a string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptySecret`] if the secret is empty.
    pub fn new(secret: impl Into<String>) -> Result<Self, ConfigError> {
        Self::from_bytes(secret.into().into_bytes())
    }

    /// Creates a new validated secret from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptySecret`] if the secret is empty.
    pub fn from_bytes(secret: impl Into<Vec<u8>>) -> Result<Self, ConfigError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        Ok(Self(secret))
    }

    /// Generates a random 32-character alphanumeric secret.
    ///
    /// Useful when this application is the one handing a signing secret to a
    /// provider that lets the subscriber choose it (e.g. HubSpot or
    /// Mailchimp relay setups).
    #[must_use]
    pub fn generate() -> Self {
        let secret: Vec<u8> = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(Self::GENERATED_LENGTH)
            .collect();
        Self(secret)
    }
}

impl AsRef<[u8]> for WebhookSecret {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for WebhookSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WebhookSecret(*****)")
    }
}

impl<'de> Deserialize<'de> for WebhookSecret {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(de::Error::custom)
    }
}

/// Hash function used for the generic HMAC verification path.
///
/// Parsing is case-insensitive and accepts an optional dash
/// (`"SHA-256"` and `"sha256"` are equivalent).
///
/// # Example
///
/// ```rust
/// use webhook_security::HashAlgorithm;
///
/// let algorithm: HashAlgorithm = "sha512".parse().unwrap();
/// assert_eq!(algorithm, HashAlgorithm::Sha512);
/// assert_eq!(HashAlgorithm::default(), HashAlgorithm::Sha256);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    /// HMAC-SHA1 (legacy providers).
    Sha1,
    /// HMAC-SHA256.
    #[default]
    Sha256,
    /// HMAC-SHA384.
    Sha384,
    /// HMAC-SHA512.
    Sha512,
}

impl HashAlgorithm {
    /// Returns the canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "");
        match normalized.as_str() {
            "sha1" => Ok(Self::Sha1),
            "sha256" => Ok(Self::Sha256),
            "sha384" => Ok(Self::Sha384),
            "sha512" => Ok(Self::Sha512),
            _ => Err(ConfigError::UnsupportedAlgorithm {
                name: s.to_string(),
            }),
        }
    }
}

impl Serialize for HashAlgorithm {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for HashAlgorithm {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
