//! HMAC computation and constant-time comparison.
//!
//! This module provides the primitives every signature scheme is built from:
//! computing an HMAC over one or more message parts with a chosen hash
//! function, encoding the digest, and comparing signatures without leaking
//! timing information.
//!
//! # Security
//!
//! All signature comparisons go through [`constant_time_compare`], which uses
//! `subtle::ConstantTimeEq`. Inputs of different lengths compare unequal
//! without panicking.
//!
//! # Example
//!
//! ```rust
//! use webhook_security::signing::{compute_signature_base64, compute_signature_hex};
//!
//! let hex_sig = compute_signature_hex(b"message", b"key");
//! assert_eq!(
//!     hex_sig,
//!     "6e9ef29b75fffc5b7abae527d58fdadb2fe42e7219011976917343065f58ed4a"
//! );
//!
//! let b64_sig = compute_signature_base64(b"message", b"key");
//! assert_eq!(b64_sig, "bp7ym3X//Ft6uuUn1Y/a2y/kLnIZARl2kXNDBl9Y7Uo=");
//! ```

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};
use subtle::ConstantTimeEq;

use crate::config::HashAlgorithm;

/// Output encoding of a computed digest.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Encoding {
    /// Lowercase hexadecimal.
    Hex,
    /// RFC 4648 standard base64 with padding.
    Base64,
}

impl Encoding {
    /// Encodes raw digest bytes.
    #[must_use]
    pub fn encode(self, digest: &[u8]) -> String {
        match self {
            Self::Hex => hex::encode(digest),
            Self::Base64 => STANDARD.encode(digest),
        }
    }
}

/// Computes an HMAC over the concatenation of `parts`.
///
/// Parts are fed to the MAC in order, so signed strings such as
/// `"{timestamp}.{payload}"` can be authenticated without copying the
/// payload into a new buffer.
#[must_use]
pub fn compute_hmac(algorithm: HashAlgorithm, secret: &[u8], parts: &[&[u8]]) -> Vec<u8> {
    match algorithm {
        HashAlgorithm::Sha1 => mac_parts::<Hmac<Sha1>>(secret, parts),
        HashAlgorithm::Sha256 => mac_parts::<Hmac<Sha256>>(secret, parts),
        HashAlgorithm::Sha384 => mac_parts::<Hmac<Sha384>>(secret, parts),
        HashAlgorithm::Sha512 => mac_parts::<Hmac<Sha512>>(secret, parts),
    }
}

#[allow(clippy::missing_panics_doc)] // HMAC accepts any key size, so this never panics
fn mac_parts<M: Mac + KeyInit>(secret: &[u8], parts: &[&[u8]]) -> Vec<u8> {
    let mut mac =
        <M as KeyInit>::new_from_slice(secret).expect("HMAC can take key of any size");
    for part in parts {
        mac.update(part);
    }
    mac.finalize().into_bytes().to_vec()
}

/// Computes a hex-encoded HMAC-SHA256 signature.
///
/// # Example
///
/// ```rust
/// use webhook_security::signing::compute_signature_hex;
///
/// let sig = compute_signature_hex(b"test-message", b"secret-key");
/// assert_eq!(sig.len(), 64);
/// ```
#[must_use]
pub fn compute_signature_hex(message: &[u8], secret: &[u8]) -> String {
    Encoding::Hex.encode(&compute_hmac(HashAlgorithm::Sha256, secret, &[message]))
}

/// Computes a base64-encoded HMAC-SHA256 signature.
///
/// # Example
///
/// ```rust
/// use webhook_security::signing::compute_signature_base64;
///
/// let sig = compute_signature_base64(b"webhook payload", b"secret-key");
/// assert_eq!(sig.len(), 44); // SHA256 produces 32 bytes = 44 base64 chars
/// ```
#[must_use]
pub fn compute_signature_base64(message: &[u8], secret: &[u8]) -> String {
    Encoding::Base64.encode(&compute_hmac(HashAlgorithm::Sha256, secret, &[message]))
}

/// Performs constant-time comparison of two strings.
///
/// # Returns
///
/// `true` if the strings are byte-for-byte equal, `false` otherwise.
#[must_use]
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    // ConstantTimeEq handles different lengths securely
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
