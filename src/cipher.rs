//! Ciphers protecting cached credentials.
//!
//! This module provides:
//! - `CipherExecutor`: the closed set of ciphers a plan can use
//! - `NoOpCipher`: identity transform for disabled or unconfigured crypto
//! - `CompositeCipher`: AES-GCM encryption followed by an HMAC signature
//!
//! Ciphers hold no mutable state and can be shared across threads.

mod composite;
mod noop;

pub use composite::{CipherAlgorithm, CompositeCipher, NONCE_LEN};
pub use noop::NoOpCipher;
pub(crate) use composite::check_signing_key_size;

use crate::error::{DecodeError, EncodeError};

/// A transform that protects a payload and recovers it again.
///
/// # Examples
///
/// ```
/// use authn_metadata::CipherExecutor;
///
/// let cipher = CipherExecutor::noop();
/// let protected = cipher.encode(b"s3cr3t").unwrap();
///
/// assert_eq!(protected, b"s3cr3t");
/// assert_eq!(cipher.decode(&protected).unwrap(), b"s3cr3t");
/// ```
#[derive(Debug, Clone)]
pub enum CipherExecutor {
    /// Payloads pass through unchanged
    NoOp(NoOpCipher),
    /// Payloads are encrypted, then signed
    Composite(CompositeCipher),
}

impl CipherExecutor {
    /// Returns the identity cipher.
    pub fn noop() -> Self {
        CipherExecutor::NoOp(NoOpCipher)
    }

    /// Protects `payload`.
    pub fn encode(&self, payload: &[u8]) -> Result<Vec<u8>, EncodeError> {
        match self {
            CipherExecutor::NoOp(c) => Ok(c.encode(payload)),
            CipherExecutor::Composite(c) => c.encode(payload),
        }
    }

    /// Recovers a payload produced by [`encode`](Self::encode).
    ///
    /// # Errors
    ///
    /// Returns `DecodeError` if the signature does not verify or the
    /// ciphertext does not decrypt. The no-op cipher never fails.
    pub fn decode(&self, protected: &[u8]) -> Result<Vec<u8>, DecodeError> {
        match self {
            CipherExecutor::NoOp(c) => Ok(c.decode(protected)),
            CipherExecutor::Composite(c) => c.decode(protected),
        }
    }

    /// Returns true if this cipher actually protects payloads.
    pub fn is_enabled(&self) -> bool {
        matches!(self, CipherExecutor::Composite(_))
    }

    /// Returns a short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            CipherExecutor::NoOp(_) => "noop",
            CipherExecutor::Composite(_) => "composite",
        }
    }
}

impl From<NoOpCipher> for CipherExecutor {
    fn from(cipher: NoOpCipher) -> Self {
        CipherExecutor::NoOp(cipher)
    }
}

impl From<CompositeCipher> for CipherExecutor {
    fn from(cipher: CompositeCipher) -> Self {
        CipherExecutor::Composite(cipher)
    }
}
