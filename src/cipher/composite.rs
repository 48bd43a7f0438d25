//! Encrypt-then-sign cipher.
//!
//! Protected payload layout:
//!
//! ```text
//! signature (32 or 64 bytes) || nonce (12 bytes) || ciphertext || tag (16 bytes)
//! ```
//!
//! The signature is an HMAC over `nonce || ciphertext || tag`. Its width is
//! fixed by the signing key size: HMAC-SHA256 for 256-bit keys, HMAC-SHA512
//! for 512-bit keys.
//!
//! SECURITY: Error types never contain plaintext, ciphertext or key material.

use std::fmt;

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes128Gcm, Aes256Gcm, Nonce};
use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha512};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::error::{
    DecodeError, DecodeErrorKind, EncodeError, KeyMaterialError, KeyMaterialErrorKind,
};

type HmacSha256 = Hmac<Sha256>;
type HmacSha512 = Hmac<Sha512>;

/// Nonce size for AES-GCM (96 bits / 12 bytes).
pub const NONCE_LEN: usize = 12;

/// Authentication tag appended by AES-GCM.
const TAG_LEN: usize = 16;

/// Content encryption algorithm of a [`CompositeCipher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherAlgorithm {
    /// AES-GCM with a 128-bit key
    Aes128Gcm,
    /// AES-GCM with a 256-bit key
    Aes256Gcm,
}

impl CipherAlgorithm {
    /// Resolves an algorithm identifier against a declared key size in bits.
    ///
    /// `AES` picks the AES-GCM variant matching the key size; `A128GCM` and
    /// `A256GCM` require their exact size. Identifiers are case-insensitive.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedAlgorithm` for unknown identifiers and
    /// `UnsupportedKeySize` when the size does not fit the algorithm.
    ///
    /// # Examples
    ///
    /// ```
    /// use authn_metadata::CipherAlgorithm;
    ///
    /// assert_eq!(CipherAlgorithm::resolve("AES", 256).unwrap(), CipherAlgorithm::Aes256Gcm);
    /// assert!(CipherAlgorithm::resolve("A128GCM", 256).is_err());
    /// ```
    pub fn resolve(name: &str, key_size_bits: u32) -> Result<Self, KeyMaterialError> {
        let name = name.trim().to_ascii_uppercase();
        let algorithm = match (name.as_str(), key_size_bits) {
            ("AES", 128) | ("A128GCM", 128) => Self::Aes128Gcm,
            ("AES", 256) | ("A256GCM", 256) => Self::Aes256Gcm,
            ("AES", _) | ("A128GCM", _) | ("A256GCM", _) => {
                return Err(KeyMaterialError::new(
                    KeyMaterialErrorKind::UnsupportedKeySize,
                    format!("{} does not support {}-bit encryption keys", name, key_size_bits),
                ));
            }
            _ => {
                return Err(KeyMaterialError::new(
                    KeyMaterialErrorKind::UnsupportedAlgorithm,
                    format!("unknown encryption algorithm '{}'", name),
                ));
            }
        };
        Ok(algorithm)
    }

    /// Returns the key size in bits.
    pub fn key_size_bits(self) -> u32 {
        match self {
            Self::Aes128Gcm => 128,
            Self::Aes256Gcm => 256,
        }
    }

    /// Returns the key length in bytes.
    pub fn key_len(self) -> usize {
        self.key_size_bits() as usize / 8
    }
}

impl fmt::Display for CipherAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aes128Gcm => write!(f, "A128GCM"),
            Self::Aes256Gcm => write!(f, "A256GCM"),
        }
    }
}

#[derive(Clone)]
enum Encrypter {
    Aes128(Aes128Gcm),
    Aes256(Aes256Gcm),
}

impl Encrypter {
    fn new(algorithm: CipherAlgorithm, key: &[u8]) -> Result<Self, KeyMaterialError> {
        let mismatch = |_| {
            KeyMaterialError::new(
                KeyMaterialErrorKind::KeyLengthMismatch,
                format!("{} requires a {}-byte key", algorithm, algorithm.key_len()),
            )
        };
        match algorithm {
            CipherAlgorithm::Aes128Gcm => <Aes128Gcm as KeyInit>::new_from_slice(key)
                .map(Encrypter::Aes128)
                .map_err(mismatch),
            CipherAlgorithm::Aes256Gcm => <Aes256Gcm as KeyInit>::new_from_slice(key)
                .map(Encrypter::Aes256)
                .map_err(mismatch),
        }
    }
}

/// Rejects signing key sizes other than 256 and 512 bits.
pub(crate) fn check_signing_key_size(key_size_bits: u32) -> Result<(), KeyMaterialError> {
    if matches!(key_size_bits, 256 | 512) {
        return Ok(());
    }
    Err(KeyMaterialError::new(
        KeyMaterialErrorKind::UnsupportedKeySize,
        format!("signing keys must be 256 or 512 bits, got {}", key_size_bits),
    ))
}

#[derive(Clone)]
enum Signer {
    Sha256(HmacSha256),
    Sha512(HmacSha512),
}

impl Signer {
    fn new(key: &[u8], key_size_bits: u32) -> Result<Self, KeyMaterialError> {
        check_signing_key_size(key_size_bits)?;
        let key_len = key_size_bits as usize / 8;
        if key.len() != key_len {
            return Err(KeyMaterialError::new(
                KeyMaterialErrorKind::KeyLengthMismatch,
                format!(
                    "signing key is {} bytes, declared size requires {}",
                    key.len(),
                    key_len
                ),
            ));
        }

        let invalid = |_| {
            KeyMaterialError::new(KeyMaterialErrorKind::KeyLengthMismatch, "signing key rejected")
        };
        if key_size_bits == 256 {
            <HmacSha256 as Mac>::new_from_slice(key)
                .map(Signer::Sha256)
                .map_err(invalid)
        } else {
            <HmacSha512 as Mac>::new_from_slice(key)
                .map(Signer::Sha512)
                .map_err(invalid)
        }
    }

    fn signature_len(&self) -> usize {
        match self {
            Signer::Sha256(_) => 32,
            Signer::Sha512(_) => 64,
        }
    }

    fn sign(&self, body: &[u8]) -> Vec<u8> {
        match self {
            Signer::Sha256(mac) => {
                let mut mac = mac.clone();
                mac.update(body);
                mac.finalize().into_bytes().to_vec()
            }
            Signer::Sha512(mac) => {
                let mut mac = mac.clone();
                mac.update(body);
                mac.finalize().into_bytes().to_vec()
            }
        }
    }
}

/// Keyed encrypt-then-sign cipher for cached credentials.
///
/// Each `encode` draws a fresh random nonce, so protecting the same payload
/// twice yields different bytes of the same length.
///
/// # Examples
///
/// ```
/// use authn_metadata::{CipherAlgorithm, CompositeCipher};
///
/// let cipher = CompositeCipher::new(CipherAlgorithm::Aes256Gcm, vec![1u8; 32], vec![2u8; 64])
///     .expect("valid key material");
///
/// let protected = cipher.encode(b"s3cr3t").unwrap();
/// assert_eq!(protected.len(), cipher.protected_len(6));
/// assert_eq!(cipher.decode(&protected).unwrap(), b"s3cr3t");
/// ```
#[derive(Clone)]
pub struct CompositeCipher {
    algorithm: CipherAlgorithm,
    encrypter: Encrypter,
    signer: Signer,
}

impl CompositeCipher {
    /// Creates a cipher whose key sizes follow from the keys themselves.
    ///
    /// The encryption key must match `algorithm`; the signing key must be 32
    /// or 64 bytes.
    pub fn new(
        algorithm: CipherAlgorithm,
        encryption_key: impl Into<Zeroizing<Vec<u8>>>,
        signing_key: impl Into<Zeroizing<Vec<u8>>>,
    ) -> Result<Self, KeyMaterialError> {
        let encryption_key: Zeroizing<Vec<u8>> = encryption_key.into();
        let signing_key: Zeroizing<Vec<u8>> = signing_key.into();
        let signing_bits = (signing_key.len() * 8) as u32;
        Self::build(algorithm, &encryption_key, &signing_key, signing_bits)
    }

    /// Creates a cipher from an algorithm identifier and declared key sizes.
    ///
    /// # Errors
    ///
    /// Returns `KeyMaterialError` when the algorithm is unknown, a declared
    /// size is unsupported, or a key's length differs from its declared size.
    pub fn with_key_sizes(
        algorithm: &str,
        encryption_key: impl Into<Zeroizing<Vec<u8>>>,
        signing_key: impl Into<Zeroizing<Vec<u8>>>,
        encryption_key_size: u32,
        signing_key_size: u32,
    ) -> Result<Self, KeyMaterialError> {
        let algorithm = CipherAlgorithm::resolve(algorithm, encryption_key_size)?;
        let encryption_key: Zeroizing<Vec<u8>> = encryption_key.into();
        let signing_key: Zeroizing<Vec<u8>> = signing_key.into();
        Self::build(algorithm, &encryption_key, &signing_key, signing_key_size)
    }

    fn build(
        algorithm: CipherAlgorithm,
        encryption_key: &[u8],
        signing_key: &[u8],
        signing_key_size: u32,
    ) -> Result<Self, KeyMaterialError> {
        if encryption_key.len() != algorithm.key_len() {
            return Err(KeyMaterialError::new(
                KeyMaterialErrorKind::KeyLengthMismatch,
                format!(
                    "encryption key is {} bytes, {} requires {}",
                    encryption_key.len(),
                    algorithm,
                    algorithm.key_len()
                ),
            ));
        }

        Ok(Self {
            algorithm,
            encrypter: Encrypter::new(algorithm, encryption_key)?,
            signer: Signer::new(signing_key, signing_key_size)?,
        })
    }

    /// Returns the content encryption algorithm.
    pub fn algorithm(&self) -> CipherAlgorithm {
        self.algorithm
    }

    /// Returns the width of the signature prefix in bytes.
    pub fn signature_len(&self) -> usize {
        self.signer.signature_len()
    }

    /// Returns the protected length of a payload of `payload_len` bytes.
    pub fn protected_len(&self, payload_len: usize) -> usize {
        self.signature_len() + NONCE_LEN + payload_len + TAG_LEN
    }

    /// Encrypts `payload`, signs the ciphertext and returns the signed form.
    pub fn encode(&self, payload: &[u8]) -> Result<Vec<u8>, EncodeError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = match &self.encrypter {
            Encrypter::Aes128(c) => c.encrypt(&nonce, payload),
            Encrypter::Aes256(c) => c.encrypt(&nonce, payload),
        }
        .map_err(|_| EncodeError::new("encryption failed"))?;

        let mut body = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        body.extend_from_slice(&nonce);
        body.extend_from_slice(&ciphertext);

        let signature = self.signer.sign(&body);
        let mut protected = Vec::with_capacity(signature.len() + body.len());
        protected.extend_from_slice(&signature);
        protected.extend_from_slice(&body);
        Ok(protected)
    }

    /// Verifies and decrypts a payload produced by [`encode`](Self::encode).
    ///
    /// The signature is checked in constant time before any decryption.
    pub fn decode(&self, protected: &[u8]) -> Result<Vec<u8>, DecodeError> {
        let signature_len = self.signature_len();
        if protected.len() < signature_len + NONCE_LEN + TAG_LEN {
            return Err(DecodeError::new(DecodeErrorKind::Truncated));
        }

        let (signature, body) = protected.split_at(signature_len);
        let expected = self.signer.sign(body);
        if !bool::from(expected.as_slice().ct_eq(signature)) {
            return Err(DecodeError::new(DecodeErrorKind::SignatureMismatch));
        }

        let (nonce, ciphertext) = body.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce);
        match &self.encrypter {
            Encrypter::Aes128(c) => c.decrypt(nonce, ciphertext),
            Encrypter::Aes256(c) => c.decrypt(nonce, ciphertext),
        }
        .map_err(|_| DecodeError::new(DecodeErrorKind::DecryptionFailed))
    }
}

impl fmt::Debug for CompositeCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeCipher")
            .field("algorithm", &self.algorithm)
            .field("signature_len", &self.signature_len())
            .finish_non_exhaustive()
    }
}
