//! Settings snapshot consumed by [`MetadataPolicy`](crate::MetadataPolicy).
//!
//! Settings are read once at startup. Only the policy looks at them.
//!
//! ```toml
//! cache_credential = true
//!
//! [crypto]
//! enabled = true
//! alg = "AES"
//!
//! [crypto.encryption]
//! key = "<base64>"
//! key_size = 256
//!
//! [crypto.signing]
//! key = "<base64>"
//! key_size = 512
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::SettingsError;
use crate::Secret;

/// Default content encryption algorithm.
pub const DEFAULT_ALGORITHM: &str = "AES";
/// Default encryption key size in bits.
pub const DEFAULT_ENCRYPTION_KEY_SIZE: u32 = 256;
/// Default signing key size in bits.
pub const DEFAULT_SIGNING_KEY_SIZE: u32 = 512;

/// Clearpass settings: whether to cache credentials, and how to protect them.
///
/// # Examples
///
/// ```
/// use authn_metadata::ClearpassSettings;
///
/// let settings = ClearpassSettings::from_toml_str("cache_credential = true").unwrap();
///
/// assert!(settings.cache_credential);
/// assert!(settings.crypto.enabled);
/// assert_eq!(settings.crypto.alg, "AES");
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ClearpassSettings {
    /// Capture the credential after authentication
    pub cache_credential: bool,
    /// Protection applied to the captured credential
    pub crypto: CryptoSettings,
}

impl ClearpassSettings {
    /// Parses settings from a TOML document. Missing fields take defaults.
    pub fn from_toml_str(document: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(document)?)
    }

    /// Reads and parses a TOML settings file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let document = std::fs::read_to_string(path)?;
        Self::from_toml_str(&document)
    }
}

/// Cipher settings for cached credentials.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CryptoSettings {
    /// Sign and encrypt cached credentials
    pub enabled: bool,
    /// Content encryption algorithm identifier
    pub alg: String,
    /// Encryption key and its declared size
    pub encryption: KeySettings,
    /// Signing key and its declared size
    pub signing: KeySettings,
}

impl CryptoSettings {
    /// Returns the declared encryption key size in bits.
    pub fn encryption_key_size(&self) -> u32 {
        self.encryption.key_size.unwrap_or(DEFAULT_ENCRYPTION_KEY_SIZE)
    }

    /// Returns the declared signing key size in bits.
    pub fn signing_key_size(&self) -> u32 {
        self.signing.key_size.unwrap_or(DEFAULT_SIGNING_KEY_SIZE)
    }
}

impl Default for CryptoSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            alg: DEFAULT_ALGORITHM.to_string(),
            encryption: KeySettings::default(),
            signing: KeySettings::default(),
        }
    }
}

/// A base64-encoded key and its declared size in bits.
///
/// A blank key means "generate one at startup".
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct KeySettings {
    /// Base64 key material
    pub key: Secret<String>,
    /// Declared key size in bits
    pub key_size: Option<u32>,
}

impl KeySettings {
    /// Creates key settings from base64 key material and a declared size.
    pub fn new(key: impl Into<String>, key_size: u32) -> Self {
        Self {
            key: Secret::new(key.into()),
            key_size: Some(key_size),
        }
    }
}
