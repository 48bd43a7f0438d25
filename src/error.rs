use std::fmt;

/// Errors that can occur while building or applying a metadata plan.
#[derive(Debug)]
pub enum Error {
    /// Cipher key material was rejected at construction time
    KeyMaterial(KeyMaterialError),
    /// A populator failed fatally during an enrichment pass
    Populate(PopulateError),
    /// The settings snapshot could not be loaded
    Settings(SettingsError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::KeyMaterial(e) => write!(f, "Key material error: {}", e),
            Error::Populate(e) => write!(f, "Population error: {}", e),
            Error::Settings(e) => write!(f, "Settings error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::KeyMaterial(e) => Some(e),
            Error::Populate(e) => Some(e),
            Error::Settings(e) => Some(e),
        }
    }
}

impl From<KeyMaterialError> for Error {
    fn from(e: KeyMaterialError) -> Self {
        Error::KeyMaterial(e)
    }
}

impl From<PopulateError> for Error {
    fn from(e: PopulateError) -> Self {
        Error::Populate(e)
    }
}

impl From<SettingsError> for Error {
    fn from(e: SettingsError) -> Self {
        Error::Settings(e)
    }
}

/// Key material could not be turned into a working cipher.
///
/// Raised while a [`CompositeCipher`](crate::CompositeCipher) is constructed.
/// This is a startup-time configuration error: it is never downgraded to a
/// no-op cipher. Messages describe sizes and algorithm names only, never the
/// key bytes themselves.
///
/// # Examples
///
/// ```
/// use authn_metadata::{KeyMaterialError, KeyMaterialErrorKind};
///
/// let error = KeyMaterialError::new(KeyMaterialErrorKind::UnsupportedAlgorithm, "RSA");
/// assert_eq!(error.kind(), KeyMaterialErrorKind::UnsupportedAlgorithm);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMaterialError {
    kind: KeyMaterialErrorKind,
    message: String,
}

impl KeyMaterialError {
    /// Creates a new key material error.
    pub fn new(kind: KeyMaterialErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Returns the error kind.
    pub fn kind(&self) -> KeyMaterialErrorKind {
        self.kind
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for KeyMaterialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid key material ({}): {}", self.kind, self.message)
    }
}

impl std::error::Error for KeyMaterialError {}

/// Kind of key material error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMaterialErrorKind {
    /// The algorithm identifier is not one the cipher knows.
    UnsupportedAlgorithm,
    /// The declared key size is not valid for the algorithm.
    UnsupportedKeySize,
    /// The decoded key length does not match the declared key size.
    KeyLengthMismatch,
    /// The key is not valid base64.
    InvalidEncoding,
}

impl fmt::Display for KeyMaterialErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedAlgorithm => write!(f, "unsupported algorithm"),
            Self::UnsupportedKeySize => write!(f, "unsupported key size"),
            Self::KeyLengthMismatch => write!(f, "key length mismatch"),
            Self::InvalidEncoding => write!(f, "invalid key encoding"),
        }
    }
}

/// Error returned when a payload cannot be protected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeError {
    message: String,
}

impl EncodeError {
    /// Creates a new encode error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "encode failed: {}", self.message)
    }
}

impl std::error::Error for EncodeError {}

/// Error returned when a protected payload cannot be recovered.
///
/// Callers may recover from this: it only means the payload handed to
/// `decode` was not produced by the same key material, or was altered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeError {
    kind: DecodeErrorKind,
}

impl DecodeError {
    /// Creates a new decode error.
    pub fn new(kind: DecodeErrorKind) -> Self {
        Self { kind }
    }

    /// Returns the error kind.
    pub fn kind(&self) -> DecodeErrorKind {
        self.kind
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "decode failed: {}", self.kind)
    }
}

impl std::error::Error for DecodeError {}

/// Kind of decode error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// The payload is shorter than the signature and nonce prefix.
    Truncated,
    /// The stored signature does not match the recomputed one.
    SignatureMismatch,
    /// The signature matched but the ciphertext did not decrypt.
    DecryptionFailed,
}

impl fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated => write!(f, "payload truncated"),
            Self::SignatureMismatch => write!(f, "signature mismatch"),
            Self::DecryptionFailed => write!(f, "decryption failed"),
        }
    }
}

/// Error raised by a single populator during an enrichment pass.
///
/// Whether the pass stops depends on [`is_fatal`](Self::is_fatal): caching
/// failures are logged and skipped, anything else aborts the pass.
///
/// # Examples
///
/// ```
/// use authn_metadata::{PopulateError, PopulateErrorKind};
///
/// let error = PopulateError::new("cacheCredentials", PopulateErrorKind::Caching, "encode failed");
/// assert!(!error.is_fatal());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopulateError {
    populator: &'static str,
    kind: PopulateErrorKind,
    message: String,
}

impl PopulateError {
    /// Creates a new populate error attributed to the named populator.
    pub fn new(populator: &'static str, kind: PopulateErrorKind, message: impl Into<String>) -> Self {
        Self {
            populator,
            kind,
            message: message.into(),
        }
    }

    /// Returns the name of the populator that failed.
    pub fn populator(&self) -> &'static str {
        self.populator
    }

    /// Returns the error kind.
    pub fn kind(&self) -> PopulateErrorKind {
        self.kind
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns true if this failure must abort the enrichment pass.
    pub fn is_fatal(&self) -> bool {
        self.kind.is_fatal()
    }
}

impl fmt::Display for PopulateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed ({}): {}", self.populator, self.kind, self.message)
    }
}

impl std::error::Error for PopulateError {}

/// Kind of populate error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopulateErrorKind {
    /// The credential could not be serialized or protected for caching.
    Caching,
    /// The handler result carries no handler name.
    MissingHandlerName,
}

impl PopulateErrorKind {
    /// Returns true if errors of this kind abort the enrichment pass.
    pub fn is_fatal(self) -> bool {
        match self {
            Self::Caching => false,
            Self::MissingHandlerName => true,
        }
    }
}

impl fmt::Display for PopulateErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Caching => write!(f, "caching"),
            Self::MissingHandlerName => write!(f, "missing handler name"),
        }
    }
}

/// Error returned when a settings snapshot cannot be loaded.
#[derive(Debug)]
pub enum SettingsError {
    /// The settings file could not be read
    Io(std::io::Error),
    /// The settings document is not valid TOML for the expected shape
    Parse(toml::de::Error),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Io(e) => write!(f, "cannot read settings: {}", e),
            SettingsError::Parse(e) => write!(f, "cannot parse settings: {}", e),
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SettingsError::Io(e) => Some(e),
            SettingsError::Parse(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for SettingsError {
    fn from(e: std::io::Error) -> Self {
        SettingsError::Io(e)
    }
}

impl From<toml::de::Error> for SettingsError {
    fn from(e: toml::de::Error) -> Self {
        SettingsError::Parse(e)
    }
}
