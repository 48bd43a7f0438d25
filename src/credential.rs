//! Credentials presented to authentication handlers.

use std::fmt;

use crate::Secret;

/// The concrete kind of a credential.
///
/// The tag is what [`CredentialTypePopulator`](crate::CredentialTypePopulator)
/// records on the authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKind {
    /// Username and password
    Password,
    /// Bearer or API token
    Token,
    /// One-time passcode
    OneTimePassword,
    /// Client certificate
    X509,
}

impl CredentialKind {
    /// Returns the stable tag for this kind.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Password => "password",
            Self::Token => "token",
            Self::OneTimePassword => "one-time-password",
            Self::X509 => "x509",
        }
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Raw material proving an identity.
///
/// The secret part is held in a [`Secret`] and is never printed. A credential
/// lives only as long as the [`HandlerResult`](crate::HandlerResult) that owns
/// it, unless the clearpass populator captures a protected copy.
///
/// # Examples
///
/// ```
/// use authn_metadata::{Credential, CredentialKind};
///
/// let credential = Credential::password("casuser", "s3cr3t").with_remember_me(true);
///
/// assert_eq!(credential.kind(), CredentialKind::Password);
/// assert!(credential.remember_me());
/// assert!(!format!("{:?}", credential).contains("s3cr3t"));
/// ```
pub struct Credential {
    id: String,
    kind: CredentialKind,
    secret: Secret<Vec<u8>>,
    remember_me: bool,
}

impl Credential {
    /// Creates a credential of the given kind.
    pub fn new(kind: CredentialKind, id: impl Into<String>, secret: impl Into<Vec<u8>>) -> Self {
        Self {
            id: id.into(),
            kind,
            secret: Secret::new(secret.into()),
            remember_me: false,
        }
    }

    /// Creates a username/password credential.
    pub fn password(username: impl Into<String>, password: impl Into<Vec<u8>>) -> Self {
        Self::new(CredentialKind::Password, username, password)
    }

    /// Creates a token credential.
    pub fn token(id: impl Into<String>, token: impl Into<Vec<u8>>) -> Self {
        Self::new(CredentialKind::Token, id, token)
    }

    /// Sets the "remember me" flag.
    pub fn with_remember_me(mut self, remember_me: bool) -> Self {
        self.remember_me = remember_me;
        self
    }

    /// Returns the credential identifier (username, token id, subject DN).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the credential kind.
    pub fn kind(&self) -> CredentialKind {
        self.kind
    }

    /// Returns true if the user asked to be remembered.
    pub fn remember_me(&self) -> bool {
        self.remember_me
    }

    /// Returns the secret bytes.
    pub fn secret(&self) -> &Secret<Vec<u8>> {
        &self.secret
    }

    /// Serializes the secret to its canonical text form.
    ///
    /// Returns `None` when the secret is not valid UTF-8.
    pub fn to_canonical_text(&self) -> Option<Secret<String>> {
        std::str::from_utf8(self.secret.expose_secret())
            .ok()
            .map(|text| Secret::new(text.to_owned()))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("secret", &self.secret)
            .field("remember_me", &self.remember_me)
            .finish()
    }
}
