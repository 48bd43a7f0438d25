use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use zeroize::Zeroizing;

use crate::authentication::{AuthenticationBuilder, HandlerResult, CACHED_CREDENTIAL_ATTRIBUTE};
use crate::cipher::CipherExecutor;
use crate::credential::{Credential, CredentialKind};
use crate::error::{PopulateError, PopulateErrorKind};

/// Captures the password credential, protected by a cipher ("clearpass").
///
/// The protected form is stored base64-encoded under
/// [`CACHED_CREDENTIAL_ATTRIBUTE`]. Only password credentials are captured.
///
/// # Examples
///
/// ```
/// use authn_metadata::{
///     AuthenticationBuilder, CacheCredentialsPopulator, CipherExecutor, Credential,
///     HandlerResult, CACHED_CREDENTIAL_ATTRIBUTE,
/// };
///
/// let populator = CacheCredentialsPopulator::new(CipherExecutor::noop());
/// let result = HandlerResult::new("ldap", Credential::password("casuser", "s3cr3t"));
/// let mut builder = AuthenticationBuilder::new("casuser");
///
/// populator.populate(&mut builder, &result).unwrap();
/// assert_eq!(builder.attributes().first(CACHED_CREDENTIAL_ATTRIBUTE), Some("czNjcjN0"));
/// ```
#[derive(Debug, Clone)]
pub struct CacheCredentialsPopulator {
    cipher: Arc<CipherExecutor>,
}

impl CacheCredentialsPopulator {
    /// Stable logical name.
    pub const NAME: &'static str = "cacheCredentials";

    /// Creates a populator protecting credentials with `cipher`.
    pub fn new(cipher: impl Into<Arc<CipherExecutor>>) -> Self {
        Self {
            cipher: cipher.into(),
        }
    }

    /// Returns the cipher protecting cached credentials.
    pub fn cipher(&self) -> &CipherExecutor {
        &self.cipher
    }

    /// Returns true for password credentials.
    pub fn supports(&self, credential: &Credential) -> bool {
        credential.kind() == CredentialKind::Password
    }

    /// Protects the credential and stores it on the authentication.
    ///
    /// # Errors
    ///
    /// Returns a non-fatal `Caching` error if the credential has no text form
    /// or the cipher fails. The attribute is left untouched in that case.
    pub fn populate(
        &self,
        authentication: &mut AuthenticationBuilder,
        result: &HandlerResult,
    ) -> Result<(), PopulateError> {
        let text = result.credential().to_canonical_text().ok_or_else(|| {
            PopulateError::new(
                Self::NAME,
                PopulateErrorKind::Caching,
                "credential secret is not valid UTF-8",
            )
        })?;

        let protected = Zeroizing::new(
            self.cipher
                .encode(text.expose_secret().as_bytes())
                .map_err(|e| {
                    PopulateError::new(Self::NAME, PopulateErrorKind::Caching, e.to_string())
                })?,
        );

        authentication
            .attributes_mut()
            .set(CACHED_CREDENTIAL_ATTRIBUTE, STANDARD.encode(protected.as_slice()));
        Ok(())
    }
}
