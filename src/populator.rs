//! Metadata populators.
//!
//! A populator takes the authentication being built plus one handler's result
//! and attaches derived metadata. The set of populators is closed:
//! - `SuccessfulHandlerPopulator`: names of handlers that succeeded
//! - `RememberMePopulator`: the remember-me flag
//! - `CredentialTypePopulator`: kinds of credential used
//! - `CacheCredentialsPopulator`: the protected credential (clearpass)

mod cache_credentials;
mod credential_type;
mod remember_me;
mod successful_handler;

pub use cache_credentials::CacheCredentialsPopulator;
pub use credential_type::CredentialTypePopulator;
pub use remember_me::RememberMePopulator;
pub use successful_handler::SuccessfulHandlerPopulator;

use crate::authentication::{AuthenticationBuilder, HandlerResult};
use crate::credential::Credential;
use crate::error::PopulateError;

/// A populator registered in an [`ExecutionPlan`](crate::ExecutionPlan).
///
/// Each variant wraps its own populator type; conversions from those types
/// let [`ExecutionPlan::register`](crate::ExecutionPlan::register) take any of
/// them directly.
#[derive(Debug, Clone)]
pub enum MetadataPopulator {
    /// Collects successful handler names
    SuccessfulHandler(SuccessfulHandlerPopulator),
    /// Records the remember-me flag
    RememberMe(RememberMePopulator),
    /// Records credential kinds
    CredentialType(CredentialTypePopulator),
    /// Caches the protected credential
    CacheCredentials(CacheCredentialsPopulator),
}

impl MetadataPopulator {
    /// Returns the stable logical name, used to deduplicate registrations.
    pub fn name(&self) -> &'static str {
        match self {
            MetadataPopulator::SuccessfulHandler(_) => SuccessfulHandlerPopulator::NAME,
            MetadataPopulator::RememberMe(_) => RememberMePopulator::NAME,
            MetadataPopulator::CredentialType(_) => CredentialTypePopulator::NAME,
            MetadataPopulator::CacheCredentials(_) => CacheCredentialsPopulator::NAME,
        }
    }

    /// Returns true if this populator applies to `credential`.
    pub fn supports(&self, credential: &Credential) -> bool {
        match self {
            MetadataPopulator::CacheCredentials(p) => p.supports(credential),
            _ => true,
        }
    }

    /// Enriches `authentication` with metadata derived from `result`.
    pub fn populate(
        &self,
        authentication: &mut AuthenticationBuilder,
        result: &HandlerResult,
    ) -> Result<(), PopulateError> {
        match self {
            MetadataPopulator::SuccessfulHandler(p) => p.populate(authentication, result),
            MetadataPopulator::RememberMe(p) => p.populate(authentication, result),
            MetadataPopulator::CredentialType(p) => p.populate(authentication, result),
            MetadataPopulator::CacheCredentials(p) => p.populate(authentication, result),
        }
    }

    /// Returns the cache populator if this is one.
    pub fn as_cache_credentials(&self) -> Option<&CacheCredentialsPopulator> {
        match self {
            MetadataPopulator::CacheCredentials(p) => Some(p),
            _ => None,
        }
    }
}

impl From<SuccessfulHandlerPopulator> for MetadataPopulator {
    fn from(p: SuccessfulHandlerPopulator) -> Self {
        MetadataPopulator::SuccessfulHandler(p)
    }
}

impl From<RememberMePopulator> for MetadataPopulator {
    fn from(p: RememberMePopulator) -> Self {
        MetadataPopulator::RememberMe(p)
    }
}

impl From<CredentialTypePopulator> for MetadataPopulator {
    fn from(p: CredentialTypePopulator) -> Self {
        MetadataPopulator::CredentialType(p)
    }
}

impl From<CacheCredentialsPopulator> for MetadataPopulator {
    fn from(p: CacheCredentialsPopulator) -> Self {
        MetadataPopulator::CacheCredentials(p)
    }
}
