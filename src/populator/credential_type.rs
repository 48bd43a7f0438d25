use crate::authentication::{AuthenticationBuilder, HandlerResult, CREDENTIAL_TYPE_ATTRIBUTE};
use crate::error::PopulateError;

/// Records which kinds of credential were used.
///
/// One entry per handler processed, in handler order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CredentialTypePopulator;

impl CredentialTypePopulator {
    /// Stable logical name.
    pub const NAME: &'static str = "credentialType";

    /// Appends the credential kind tag to [`CREDENTIAL_TYPE_ATTRIBUTE`].
    pub fn populate(
        &self,
        authentication: &mut AuthenticationBuilder,
        result: &HandlerResult,
    ) -> Result<(), PopulateError> {
        authentication
            .attributes_mut()
            .append(CREDENTIAL_TYPE_ATTRIBUTE, result.credential().kind().tag());
        Ok(())
    }
}
