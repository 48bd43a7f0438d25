use crate::authentication::{AuthenticationBuilder, HandlerResult, REMEMBER_ME_ATTRIBUTE};
use crate::error::PopulateError;

/// Flags the authentication when the credential asked to be remembered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RememberMePopulator;

impl RememberMePopulator {
    /// Stable logical name.
    pub const NAME: &'static str = "rememberMe";

    /// Sets [`REMEMBER_ME_ATTRIBUTE`] to `"true"` if the credential is flagged.
    pub fn populate(
        &self,
        authentication: &mut AuthenticationBuilder,
        result: &HandlerResult,
    ) -> Result<(), PopulateError> {
        if result.credential().remember_me() {
            authentication
                .attributes_mut()
                .set(REMEMBER_ME_ATTRIBUTE, "true");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Credential;

    #[test]
    fn sets_flag_when_requested() {
        let mut builder = AuthenticationBuilder::new("casuser");
        let result = HandlerResult::new(
            "ldap",
            Credential::password("casuser", "p").with_remember_me(true),
        );

        RememberMePopulator.populate(&mut builder, &result).unwrap();
        assert_eq!(builder.attributes().first(REMEMBER_ME_ATTRIBUTE), Some("true"));
    }

    #[test]
    fn no_op_without_flag() {
        let mut builder = AuthenticationBuilder::new("casuser");
        let result = HandlerResult::new("ldap", Credential::password("casuser", "p"));

        RememberMePopulator.populate(&mut builder, &result).unwrap();
        assert!(!builder.attributes().contains(REMEMBER_ME_ATTRIBUTE));
    }
}
