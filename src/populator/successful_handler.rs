use crate::authentication::{AuthenticationBuilder, HandlerResult, SUCCESSFUL_HANDLERS_ATTRIBUTE};
use crate::error::{PopulateError, PopulateErrorKind};

/// Collects the names of every handler that succeeded.
///
/// Each handler name appears once under
/// [`SUCCESSFUL_HANDLERS_ATTRIBUTE`], in the order handlers were processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SuccessfulHandlerPopulator;

impl SuccessfulHandlerPopulator {
    /// Stable logical name.
    pub const NAME: &'static str = "successfulHandler";

    /// Appends the handler name to the successful handlers attribute.
    ///
    /// # Errors
    ///
    /// Returns a fatal `MissingHandlerName` error if the handler name is blank.
    pub fn populate(
        &self,
        authentication: &mut AuthenticationBuilder,
        result: &HandlerResult,
    ) -> Result<(), PopulateError> {
        let handler = result.handler_name().trim();
        if handler.is_empty() {
            return Err(PopulateError::new(
                Self::NAME,
                PopulateErrorKind::MissingHandlerName,
                "handler result does not name its handler",
            ));
        }

        authentication
            .attributes_mut()
            .merge(SUCCESSFUL_HANDLERS_ATTRIBUTE, handler);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Credential;

    #[test]
    fn appends_each_handler_once() {
        let mut builder = AuthenticationBuilder::new("casuser");
        let ldap = HandlerResult::new("ldap", Credential::password("casuser", "p"));
        let jdbc = HandlerResult::new("jdbc", Credential::password("casuser", "p"));

        SuccessfulHandlerPopulator.populate(&mut builder, &ldap).unwrap();
        SuccessfulHandlerPopulator.populate(&mut builder, &jdbc).unwrap();
        SuccessfulHandlerPopulator.populate(&mut builder, &ldap).unwrap();

        assert_eq!(
            builder.attributes().get(SUCCESSFUL_HANDLERS_ATTRIBUTE),
            Some(&["ldap".to_string(), "jdbc".to_string()][..])
        );
    }

    #[test]
    fn blank_handler_name_is_fatal() {
        let mut builder = AuthenticationBuilder::new("casuser");
        let result = HandlerResult::new("  ", Credential::password("casuser", "p"));

        let err = SuccessfulHandlerPopulator
            .populate(&mut builder, &result)
            .unwrap_err();
        assert!(err.is_fatal());
        assert!(builder.attributes().is_empty());
    }
}
