//! Authentication results and the builder enriched by populators.
//!
//! An [`AuthenticationBuilder`] is created fresh for each authentication
//! event, threaded through an [`ExecutionPlan`](crate::ExecutionPlan), and
//! frozen into an [`Authentication`] once the pass completes.

use std::fmt;

use indexmap::IndexMap;

use crate::credential::{Credential, CredentialKind};

/// Attribute collecting the names of every handler that succeeded.
pub const SUCCESSFUL_HANDLERS_ATTRIBUTE: &str = "successfulAuthenticationHandlers";
/// Attribute set to `"true"` when the credential asked to be remembered.
pub const REMEMBER_ME_ATTRIBUTE: &str = "rememberMe";
/// Attribute recording the kind tags of the credentials that were used.
pub const CREDENTIAL_TYPE_ATTRIBUTE: &str = "credentialType";
/// Attribute holding the protected, cached credential.
pub const CACHED_CREDENTIAL_ATTRIBUTE: &str = "credential";

/// Ordered mapping from attribute name to its values.
///
/// Insertion order is preserved: populators later in a pass see the
/// attributes earlier ones wrote in the order they wrote them.
///
/// The cached credential attribute is redacted in `Debug` output.
///
/// # Examples
///
/// ```
/// use authn_metadata::Attributes;
///
/// let mut attributes = Attributes::new();
/// attributes.merge("successfulAuthenticationHandlers", "ldap");
/// attributes.merge("successfulAuthenticationHandlers", "ldap");
/// attributes.append("credentialType", "password");
/// attributes.append("credentialType", "password");
///
/// assert_eq!(attributes.get("successfulAuthenticationHandlers").map(|v| v.len()), Some(1));
/// assert_eq!(attributes.get("credentialType").map(|v| v.len()), Some(2));
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: IndexMap<String, Vec<String>>,
}

impl Attributes {
    /// Creates an empty attribute map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the values stored under `name`.
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    /// Returns the first value stored under `name`.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Returns true if an attribute named `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Appends `value` under `name`, keeping existing values.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.entry(name.into()).or_default().push(value.into());
    }

    /// Appends `value` under `name` unless it is already present.
    ///
    /// Returns true if the value was added.
    pub fn merge(&mut self, name: impl Into<String>, value: impl Into<String>) -> bool {
        let value = value.into();
        let values = self.entries.entry(name.into()).or_default();
        if values.contains(&value) {
            return false;
        }
        values.push(value);
        true
    }

    /// Replaces every value under `name` with a single `value`.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(name.into(), vec![value.into()]);
    }

    /// Iterates over attributes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Returns attribute names in insertion order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Returns the number of attributes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no attributes.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, values) in &self.entries {
            if name == CACHED_CREDENTIAL_ATTRIBUTE {
                map.entry(name, &"[REDACTED]");
            } else {
                map.entry(name, values);
            }
        }
        map.finish()
    }
}

/// Outcome of one authentication handler that succeeded.
///
/// Owns the credential the handler accepted, so it is not `Clone`; drop it
/// once the enrichment pass is over.
#[derive(Debug)]
pub struct HandlerResult {
    handler_name: String,
    credential: Credential,
    attributes: Attributes,
}

impl HandlerResult {
    /// Creates a handler result with no handler attributes.
    pub fn new(handler_name: impl Into<String>, credential: Credential) -> Self {
        Self {
            handler_name: handler_name.into(),
            credential,
            attributes: Attributes::new(),
        }
    }

    /// Adds an attribute produced by the handler.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.append(name, value);
        self
    }

    /// Returns the handler name.
    pub fn handler_name(&self) -> &str {
        &self.handler_name
    }

    /// Returns the credential the handler accepted.
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Returns the attributes the handler produced.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}

/// A processed handler result as retained on the authentication.
///
/// Keeps the credential kind but never the credential itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerSuccess {
    handler_name: String,
    credential_kind: CredentialKind,
    attributes: Attributes,
}

impl HandlerSuccess {
    fn from_result(result: &HandlerResult) -> Self {
        Self {
            handler_name: result.handler_name.clone(),
            credential_kind: result.credential.kind(),
            attributes: result.attributes.clone(),
        }
    }

    /// Returns the handler name.
    pub fn handler_name(&self) -> &str {
        &self.handler_name
    }

    /// Returns the kind of credential the handler accepted.
    pub fn credential_kind(&self) -> CredentialKind {
        self.credential_kind
    }

    /// Returns the attributes the handler produced.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}

/// Records that a populator contributed to a handler's result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopulationRecord {
    /// Handler whose result was enriched
    pub handler: String,
    /// Populator that enriched it
    pub populator: &'static str,
}

/// Authentication being assembled during one enrichment pass.
///
/// Exclusively owned by the pass. Populators mutate it through
/// [`attributes_mut`](Self::attributes_mut); the plan appends handler
/// successes and population records.
#[derive(Debug, Clone)]
pub struct AuthenticationBuilder {
    principal: String,
    attributes: Attributes,
    successes: Vec<HandlerSuccess>,
    metadata: Vec<PopulationRecord>,
}

impl AuthenticationBuilder {
    /// Starts a new authentication for `principal`.
    pub fn new(principal: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
            attributes: Attributes::new(),
            successes: Vec::new(),
            metadata: Vec::new(),
        }
    }

    /// Returns the principal identifier.
    pub fn principal(&self) -> &str {
        &self.principal
    }

    /// Returns the attributes collected so far.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Returns mutable access to the attributes.
    pub fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    /// Returns the handler successes processed so far.
    pub fn successes(&self) -> &[HandlerSuccess] {
        &self.successes
    }

    /// Returns the population records appended so far.
    pub fn metadata(&self) -> &[PopulationRecord] {
        &self.metadata
    }

    pub(crate) fn record_population(&mut self, handler: &str, populator: &'static str) {
        self.metadata.push(PopulationRecord {
            handler: handler.to_owned(),
            populator,
        });
    }

    pub(crate) fn record_success(&mut self, result: &HandlerResult) {
        self.successes.push(HandlerSuccess::from_result(result));
    }

    /// Freezes the builder into an immutable [`Authentication`].
    pub fn build(self) -> Authentication {
        Authentication {
            principal: self.principal,
            attributes: self.attributes,
            successes: self.successes,
            metadata: self.metadata,
        }
    }
}

/// An immutable, fully enriched authentication result.
#[derive(Debug, Clone)]
pub struct Authentication {
    principal: String,
    attributes: Attributes,
    successes: Vec<HandlerSuccess>,
    metadata: Vec<PopulationRecord>,
}

impl Authentication {
    /// Returns the principal identifier.
    pub fn principal(&self) -> &str {
        &self.principal
    }

    /// Returns the authentication attributes.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Returns every handler success, in processing order.
    pub fn successes(&self) -> &[HandlerSuccess] {
        &self.successes
    }

    /// Returns the population records, in the order they were appended.
    pub fn metadata(&self) -> &[PopulationRecord] {
        &self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_preserve_insertion_order() {
        let mut attributes = Attributes::new();
        attributes.set("b", "1");
        attributes.set("a", "2");
        attributes.append("c", "3");

        assert_eq!(attributes.names(), vec!["b", "a", "c"]);
    }

    #[test]
    fn merge_skips_duplicates() {
        let mut attributes = Attributes::new();
        assert!(attributes.merge("handlers", "ldap"));
        assert!(!attributes.merge("handlers", "ldap"));
        assert!(attributes.merge("handlers", "jdbc"));

        assert_eq!(
            attributes.get("handlers"),
            Some(&["ldap".to_string(), "jdbc".to_string()][..])
        );
    }

    #[test]
    fn set_replaces_values() {
        let mut attributes = Attributes::new();
        attributes.append("x", "1");
        attributes.append("x", "2");
        attributes.set("x", "3");

        assert_eq!(attributes.first("x"), Some("3"));
        assert_eq!(attributes.get("x").map(<[String]>::len), Some(1));
    }

    #[test]
    fn debug_redacts_cached_credential() {
        let mut attributes = Attributes::new();
        attributes.set(CACHED_CREDENTIAL_ATTRIBUTE, "czNjcjN0");
        attributes.set(CREDENTIAL_TYPE_ATTRIBUTE, "password");

        let output = format!("{:?}", attributes);
        assert!(!output.contains("czNjcjN0"));
        assert!(output.contains("[REDACTED]"));
        assert!(output.contains("password"));
    }

    #[test]
    fn build_keeps_successes_without_credential() {
        let result = HandlerResult::new("ldap", Credential::password("casuser", "s3cr3t"))
            .with_attribute("mail", "casuser@example.org");

        let mut builder = AuthenticationBuilder::new("casuser");
        builder.record_success(&result);
        builder.record_population("ldap", "successfulHandler");
        let authentication = builder.build();

        assert_eq!(authentication.principal(), "casuser");
        assert_eq!(authentication.successes().len(), 1);
        let success = &authentication.successes()[0];
        assert_eq!(success.handler_name(), "ldap");
        assert_eq!(success.credential_kind(), CredentialKind::Password);
        assert_eq!(success.attributes().first("mail"), Some("casuser@example.org"));
        assert_eq!(authentication.metadata()[0].populator, "successfulHandler");
        assert!(!format!("{:?}", authentication).contains("s3cr3t"));
    }
}
