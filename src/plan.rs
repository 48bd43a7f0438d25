use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use crate::{
    authentication::{Authentication, AuthenticationBuilder, HandlerResult},
    error::{Error, PopulateError},
    logging::{PlanLog, TracingLog},
    populator::MetadataPopulator,
};

/// The ordered, deduplicated set of populators applied to every
/// authentication event.
///
/// A plan is built once (usually by [`MetadataPolicy`](crate::MetadataPolicy))
/// and then shared read-only by every enrichment pass.
///
/// # Examples
///
/// ```
/// use authn_metadata::{
///     Credential, CredentialTypePopulator, ExecutionPlan, HandlerResult,
///     SuccessfulHandlerPopulator,
/// };
///
/// let mut plan = ExecutionPlan::default();
/// plan.register(SuccessfulHandlerPopulator);
/// plan.register(CredentialTypePopulator);
///
/// let results = [HandlerResult::new("ldap", Credential::password("casuser", "s3cr3t"))];
/// let authentication = plan.enrich("casuser", &results).expect("no fatal populator");
///
/// assert_eq!(authentication.attributes().first("credentialType"), Some("password"));
/// ```
pub struct ExecutionPlan {
    populators: Vec<MetadataPopulator>,
    log: Arc<dyn PlanLog>,
}

impl ExecutionPlan {
    /// Creates an empty plan reporting non-fatal failures to `log`.
    pub fn new(log: Arc<dyn PlanLog>) -> Self {
        Self {
            populators: Vec::new(),
            log,
        }
    }

    /// Adds a populator to the plan, deduplicating by logical name.
    ///
    /// If a populator of the same kind is already registered the plan is left
    /// unchanged. Returns true if the populator was added.
    ///
    /// # Examples
    ///
    /// ```
    /// use authn_metadata::{ExecutionPlan, RememberMePopulator};
    ///
    /// let mut plan = ExecutionPlan::default();
    /// assert!(plan.register(RememberMePopulator));
    /// assert!(!plan.register(RememberMePopulator)); // second call is deduplicated
    /// assert_eq!(plan.len(), 1);
    /// ```
    pub fn register(&mut self, populator: impl Into<MetadataPopulator>) -> bool {
        let populator = populator.into();

        if self
            .populators
            .iter()
            .any(|p| Self::same_populator(p, &populator))
        {
            return false;
        }

        self.populators.push(populator);
        true
    }

    /// Runs every registered populator over `authentication`, in registration order.
    ///
    /// Each populator works on a copy of the current state. On success the
    /// copy replaces the state and a population record is appended. A
    /// non-fatal failure is reported to the plan's log and discarded, so the
    /// next populator sees the state from before the failure. Populators that
    /// do not support the handler's credential are skipped. Once the fold
    /// finishes the handler success is recorded.
    ///
    /// # Errors
    ///
    /// Returns the first fatal `PopulateError`; the pass stops there.
    pub fn apply(
        &self,
        authentication: AuthenticationBuilder,
        result: &HandlerResult,
    ) -> Result<AuthenticationBuilder, PopulateError> {
        let mut current = authentication;

        for populator in &self.populators {
            if !populator.supports(result.credential()) {
                continue;
            }

            let mut next = current.clone();
            match populator.populate(&mut next, result) {
                Ok(()) => {
                    next.record_population(result.handler_name(), populator.name());
                    current = next;
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => self.log.warn(format_args!(
                    "metadata populator '{}' skipped for handler '{}': {}",
                    populator.name(),
                    result.handler_name(),
                    e
                )),
            }
        }

        current.record_success(result);
        Ok(current)
    }

    /// Builds a complete authentication for `principal` from handler results.
    pub fn enrich(
        &self,
        principal: impl Into<String>,
        results: &[HandlerResult],
    ) -> Result<Authentication, PopulateError> {
        results
            .iter()
            .try_fold(AuthenticationBuilder::new(principal), |builder, result| {
                self.apply(builder, result)
            })
            .map(AuthenticationBuilder::build)
    }

    /// Returns the registered populators in order.
    pub fn populators(&self) -> &[MetadataPopulator] {
        &self.populators
    }

    /// Returns the logical names of the registered populators in order.
    pub fn names(&self) -> Vec<&'static str> {
        self.populators.iter().map(MetadataPopulator::name).collect()
    }

    /// Returns the number of registered populators.
    pub fn len(&self) -> usize {
        self.populators.len()
    }

    /// Returns true if no populator is registered.
    pub fn is_empty(&self) -> bool {
        self.populators.is_empty()
    }

    /// Determine whether two populators are the same logical populator.
    ///
    /// Populators are equivalent when they share a kind; a plan never holds
    /// two populators writing the same attribute.
    fn same_populator(a: &MetadataPopulator, b: &MetadataPopulator) -> bool {
        a.name() == b.name()
    }
}

impl Default for ExecutionPlan {
    fn default() -> Self {
        Self::new(Arc::new(TracingLog::default()))
    }
}

impl fmt::Debug for ExecutionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionPlan")
            .field("populators", &self.populators)
            .finish_non_exhaustive()
    }
}

/// Contributes populators into a plan.
///
/// Invoked once by whatever bootstraps the authentication pipeline.
pub trait PlanConfigurer {
    /// Registers this configurer's populators into `plan`.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration is unusable, for example when
    /// cipher key material is malformed.
    fn configure(&self, plan: &mut ExecutionPlan) -> Result<(), Error>;
}

/// A process-wide handle to the current plan.
///
/// Replacing the plan (after key rotation, say) only affects passes that
/// call [`current`](Self::current) afterwards; passes already holding the
/// previous `Arc` finish with it.
///
/// # Examples
///
/// ```
/// use authn_metadata::{ExecutionPlan, RememberMePopulator, SharedPlan};
///
/// let shared = SharedPlan::new(ExecutionPlan::default());
/// let before = shared.current();
///
/// let mut rotated = ExecutionPlan::default();
/// rotated.register(RememberMePopulator);
/// shared.replace(rotated);
///
/// assert_eq!(before.len(), 0);
/// assert_eq!(shared.current().len(), 1);
/// ```
#[derive(Debug)]
pub struct SharedPlan {
    current: RwLock<Arc<ExecutionPlan>>,
}

impl SharedPlan {
    /// Wraps `plan` as the current plan.
    pub fn new(plan: ExecutionPlan) -> Self {
        Self {
            current: RwLock::new(Arc::new(plan)),
        }
    }

    /// Returns a snapshot of the current plan.
    pub fn current(&self) -> Arc<ExecutionPlan> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Swaps in a new plan, returning the previous one.
    pub fn replace(&self, plan: ExecutionPlan) -> Arc<ExecutionPlan> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(plan))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authentication::{
        CACHED_CREDENTIAL_ATTRIBUTE, CREDENTIAL_TYPE_ATTRIBUTE, REMEMBER_ME_ATTRIBUTE,
        SUCCESSFUL_HANDLERS_ATTRIBUTE,
    };
    use crate::cipher::CipherExecutor;
    use crate::error::PopulateErrorKind;
    use crate::logging::WarningTrail;
    use crate::populator::{
        CacheCredentialsPopulator, CredentialTypePopulator, RememberMePopulator,
        SuccessfulHandlerPopulator,
    };
    use crate::{Credential, CredentialKind};

    fn full_plan(log: Arc<dyn PlanLog>) -> ExecutionPlan {
        let mut plan = ExecutionPlan::new(log);
        plan.register(SuccessfulHandlerPopulator);
        plan.register(RememberMePopulator);
        plan.register(CredentialTypePopulator);
        plan.register(CacheCredentialsPopulator::new(CipherExecutor::noop()));
        plan
    }

    #[test]
    fn register_deduplicates_by_kind() {
        let mut plan = ExecutionPlan::default();
        assert!(plan.register(SuccessfulHandlerPopulator));
        assert!(plan.register(CacheCredentialsPopulator::new(CipherExecutor::noop())));
        assert!(!plan.register(SuccessfulHandlerPopulator));
        assert!(!plan.register(CacheCredentialsPopulator::new(CipherExecutor::noop())));

        assert_eq!(plan.names(), vec!["successfulHandler", "cacheCredentials"]);
    }

    #[test]
    fn register_preserves_order_of_distinct_kinds() {
        let mut plan = ExecutionPlan::default();
        plan.register(CredentialTypePopulator);
        plan.register(RememberMePopulator);
        plan.register(CredentialTypePopulator);

        assert_eq!(plan.names(), vec!["credentialType", "rememberMe"]);
    }

    #[test]
    fn apply_runs_populators_in_order() {
        let plan = full_plan(Arc::new(WarningTrail::new()));
        let result = HandlerResult::new(
            "ldap",
            Credential::password("casuser", "s3cr3t").with_remember_me(true),
        );

        let builder = plan
            .apply(AuthenticationBuilder::new("casuser"), &result)
            .unwrap();

        assert_eq!(
            builder.attributes().names(),
            vec![
                SUCCESSFUL_HANDLERS_ATTRIBUTE,
                REMEMBER_ME_ATTRIBUTE,
                CREDENTIAL_TYPE_ATTRIBUTE,
                CACHED_CREDENTIAL_ATTRIBUTE,
            ]
        );
        let populators: Vec<_> = builder.metadata().iter().map(|r| r.populator).collect();
        assert_eq!(populators, plan.names());
        assert_eq!(builder.successes().len(), 1);
    }

    #[test]
    fn apply_skips_unsupported_populators() {
        let plan = full_plan(Arc::new(WarningTrail::new()));
        let result = HandlerResult::new("api", Credential::token("svc", "t"));

        let builder = plan
            .apply(AuthenticationBuilder::new("svc"), &result)
            .unwrap();

        assert!(!builder.attributes().contains(CACHED_CREDENTIAL_ATTRIBUTE));
        assert_eq!(builder.metadata().len(), 3);
    }

    #[test]
    fn non_fatal_failure_is_logged_and_skipped() {
        let trail = Arc::new(WarningTrail::new());
        let plan = full_plan(trail.clone());
        let result = HandlerResult::new("ldap", Credential::password("casuser", vec![0xff]));

        let builder = plan
            .apply(AuthenticationBuilder::new("casuser"), &result)
            .unwrap();

        assert!(!builder.attributes().contains(CACHED_CREDENTIAL_ATTRIBUTE));
        assert!(builder.attributes().contains(CREDENTIAL_TYPE_ATTRIBUTE));
        assert_eq!(trail.len(), 1);
        assert!(trail.contains("cacheCredentials"));
        assert!(builder
            .metadata()
            .iter()
            .all(|r| r.populator != CacheCredentialsPopulator::NAME));
    }

    #[test]
    fn fatal_failure_stops_the_pass() {
        let plan = full_plan(Arc::new(WarningTrail::new()));
        let result = HandlerResult::new("", Credential::password("casuser", "s3cr3t"));

        let err = plan
            .apply(AuthenticationBuilder::new("casuser"), &result)
            .unwrap_err();
        assert_eq!(err.kind(), PopulateErrorKind::MissingHandlerName);
    }

    #[test]
    fn enrich_folds_every_handler() {
        let plan = full_plan(Arc::new(WarningTrail::new()));
        let results = [
            HandlerResult::new("ldap", Credential::password("casuser", "s3cr3t")),
            HandlerResult::new(
                "mfa",
                Credential::new(CredentialKind::OneTimePassword, "casuser", "123456"),
            ),
        ];

        let authentication = plan.enrich("casuser", &results).unwrap();

        assert_eq!(
            authentication.attributes().get(SUCCESSFUL_HANDLERS_ATTRIBUTE),
            Some(&["ldap".to_string(), "mfa".to_string()][..])
        );
        assert_eq!(
            authentication.attributes().get(CREDENTIAL_TYPE_ATTRIBUTE),
            Some(&["password".to_string(), "one-time-password".to_string()][..])
        );
        assert_eq!(authentication.successes().len(), 2);
    }

    #[test]
    fn credential_type_is_recorded_per_handler() {
        let mut plan = ExecutionPlan::new(Arc::new(WarningTrail::new()));
        plan.register(CredentialTypePopulator);
        let results = [
            HandlerResult::new("ldap", Credential::password("casuser", "a")),
            HandlerResult::new("jdbc", Credential::password("casuser", "b")),
        ];

        let authentication = plan.enrich("casuser", &results).unwrap();

        assert_eq!(
            authentication.attributes().get(CREDENTIAL_TYPE_ATTRIBUTE),
            Some(&["password".to_string(), "password".to_string()][..])
        );
    }

    #[test]
    fn shared_plan_readers_keep_their_snapshot() {
        let shared = SharedPlan::new(full_plan(Arc::new(WarningTrail::new())));
        let in_flight = shared.current();

        let previous = shared.replace(ExecutionPlan::default());

        assert_eq!(in_flight.len(), 4);
        assert_eq!(previous.len(), 4);
        assert!(shared.current().is_empty());
    }

    #[test]
    fn plan_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ExecutionPlan>();
        assert_send_sync::<SharedPlan>();
    }
}
