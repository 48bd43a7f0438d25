//! Authentication metadata population with protected credential caching.
//!
//! This crate enriches authentication results through an ordered pipeline:
//! - **Populators**: stages that attach metadata for each successful handler
//! - **Execution plan**: the ordered, deduplicated set of populators
//! - **Clearpass**: optional capture of the password, signed and encrypted
//!   before it is stored on the authentication
//!
//! # Core Types
//!
//! - [`MetadataPolicy`]: reads [`ClearpassSettings`] once and builds the plan
//! - [`ExecutionPlan`]: applies populators to each [`HandlerResult`]
//! - [`CipherExecutor`]: [`NoOpCipher`] or [`CompositeCipher`] protecting cached credentials
//! - [`Secret<T>`]: wrapper that redacts credentials and keys in logs/output
//! - [`PlanLog`]: warning sink handed to the policy and the plan
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use authn_metadata::{
//!     ClearpassSettings, Credential, HandlerResult, MetadataPolicy, TracingLog,
//!     CACHED_CREDENTIAL_ATTRIBUTE,
//! };
//!
//! let settings = ClearpassSettings::from_toml_str(r#"
//!     cache_credential = true
//!
//!     [crypto.encryption]
//!     key = "AQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQE="
//!
//!     [crypto.signing]
//!     key = "AgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAg=="
//! "#).expect("valid settings");
//!
//! let plan = MetadataPolicy::new(&settings, Arc::new(TracingLog::new("clearpass")))
//!     .build_plan()
//!     .expect("valid key material");
//!
//! let results = [HandlerResult::new("ldap", Credential::password("casuser", "s3cr3t"))];
//! let authentication = plan.enrich("casuser", &results).expect("no fatal populator");
//!
//! assert!(authentication.attributes().contains(CACHED_CREDENTIAL_ATTRIBUTE));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod authentication;
mod cipher;
mod credential;
mod error;
mod logging;
mod plan;
mod policy;
mod populator;
mod secret;
mod settings;

pub use authentication::{
    Attributes, Authentication, AuthenticationBuilder, HandlerResult, HandlerSuccess,
    PopulationRecord, CACHED_CREDENTIAL_ATTRIBUTE, CREDENTIAL_TYPE_ATTRIBUTE,
    REMEMBER_ME_ATTRIBUTE, SUCCESSFUL_HANDLERS_ATTRIBUTE,
};
pub use cipher::{CipherAlgorithm, CipherExecutor, CompositeCipher, NoOpCipher, NONCE_LEN};
pub use credential::{Credential, CredentialKind};
pub use error::{
    DecodeError, DecodeErrorKind, EncodeError, Error, KeyMaterialError, KeyMaterialErrorKind,
    PopulateError, PopulateErrorKind, SettingsError,
};
pub use logging::{PlanLog, TracingLog, WarningTrail};
pub use plan::{ExecutionPlan, PlanConfigurer, SharedPlan};
pub use policy::{MetadataPolicy, CREDENTIAL_SHARING_WARNING, UNPROTECTED_CACHING_WARNING};
pub use populator::{
    CacheCredentialsPopulator, CredentialTypePopulator, MetadataPopulator, RememberMePopulator,
    SuccessfulHandlerPopulator,
};
pub use secret::Secret;
pub use settings::{
    ClearpassSettings, CryptoSettings, KeySettings, DEFAULT_ALGORITHM,
    DEFAULT_ENCRYPTION_KEY_SIZE, DEFAULT_SIGNING_KEY_SIZE,
};
