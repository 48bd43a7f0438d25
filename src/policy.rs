//! Decides, from a settings snapshot, which populators run and how cached
//! credentials are protected.

use std::sync::Arc;

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::OsRng;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use zeroize::Zeroizing;

use crate::{
    cipher::{check_signing_key_size, CipherAlgorithm, CipherExecutor, CompositeCipher},
    error::{Error, KeyMaterialError, KeyMaterialErrorKind},
    logging::PlanLog,
    plan::{ExecutionPlan, PlanConfigurer},
    populator::{
        CacheCredentialsPopulator, CredentialTypePopulator, RememberMePopulator,
        SuccessfulHandlerPopulator,
    },
    settings::{ClearpassSettings, KeySettings},
};

/// Warning emitted when credentials are cached with crypto turned off.
pub const UNPROTECTED_CACHING_WARNING: &str = "Credentials are captured and cached via clearpass, \
    yet crypto operations for the cached credential are turned off: credentials will be cached \
    without protection. Sharing the user credential with other applications is generally NOT \
    recommended and MUST only be used as a last resort. Enable the crypto settings so the \
    captured credential is signed and encrypted.";

/// Warning emitted when credentials are cached with crypto turned on.
pub const CREDENTIAL_SHARING_WARNING: &str = "Credentials are captured and cached via clearpass. \
    Sharing the user credential with other applications is generally NOT recommended, may lead \
    to security vulnerabilities and MUST only be used as a last resort.";

/// Builds execution plans from a [`ClearpassSettings`] snapshot.
///
/// The decision is deterministic:
/// 1. The successful-handler, remember-me and credential-type populators are
///    always registered, in that order.
/// 2. With caching on and crypto on, a [`CompositeCipher`] is built from the
///    key material. Malformed key material is an error, never a fallback.
/// 3. With caching on and crypto off, the no-op cipher is used and a warning
///    is reported.
/// 4. With caching on, the cache populator is registered last.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use authn_metadata::{ClearpassSettings, MetadataPolicy, WarningTrail};
///
/// let settings = ClearpassSettings::default();
/// let trail = Arc::new(WarningTrail::new());
///
/// let plan = MetadataPolicy::new(&settings, trail.clone()).build_plan().unwrap();
///
/// assert_eq!(plan.len(), 3);
/// assert!(trail.is_empty());
/// ```
pub struct MetadataPolicy<'a> {
    settings: &'a ClearpassSettings,
    log: Arc<dyn PlanLog>,
}

impl<'a> MetadataPolicy<'a> {
    /// Creates a policy over `settings`, reporting warnings to `log`.
    ///
    /// Plans built by this policy report their own non-fatal failures to the
    /// same log.
    pub fn new(settings: &'a ClearpassSettings, log: Arc<dyn PlanLog>) -> Self {
        Self { settings, log }
    }

    /// Builds a new plan and configures it.
    ///
    /// # Errors
    ///
    /// Returns `Error::KeyMaterial` when crypto is enabled and the key
    /// material cannot produce a cipher.
    pub fn build_plan(&self) -> Result<ExecutionPlan, Error> {
        let mut plan = ExecutionPlan::new(Arc::clone(&self.log));
        self.configure(&mut plan)?;
        Ok(plan)
    }

    /// Resolves the cipher protecting cached credentials.
    ///
    /// Returns the no-op cipher unless both caching and crypto are enabled.
    pub fn resolve_cipher(&self) -> Result<CipherExecutor, KeyMaterialError> {
        if !self.settings.cache_credential {
            return Ok(CipherExecutor::noop());
        }

        let crypto = &self.settings.crypto;
        if !crypto.enabled {
            self.log.warn(format_args!("{}", UNPROTECTED_CACHING_WARNING));
            return Ok(CipherExecutor::noop());
        }

        let encryption_key_size = crypto.encryption_key_size();
        let signing_key_size = crypto.signing_key_size();
        // Sizes are checked before any key is generated or announced.
        CipherAlgorithm::resolve(&crypto.alg, encryption_key_size)?;
        check_signing_key_size(signing_key_size)?;

        let encryption_key =
            self.key_or_generate(&crypto.encryption, "encryption", encryption_key_size)?;
        let signing_key = self.key_or_generate(&crypto.signing, "signing", signing_key_size)?;

        let cipher = CompositeCipher::with_key_sizes(
            &crypto.alg,
            encryption_key,
            signing_key,
            encryption_key_size,
            signing_key_size,
        )?;
        Ok(cipher.into())
    }

    /// Decodes the configured key, or generates one when the key is blank.
    fn key_or_generate(
        &self,
        key: &KeySettings,
        purpose: &str,
        key_size: u32,
    ) -> Result<Zeroizing<Vec<u8>>, KeyMaterialError> {
        if !key.key.is_blank() {
            return decode_key(key, purpose);
        }

        self.log.warn(format_args!(
            "No {} key is defined for cached credentials; a random {}-bit key was generated. \
             Credentials cached by this process cannot be decoded by other nodes or after a restart.",
            purpose, key_size
        ));
        let mut generated = Zeroizing::new(vec![0u8; key_size as usize / 8]);
        OsRng.fill_bytes(&mut generated);
        Ok(generated)
    }
}

impl PlanConfigurer for MetadataPolicy<'_> {
    fn configure(&self, plan: &mut ExecutionPlan) -> Result<(), Error> {
        plan.register(SuccessfulHandlerPopulator);
        plan.register(RememberMePopulator);
        plan.register(CredentialTypePopulator);

        if !self.settings.cache_credential {
            return Ok(());
        }

        let cipher = self.resolve_cipher()?;
        if cipher.is_enabled() {
            self.log.warn(format_args!("{}", CREDENTIAL_SHARING_WARNING));
        }
        plan.register(CacheCredentialsPopulator::new(cipher));
        Ok(())
    }
}

/// Decodes base64 key material, accepting the standard and URL-safe alphabets.
fn decode_key(key: &KeySettings, purpose: &str) -> Result<Zeroizing<Vec<u8>>, KeyMaterialError> {
    let text = key.key.expose_secret().trim();
    STANDARD
        .decode(text)
        .or_else(|_| URL_SAFE_NO_PAD.decode(text.trim_end_matches('=')))
        .map(Zeroizing::new)
        .map_err(|_| {
            KeyMaterialError::new(
                KeyMaterialErrorKind::InvalidEncoding,
                format!("{} key is not valid base64", purpose),
            )
        })
}
