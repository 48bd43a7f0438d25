use std::sync::Arc;
use std::thread;

use authn_metadata::{
    ClearpassSettings, CipherExecutor, Credential, CredentialKind, DecodeErrorKind, Error,
    HandlerResult, KeySettings, MetadataPolicy, PlanLog, SharedPlan, TracingLog,
    WarningTrail, CACHED_CREDENTIAL_ATTRIBUTE, CREDENTIAL_TYPE_ATTRIBUTE, REMEMBER_ME_ATTRIBUTE,
    SUCCESSFUL_HANDLERS_ATTRIBUTE,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn settings(caching: bool, crypto: bool) -> ClearpassSettings {
    let mut settings = ClearpassSettings::default();
    settings.cache_credential = caching;
    settings.crypto.enabled = crypto;
    settings.crypto.alg = "AES".to_string();
    settings.crypto.encryption = KeySettings::new(STANDARD.encode([0x42u8; 32]), 256);
    settings.crypto.signing = KeySettings::new(STANDARD.encode([0x24u8; 64]), 512);
    settings
}

fn cached_cipher(plan: &authn_metadata::ExecutionPlan) -> &CipherExecutor {
    plan.populators()[3]
        .as_cache_credentials()
        .expect("fourth populator caches credentials")
        .cipher()
}

#[test]
fn loaded_settings_never_print_key_material() {
    let encryption = STANDARD.encode([0x42u8; 32]);
    let signing = STANDARD.encode([0x24u8; 64]);
    let document = format!(
        "cache_credential = true\n\n[crypto.encryption]\nkey = \"{}\"\n\n[crypto.signing]\nkey = \"{}\"\n",
        encryption, signing
    );
    let settings = ClearpassSettings::from_toml_str(&document).unwrap();

    let debug_out = format!("{:?}", settings);
    assert!(!debug_out.contains(&encryption));
    assert!(!debug_out.contains(&signing));
    assert_eq!(debug_out.matches("[REDACTED]").count(), 2);

    // Keys still drive a working cipher.
    let plan = MetadataPolicy::new(&settings, Arc::new(WarningTrail::new()))
        .build_plan()
        .unwrap();
    let protected = cached_cipher(&plan).encode(b"s3cr3t").unwrap();
    assert_eq!(cached_cipher(&plan).decode(&protected).unwrap(), b"s3cr3t");
}

#[test]
fn caching_with_crypto_round_trips_sample_credential() {
    init_tracing();
    let settings = settings(true, true);
    let trail = Arc::new(WarningTrail::new());

    let plan = MetadataPolicy::new(&settings, trail.clone())
        .build_plan()
        .expect("valid key material");
    assert_eq!(plan.len(), 4);
    assert_eq!(trail.len(), 1);

    let cipher = cached_cipher(&plan);
    let CipherExecutor::Composite(composite) = cipher else {
        panic!("expected a composite cipher");
    };

    let first = cipher.encode(b"s3cr3t").unwrap();
    let second = cipher.encode(b"s3cr3t").unwrap();
    assert_eq!(first.len(), composite.protected_len(6));
    assert_eq!(first.len(), second.len());
    assert_eq!(cipher.decode(&first).unwrap(), b"s3cr3t");
}

#[test]
fn caching_without_crypto_stores_plaintext_and_warns_once() {
    let settings = settings(true, false);
    let trail = Arc::new(WarningTrail::new());

    let plan = MetadataPolicy::new(&settings, trail.clone())
        .build_plan()
        .unwrap();

    assert_eq!(plan.len(), 4);
    let cipher = cached_cipher(&plan);
    assert!(!cipher.is_enabled());
    assert_eq!(cipher.encode(b"s3cr3t").unwrap(), b"s3cr3t");
    assert_eq!(trail.len(), 1);
}

#[test]
fn caching_disabled_never_captures_credentials() {
    let settings = settings(false, true);
    let trail = Arc::new(WarningTrail::new());
    let plan = MetadataPolicy::new(&settings, trail.clone())
        .build_plan()
        .unwrap();

    let results = [HandlerResult::new(
        "ldap",
        Credential::password("casuser", "s3cr3t"),
    )];
    let authentication = plan.enrich("casuser", &results).unwrap();

    assert_eq!(plan.len(), 3);
    assert!(plan.populators().iter().all(|p| p.as_cache_credentials().is_none()));
    assert!(!authentication.attributes().contains(CACHED_CREDENTIAL_ATTRIBUTE));
    assert!(trail.is_empty());
}

#[test]
fn end_to_end_enrichment_releases_original_password() {
    let settings = settings(true, true);
    let plan = MetadataPolicy::new(&settings, Arc::new(WarningTrail::new()))
        .build_plan()
        .unwrap();

    let results = [
        HandlerResult::new(
            "ldap",
            Credential::password("casuser", "s3cr3t").with_remember_me(true),
        ),
        HandlerResult::new(
            "otp",
            Credential::new(CredentialKind::OneTimePassword, "casuser", "912345"),
        ),
    ];
    let authentication = plan.enrich("casuser", &results).unwrap();
    let attributes = authentication.attributes();

    assert_eq!(
        attributes.get(SUCCESSFUL_HANDLERS_ATTRIBUTE),
        Some(&["ldap".to_string(), "otp".to_string()][..])
    );
    assert_eq!(attributes.first(REMEMBER_ME_ATTRIBUTE), Some("true"));
    assert_eq!(
        attributes.get(CREDENTIAL_TYPE_ATTRIBUTE),
        Some(&["password".to_string(), "one-time-password".to_string()][..])
    );

    let protected = STANDARD
        .decode(attributes.first(CACHED_CREDENTIAL_ATTRIBUTE).unwrap())
        .unwrap();
    assert_eq!(cached_cipher(&plan).decode(&protected).unwrap(), b"s3cr3t");

    let debug_out = format!("{:?}", authentication);
    assert!(!debug_out.contains("s3cr3t"));
    assert!(!debug_out.contains(attributes.first(CACHED_CREDENTIAL_ATTRIBUTE).unwrap()));
}

#[test]
fn tampered_cached_credential_is_rejected() {
    let settings = settings(true, true);
    let plan = MetadataPolicy::new(&settings, Arc::new(WarningTrail::new()))
        .build_plan()
        .unwrap();
    let cipher = cached_cipher(&plan);

    let mut protected = cipher.encode(b"s3cr3t").unwrap();
    protected[0] ^= 0x80;

    let err = cipher.decode(&protected).unwrap_err();
    assert_eq!(err.kind(), DecodeErrorKind::SignatureMismatch);
}

#[test]
fn malformed_key_material_aborts_startup() {
    let mut settings = settings(true, true);
    settings.crypto.alg = "DES".to_string();

    let result = MetadataPolicy::new(&settings, Arc::new(TracingLog::default())).build_plan();
    assert!(matches!(result, Err(Error::KeyMaterial(_))));
}

#[test]
fn concurrent_passes_share_one_plan() {
    let settings = settings(true, true);
    let log: Arc<dyn PlanLog> = Arc::new(WarningTrail::new());
    let plan = Arc::new(MetadataPolicy::new(&settings, log).build_plan().unwrap());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let plan = Arc::clone(&plan);
            thread::spawn(move || {
                let principal = format!("user-{}", i);
                let password = format!("pw-{}", i);
                let results = [HandlerResult::new(
                    "ldap",
                    Credential::password(principal.clone(), password.clone()),
                )];
                let authentication = plan.enrich(principal, &results).unwrap();
                let protected = STANDARD
                    .decode(
                        authentication
                            .attributes()
                            .first(CACHED_CREDENTIAL_ATTRIBUTE)
                            .unwrap(),
                    )
                    .unwrap();
                let cipher = plan.populators()[3].as_cache_credentials().unwrap().cipher();
                assert_eq!(cipher.decode(&protected).unwrap(), password.as_bytes());
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("enrichment pass panicked");
    }
}

#[test]
fn rotated_plan_is_seen_by_new_passes_only() {
    let shared = SharedPlan::new(
        MetadataPolicy::new(&settings(false, true), Arc::new(WarningTrail::new()))
            .build_plan()
            .unwrap(),
    );
    let in_flight = shared.current();

    shared.replace(
        MetadataPolicy::new(&settings(true, true), Arc::new(WarningTrail::new()))
            .build_plan()
            .unwrap(),
    );

    assert_eq!(in_flight.len(), 3);
    assert_eq!(shared.current().len(), 4);
}
