//! Device Authentication Flow Tests
//!
//! Registration through token issuance, including the failure paths
//! boundary callers see through the response normalizer.

use chrono::Utc;
use lcore_node::api::wrap;
use lcore_node::crypto::{public_key_hex, sign_message};
use lcore_node::identity::{
    AuthError, DeviceCredential, DeviceMetadata, DeviceRegistrationRequest, DeviceRegistry,
    DeviceStatus, IdentityVerifier, InMemoryDeviceRegistry, InMemoryReplayStore, VerifierConfig,
};
use rand::rngs::OsRng;
use rand::RngCore;
use std::collections::HashMap;
use std::sync::Arc;

fn seed() -> [u8; 32] {
    let mut s = [0u8; 32];
    OsRng.fill_bytes(&mut s);
    s
}

fn metadata() -> DeviceMetadata {
    DeviceMetadata {
        manufacturer: "acme".to_string(),
        model: "env-sensor".to_string(),
        serial_number: "SN-100".to_string(),
        firmware_version: "2.1.0".to_string(),
        extra: HashMap::new(),
    }
}

fn credential(seed: &[u8; 32], did: &str, nonce: &str) -> DeviceCredential {
    let timestamp = Utc::now().timestamp_millis();
    let message = IdentityVerifier::credential_message(did, nonce, timestamp);
    DeviceCredential {
        did: did.to_string(),
        signature: sign_message(seed, &message),
        timestamp,
        nonce: nonce.to_string(),
    }
}

fn setup() -> (IdentityVerifier, Arc<InMemoryDeviceRegistry>) {
    let registry = Arc::new(InMemoryDeviceRegistry::new());
    let verifier = IdentityVerifier::new(
        registry.clone(),
        Arc::new(InMemoryReplayStore::new()),
        VerifierConfig::default(),
    );
    (verifier, registry)
}

#[tokio::test]
async fn test_register_then_authenticate_issues_token() {
    let (verifier, _) = setup();
    let device_seed = seed();

    let registered = verifier
        .register_device(DeviceRegistrationRequest {
            did: "did:example:123".to_string(),
            public_key: public_key_hex(&device_seed),
            metadata: metadata(),
        })
        .await
        .unwrap();
    assert_eq!(registered.status, DeviceStatus::Active);

    let auth = verifier
        .authenticate(&credential(&device_seed, "did:example:123", "n1"))
        .await
        .unwrap();

    // JWTs have three dot-separated segments
    assert_eq!(auth.token.split('.').count(), 3);
    assert!(auth.expires_at > Utc::now().timestamp_millis());
}

#[tokio::test]
async fn test_distinct_nonces_authenticate_repeatedly() {
    let (verifier, _) = setup();
    let device_seed = seed();

    verifier
        .register_device(DeviceRegistrationRequest {
            did: "did:example:123".to_string(),
            public_key: public_key_hex(&device_seed),
            metadata: metadata(),
        })
        .await
        .unwrap();

    for nonce in ["n1", "n2", "n3"] {
        verifier
            .authenticate(&credential(&device_seed, "did:example:123", nonce))
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_revoked_device_cannot_authenticate() {
    let (verifier, registry) = setup();
    let device_seed = seed();

    verifier
        .register_device(DeviceRegistrationRequest {
            did: "did:example:123".to_string(),
            public_key: public_key_hex(&device_seed),
            metadata: metadata(),
        })
        .await
        .unwrap();
    registry
        .set_status("did:example:123", DeviceStatus::Revoked)
        .await
        .unwrap();

    let result = verifier
        .authenticate(&credential(&device_seed, "did:example:123", "n1"))
        .await;
    assert!(matches!(result, Err(AuthError::NotActive { .. })));
}

#[tokio::test]
async fn test_duplicate_did_normalized_for_boundary() {
    let (verifier, _) = setup();

    verifier
        .register_device(DeviceRegistrationRequest {
            did: "did:example:123".to_string(),
            public_key: public_key_hex(&seed()),
            metadata: metadata(),
        })
        .await
        .unwrap();

    let result = verifier
        .register_device(DeviceRegistrationRequest {
            did: "did:example:123".to_string(),
            public_key: public_key_hex(&seed()),
            metadata: metadata(),
        })
        .await;

    let wrapped = wrap(result);
    assert!(!wrapped.success);
    assert_eq!(wrapped.error.unwrap().code, "DuplicateDID");
    assert!(!wrapped.meta.request_id.is_empty());
}

#[tokio::test]
async fn test_credential_freshness_edges() {
    let (verifier, _) = setup();
    let device_seed = seed();
    let config = VerifierConfig::default();
    let did = "did:example:123";

    // Exactly at the window edge: accepted
    let now = Utc::now().timestamp_millis();
    let edge = now - config.freshness_window_ms + 2_000; // margin for test runtime
    let message = IdentityVerifier::credential_message(did, "n1", edge);
    let cred = DeviceCredential {
        did: did.to_string(),
        signature: sign_message(&device_seed, &message),
        timestamp: edge,
        nonce: "n1".to_string(),
    };
    assert!(verifier
        .verify_credential(&cred, &public_key_hex(&device_seed))
        .is_ok());

    // Far beyond the window: rejected
    let stale = now - config.freshness_window_ms - 60_000;
    let message = IdentityVerifier::credential_message(did, "n2", stale);
    let cred = DeviceCredential {
        did: did.to_string(),
        signature: sign_message(&device_seed, &message),
        timestamp: stale,
        nonce: "n2".to_string(),
    };
    assert!(matches!(
        verifier.verify_credential(&cred, &public_key_hex(&device_seed)),
        Err(AuthError::Expired { .. })
    ));
}
