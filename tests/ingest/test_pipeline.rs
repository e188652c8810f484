//! End-to-End Ingestion Pipeline Tests
//!
//! Drives the full device flow: register, seal a telemetry envelope,
//! sign the canonical bytes, ingest, and observe chain submission.

use chrono::Utc;
use lcore_node::api::wrap;
use lcore_node::crypto::{
    generate_iv, public_key_hex, seal_envelope, sign_message, EncryptionAlgorithm, KEY_SIZE,
};
use lcore_node::identity::{
    DeviceMetadata, DeviceRegistrationRequest, DeviceStatus, IdentityVerifier,
    InMemoryDeviceRegistry, InMemoryReplayStore, VerifierConfig,
};
use lcore_node::ingest::{
    AcceptedPayload, ChainSubmitter, DataPayload, InMemoryDeviceKeyStore, IngestConfig,
    IngestError, IngestPipeline, SubmitError, SubmitReceipt,
};
use rand::rngs::OsRng;
use rand::RngCore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{sleep, Duration};

struct RecordingSubmitter {
    submitted: Arc<RwLock<Vec<AcceptedPayload>>>,
}

#[async_trait::async_trait]
impl ChainSubmitter for RecordingSubmitter {
    async fn submit(&self, payload: &AcceptedPayload) -> Result<SubmitReceipt, SubmitError> {
        self.submitted.write().await.push(payload.clone());
        Ok(SubmitReceipt {
            tx_hash: ethers::types::H256::random(),
            block_number: Some(1),
        })
    }
}

struct FailingSubmitter;

#[async_trait::async_trait]
impl ChainSubmitter for FailingSubmitter {
    async fn submit(&self, _payload: &AcceptedPayload) -> Result<SubmitReceipt, SubmitError> {
        Err(SubmitError::Rejected("ledger refused".to_string()))
    }
}

/// Everything a test needs to act as both node and device
struct Harness {
    verifier: IdentityVerifier,
    pipeline: IngestPipeline,
    keys: Arc<InMemoryDeviceKeyStore>,
    submitted: Arc<RwLock<Vec<AcceptedPayload>>>,
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

fn harness() -> Harness {
    let registry = Arc::new(InMemoryDeviceRegistry::new());
    let replay = Arc::new(InMemoryReplayStore::new());
    let keys = Arc::new(InMemoryDeviceKeyStore::new());
    let submitted = Arc::new(RwLock::new(Vec::new()));

    let verifier = IdentityVerifier::new(
        registry.clone(),
        replay.clone(),
        VerifierConfig::default(),
    );
    let pipeline = IngestPipeline::new(
        registry,
        replay,
        keys.clone(),
        IngestConfig::default(),
    )
    .with_submitter(Arc::new(RecordingSubmitter {
        submitted: submitted.clone(),
    }));

    Harness {
        verifier,
        pipeline,
        keys,
        submitted,
    }
}

/// Register a device and provision its transport key
async fn register_device(h: &Harness, did: &str) -> ([u8; 32], [u8; 32]) {
    let mut seed = [0u8; 32];
    OsRng.fill_bytes(&mut seed);
    let mut transport_key = [0u8; KEY_SIZE];
    OsRng.fill_bytes(&mut transport_key);

    h.verifier
        .register_device(DeviceRegistrationRequest {
            did: did.to_string(),
            public_key: public_key_hex(&seed),
            metadata: metadata(),
        })
        .await
        .unwrap();
    h.keys.insert(did, transport_key).await;

    (seed, transport_key)
}

/// Build a payload the way a device would: seal, then sign
fn build_payload(
    did: &str,
    seed: &[u8; 32],
    transport_key: &[u8; KEY_SIZE],
    nonce: &str,
    timestamp: i64,
) -> DataPayload {
    let iv = generate_iv(&mut OsRng);
    let data = seal_envelope(
        b"{\"temperature\": 19.2}",
        EncryptionAlgorithm::ChaCha20Poly1305,
        transport_key,
        &iv,
    )
    .unwrap();

    let mut payload = DataPayload {
        device_id: did.to_string(),
        timestamp,
        data,
        signature: String::new(),
    };
    payload.signature = sign_message(seed, &payload.canonical_bytes(nonce));
    payload
}

#[tokio::test]
async fn test_registered_device_payload_accepted() {
    let h = harness();
    let (seed, key) = register_device(&h, "did:example:123").await;

    let payload = build_payload(
        "did:example:123",
        &seed,
        &key,
        "n1",
        Utc::now().timestamp_millis(),
    );
    let accepted = h.pipeline.ingest(payload, "n1").await.unwrap();

    assert_eq!(accepted.payload.device_id, "did:example:123");
    assert_eq!(accepted.nonce, "n1");

    // The submitter runs on a spawned task
    sleep(Duration::from_millis(50)).await;
    assert_eq!(h.submitted.read().await.len(), 1);
}

#[tokio::test]
async fn test_duplicate_nonce_rejected() {
    let h = harness();
    let (seed, key) = register_device(&h, "did:example:123").await;

    let payload = build_payload(
        "did:example:123",
        &seed,
        &key,
        "n1",
        Utc::now().timestamp_millis(),
    );

    h.pipeline.ingest(payload.clone(), "n1").await.unwrap();
    let result = h.pipeline.ingest(payload, "n1").await;

    assert!(matches!(result, Err(IngestError::DuplicateNonce { .. })));
}

#[tokio::test]
async fn test_concurrent_duplicate_admits_exactly_once() {
    let h = harness();
    let (seed, key) = register_device(&h, "did:example:123").await;

    let payload = build_payload(
        "did:example:123",
        &seed,
        &key,
        "n1",
        Utc::now().timestamp_millis(),
    );

    let p1 = h.pipeline.clone();
    let p2 = h.pipeline.clone();
    let a = payload.clone();
    let b = payload;
    let (r1, r2) = tokio::join!(p1.ingest(a, "n1"), p2.ingest(b, "n1"));

    let accepted = [&r1, &r2].iter().filter(|r| r.is_ok()).count();
    assert_eq!(accepted, 1);
    for r in [r1, r2] {
        if let Err(e) = r {
            assert!(matches!(e, IngestError::DuplicateNonce { .. }));
        }
    }
}

#[tokio::test]
async fn test_unknown_device_rejected_and_normalized() {
    let h = harness();
    let mut seed = [0u8; 32];
    OsRng.fill_bytes(&mut seed);
    let key = [0u8; KEY_SIZE];

    let payload = build_payload(
        "did:example:999",
        &seed,
        &key,
        "n1",
        Utc::now().timestamp_millis(),
    );
    let result = h.pipeline.ingest(payload, "n1").await;
    assert!(matches!(result, Err(IngestError::UnknownDevice(_))));

    let wrapped = wrap(result);
    assert!(!wrapped.success);
    let error = wrapped.error.unwrap();
    assert_eq!(error.code, "UnknownDevice");
    assert!(error.message.contains("did:example:999"));
}

#[tokio::test]
async fn test_revoked_device_rejected() {
    // Wire stores directly so the test can reach set_status
    let registry = Arc::new(InMemoryDeviceRegistry::new());
    let replay = Arc::new(InMemoryReplayStore::new());
    let keys = Arc::new(InMemoryDeviceKeyStore::new());
    let verifier =
        IdentityVerifier::new(registry.clone(), replay.clone(), VerifierConfig::default());
    let pipeline =
        IngestPipeline::new(registry.clone(), replay, keys.clone(), IngestConfig::default());

    let mut seed = [0u8; 32];
    OsRng.fill_bytes(&mut seed);
    let mut key = [0u8; KEY_SIZE];
    OsRng.fill_bytes(&mut key);
    verifier
        .register_device(DeviceRegistrationRequest {
            did: "did:example:123".to_string(),
            public_key: public_key_hex(&seed),
            metadata: metadata(),
        })
        .await
        .unwrap();
    keys.insert("did:example:123", key).await;

    use lcore_node::identity::DeviceRegistry;
    registry
        .set_status("did:example:123", DeviceStatus::Revoked)
        .await
        .unwrap();

    let payload = build_payload(
        "did:example:123",
        &seed,
        &key,
        "n1",
        Utc::now().timestamp_millis(),
    );
    let result = pipeline.ingest(payload, "n1").await;
    assert!(matches!(result, Err(IngestError::UnknownDevice(_))));
}

#[tokio::test]
async fn test_wrong_signing_key_rejected() {
    let h = harness();
    let (_seed, key) = register_device(&h, "did:example:123").await;

    let mut other_seed = [0u8; 32];
    OsRng.fill_bytes(&mut other_seed);

    let payload = build_payload(
        "did:example:123",
        &other_seed,
        &key,
        "n1",
        Utc::now().timestamp_millis(),
    );
    let result = h.pipeline.ingest(payload, "n1").await;
    assert!(matches!(result, Err(IngestError::BadSignature(_))));
}

#[tokio::test]
async fn test_signature_binds_nonce() {
    // A payload signed for nonce n1 must not be admittable under n2
    let h = harness();
    let (seed, key) = register_device(&h, "did:example:123").await;

    let payload = build_payload(
        "did:example:123",
        &seed,
        &key,
        "n1",
        Utc::now().timestamp_millis(),
    );
    let result = h.pipeline.ingest(payload, "n2").await;
    assert!(matches!(result, Err(IngestError::BadSignature(_))));
}

#[tokio::test]
async fn test_tampered_envelope_rejected() {
    let h = harness();
    let (seed, key) = register_device(&h, "did:example:123").await;

    let mut payload = build_payload(
        "did:example:123",
        &seed,
        &key,
        "n1",
        Utc::now().timestamp_millis(),
    );
    // Corrupt the ciphertext and re-sign so only the tag check can catch it
    let mut ct = hex::decode(&payload.data.ciphertext).unwrap();
    ct[0] ^= 0xff;
    payload.data.ciphertext = hex::encode(ct);
    payload.signature = sign_message(&seed, &payload.canonical_bytes("n1"));

    let result = h.pipeline.ingest(payload, "n1").await;
    assert!(matches!(result, Err(IngestError::BadEnvelope(_))));
}

#[tokio::test]
async fn test_stale_payload_rejected() {
    let h = harness();
    let (seed, key) = register_device(&h, "did:example:123").await;

    let old = Utc::now().timestamp_millis()
        - IngestConfig::default().freshness_window_ms
        - 60_000;
    let payload = build_payload("did:example:123", &seed, &key, "n1", old);

    let result = h.pipeline.ingest(payload, "n1").await;
    assert!(matches!(result, Err(IngestError::Stale { .. })));
}

#[tokio::test]
async fn test_missing_transport_key_rejected() {
    let h = harness();
    let mut seed = [0u8; 32];
    OsRng.fill_bytes(&mut seed);

    // Registered but never provisioned with a transport key
    h.verifier
        .register_device(DeviceRegistrationRequest {
            did: "did:example:456".to_string(),
            public_key: public_key_hex(&seed),
            metadata: metadata(),
        })
        .await
        .unwrap();

    let key = [0u8; KEY_SIZE];
    let payload = build_payload(
        "did:example:456",
        &seed,
        &key,
        "n1",
        Utc::now().timestamp_millis(),
    );
    let result = h.pipeline.ingest(payload, "n1").await;
    assert!(matches!(result, Err(IngestError::KeyUnavailable(_))));
}

#[tokio::test]
async fn test_submitter_failure_does_not_unwind_admission() {
    let registry = Arc::new(InMemoryDeviceRegistry::new());
    let replay = Arc::new(InMemoryReplayStore::new());
    let keys = Arc::new(InMemoryDeviceKeyStore::new());
    let verifier =
        IdentityVerifier::new(registry.clone(), replay.clone(), VerifierConfig::default());
    let pipeline = IngestPipeline::new(registry, replay, keys.clone(), IngestConfig::default())
        .with_submitter(Arc::new(FailingSubmitter));

    let mut seed = [0u8; 32];
    OsRng.fill_bytes(&mut seed);
    let mut key = [0u8; KEY_SIZE];
    OsRng.fill_bytes(&mut key);
    verifier
        .register_device(DeviceRegistrationRequest {
            did: "did:example:123".to_string(),
            public_key: public_key_hex(&seed),
            metadata: metadata(),
        })
        .await
        .unwrap();
    keys.insert("did:example:123", key).await;

    let payload = build_payload(
        "did:example:123",
        &seed,
        &key,
        "n1",
        Utc::now().timestamp_millis(),
    );

    // Admission succeeds even though every submission attempt fails
    let accepted = pipeline.ingest(payload, "n1").await.unwrap();
    assert_eq!(accepted.nonce, "n1");
    sleep(Duration::from_millis(50)).await;

    // And the nonce stays consumed
    let payload2 = build_payload(
        "did:example:123",
        &seed,
        &key,
        "n1",
        Utc::now().timestamp_millis(),
    );
    let result = pipeline.ingest(payload2, "n1").await;
    assert!(matches!(result, Err(IngestError::DuplicateNonce { .. })));
}
