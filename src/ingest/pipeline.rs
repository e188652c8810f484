// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Payload Ingestion Pipeline
//!
//! Receives a `DataPayload`, verifies device identity, signature,
//! envelope integrity and freshness, admits it exactly once per
//! `(deviceId, nonce)`, and hands it to the chain/rollup submitter.
//!
//! Verification is ordered so that no externally visible side effect
//! happens before the atomic admission step: abandoning an in-flight
//! `ingest` call before that point is always safe.
//!
//! Submitter failures never unwind the admission decision; they are
//! retried on a spawned task and reported through logs.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info, warn};

use crate::crypto::{open_envelope, verify_signature, CryptoError, EncryptionAlgorithm};
use crate::identity::{DeviceRegistry, DeviceStatus, Did, ReplayStore};

use super::payload::{AcceptedPayload, DataPayload, SubmitReceipt};

/// Ingestion failures
#[derive(Debug, Clone, Error, PartialEq)]
pub enum IngestError {
    #[error("device '{0}' is unknown or not active")]
    UnknownDevice(String),

    #[error("payload signature verification failed for '{0}'")]
    BadSignature(String),

    #[error("envelope verification failed: {0}")]
    BadEnvelope(String),

    #[error("payload is {age_ms}ms old, outside the {window_ms}ms window")]
    Stale { age_ms: i64, window_ms: i64 },

    #[error("nonce '{nonce}' already consumed for '{did}'")]
    DuplicateNonce { did: String, nonce: String },

    #[error("no transport key available for '{0}'")]
    KeyUnavailable(String),

    #[error("backing store unavailable: {0}")]
    StoreUnavailable(String),
}

impl IngestError {
    /// Stable error code for the response normalizer
    pub fn code(&self) -> &'static str {
        match self {
            IngestError::UnknownDevice(_) => "UnknownDevice",
            IngestError::BadSignature(_) => "BadSignature",
            IngestError::BadEnvelope(_) => "BadEnvelope",
            IngestError::Stale { .. } => "Stale",
            IngestError::DuplicateNonce { .. } => "DuplicateNonce",
            IngestError::KeyUnavailable(_) => "KeyUnavailable",
            IngestError::StoreUnavailable(_) => "StoreUnavailable",
        }
    }

    /// Whether the transport layer should retry
    pub fn is_retryable(&self) -> bool {
        matches!(self, IngestError::StoreUnavailable(_))
    }
}

impl From<CryptoError> for IngestError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::InvalidKeyEncoding { .. } => IngestError::BadSignature(err.to_string()),
            _ => IngestError::BadEnvelope(err.to_string()),
        }
    }
}

/// Chain submission failures
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SubmitError {
    /// The submitter rejected the payload; retrying will not help
    #[error("submission rejected: {0}")]
    Rejected(String),

    /// The submitter endpoint is unreachable or overloaded
    #[error("submitter unavailable: {0}")]
    Unavailable(String),
}

impl SubmitError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, SubmitError::Unavailable(_))
    }
}

/// Per-device transport key lookup collaborator
///
/// Keys are provisioned out of band at registration time; the pipeline
/// only ever reads them.
#[async_trait::async_trait]
pub trait DeviceKeyStore: Send + Sync {
    async fn transport_key(&self, did: &str) -> Result<Option<[u8; 32]>, String>;
}

/// Chain/rollup submitter collaborator
///
/// Invoked asynchronously after successful ingest; failures here are
/// reported separately and never unwind the ingest decision.
#[async_trait::async_trait]
pub trait ChainSubmitter: Send + Sync {
    async fn submit(&self, payload: &AcceptedPayload) -> Result<SubmitReceipt, SubmitError>;
}

/// In-memory transport key store
#[derive(Clone, Default)]
pub struct InMemoryDeviceKeyStore {
    keys: Arc<RwLock<HashMap<String, [u8; 32]>>>,
}

impl InMemoryDeviceKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, did: &str, key: [u8; 32]) {
        self.keys.write().await.insert(did.to_string(), key);
    }
}

#[async_trait::async_trait]
impl DeviceKeyStore for InMemoryDeviceKeyStore {
    async fn transport_key(&self, did: &str) -> Result<Option<[u8; 32]>, String> {
        Ok(self.keys.read().await.get(did).copied())
    }
}

/// Pipeline tuning knobs
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Maximum payload age in milliseconds (boundary inclusive)
    pub freshness_window_ms: i64,
    /// Tolerance for device clocks ahead of the node
    pub clock_skew_ms: i64,
    /// Algorithm used for the transport envelope
    pub transport_algorithm: EncryptionAlgorithm,
    pub submit_retry_attempts: usize,
    pub submit_retry_delay: Duration,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            freshness_window_ms: 30_000,
            clock_skew_ms: 5_000,
            transport_algorithm: EncryptionAlgorithm::ChaCha20Poly1305,
            submit_retry_attempts: 3,
            submit_retry_delay: Duration::from_millis(100),
        }
    }
}

/// Payload ingestion pipeline
#[derive(Clone)]
pub struct IngestPipeline {
    registry: Arc<dyn DeviceRegistry>,
    replay: Arc<dyn ReplayStore>,
    keys: Arc<dyn DeviceKeyStore>,
    submitter: Option<Arc<dyn ChainSubmitter>>,
    config: IngestConfig,
}

impl IngestPipeline {
    pub fn new(
        registry: Arc<dyn DeviceRegistry>,
        replay: Arc<dyn ReplayStore>,
        keys: Arc<dyn DeviceKeyStore>,
        config: IngestConfig,
    ) -> Self {
        Self {
            registry,
            replay,
            keys,
            submitter: None,
            config,
        }
    }

    /// Attach a chain/rollup submitter for accepted payloads
    pub fn with_submitter(mut self, submitter: Arc<dyn ChainSubmitter>) -> Self {
        self.submitter = Some(submitter);
        self
    }

    /// Verify and admit one payload
    ///
    /// The admission nonce accompanies the payload (one credential nonce
    /// per submission) and is covered by the payload signature.
    ///
    /// Check order: device lookup -> signature -> envelope -> freshness
    /// -> atomic nonce admission. Nothing before the admission step has
    /// an externally visible side effect.
    pub async fn ingest(
        &self,
        payload: DataPayload,
        nonce: &str,
    ) -> Result<AcceptedPayload, IngestError> {
        // 1. Device lookup; only active devices may submit
        if Did::parse(&payload.device_id).is_err() {
            return Err(IngestError::UnknownDevice(payload.device_id));
        }
        let record = self
            .registry
            .get(&payload.device_id)
            .await
            .map_err(IngestError::StoreUnavailable)?
            .ok_or_else(|| IngestError::UnknownDevice(payload.device_id.clone()))?;
        if record.status != DeviceStatus::Active {
            debug!(
                "Rejecting payload from {}: status {:?}",
                payload.device_id, record.status
            );
            return Err(IngestError::UnknownDevice(payload.device_id));
        }

        // 2. Signature over the canonical byte representation
        let message = payload.canonical_bytes(nonce);
        let verified = verify_signature(
            &record.identity.public_key,
            &message,
            &payload.signature,
        )?;
        if !verified {
            warn!("Bad payload signature from {}", payload.device_id);
            return Err(IngestError::BadSignature(payload.device_id));
        }

        // 3. Envelope integrity
        let key = self
            .keys
            .transport_key(&payload.device_id)
            .await
            .map_err(IngestError::StoreUnavailable)?
            .ok_or_else(|| IngestError::KeyUnavailable(payload.device_id.clone()))?;
        let opened = open_envelope(&payload.data, self.config.transport_algorithm, &key)?;
        if !opened.verified {
            warn!("Envelope tag mismatch from {}", payload.device_id);
            return Err(IngestError::BadEnvelope(format!(
                "authentication tag mismatch for '{}'",
                payload.device_id
            )));
        }

        // 4. Freshness window, boundary inclusive
        let now = Utc::now().timestamp_millis();
        let age = now - payload.timestamp;
        if age > self.config.freshness_window_ms || -age > self.config.clock_skew_ms {
            return Err(IngestError::Stale {
                age_ms: age,
                window_ms: self.config.freshness_window_ms,
            });
        }

        // 5. Atomic exactly-once admission
        let fresh = self
            .replay
            .try_consume(&payload.device_id, nonce)
            .await
            .map_err(IngestError::StoreUnavailable)?;
        if !fresh {
            return Err(IngestError::DuplicateNonce {
                did: payload.device_id,
                nonce: nonce.to_string(),
            });
        }

        // 6. Admission committed; liveness update is best effort
        if let Err(e) = self.registry.touch(&payload.device_id).await {
            warn!("Failed to update last_seen for {}: {}", payload.device_id, e);
        }

        let accepted = AcceptedPayload {
            nonce: nonce.to_string(),
            payload_hash: payload.canonical_hash(nonce),
            admitted_at: now,
            payload,
        };
        info!(
            "✅ Payload admitted from {} (nonce {})",
            accepted.payload.device_id, accepted.nonce
        );

        // 7. Hand off to the chain submitter without blocking the caller
        if let Some(submitter) = &self.submitter {
            let submitter = Arc::clone(submitter);
            let accepted_clone = accepted.clone();
            let attempts = self.config.submit_retry_attempts;
            let delay = self.config.submit_retry_delay;
            tokio::spawn(async move {
                submit_with_retry(submitter, accepted_clone, attempts, delay).await;
            });
        }

        Ok(accepted)
    }
}

/// Submit an accepted payload, retrying only retryable failures
async fn submit_with_retry(
    submitter: Arc<dyn ChainSubmitter>,
    accepted: AcceptedPayload,
    attempts: usize,
    delay: Duration,
) {
    let did = accepted.payload.device_id.clone();
    for attempt in 1..=attempts.max(1) {
        match submitter.submit(&accepted).await {
            Ok(receipt) => {
                info!("⛓️  Payload from {} submitted: {:?}", did, receipt.tx_hash);
                return;
            }
            Err(e) if e.is_retryable() && attempt < attempts => {
                warn!(
                    "Submission attempt {}/{} for {} failed: {}",
                    attempt, attempts, did, e
                );
                sleep(delay).await;
            }
            Err(e) => {
                error!("Submission for {} gave up: {}", did, e);
                return;
            }
        }
    }
}
