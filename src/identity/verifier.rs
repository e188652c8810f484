// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Device Identity & Credential Verifier
//!
//! Validates device registrations and per-request credentials. A
//! credential is a signature over `did + nonce + timestamp`; it is
//! accepted only when the device is `Active`, the signature checks out
//! against the registered public key, the timestamp falls inside the
//! freshness window, and the nonce has not been consumed before.
//!
//! Successful authentication issues a short-lived signed token so a
//! device does not have to produce a fresh credential for every call.

use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::crypto::{verify_signature, CryptoError};

use super::did::Did;
use super::nonce::ReplayStore;
use super::registry::{
    DeviceIdentifier, DeviceMetadata, DeviceRecord, DeviceRegistry, DeviceStatus,
};

/// Authentication and registration errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AuthError {
    #[error("DID '{0}' already registered with a different key")]
    DuplicateDid(String),

    #[error("device '{0}' is not registered")]
    Unregistered(String),

    #[error("signature verification failed for '{0}'")]
    BadSignature(String),

    #[error("credential timestamp is {age_ms}ms old, outside the {window_ms}ms window")]
    Expired { age_ms: i64, window_ms: i64 },

    #[error("invalid DID format: '{0}'")]
    InvalidDid(String),

    #[error("device '{did}' is {status:?}, not active")]
    NotActive { did: String, status: DeviceStatus },

    #[error("nonce already consumed for '{0}'")]
    ReplayedNonce(String),

    #[error("backing store unavailable: {0}")]
    StoreUnavailable(String),
}

impl AuthError {
    /// Stable error code for the response normalizer
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::DuplicateDid(_) => "DuplicateDID",
            AuthError::Unregistered(_) => "Unregistered",
            AuthError::BadSignature(_) => "BadSignature",
            AuthError::Expired { .. } => "Expired",
            AuthError::InvalidDid(_) => "InvalidDID",
            AuthError::NotActive { .. } => "NotActive",
            AuthError::ReplayedNonce(_) => "ReplayedNonce",
            AuthError::StoreUnavailable(_) => "StoreUnavailable",
        }
    }
}

impl From<CryptoError> for AuthError {
    fn from(err: CryptoError) -> Self {
        // Malformed keys or signatures are treated as a failed check,
        // keeping the error surface of verification narrow
        AuthError::BadSignature(err.to_string())
    }
}

/// Ephemeral per-request credential
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceCredential {
    pub did: String,
    /// Hex-encoded Ed25519 signature over `did + "." + nonce + "." + timestamp`
    pub signature: String,
    /// Unix-epoch milliseconds
    pub timestamp: i64,
    /// Single-use random value, unique per DID
    pub nonce: String,
}

/// Authentication request carries the same fields as a credential
pub type DeviceAuthRequest = DeviceCredential;

/// Token issued on successful authentication
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceAuthResponse {
    pub token: String,
    /// Unix-epoch milliseconds
    #[serde(rename = "expiresAt")]
    pub expires_at: i64,
}

/// Registration request for a new device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceRegistrationRequest {
    pub did: String,
    /// Hex-encoded Ed25519 public key, immutable after registration
    #[serde(rename = "publicKey")]
    pub public_key: String,
    pub metadata: DeviceMetadata,
}

/// Registration outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRegistrationResponse {
    pub did: String,
    pub status: DeviceStatus,
    #[serde(rename = "registeredAt")]
    pub registered_at: i64,
}

/// Verifier tuning knobs
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    /// Maximum credential age in milliseconds (boundary inclusive)
    pub freshness_window_ms: i64,
    /// Tolerance for device clocks ahead of the node
    pub clock_skew_ms: i64,
    /// Lifetime of issued auth tokens
    pub token_ttl_ms: i64,
    /// HMAC secret for token signing
    pub token_secret: Vec<u8>,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            freshness_window_ms: 30_000,
            clock_skew_ms: 5_000,
            token_ttl_ms: 15 * 60 * 1_000,
            token_secret: b"dev-only-secret".to_vec(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenClaims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// Device identity and credential verifier
#[derive(Clone)]
pub struct IdentityVerifier {
    registry: Arc<dyn DeviceRegistry>,
    replay: Arc<dyn ReplayStore>,
    config: VerifierConfig,
}

impl IdentityVerifier {
    pub fn new(
        registry: Arc<dyn DeviceRegistry>,
        replay: Arc<dyn ReplayStore>,
        config: VerifierConfig,
    ) -> Self {
        Self {
            registry,
            replay,
            config,
        }
    }

    /// Canonical signed message for a credential
    pub fn credential_message(did: &str, nonce: &str, timestamp: i64) -> Vec<u8> {
        format!("{}.{}.{}", did, nonce, timestamp).into_bytes()
    }

    /// Freshness check, boundary inclusive
    ///
    /// A timestamp exactly `freshness_window_ms` in the past (or
    /// `clock_skew_ms` in the future) is accepted; one millisecond
    /// beyond is rejected.
    pub fn is_fresh(&self, timestamp_ms: i64, now_ms: i64) -> bool {
        let age = now_ms - timestamp_ms;
        age <= self.config.freshness_window_ms && -age <= self.config.clock_skew_ms
    }

    /// Register a device
    ///
    /// Re-registering an existing DID with the same public key is
    /// idempotent and returns the current status. The same DID with a
    /// different key is rejected with [`AuthError::DuplicateDid`].
    ///
    /// New registrations become `Active` immediately; approval flows
    /// move devices through `Pending` via the registry's `set_status`.
    pub async fn register_device(
        &self,
        req: DeviceRegistrationRequest,
    ) -> Result<DeviceRegistrationResponse, AuthError> {
        // 1. Validate the DID format
        let did = Did::parse(&req.did)?;

        // 2. Validate the public key encoding up front
        crate::crypto::parse_public_key(&req.public_key)
            .map_err(|e| AuthError::BadSignature(e.to_string()))?;

        // 3. Uniqueness: same key is idempotent, different key is rejected
        if let Some(existing) = self
            .registry
            .get(did.as_str())
            .await
            .map_err(AuthError::StoreUnavailable)?
        {
            if existing.identity.public_key == req.public_key {
                debug!("Idempotent re-registration for {}", did);
                return Ok(DeviceRegistrationResponse {
                    did: req.did,
                    status: existing.status,
                    registered_at: existing.registered_at,
                });
            }
            warn!("Duplicate DID registration attempt: {}", did);
            return Err(AuthError::DuplicateDid(req.did));
        }

        // 4. Store the record
        let registered_at = Utc::now().timestamp_millis();
        let record = DeviceRecord {
            identity: DeviceIdentifier {
                did: req.did.clone(),
                public_key: req.public_key,
                metadata: req.metadata,
            },
            status: DeviceStatus::Active,
            registered_at,
            last_seen: None,
        };
        self.registry
            .put(record)
            .await
            .map_err(AuthError::StoreUnavailable)?;

        Ok(DeviceRegistrationResponse {
            did: req.did,
            status: DeviceStatus::Active,
            registered_at,
        })
    }

    /// Verify a credential against a known public key
    ///
    /// Checks signature and freshness only; device lookup and nonce
    /// consumption are the caller's steps (see [`Self::authenticate`]).
    pub fn verify_credential(
        &self,
        cred: &DeviceCredential,
        known_public_key: &str,
    ) -> Result<(), AuthError> {
        // 1. Freshness window with clock-skew tolerance
        let now = Utc::now().timestamp_millis();
        if !self.is_fresh(cred.timestamp, now) {
            return Err(AuthError::Expired {
                age_ms: now - cred.timestamp,
                window_ms: self.config.freshness_window_ms,
            });
        }

        // 2. Recompute the expected message and check the signature
        let message = Self::credential_message(&cred.did, &cred.nonce, cred.timestamp);
        let verified = verify_signature(known_public_key, &message, &cred.signature)?;
        if !verified {
            return Err(AuthError::BadSignature(cred.did.clone()));
        }

        Ok(())
    }

    /// Authenticate a device and issue a short-lived token
    ///
    /// Full check sequence: lookup, active status, credential signature
    /// and freshness, then atomic nonce consumption.
    pub async fn authenticate(
        &self,
        req: &DeviceAuthRequest,
    ) -> Result<DeviceAuthResponse, AuthError> {
        // 1. Look the device up; only active devices may authenticate
        let record = self
            .registry
            .get(&req.did)
            .await
            .map_err(AuthError::StoreUnavailable)?
            .ok_or_else(|| AuthError::Unregistered(req.did.clone()))?;
        if record.status != DeviceStatus::Active {
            return Err(AuthError::NotActive {
                did: req.did.clone(),
                status: record.status,
            });
        }

        // 2. Signature and freshness
        self.verify_credential(req, &record.identity.public_key)?;

        // 3. Atomic replay check
        let fresh = self
            .replay
            .try_consume(&req.did, &req.nonce)
            .await
            .map_err(AuthError::StoreUnavailable)?;
        if !fresh {
            warn!("Replayed credential nonce for {}", req.did);
            return Err(AuthError::ReplayedNonce(req.did.clone()));
        }

        // 4. Issue the token
        let now = Utc::now().timestamp_millis();
        let expires_at = now + self.config.token_ttl_ms;
        let claims = TokenClaims {
            sub: req.did.clone(),
            iat: now / 1_000,
            exp: expires_at / 1_000,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(&self.config.token_secret),
        )
        .map_err(|e| AuthError::StoreUnavailable(format!("token signing failed: {}", e)))?;

        debug!("🔑 Auth token issued for {}", req.did);
        Ok(DeviceAuthResponse { token, expires_at })
    }
}
