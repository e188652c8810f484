// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Dual-Stage Envelope Codec
//!
//! Encodes and decodes dual-stage encrypted payloads. Stage 1 applies
//! authenticated symmetric encryption to the raw telemetry; stage 2
//! re-encrypts the stage-1 ciphertext as opaque bytes for transport,
//! with an independent IV and key. Decryption reverses strictly in
//! stage2 -> stage1 order.
//!
//! **Wire Format**: all binary fields are hex-encoded strings, timestamps
//! are Unix-epoch milliseconds.
//!
//! Tag failures during decryption never raise: they are reported through
//! `DecryptionResult::verified` so callers can distinguish corrupt data
//! from access denial.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::aead::{
    decrypt_with_aead, encrypt_with_aead, EncryptionAlgorithm, IV_SIZE, KEY_SIZE,
};
use super::error::CryptoError;

/// Envelope format version stamped into dual-encryption metadata
pub const ENVELOPE_VERSION: &str = "1.0";

/// Configuration for one encryption stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionConfig {
    pub algorithm: EncryptionAlgorithm,
    /// Key size in bits (256 for both supported algorithms)
    #[serde(rename = "keySize")]
    pub key_size: u32,
}

impl EncryptionConfig {
    pub fn aes_256_gcm() -> Self {
        Self {
            algorithm: EncryptionAlgorithm::Aes256Gcm,
            key_size: 256,
        }
    }

    pub fn chacha20_poly1305() -> Self {
        Self {
            algorithm: EncryptionAlgorithm::ChaCha20Poly1305,
            key_size: 256,
        }
    }

    /// Validate a raw key against this config
    pub fn check_key(&self, key: &[u8]) -> Result<(), CryptoError> {
        let expected = (self.key_size as usize) / 8;
        if key.len() != expected || key.len() != KEY_SIZE {
            return Err(CryptoError::InvalidKeySize {
                algorithm: self.algorithm.label().to_string(),
                expected: KEY_SIZE,
                actual: key.len(),
            });
        }
        Ok(())
    }
}

/// Configuration for both stages of dual encryption
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DualEncryptionConfig {
    pub stage1: EncryptionConfig,
    pub stage2: EncryptionConfig,
}

impl Default for DualEncryptionConfig {
    fn default() -> Self {
        Self {
            stage1: EncryptionConfig::aes_256_gcm(),
            stage2: EncryptionConfig::chacha20_poly1305(),
        }
    }
}

/// Output of one encryption stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncryptionResult {
    /// Hex-encoded ciphertext (tag detached)
    pub ciphertext: String,
    /// Hex-encoded 12-byte IV
    pub iv: String,
    /// Hex-encoded 16-byte authentication tag
    pub tag: String,
    /// Wire label of the algorithm used
    pub algorithm: String,
}

/// Encrypted data as carried inside a `DataPayload`
///
/// Same envelope shape as [`EncryptionResult`] but without the algorithm
/// label (the transport algorithm is fixed by node config) and with an
/// optional wrapped per-payload key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncryptedData {
    pub ciphertext: String,
    pub iv: String,
    pub tag: String,
    #[serde(rename = "encryptedKey", skip_serializing_if = "Option::is_none")]
    pub encrypted_key: Option<String>,
}

/// Metadata stamped onto a dual-encryption result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeMetadata {
    /// Unix-epoch milliseconds at encryption time
    pub timestamp: i64,
    pub version: String,
}

/// Ordered composition of both encryption stages
///
/// Invariant: `stage2.ciphertext` is computed over the stage-1 ciphertext
/// bytes; decryption must reverse stage2 before stage1 can be verified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DualEncryptionResult {
    pub stage1: EncryptionResult,
    pub stage2: EncryptionResult,
    pub metadata: EnvelopeMetadata,
}

/// Outcome of a decryption attempt
///
/// `verified` is false when any authentication tag failed; `plaintext`
/// is empty in that case and must not be trusted.
#[derive(Debug, Clone, PartialEq)]
pub struct DecryptionResult {
    pub plaintext: Vec<u8>,
    pub verified: bool,
}

impl DecryptionResult {
    fn unverified() -> Self {
        Self {
            plaintext: Vec::new(),
            verified: false,
        }
    }
}

/// Key pair for dual encryption (one independent key per stage)
#[derive(Debug, Clone)]
pub struct DualKeys {
    pub stage1: [u8; KEY_SIZE],
    pub stage2: [u8; KEY_SIZE],
}

/// Caller-supplied IVs, one per stage
///
/// Randomness is injected here rather than sourced inside the codec,
/// keeping the transform deterministic and testable.
#[derive(Debug, Clone, Copy)]
pub struct DualIvs {
    pub stage1: [u8; IV_SIZE],
    pub stage2: [u8; IV_SIZE],
}

/// Apply both encryption stages to a plaintext
///
/// Stage 1 encrypts `plaintext`; stage 2 encrypts the stage-1 ciphertext
/// as opaque bytes with its own key and IV.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidKeySize`] if either key does not match
/// its stage's `key_size`.
pub fn encrypt_dual(
    plaintext: &[u8],
    config: &DualEncryptionConfig,
    keys: &DualKeys,
    ivs: &DualIvs,
) -> Result<DualEncryptionResult, CryptoError> {
    // 1. Validate keys against the stage configs
    config.stage1.check_key(&keys.stage1)?;
    config.stage2.check_key(&keys.stage2)?;

    // 2. Stage 1 over the raw plaintext
    let (ct1, tag1) = encrypt_with_aead(
        config.stage1.algorithm,
        plaintext,
        &ivs.stage1,
        &keys.stage1,
    )?;

    // 3. Stage 2 over the stage-1 ciphertext as opaque bytes
    let (ct2, tag2) =
        encrypt_with_aead(config.stage2.algorithm, &ct1, &ivs.stage2, &keys.stage2)?;

    Ok(DualEncryptionResult {
        stage1: EncryptionResult {
            ciphertext: hex::encode(&ct1),
            iv: hex::encode(ivs.stage1),
            tag: hex::encode(tag1),
            algorithm: config.stage1.algorithm.label().to_string(),
        },
        stage2: EncryptionResult {
            ciphertext: hex::encode(&ct2),
            iv: hex::encode(ivs.stage2),
            tag: hex::encode(tag2),
            algorithm: config.stage2.algorithm.label().to_string(),
        },
        metadata: EnvelopeMetadata {
            timestamp: Utc::now().timestamp_millis(),
            version: ENVELOPE_VERSION.to_string(),
        },
    })
}

/// Reverse both encryption stages, strictly stage2 -> stage1
///
/// Tag failures at either stage yield `verified == false` rather than an
/// error. Errors are reserved for malformed envelopes (bad hex, wrong
/// sizes, unknown algorithm) and key-size mismatches.
pub fn decrypt_dual(
    result: &DualEncryptionResult,
    keys: &DualKeys,
) -> Result<DecryptionResult, CryptoError> {
    // 1. Decode and validate the stage-2 envelope
    let alg2 = EncryptionAlgorithm::from_label(&result.stage2.algorithm)?;
    let ct2 = decode_field("stage2.ciphertext", &result.stage2.ciphertext)?;
    let iv2 = decode_field("stage2.iv", &result.stage2.iv)?;
    let tag2 = decode_field("stage2.tag", &result.stage2.tag)?;

    // 2. Unwrap stage 2; a tag failure here means the transport layer
    //    was tampered with
    let ct1 = match decrypt_with_aead(alg2, &ct2, &iv2, &tag2, &keys.stage2) {
        Ok(bytes) => bytes,
        Err(CryptoError::TagMismatch { .. }) => return Ok(DecryptionResult::unverified()),
        Err(e) => return Err(e),
    };

    // 3. The recovered bytes must match the stage-1 ciphertext on record
    let expected_ct1 = decode_field("stage1.ciphertext", &result.stage1.ciphertext)?;
    if ct1 != expected_ct1 {
        return Ok(DecryptionResult::unverified());
    }

    // 4. Decode and reverse stage 1
    let alg1 = EncryptionAlgorithm::from_label(&result.stage1.algorithm)?;
    let iv1 = decode_field("stage1.iv", &result.stage1.iv)?;
    let tag1 = decode_field("stage1.tag", &result.stage1.tag)?;

    match decrypt_with_aead(alg1, &ct1, &iv1, &tag1, &keys.stage1) {
        Ok(plaintext) => Ok(DecryptionResult {
            plaintext,
            verified: true,
        }),
        Err(CryptoError::TagMismatch { .. }) => Ok(DecryptionResult::unverified()),
        Err(e) => Err(e),
    }
}

/// Verify and open a single transport envelope as carried in a payload
///
/// Used by the ingestion pipeline to check `DataPayload.data` integrity.
/// Tag failures are reported through `verified`, never raised.
pub fn open_envelope(
    data: &EncryptedData,
    algorithm: EncryptionAlgorithm,
    key: &[u8],
) -> Result<DecryptionResult, CryptoError> {
    let ct = decode_field("ciphertext", &data.ciphertext)?;
    let iv = decode_field("iv", &data.iv)?;
    let tag = decode_field("tag", &data.tag)?;

    match decrypt_with_aead(algorithm, &ct, &iv, &tag, key) {
        Ok(plaintext) => Ok(DecryptionResult {
            plaintext,
            verified: true,
        }),
        Err(CryptoError::TagMismatch { .. }) => Ok(DecryptionResult::unverified()),
        Err(e) => Err(e),
    }
}

/// Seal a plaintext into a transport envelope (device-side helper)
pub fn seal_envelope(
    plaintext: &[u8],
    algorithm: EncryptionAlgorithm,
    key: &[u8],
    iv: &[u8; IV_SIZE],
) -> Result<EncryptedData, CryptoError> {
    let (ct, tag) = encrypt_with_aead(algorithm, plaintext, iv, key)?;
    Ok(EncryptedData {
        ciphertext: hex::encode(ct),
        iv: hex::encode(iv),
        tag: hex::encode(tag),
        encrypted_key: None,
    })
}

fn decode_field(field: &str, value: &str) -> Result<Vec<u8>, CryptoError> {
    hex::decode(value).map_err(|e| CryptoError::InvalidEnvelope {
        field: field.to_string(),
        reason: format!("hex decode error: {}", e),
    })
}
