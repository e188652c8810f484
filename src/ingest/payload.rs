// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Telemetry Payload Types
//!
//! Wire shape of submitted payloads and their canonical byte
//! representation for signing.

use ethers::types::H256;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::crypto::EncryptedData;

/// One telemetry submission from a device
///
/// Owned transiently by the ingestion pipeline for the duration of one
/// verification cycle; this core does not persist payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPayload {
    #[serde(rename = "deviceId")]
    pub device_id: String,
    /// Unix-epoch milliseconds at capture time
    pub timestamp: i64,
    pub data: EncryptedData,
    /// Hex-encoded Ed25519 signature over [`DataPayload::canonical_bytes`]
    pub signature: String,
}

impl DataPayload {
    /// Canonical byte representation signed by the device
    ///
    /// Deterministic field order: device id, admission nonce, timestamp,
    /// then the envelope fields. The nonce is part of the signed bytes so
    /// replay protection cannot be stripped off a captured payload.
    pub fn canonical_bytes(&self, nonce: &str) -> Vec<u8> {
        let mut bytes = Vec::new();
        for field in [
            self.device_id.as_str(),
            nonce,
            &self.timestamp.to_string(),
            &self.data.ciphertext,
            &self.data.iv,
            &self.data.tag,
            self.data.encrypted_key.as_deref().unwrap_or("-"),
        ] {
            bytes.extend_from_slice(field.as_bytes());
            bytes.push(b'\n');
        }
        bytes
    }

    /// SHA-256 over the canonical bytes, hex-encoded
    ///
    /// This is the digest the chain submitter anchors on-chain.
    pub fn canonical_hash(&self, nonce: &str) -> String {
        hex::encode(Sha256::digest(self.canonical_bytes(nonce)))
    }
}

/// A payload that passed every verification step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptedPayload {
    pub payload: DataPayload,
    /// The consumed admission nonce
    pub nonce: String,
    /// Hex-encoded SHA-256 of the canonical bytes
    #[serde(rename = "payloadHash")]
    pub payload_hash: String,
    /// Unix-epoch milliseconds at admission
    #[serde(rename = "admittedAt")]
    pub admitted_at: i64,
}

/// Receipt returned by the chain/rollup submitter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitReceipt {
    #[serde(rename = "txHash")]
    pub tx_hash: H256,
    #[serde(rename = "blockNumber", skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
}
