// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Device Registry
//!
//! Device identity records and the registry collaborator trait. The
//! registry is an externally-synchronized shared resource; the in-memory
//! implementation here backs tests and single-node deployments.
//!
//! Per-device lifecycle: `Pending -> Active -> Revoked`, with `Rejected`
//! as a terminal alternative to activation. Only `Active` devices pass
//! credential verification and ingest.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Descriptive device metadata captured at registration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceMetadata {
    pub manufacturer: String,
    pub model: String,
    #[serde(rename = "serialNumber")]
    pub serial_number: String,
    #[serde(rename = "firmwareVersion")]
    pub firmware_version: String,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Immutable device identity fixed at registration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceIdentifier {
    pub did: String,
    /// Hex-encoded Ed25519 public key
    #[serde(rename = "publicKey")]
    pub public_key: String,
    pub metadata: DeviceMetadata,
}

/// Device lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Pending,
    Active,
    Rejected,
    Revoked,
}

impl DeviceStatus {
    /// Whether a lifecycle transition is allowed
    ///
    /// `Rejected` and `Revoked` are terminal.
    pub fn can_transition(&self, to: DeviceStatus) -> bool {
        matches!(
            (self, to),
            (DeviceStatus::Pending, DeviceStatus::Active)
                | (DeviceStatus::Pending, DeviceStatus::Rejected)
                | (DeviceStatus::Active, DeviceStatus::Revoked)
        )
    }
}

/// Registry record for one device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub identity: DeviceIdentifier,
    pub status: DeviceStatus,
    /// Unix-epoch milliseconds at registration
    #[serde(rename = "registeredAt")]
    pub registered_at: i64,
    /// Unix-epoch milliseconds of the last accepted payload
    #[serde(rename = "lastSeen", skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<i64>,
}

/// Device registry collaborator
///
/// Backing storage is external to this core; implementations must make
/// `put` and `set_status` safe under concurrent callers.
#[async_trait::async_trait]
pub trait DeviceRegistry: Send + Sync {
    async fn get(&self, did: &str) -> Result<Option<DeviceRecord>, String>;
    async fn put(&self, record: DeviceRecord) -> Result<(), String>;
    async fn set_status(&self, did: &str, status: DeviceStatus) -> Result<(), String>;
    /// Record payload acceptance time for liveness tracking
    async fn touch(&self, did: &str) -> Result<(), String>;
}

/// In-memory device registry
///
/// Thread-safe store for tests and single-node deployments.
#[derive(Clone, Default)]
pub struct InMemoryDeviceRegistry {
    devices: Arc<RwLock<HashMap<String, DeviceRecord>>>,
}

impl InMemoryDeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered devices
    pub async fn count(&self) -> usize {
        self.devices.read().await.len()
    }
}

#[async_trait::async_trait]
impl DeviceRegistry for InMemoryDeviceRegistry {
    async fn get(&self, did: &str) -> Result<Option<DeviceRecord>, String> {
        Ok(self.devices.read().await.get(did).cloned())
    }

    async fn put(&self, record: DeviceRecord) -> Result<(), String> {
        let mut devices = self.devices.write().await;
        let did = record.identity.did.clone();
        devices.insert(did.clone(), record);
        tracing::info!("📟 Device registered: {} (total: {})", did, devices.len());
        Ok(())
    }

    async fn set_status(&self, did: &str, status: DeviceStatus) -> Result<(), String> {
        let mut devices = self.devices.write().await;
        let record = devices
            .get_mut(did)
            .ok_or_else(|| format!("device '{}' not found", did))?;
        if !record.status.can_transition(status) {
            return Err(format!(
                "illegal status transition for '{}': {:?} -> {:?}",
                did, record.status, status
            ));
        }
        tracing::info!("📟 Device {} status: {:?} -> {:?}", did, record.status, status);
        record.status = status;
        Ok(())
    }

    async fn touch(&self, did: &str) -> Result<(), String> {
        let mut devices = self.devices.write().await;
        let record = devices
            .get_mut(did)
            .ok_or_else(|| format!("device '{}' not found", did))?;
        record.last_seen = Some(Utc::now().timestamp_millis());
        Ok(())
    }
}
