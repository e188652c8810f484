// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Device Identity & Credential Verification
//!
//! Device registration, lifecycle tracking, credential verification and
//! replay prevention. Backing stores (device registry, nonce set) are
//! collaborator traits; in-memory implementations back tests and
//! single-node deployments.

pub mod did;
pub mod nonce;
pub mod registry;
pub mod verifier;

pub use did::Did;
pub use nonce::{InMemoryReplayStore, ReplayStore};
pub use registry::{
    DeviceIdentifier, DeviceMetadata, DeviceRecord, DeviceRegistry, DeviceStatus,
    InMemoryDeviceRegistry,
};
pub use verifier::{
    AuthError, DeviceAuthRequest, DeviceAuthResponse, DeviceCredential,
    DeviceRegistrationRequest, DeviceRegistrationResponse, IdentityVerifier, VerifierConfig,
};
