// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod config;
pub mod crypto;
pub mod identity;
pub mod ingest;
pub mod version;

// Re-export main types
pub use api::{wrap, ApiError, ApiResponseWrapper, ErrorCode, ResponseMeta};
pub use config::{CartesiEndpoints, ChainConfig, ContractConfig, NodeConfig};
pub use crypto::{
    decrypt_dual, encrypt_dual, CryptoError, DecryptionResult, DualEncryptionConfig,
    DualEncryptionResult, EncryptedData, EncryptionAlgorithm,
};
pub use identity::{
    AuthError, DeviceCredential, DeviceIdentifier, DeviceRegistry, DeviceStatus, Did,
    IdentityVerifier, InMemoryDeviceRegistry, InMemoryReplayStore, ReplayStore,
};
pub use ingest::{
    AcceptedPayload, ChainSubmitter, DataPayload, DeviceKeyStore, IngestError, IngestPipeline,
    SubmitError, SubmitReceipt,
};
