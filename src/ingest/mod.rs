// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Payload Ingestion
//!
//! Verified admission of device telemetry and hand-off to the
//! chain/rollup submitter.

pub mod payload;
pub mod pipeline;

pub use payload::{AcceptedPayload, DataPayload, SubmitReceipt};
pub use pipeline::{
    ChainSubmitter, DeviceKeyStore, InMemoryDeviceKeyStore, IngestConfig, IngestError,
    IngestPipeline, SubmitError,
};
