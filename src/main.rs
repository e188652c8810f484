// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use lcore_node::{
    config::NodeConfig,
    identity::{IdentityVerifier, InMemoryDeviceRegistry, InMemoryReplayStore},
    ingest::{AcceptedPayload, ChainSubmitter, InMemoryDeviceKeyStore, IngestPipeline,
        SubmitError, SubmitReceipt},
};
use std::{env, sync::Arc};
use tokio::signal;
use tracing::info;

/// Submitter that only logs accepted payloads
///
/// Stands in until the Cartesi rollup client is wired up; the pipeline
/// treats it like any other chain submitter.
struct LoggingSubmitter;

#[async_trait::async_trait]
impl ChainSubmitter for LoggingSubmitter {
    async fn submit(&self, payload: &AcceptedPayload) -> Result<SubmitReceipt, SubmitError> {
        info!(
            "⛓️  Would submit payload from {} (nonce {})",
            payload.payload.device_id, payload.nonce
        );
        Ok(SubmitReceipt {
            tx_hash: ethers::types::H256::zero(),
            block_number: None,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    println!("🚀 Starting LCore Node...\n");
    println!("📦 BUILD VERSION: {}", lcore_node::version::VERSION);
    println!("📅 Build Date: {}", lcore_node::version::BUILD_DATE);
    println!();

    let config = NodeConfig::from_env();
    info!(
        "Chain: {} (id {}), freshness window {}ms",
        config.chain.name, config.chain.chain_id, config.freshness_window_ms
    );

    let registry = Arc::new(InMemoryDeviceRegistry::new());
    let replay = Arc::new(InMemoryReplayStore::new());
    let keys = Arc::new(InMemoryDeviceKeyStore::new());

    let verifier = IdentityVerifier::new(
        registry.clone(),
        replay.clone(),
        config.verifier_config(),
    );
    let pipeline = IngestPipeline::new(
        registry.clone(),
        replay.clone(),
        keys.clone(),
        config.ingest_config(),
    )
    .with_submitter(Arc::new(LoggingSubmitter));

    // The transport layer (external collaborator) drives these; keep
    // them alive for its lifetime
    let _ = (&verifier, &pipeline);

    println!("✅ Ingestion pipeline ready");
    info!("Node running; press Ctrl+C to stop");

    signal::ctrl_c().await?;
    info!("Shutdown signal received");

    Ok(())
}
