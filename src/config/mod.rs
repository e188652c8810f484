// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Node Configuration
//!
//! Assembled from environment variables with defaults suitable for
//! local development. Chain presets live in [`chains`].

pub mod chains;

pub use chains::{CartesiEndpoints, ChainConfig, ContractAddresses, ContractConfig};

use std::env;
use std::time::Duration;
use tracing::warn;

use crate::crypto::DualEncryptionConfig;
use crate::identity::VerifierConfig;
use crate::ingest::IngestConfig;

/// Top-level node configuration
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub freshness_window_ms: i64,
    pub clock_skew_ms: i64,
    pub auth_token_ttl_ms: i64,
    pub auth_token_secret: Vec<u8>,
    pub submit_retry_attempts: usize,
    pub submit_retry_delay: Duration,
    pub encryption: DualEncryptionConfig,
    pub chain: ChainConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            freshness_window_ms: 30_000,
            clock_skew_ms: 5_000,
            auth_token_ttl_ms: 15 * 60 * 1_000,
            auth_token_secret: b"dev-only-secret".to_vec(),
            submit_retry_attempts: 3,
            submit_retry_delay: Duration::from_millis(100),
            encryption: DualEncryptionConfig::default(),
            chain: ChainConfig::local_devnet(),
        }
    }
}

fn env_i64(name: &str, default: i64) -> i64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl NodeConfig {
    /// Build configuration from environment variables
    ///
    /// Recognized variables: `FRESHNESS_WINDOW_MS`, `CLOCK_SKEW_MS`,
    /// `AUTH_TOKEN_TTL_MS`, `AUTH_TOKEN_SECRET`, `SUBMIT_RETRY_ATTEMPTS`,
    /// `SUBMIT_RETRY_DELAY_MS`, `CHAIN_ID`.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let auth_token_secret = match env::var("AUTH_TOKEN_SECRET") {
            Ok(secret) if !secret.is_empty() => secret.into_bytes(),
            _ => {
                warn!("AUTH_TOKEN_SECRET not set, using development secret");
                defaults.auth_token_secret.clone()
            }
        };

        let chain_id = env_i64("CHAIN_ID", defaults.chain.chain_id as i64) as u64;

        Self {
            freshness_window_ms: env_i64("FRESHNESS_WINDOW_MS", defaults.freshness_window_ms),
            clock_skew_ms: env_i64("CLOCK_SKEW_MS", defaults.clock_skew_ms),
            auth_token_ttl_ms: env_i64("AUTH_TOKEN_TTL_MS", defaults.auth_token_ttl_ms),
            auth_token_secret,
            submit_retry_attempts: env_i64(
                "SUBMIT_RETRY_ATTEMPTS",
                defaults.submit_retry_attempts as i64,
            )
            .max(1) as usize,
            submit_retry_delay: Duration::from_millis(env_i64(
                "SUBMIT_RETRY_DELAY_MS",
                defaults.submit_retry_delay.as_millis() as i64,
            )
            .max(0) as u64),
            encryption: defaults.encryption,
            chain: ChainConfig::for_chain_id(chain_id),
        }
    }

    /// Verifier knobs derived from this config
    pub fn verifier_config(&self) -> VerifierConfig {
        VerifierConfig {
            freshness_window_ms: self.freshness_window_ms,
            clock_skew_ms: self.clock_skew_ms,
            token_ttl_ms: self.auth_token_ttl_ms,
            token_secret: self.auth_token_secret.clone(),
        }
    }

    /// Pipeline knobs derived from this config
    pub fn ingest_config(&self) -> IngestConfig {
        IngestConfig {
            freshness_window_ms: self.freshness_window_ms,
            clock_skew_ms: self.clock_skew_ms,
            transport_algorithm: self.encryption.stage2.algorithm,
            submit_retry_attempts: self.submit_retry_attempts,
            submit_retry_delay: self.submit_retry_delay,
        }
    }
}
