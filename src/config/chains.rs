// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Cartesi rollup endpoint set consumed by the external submitter
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartesiEndpoints {
    pub http: String,
    pub ws: String,
    pub graphql: String,
}

/// Deployed contract reference
///
/// `address` + `chain_id` form the compound identity key; a deployment
/// is immutable once made.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContractConfig {
    pub address: Address,
    #[serde(rename = "chainId")]
    pub chain_id: u64,
}

impl ContractConfig {
    /// Compound identity key
    pub fn id(&self) -> (Address, u64) {
        (self.address, self.chain_id)
    }
}

/// Contracts the submitter interacts with
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContractAddresses {
    pub device_registry: Address,
    pub telemetry_ledger: Address,
}

/// Per-chain configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub name: String,
    pub rpc_url: String,
    pub contracts: ContractAddresses,
    pub cartesi: CartesiEndpoints,
    pub confirmation_blocks: u64,
}

impl ChainConfig {
    pub fn cartesi_testnet() -> Self {
        ChainConfig {
            chain_id: 11155111,
            name: "Cartesi Sepolia".to_string(),
            rpc_url: std::env::var("CARTESI_SEPOLIA_RPC_URL")
                .unwrap_or_else(|_| "https://rpc.sepolia.org".to_string()),
            contracts: ContractAddresses {
                device_registry: Address::from_str(
                    "0x59b22D57D4f067708AB0c00552767405926dc768",
                )
                .expect("Invalid device registry address"),
                telemetry_ledger: Address::from_str(
                    "0x0974CC873dF79Ad2d57Ab6de299506A1F71bd3b5",
                )
                .expect("Invalid telemetry ledger address"),
            },
            cartesi: CartesiEndpoints {
                http: std::env::var("CARTESI_HTTP_URL")
                    .unwrap_or_else(|_| "http://localhost:8080/rollup".to_string()),
                ws: std::env::var("CARTESI_WS_URL")
                    .unwrap_or_else(|_| "ws://localhost:8080/ws".to_string()),
                graphql: std::env::var("CARTESI_GRAPHQL_URL")
                    .unwrap_or_else(|_| "http://localhost:8080/graphql".to_string()),
            },
            confirmation_blocks: 3,
        }
    }

    pub fn local_devnet() -> Self {
        ChainConfig {
            chain_id: 31337,
            name: "Local Devnet".to_string(),
            rpc_url: std::env::var("LOCAL_RPC_URL")
                .unwrap_or_else(|_| "http://localhost:8545".to_string()),
            contracts: ContractAddresses {
                device_registry: Address::zero(),
                telemetry_ledger: Address::zero(),
            },
            cartesi: CartesiEndpoints {
                http: "http://localhost:8080/rollup".to_string(),
                ws: "ws://localhost:8080/ws".to_string(),
                graphql: "http://localhost:8080/graphql".to_string(),
            },
            confirmation_blocks: 1,
        }
    }

    /// Select a chain preset by id, falling back to the local devnet
    pub fn for_chain_id(chain_id: u64) -> Self {
        match chain_id {
            11155111 => Self::cartesi_testnet(),
            _ => Self::local_devnet(),
        }
    }
}
