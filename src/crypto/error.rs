// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Crypto Error Types
//!
//! Error types for the envelope codec and signature helpers with context
//! preservation.
//!
//! ## Error Variants
//!
//! - **InvalidKeySize**: Key length does not match the configured algorithm
//! - **InvalidIvSize**: IV length is wrong for the algorithm (always 12 bytes)
//! - **TagMismatch**: Authentication tag verification failed (tampered data or wrong key)
//! - **InvalidEnvelope**: Envelope field failed validation (missing, bad hex, wrong size)
//! - **InvalidKeyEncoding**: Public key or signature bytes could not be parsed
//!
//! Tag mismatches are surfaced as errors by the AEAD layer only; the dual
//! envelope codec recovers them into `DecryptionResult { verified: false }`
//! so callers can tell corrupt data apart from access denial.

use std::fmt;

/// Error type for envelope codec and signature operations
#[derive(Debug, Clone, PartialEq)]
pub enum CryptoError {
    /// Key length does not match the algorithm's required key size
    InvalidKeySize {
        /// Algorithm label (e.g. "AES-256-GCM")
        algorithm: String,
        /// Required key size in bytes
        expected: usize,
        /// Key size that was provided
        actual: usize,
    },

    /// IV length is wrong for the algorithm
    InvalidIvSize {
        /// Required IV size in bytes
        expected: usize,
        /// IV size that was provided
        actual: usize,
    },

    /// Authentication tag verification failed
    ///
    /// Either the ciphertext was tampered with or the wrong key was used.
    TagMismatch {
        /// Which encryption stage failed (e.g. "stage1", "transport")
        stage: String,
    },

    /// Envelope field failed validation
    InvalidEnvelope {
        /// Which field failed validation
        field: String,
        /// Specific failure reason
        reason: String,
    },

    /// Public key or signature bytes could not be parsed
    InvalidKeyEncoding {
        /// Type of key that failed (e.g. "device_public_key", "signature")
        key_type: String,
        /// Specific failure reason
        reason: String,
    },
}

impl CryptoError {
    /// Stable error code for the response normalizer
    pub fn code(&self) -> &'static str {
        match self {
            CryptoError::InvalidKeySize { .. } => "InvalidKeySize",
            CryptoError::InvalidIvSize { .. } => "InvalidIvSize",
            CryptoError::TagMismatch { .. } => "TagMismatch",
            CryptoError::InvalidEnvelope { .. } => "InvalidEnvelope",
            CryptoError::InvalidKeyEncoding { .. } => "InvalidKeyEncoding",
        }
    }
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CryptoError::InvalidKeySize {
                algorithm,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Invalid key size for {}: expected {} bytes, got {} bytes",
                    algorithm, expected, actual
                )
            }
            CryptoError::InvalidIvSize { expected, actual } => {
                write!(
                    f,
                    "Invalid IV size: expected {} bytes, got {} bytes",
                    expected, actual
                )
            }
            CryptoError::TagMismatch { stage } => {
                write!(f, "Authentication tag mismatch during {}", stage)
            }
            CryptoError::InvalidEnvelope { field, reason } => {
                write!(f, "Invalid envelope field '{}': {}", field, reason)
            }
            CryptoError::InvalidKeyEncoding { key_type, reason } => {
                write!(f, "Invalid key encoding ({}): {}", key_type, reason)
            }
        }
    }
}

impl std::error::Error for CryptoError {}

// Conversion from hex decode errors
impl From<hex::FromHexError> for CryptoError {
    fn from(err: hex::FromHexError) -> Self {
        CryptoError::InvalidEnvelope {
            field: "hex_field".to_string(),
            reason: format!("hex decode error: {}", err),
        }
    }
}
