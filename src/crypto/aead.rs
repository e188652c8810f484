// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Authenticated Symmetric Encryption
//!
//! Single-stage AEAD encryption/decryption behind an algorithm selector.
//! Both supported algorithms use 32-byte keys, 12-byte IVs and 16-byte
//! authentication tags, kept detached so envelopes can carry `ciphertext`,
//! `iv` and `tag` as separate fields.
//!
//! IVs are always supplied by the caller. This keeps the codec a pure
//! transform over its inputs; random IV generation happens at the edge
//! (see [`generate_iv`] for the helper callers use).

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use chacha20poly1305::ChaCha20Poly1305;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::CryptoError;

/// Key size in bytes for both supported algorithms (256-bit)
pub const KEY_SIZE: usize = 32;

/// IV size in bytes (96-bit, AEAD standard)
pub const IV_SIZE: usize = 12;

/// Authentication tag size in bytes
pub const TAG_SIZE: usize = 16;

/// AEAD algorithm selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncryptionAlgorithm {
    #[serde(rename = "AES-256-GCM")]
    Aes256Gcm,
    #[serde(rename = "ChaCha20-Poly1305")]
    ChaCha20Poly1305,
}

impl EncryptionAlgorithm {
    /// Wire label, matching the `algorithm` field of envelopes
    pub fn label(&self) -> &'static str {
        match self {
            EncryptionAlgorithm::Aes256Gcm => "AES-256-GCM",
            EncryptionAlgorithm::ChaCha20Poly1305 => "ChaCha20-Poly1305",
        }
    }

    /// Parse a wire label back into an algorithm selector
    pub fn from_label(label: &str) -> Result<Self, CryptoError> {
        match label {
            "AES-256-GCM" => Ok(EncryptionAlgorithm::Aes256Gcm),
            "ChaCha20-Poly1305" => Ok(EncryptionAlgorithm::ChaCha20Poly1305),
            other => Err(CryptoError::InvalidEnvelope {
                field: "algorithm".to_string(),
                reason: format!("unknown algorithm '{}'", other),
            }),
        }
    }
}

impl fmt::Display for EncryptionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Generate a random 12-byte IV
///
/// Convenience for callers at the boundary; the codec itself never
/// sources randomness.
pub fn generate_iv<R: RngCore>(rng: &mut R) -> [u8; IV_SIZE] {
    let mut iv = [0u8; IV_SIZE];
    rng.fill_bytes(&mut iv);
    iv
}

fn check_sizes(
    algorithm: EncryptionAlgorithm,
    iv: &[u8],
    key: &[u8],
) -> Result<(), CryptoError> {
    if key.len() != KEY_SIZE {
        return Err(CryptoError::InvalidKeySize {
            algorithm: algorithm.label().to_string(),
            expected: KEY_SIZE,
            actual: key.len(),
        });
    }
    if iv.len() != IV_SIZE {
        return Err(CryptoError::InvalidIvSize {
            expected: IV_SIZE,
            actual: iv.len(),
        });
    }
    Ok(())
}

/// Encrypt with the selected AEAD algorithm
///
/// # Arguments
///
/// * `algorithm` - AEAD algorithm to use
/// * `plaintext` - Data to encrypt
/// * `iv` - 12-byte IV (must be unique for this key)
/// * `key` - 32-byte encryption key
///
/// # Returns
///
/// `(ciphertext, tag)` with the 16-byte authentication tag detached
///
/// # Errors
///
/// Returns [`CryptoError::InvalidKeySize`] or [`CryptoError::InvalidIvSize`]
/// on size mismatches.
pub fn encrypt_with_aead(
    algorithm: EncryptionAlgorithm,
    plaintext: &[u8],
    iv: &[u8],
    key: &[u8],
) -> Result<(Vec<u8>, [u8; TAG_SIZE]), CryptoError> {
    // 1. Validate key and IV sizes
    check_sizes(algorithm, iv, key)?;

    // 2. Encrypt; both ciphers append a 16-byte tag
    let nonce = Nonce::from_slice(iv);
    let payload = Payload {
        msg: plaintext,
        aad: b"",
    };
    let mut combined = match algorithm {
        EncryptionAlgorithm::Aes256Gcm => {
            let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| {
                CryptoError::InvalidKeySize {
                    algorithm: algorithm.label().to_string(),
                    expected: KEY_SIZE,
                    actual: key.len(),
                }
            })?;
            cipher.encrypt(nonce, payload).map_err(|_| CryptoError::TagMismatch {
                stage: "encrypt".to_string(),
            })?
        }
        EncryptionAlgorithm::ChaCha20Poly1305 => {
            let cipher = ChaCha20Poly1305::new_from_slice(key).map_err(|_| {
                CryptoError::InvalidKeySize {
                    algorithm: algorithm.label().to_string(),
                    expected: KEY_SIZE,
                    actual: key.len(),
                }
            })?;
            cipher.encrypt(nonce, payload).map_err(|_| CryptoError::TagMismatch {
                stage: "encrypt".to_string(),
            })?
        }
    };

    // 3. Detach the tag from the combined output
    let tag_start = combined.len() - TAG_SIZE;
    let mut tag = [0u8; TAG_SIZE];
    tag.copy_from_slice(&combined[tag_start..]);
    combined.truncate(tag_start);

    Ok((combined, tag))
}

/// Decrypt with the selected AEAD algorithm and verify the tag
///
/// # Arguments
///
/// * `algorithm` - AEAD algorithm to use
/// * `ciphertext` - Encrypted data (tag detached)
/// * `iv` - 12-byte IV used at encryption time
/// * `tag` - 16-byte authentication tag
/// * `key` - 32-byte encryption key
///
/// # Errors
///
/// Returns [`CryptoError::TagMismatch`] when authentication fails
/// (tampered data or wrong key), size errors on malformed inputs.
pub fn decrypt_with_aead(
    algorithm: EncryptionAlgorithm,
    ciphertext: &[u8],
    iv: &[u8],
    tag: &[u8],
    key: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    // 1. Validate key and IV sizes
    check_sizes(algorithm, iv, key)?;

    if tag.len() != TAG_SIZE {
        return Err(CryptoError::InvalidEnvelope {
            field: "tag".to_string(),
            reason: format!("expected {} bytes, got {}", TAG_SIZE, tag.len()),
        });
    }

    // 2. Re-attach the tag for the aead crate's combined format
    let mut combined = Vec::with_capacity(ciphertext.len() + TAG_SIZE);
    combined.extend_from_slice(ciphertext);
    combined.extend_from_slice(tag);

    // 3. Decrypt and verify the authentication tag
    let nonce = Nonce::from_slice(iv);
    let payload = Payload {
        msg: &combined,
        aad: b"",
    };
    let plaintext = match algorithm {
        EncryptionAlgorithm::Aes256Gcm => {
            let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| {
                CryptoError::InvalidKeySize {
                    algorithm: algorithm.label().to_string(),
                    expected: KEY_SIZE,
                    actual: key.len(),
                }
            })?;
            cipher.decrypt(nonce, payload)
        }
        EncryptionAlgorithm::ChaCha20Poly1305 => {
            let cipher = ChaCha20Poly1305::new_from_slice(key).map_err(|_| {
                CryptoError::InvalidKeySize {
                    algorithm: algorithm.label().to_string(),
                    expected: KEY_SIZE,
                    actual: key.len(),
                }
            })?;
            cipher.decrypt(nonce, payload)
        }
    }
    .map_err(|_| CryptoError::TagMismatch {
        stage: "decrypt".to_string(),
    })?;

    Ok(plaintext)
}
