//! Ed25519 Device Signatures
//!
//! Signature helpers for device credentials and payloads. Devices sign
//! with Ed25519; public keys and signatures travel as hex-encoded strings.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};

use super::error::CryptoError;

/// Ed25519 public key length in bytes
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Ed25519 signature length in bytes
pub const SIGNATURE_SIZE: usize = 64;

/// Parse a hex-encoded Ed25519 public key
pub fn parse_public_key(public_key_hex: &str) -> Result<VerifyingKey, CryptoError> {
    let bytes = hex::decode(public_key_hex).map_err(|e| CryptoError::InvalidKeyEncoding {
        key_type: "device_public_key".to_string(),
        reason: format!("hex decode error: {}", e),
    })?;

    let bytes: [u8; PUBLIC_KEY_SIZE] =
        bytes
            .try_into()
            .map_err(|v: Vec<u8>| CryptoError::InvalidKeyEncoding {
                key_type: "device_public_key".to_string(),
                reason: format!("expected {} bytes, got {}", PUBLIC_KEY_SIZE, v.len()),
            })?;

    VerifyingKey::from_bytes(&bytes).map_err(|e| CryptoError::InvalidKeyEncoding {
        key_type: "device_public_key".to_string(),
        reason: format!("invalid curve point: {}", e),
    })
}

/// Verify a hex-encoded signature over a message
///
/// # Returns
///
/// `Ok(true)` when the signature matches, `Ok(false)` when it does not.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidKeyEncoding`] only for malformed key or
/// signature bytes; a well-formed but wrong signature is `Ok(false)`.
pub fn verify_signature(
    public_key_hex: &str,
    message: &[u8],
    signature_hex: &str,
) -> Result<bool, CryptoError> {
    // 1. Parse the public key
    let verifying_key = parse_public_key(public_key_hex)?;

    // 2. Parse the signature bytes
    let sig_bytes = hex::decode(signature_hex).map_err(|e| CryptoError::InvalidKeyEncoding {
        key_type: "signature".to_string(),
        reason: format!("hex decode error: {}", e),
    })?;
    if sig_bytes.len() != SIGNATURE_SIZE {
        return Err(CryptoError::InvalidKeyEncoding {
            key_type: "signature".to_string(),
            reason: format!("expected {} bytes, got {}", SIGNATURE_SIZE, sig_bytes.len()),
        });
    }
    let signature = Signature::from_slice(&sig_bytes).map_err(|e| {
        CryptoError::InvalidKeyEncoding {
            key_type: "signature".to_string(),
            reason: format!("malformed signature: {}", e),
        }
    })?;

    // 3. Verify; a mismatch is a normal outcome, not an error
    Ok(verifying_key.verify(message, &signature).is_ok())
}

/// Sign a message with a raw 32-byte Ed25519 seed, hex output
///
/// Device-side helper; the node itself never holds device private keys.
pub fn sign_message(seed: &[u8; 32], message: &[u8]) -> String {
    let signing_key = SigningKey::from_bytes(seed);
    hex::encode(signing_key.sign(message).to_bytes())
}

/// Derive the hex-encoded public key for a raw 32-byte Ed25519 seed
pub fn public_key_hex(seed: &[u8; 32]) -> String {
    let signing_key = SigningKey::from_bytes(seed);
    hex::encode(signing_key.verifying_key().to_bytes())
}
