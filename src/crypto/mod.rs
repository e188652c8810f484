// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Cryptographic Envelope Codec
//!
//! This module implements the cryptographic primitives for the telemetry
//! ingestion pipeline:
//!
//! - **AEAD**: AES-256-GCM / ChaCha20-Poly1305 authenticated encryption
//! - **Envelope**: dual-stage encryption codec and transport envelopes
//! - **Signature**: Ed25519 verification of device credentials and payloads
//!
//! ## Security Considerations
//!
//! - IVs are injected by callers and must be unique per key
//! - Authentication tags are verified before any plaintext is trusted
//! - Tag failures surface as `verified == false`, never as panics
//! - Device private keys never cross this module's boundary
//!
//! ## Envelope Flow
//!
//! 1. Device encrypts raw telemetry with its stage-1 key
//! 2. Device re-encrypts the stage-1 ciphertext with the transport key
//! 3. Node reverses stage 2, checks the recovered bytes against the
//!    stage-1 envelope, then reverses stage 1
//! 4. Plaintext is released only when every tag verified

pub mod aead;
pub mod envelope;
pub mod error;
pub mod signature;

pub use aead::{
    decrypt_with_aead, encrypt_with_aead, generate_iv, EncryptionAlgorithm, IV_SIZE, KEY_SIZE,
    TAG_SIZE,
};
pub use envelope::{
    decrypt_dual, encrypt_dual, open_envelope, seal_envelope, DecryptionResult,
    DualEncryptionConfig, DualEncryptionResult, DualIvs, DualKeys, EncryptedData,
    EncryptionConfig, EncryptionResult, EnvelopeMetadata, ENVELOPE_VERSION,
};
pub use error::CryptoError;
pub use signature::{
    parse_public_key, public_key_hex, sign_message, verify_signature, PUBLIC_KEY_SIZE,
    SIGNATURE_SIZE,
};
