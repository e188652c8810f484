//! Dual-Stage Envelope Codec Tests
//!
//! Exercises the encrypt/decrypt contract: roundtrips recover the
//! plaintext with `verified == true`, and any tampering yields
//! `verified == false` without ever raising.

use lcore_node::crypto::{
    decrypt_dual, encrypt_dual, generate_iv, open_envelope, seal_envelope,
    DualEncryptionConfig, DualIvs, DualKeys, EncryptionAlgorithm, EncryptionConfig, KEY_SIZE,
};
use rand::rngs::OsRng;
use rand::RngCore;

fn random_keys() -> DualKeys {
    let mut keys = DualKeys {
        stage1: [0u8; KEY_SIZE],
        stage2: [0u8; KEY_SIZE],
    };
    OsRng.fill_bytes(&mut keys.stage1);
    OsRng.fill_bytes(&mut keys.stage2);
    keys
}

fn random_ivs() -> DualIvs {
    DualIvs {
        stage1: generate_iv(&mut OsRng),
        stage2: generate_iv(&mut OsRng),
    }
}

#[test]
fn test_roundtrip_recovers_plaintext() {
    let plaintext = b"{\"temperature\": 22.4, \"battery\": 87}";
    let config = DualEncryptionConfig::default();
    let keys = random_keys();

    let sealed = encrypt_dual(plaintext, &config, &keys, &random_ivs()).unwrap();
    let opened = decrypt_dual(&sealed, &keys).unwrap();

    assert!(opened.verified);
    assert_eq!(opened.plaintext, plaintext);
}

#[test]
fn test_roundtrip_with_swapped_stage_algorithms() {
    // ChaCha20 inner, AES-GCM transport
    let config = DualEncryptionConfig {
        stage1: EncryptionConfig::chacha20_poly1305(),
        stage2: EncryptionConfig::aes_256_gcm(),
    };
    let keys = random_keys();

    let sealed = encrypt_dual(b"reading", &config, &keys, &random_ivs()).unwrap();
    assert_eq!(sealed.stage1.algorithm, "ChaCha20-Poly1305");
    assert_eq!(sealed.stage2.algorithm, "AES-256-GCM");

    let opened = decrypt_dual(&sealed, &keys).unwrap();
    assert!(opened.verified);
    assert_eq!(opened.plaintext, b"reading");
}

#[test]
fn test_stage_ivs_are_independent() {
    let config = DualEncryptionConfig::default();
    let keys = random_keys();
    let ivs = random_ivs();

    let sealed = encrypt_dual(b"reading", &config, &keys, &ivs).unwrap();
    assert_eq!(sealed.stage1.iv, hex::encode(ivs.stage1));
    assert_eq!(sealed.stage2.iv, hex::encode(ivs.stage2));
    assert_ne!(sealed.stage1.iv, sealed.stage2.iv);
}

#[test]
fn test_tampered_stage2_ciphertext_never_raises() {
    let config = DualEncryptionConfig::default();
    let keys = random_keys();
    let mut sealed = encrypt_dual(b"reading", &config, &keys, &random_ivs()).unwrap();

    // Flip the first byte of the transport ciphertext
    let mut ct = hex::decode(&sealed.stage2.ciphertext).unwrap();
    ct[0] ^= 0xff;
    sealed.stage2.ciphertext = hex::encode(ct);

    let opened = decrypt_dual(&sealed, &keys).unwrap();
    assert!(!opened.verified);
    assert!(opened.plaintext.is_empty());
}

#[test]
fn test_substituted_stage1_envelope_reports_unverified() {
    // An attacker swaps the recorded stage-1 envelope for another one;
    // the recovered stage-2 bytes no longer match
    let config = DualEncryptionConfig::default();
    let keys = random_keys();
    let sealed_a = encrypt_dual(b"reading a", &config, &keys, &random_ivs()).unwrap();
    let sealed_b = encrypt_dual(b"reading b", &config, &keys, &random_ivs()).unwrap();

    let mut frankenstein = sealed_a.clone();
    frankenstein.stage1 = sealed_b.stage1;

    let opened = decrypt_dual(&frankenstein, &keys).unwrap();
    assert!(!opened.verified);
}

#[test]
fn test_wrong_stage1_key_reports_unverified() {
    let config = DualEncryptionConfig::default();
    let keys = random_keys();
    let sealed = encrypt_dual(b"reading", &config, &keys, &random_ivs()).unwrap();

    let mut wrong = keys.clone();
    wrong.stage1[31] ^= 0x01;

    let opened = decrypt_dual(&sealed, &wrong).unwrap();
    assert!(!opened.verified);
}

#[test]
fn test_envelope_json_is_hex_and_millis() {
    let config = DualEncryptionConfig::default();
    let keys = random_keys();
    let sealed = encrypt_dual(b"reading", &config, &keys, &random_ivs()).unwrap();

    let json = serde_json::to_value(&sealed).unwrap();
    let iv = json["stage1"]["iv"].as_str().unwrap();
    assert_eq!(iv.len(), 24); // 12 bytes hex-encoded
    assert!(hex::decode(iv).is_ok());
    assert!(json["metadata"]["timestamp"].as_i64().unwrap() > 1_000_000_000_000);
    assert_eq!(json["metadata"]["version"], "1.0");
}

#[test]
fn test_transport_envelope_seal_open() {
    let mut key = [0u8; KEY_SIZE];
    OsRng.fill_bytes(&mut key);
    let iv = generate_iv(&mut OsRng);

    let sealed = seal_envelope(
        b"device reading",
        EncryptionAlgorithm::ChaCha20Poly1305,
        &key,
        &iv,
    )
    .unwrap();

    let opened = open_envelope(&sealed, EncryptionAlgorithm::ChaCha20Poly1305, &key).unwrap();
    assert!(opened.verified);
    assert_eq!(opened.plaintext, b"device reading");

    // Wrong algorithm for the same envelope fails verification cleanly
    let opened = open_envelope(&sealed, EncryptionAlgorithm::Aes256Gcm, &key).unwrap();
    assert!(!opened.verified);
}
