//! Device Signature Tests
//!
//! Credential-message signing as devices do it, verified through the
//! same helpers the node uses.

use lcore_node::crypto::{public_key_hex, sign_message, verify_signature};
use lcore_node::identity::IdentityVerifier;
use rand::rngs::OsRng;
use rand::RngCore;

fn random_seed() -> [u8; 32] {
    let mut seed = [0u8; 32];
    OsRng.fill_bytes(&mut seed);
    seed
}

#[test]
fn test_credential_message_roundtrip() {
    let seed = random_seed();
    let message = IdentityVerifier::credential_message("did:example:123", "n1", 1_700_000_000_000);

    let signature = sign_message(&seed, &message);
    let public_key = public_key_hex(&seed);

    assert!(verify_signature(&public_key, &message, &signature).unwrap());
}

#[test]
fn test_credential_message_binds_all_fields() {
    let base = IdentityVerifier::credential_message("did:example:123", "n1", 1_700_000_000_000);

    // Changing any component changes the signed bytes
    assert_ne!(
        base,
        IdentityVerifier::credential_message("did:example:124", "n1", 1_700_000_000_000)
    );
    assert_ne!(
        base,
        IdentityVerifier::credential_message("did:example:123", "n2", 1_700_000_000_000)
    );
    assert_ne!(
        base,
        IdentityVerifier::credential_message("did:example:123", "n1", 1_700_000_000_001)
    );
}

#[test]
fn test_signature_from_other_device_rejected() {
    let device = random_seed();
    let imposter = random_seed();
    let message = IdentityVerifier::credential_message("did:example:123", "n1", 1_700_000_000_000);

    let signature = sign_message(&imposter, &message);
    let public_key = public_key_hex(&device);

    assert!(!verify_signature(&public_key, &message, &signature).unwrap());
}

#[test]
fn test_malformed_inputs_are_errors_not_false() {
    let seed = random_seed();
    let public_key = public_key_hex(&seed);

    // Truncated signature
    assert!(verify_signature(&public_key, b"msg", "0011").is_err());
    // Garbage public key
    assert!(verify_signature("zz", b"msg", &"00".repeat(64)).is_err());
}
