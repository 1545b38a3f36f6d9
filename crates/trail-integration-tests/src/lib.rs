//! Shared fixtures for the cross-crate trail tests.

use ed25519_dalek::SigningKey;
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;
use trail_chain::{create_history, extend, History, VerificationKey};

/// Install a test subscriber honouring `RUST_LOG`. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Deterministic keypair derived from a one-byte seed.
pub fn fixed_key(seed: u8) -> (SigningKey, VerificationKey) {
    let signing_key = SigningKey::from_bytes(&[seed; 32]);
    let key = VerificationKey::from_verifying_key(&signing_key.verifying_key());
    (signing_key, key)
}

/// A one-entry history for `subject` with body `{}`.
pub fn genesis(subject: &str, signing_key: &SigningKey, key: &VerificationKey) -> History {
    create_history(subject, json!({}), signing_key, key.clone())
        .expect("genesis history should validate")
}

/// Append `count` entries with bodies `{"tag": tag, "v": i}`.
pub fn extend_times(history: &History, signing_key: &SigningKey, tag: &str, count: usize) -> History {
    (0..count).fold(history.clone(), |acc, i| {
        extend(&acc, body(tag, i), signing_key, None).expect("extension should validate")
    })
}

pub fn body(tag: &str, i: usize) -> Value {
    json!({ "tag": tag, "v": i })
}
