//! Ed25519 entry signing and verification.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey};
use serde::Serialize;
use serde_json::Value;

use crate::chain::ChainError;
use crate::types::{Entry, Header, ProofId, VerificationKey};

/// Generate a new Ed25519 keypair.
///
/// Returns the signing key and the verification key to declare in headers.
pub fn generate_key_pair() -> (SigningKey, VerificationKey) {
    let seed: [u8; 32] = rand::random();
    let signing_key = SigningKey::from_bytes(&seed);
    let verification_key = VerificationKey::from_verifying_key(&signing_key.verifying_key());
    (signing_key, verification_key)
}

/// Headers as they are signed: `next` is left out.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignableHeaders<'a> {
    subject: &'a Option<String>,
    prev: &'a Option<ProofId>,
    verification_key: &'a Option<VerificationKey>,
}

#[derive(Serialize)]
struct SignableContent<'a> {
    headers: SignableHeaders<'a>,
    body: &'a Value,
}

/// Compute the canonical bytes signed for an entry.
///
/// Fields are written in a fixed order and JSON object keys in sorted order,
/// so one logical entry always yields the same CBOR bytes.
pub fn signable_payload(headers: &Header, body: &Value) -> Result<Vec<u8>, ChainError> {
    let content = SignableContent {
        headers: SignableHeaders {
            subject: &headers.subject,
            prev: &headers.prev,
            verification_key: &headers.verification_key,
        },
        body,
    };
    let mut bytes = Vec::new();
    ciborium::ser::into_writer(&content, &mut bytes)
        .map_err(|e| ChainError::Encoding(e.to_string()))?;
    Ok(bytes)
}

/// Sign a new entry.
///
/// The proof id is the base64url signature over the signable payload. The
/// returned entry keeps whatever `next` the caller supplied in `headers`.
/// No business rules are checked here.
pub fn create_entry(
    signing_key: &SigningKey,
    headers: Header,
    body: Value,
) -> Result<(ProofId, Entry), ChainError> {
    let payload = signable_payload(&headers, &body)?;
    let signature = signing_key.sign(&payload);
    let proof = ProofId::new(URL_SAFE_NO_PAD.encode(signature.to_bytes()));
    Ok((proof, Entry::new(headers, body)))
}

/// Check that `proof` is a valid signature over `entry` by `key`.
///
/// Returns `false` for undecodable proofs or keys.
pub fn verify_entry(key: &VerificationKey, proof: &ProofId, entry: &Entry) -> bool {
    let Some(verifying_key) = key.to_verifying_key() else {
        return false;
    };
    let Ok(sig_bytes) = URL_SAFE_NO_PAD.decode(proof.as_str()) else {
        return false;
    };
    let Ok(signature) = Signature::from_slice(&sig_bytes) else {
        return false;
    };
    let Ok(payload) = signable_payload(&entry.headers, &entry.body) else {
        return false;
    };
    verifying_key.verify_strict(&payload, &signature).is_ok()
}
