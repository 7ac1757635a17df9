// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keypair generation and base64 (de)serialization helpers.

use base64::Engine;
use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;

fn b64() -> base64::engine::GeneralPurpose {
    base64::engine::general_purpose::STANDARD
}

/// Generate a fresh Ed25519 keypair, returning `(signingKey, publicKeyB64)`.
pub fn generate_keypair() -> (SigningKey, String) {
    let signing_key = SigningKey::generate(&mut OsRng);
    let public_key = b64().encode(signing_key.verifying_key().to_bytes());
    (signing_key, public_key)
}

/// Base64-encode a signing key's secret bytes, for [`gitgov_store::KeyProvider`] storage.
#[must_use]
pub fn encode_signing_key(key: &SigningKey) -> String {
    b64().encode(key.to_bytes())
}

/// Decode a base64-encoded private key back into a [`SigningKey`].
pub fn decode_signing_key(b64_key: &str) -> Option<SigningKey> {
    let bytes = b64().decode(b64_key).ok()?;
    let bytes: [u8; 32] = bytes.try_into().ok()?;
    Some(SigningKey::from_bytes(&bytes))
}

/// Decode a base64-encoded public key into a [`VerifyingKey`].
pub fn decode_verifying_key(b64_key: &str) -> Option<VerifyingKey> {
    let bytes = b64().decode(b64_key).ok()?;
    let bytes: [u8; 32] = bytes.try_into().ok()?;
    VerifyingKey::from_bytes(&bytes).ok()
}
