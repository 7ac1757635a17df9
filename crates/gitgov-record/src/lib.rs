// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]
//! gitgov-record
//!
//! The canonical signed-record envelope shared by every GitGov domain
//! adapter, plus the three pure crypto operations (`checksum`, `sign`,
//! `verify`) that give every persisted record its integrity guarantees.
//!
//! This crate intentionally knows nothing about actors, keys, or stores —
//! callers resolve `keyId -> public key` themselves and hand the resolver
//! in as a closure, so this crate never depends on the identity layer.

use std::fmt;

use base64::Engine;
use chrono::Utc;
use ed25519_dalek::{Signature as Ed25519Signature, Signer, SigningKey, Verifier, VerifyingKey};
use schemars::JsonSchema;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Digest, Sha256};

const ENVELOPE_VERSION: &str = "1.0";

fn b64() -> base64::engine::GeneralPurpose {
    base64::engine::general_purpose::STANDARD
}

/// Record kinds, used as the `header.type` discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    /// An [`crate`]-level actor record (see `gitgov-factory`/`gitgov-identity`).
    Actor,
    /// An agent manifest record.
    Agent,
    /// A task record.
    Task,
    /// A cycle record.
    Cycle,
    /// A feedback record.
    Feedback,
    /// An execution record.
    Execution,
    /// A changelog record.
    Changelog,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Kind::Actor => "actor",
            Kind::Agent => "agent",
            Kind::Task => "task",
            Kind::Cycle => "cycle",
            Kind::Feedback => "feedback",
            Kind::Execution => "execution",
            Kind::Changelog => "changelog",
        };
        write!(f, "{s}")
    }
}

/// A single signature attached to a record header.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Signature {
    /// Id of the actor whose key produced this signature.
    pub key_id: String,
    /// The role the signer claims to act under (e.g. `"author"`).
    pub role: String,
    /// Free-form annotation (e.g. "bootstrap", "resolved blocker").
    pub notes: String,
    /// Base64-encoded Ed25519 signature bytes.
    pub signature: String,
    /// Epoch-seconds timestamp of signing.
    pub timestamp: i64,
}

/// Sentinel signature value used before a record has been through
/// [`crate::sign`] — see `UnsignedRecord` for the type-level guard most
/// callers should prefer instead of constructing this directly.
pub const PLACEHOLDER_SIGNATURE: &str = "placeholder";

impl Signature {
    /// Build a well-marked placeholder signature. Never persisted as-is:
    /// `IdentityAdapter::sign_record` replaces any signature whose
    /// `signature` field equals [`PLACEHOLDER_SIGNATURE`] in place.
    #[must_use]
    pub fn placeholder(key_id: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
            role: role.into(),
            notes: "placeholder".into(),
            signature: PLACEHOLDER_SIGNATURE.into(),
            timestamp: Utc::now().timestamp(),
        }
    }

    fn is_placeholder(&self) -> bool {
        self.signature == PLACEHOLDER_SIGNATURE
    }
}

/// The canonical envelope header shared by every record kind.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Header {
    /// Envelope schema version, currently always `"1.0"`.
    pub version: String,
    /// Record kind discriminator.
    #[serde(rename = "type")]
    pub kind: Kind,
    /// Hex-encoded SHA-256 checksum of the canonicalized payload.
    pub payload_checksum: String,
    /// Non-empty signature list; the first entry is the author's.
    pub signatures: Vec<Signature>,
}

/// A fully-formed, persistable record: header plus typed payload.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Record<T> {
    /// The envelope metadata.
    pub header: Header,
    /// The domain payload.
    pub payload: T,
}

/// A payload that has been assembled and checksummed but not yet signed.
///
/// Modeling the unsigned state as a distinct type prevents accidentally
/// persisting a record whose only signature is a
/// [`PLACEHOLDER_SIGNATURE`] — callers must go through
/// [`UnsignedRecord::into_signed`] (or an adapter's `sign_record`) to
/// obtain a [`Record<T>`].
#[derive(Debug, Clone)]
pub struct UnsignedRecord<T> {
    kind: Kind,
    payload_checksum: String,
    payload: T,
}

impl<T: Serialize> UnsignedRecord<T> {
    /// Assemble an unsigned record, computing the payload checksum.
    ///
    /// # Errors
    /// Returns [`RecordError::Json`] if `payload` cannot be serialized.
    pub fn new(kind: Kind, payload: T) -> Result<Self, RecordError> {
        let payload_checksum = checksum(&payload)?;
        Ok(Self {
            kind,
            payload_checksum,
            payload,
        })
    }

    /// Record kind this will become once signed.
    #[must_use]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// The precomputed payload checksum.
    #[must_use]
    pub fn payload_checksum(&self) -> &str {
        &self.payload_checksum
    }

    /// Borrow the unsigned payload.
    #[must_use]
    pub fn payload(&self) -> &T {
        &self.payload
    }

    /// Attach the first signature and produce a complete [`Record<T>`].
    #[must_use]
    pub fn into_signed(self, signature: Signature) -> Record<T> {
        Record {
            header: Header {
                version: ENVELOPE_VERSION.to_string(),
                kind: self.kind,
                payload_checksum: self.payload_checksum,
                signatures: vec![signature],
            },
            payload: self.payload,
        }
    }
}

/// Errors from checksum/sign operations.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// JSON serialization failed while canonicalizing a payload.
    #[error("failed to serialize payload for hashing: {0}")]
    Json(#[from] serde_json::Error),
    /// Signature bytes were not valid base64 or not a valid Ed25519 signature.
    #[error("malformed signature bytes for key {key_id}")]
    MalformedSignature {
        /// The signing actor id whose signature bytes were malformed.
        key_id: String,
    },
}

/// Failure kinds from [`verify`]. Matches the stable error taxonomy of
/// the GitGov error catalog (`CHECKSUM_MISMATCH`, `KEY_NOT_FOUND`,
/// `SIGNATURE_INVALID`).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    /// The recomputed payload checksum does not match `header.payload_checksum`.
    #[error("payload checksum mismatch")]
    ChecksumMismatch,
    /// A signature's `key_id` could not be resolved to a public key.
    #[error("public key not found for signer {key_id}")]
    KeyNotFound {
        /// The unresolved signer id.
        key_id: String,
    },
    /// A signature did not verify against the resolved public key.
    #[error("signature invalid for signer {key_id}")]
    SignatureInvalid {
        /// The signer whose signature failed verification.
        key_id: String,
    },
}

impl VerifyError {
    /// Stable string error code, as named in the GitGov error taxonomy.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            VerifyError::ChecksumMismatch => "CHECKSUM_MISMATCH",
            VerifyError::KeyNotFound { .. } => "KEY_NOT_FOUND",
            VerifyError::SignatureInvalid { .. } => "SIGNATURE_INVALID",
        }
    }
}

/// Produce a deterministic JSON string for hashing/signing.
///
/// Not a full JCS implementation, but stable for our payload types:
/// `serde_json::Map` is backed by a `BTreeMap` by default, so keys are
/// already sorted; we round-trip through `serde_json::Value` to apply that
/// ordering uniformly regardless of the struct's field declaration order.
fn canonical_json<T: Serialize>(value: &T) -> Result<String, RecordError> {
    let v = serde_json::to_value(value)?;
    Ok(serde_json::to_string(&v)?)
}

/// Compute the hex-encoded SHA-256 checksum of a payload's canonical JSON.
///
/// # Errors
/// Returns [`RecordError::Json`] if `payload` cannot be serialized.
pub fn checksum<T: Serialize>(payload: &T) -> Result<String, RecordError> {
    let json = canonical_json(payload)?;
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

/// Sign a payload's canonical bytes with an Ed25519 signing key.
///
/// # Errors
/// Returns [`RecordError::Json`] if `payload` cannot be serialized.
pub fn sign<T: Serialize>(
    payload: &T,
    signing_key: &SigningKey,
    key_id: impl Into<String>,
    role: impl Into<String>,
    notes: impl Into<String>,
) -> Result<Signature, RecordError> {
    let json = canonical_json(payload)?;
    let sig: Ed25519Signature = signing_key.sign(json.as_bytes());
    Ok(Signature {
        key_id: key_id.into(),
        role: role.into(),
        notes: notes.into(),
        signature: b64().encode(sig.to_bytes()),
        timestamp: Utc::now().timestamp(),
    })
}

/// Verify every signature on a record against its checksum and resolved
/// public keys.
///
/// `public_key_of` is typically backed by the identity adapter; this crate
/// never calls into it directly to keep the dependency direction intact.
///
/// # Errors
/// Returns the first [`VerifyError`] encountered: a checksum mismatch is
/// checked before any signature, after which signatures are checked in
/// order.
pub fn verify<T, F>(record: &Record<T>, public_key_of: F) -> Result<(), VerifyError>
where
    T: Serialize,
    F: Fn(&str) -> Option<VerifyingKey>,
{
    let recomputed = checksum(&record.payload).map_err(|_| VerifyError::ChecksumMismatch)?;
    if recomputed != record.header.payload_checksum {
        return Err(VerifyError::ChecksumMismatch);
    }

    let json = canonical_json(&record.payload).map_err(|_| VerifyError::ChecksumMismatch)?;

    for sig in &record.header.signatures {
        let key = public_key_of(&sig.key_id).ok_or_else(|| VerifyError::KeyNotFound {
            key_id: sig.key_id.clone(),
        })?;
        let bytes = b64()
            .decode(sig.signature.as_bytes())
            .map_err(|_| VerifyError::SignatureInvalid {
                key_id: sig.key_id.clone(),
            })?;
        let arr: [u8; 64] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| VerifyError::SignatureInvalid {
                key_id: sig.key_id.clone(),
            })?;
        let ed_sig = Ed25519Signature::from_bytes(&arr);
        key.verify(json.as_bytes(), &ed_sig)
            .map_err(|_| VerifyError::SignatureInvalid {
                key_id: sig.key_id.clone(),
            })?;
    }

    Ok(())
}

/// Load an untrusted `(Header, T)` pair read back from storage into a typed
/// [`Record<T>`] without verifying signatures (callers verify separately via
/// [`verify`]). Kept separate from `serde_json::from_value` so adapters have
/// one place to extend with structural checks later.
pub fn from_parts<T: DeserializeOwned>(header: Header, payload: serde_json::Value) -> Result<Record<T>, RecordError> {
    let payload: T = serde_json::from_value(payload)?;
    Ok(Record { header, payload })
}

/// Replace any placeholder signatures in `signatures` with `new_sig`, or
/// append `new_sig` if none were placeholders. Implements the rule in
/// `IdentityAdapter::sign_record`: "if any existing signature has
/// `signature == placeholder`, replace those in place; otherwise append".
pub fn apply_signature(signatures: &mut Vec<Signature>, new_sig: Signature) {
    let had_placeholder = signatures.iter().any(Signature::is_placeholder);
    if had_placeholder {
        for s in signatures.iter_mut() {
            if s.is_placeholder() {
                *s = new_sig.clone();
            }
        }
    } else {
        signatures.push(new_sig);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::SigningKey;
    use rand::rngs::OsRng;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Payload {
        a: u32,
        b: String,
    }

    fn keypair() -> (SigningKey, VerifyingKey) {
        let sk = SigningKey::generate(&mut OsRng);
        let vk = sk.verifying_key();
        (sk, vk)
    }

    #[test]
    fn checksum_is_deterministic() {
        let p = Payload { a: 1, b: "x".into() };
        assert_eq!(checksum(&p).unwrap(), checksum(&p).unwrap());
    }

    #[test]
    fn checksum_is_field_order_independent() {
        // serde_json::Value normalizes map ordering regardless of struct
        // field declaration order.
        let p1 = Payload { a: 1, b: "x".into() };
        let v = serde_json::json!({"b": "x", "a": 1});
        let h1 = checksum(&p1).unwrap();
        let h2 = checksum(&v).unwrap();
        assert_eq!(h1, h2);
    }

    #[test]
    fn sign_and_verify_round_trip() {
        let (sk, vk) = keypair();
        let payload = Payload { a: 7, b: "hello".into() };
        let unsigned = UnsignedRecord::new(Kind::Task, payload).unwrap();
        let sig = sign(unsigned.payload(), &sk, "human:dev", "author", "").unwrap();
        let record = unsigned.into_signed(sig);

        verify(&record, |id| if id == "human:dev" { Some(vk) } else { None }).unwrap();
    }

    #[test]
    fn verify_detects_checksum_mismatch() {
        let (sk, vk) = keypair();
        let payload = Payload { a: 1, b: "orig".into() };
        let unsigned = UnsignedRecord::new(Kind::Task, payload.clone()).unwrap();
        let sig = sign(&payload, &sk, "human:dev", "author", "").unwrap();
        let mut record = unsigned.into_signed(sig);
        record.payload.b = "tampered".into();

        let err = verify(&record, |_| Some(vk)).unwrap_err();
        assert_eq!(err, VerifyError::ChecksumMismatch);
        assert_eq!(err.code(), "CHECKSUM_MISMATCH");
    }

    #[test]
    fn verify_detects_missing_key() {
        let (sk, _vk) = keypair();
        let payload = Payload { a: 1, b: "x".into() };
        let unsigned = UnsignedRecord::new(Kind::Task, payload.clone()).unwrap();
        let sig = sign(&payload, &sk, "human:dev", "author", "").unwrap();
        let record = unsigned.into_signed(sig);

        let err = verify(&record, |_| None).unwrap_err();
        assert!(matches!(err, VerifyError::KeyNotFound { .. }));
        assert_eq!(err.code(), "KEY_NOT_FOUND");
    }

    #[test]
    fn verify_detects_wrong_key() {
        let (sk, _vk) = keypair();
        let (_, other_vk) = keypair();
        let payload = Payload { a: 1, b: "x".into() };
        let unsigned = UnsignedRecord::new(Kind::Task, payload.clone()).unwrap();
        let sig = sign(&payload, &sk, "human:dev", "author", "").unwrap();
        let record = unsigned.into_signed(sig);

        let err = verify(&record, |_| Some(other_vk)).unwrap_err();
        assert!(matches!(err, VerifyError::SignatureInvalid { .. }));
    }

    #[test]
    fn apply_signature_replaces_placeholder() {
        let mut sigs = vec![Signature::placeholder("human:dev", "author")];
        let real = Signature {
            key_id: "human:dev".into(),
            role: "author".into(),
            notes: "real".into(),
            signature: "realsig".into(),
            timestamp: 0,
        };
        apply_signature(&mut sigs, real.clone());
        assert_eq!(sigs.len(), 1);
        assert_eq!(sigs[0].signature, "realsig");
    }

    #[test]
    fn apply_signature_appends_when_no_placeholder() {
        let mut sigs = vec![Signature {
            key_id: "human:dev".into(),
            role: "author".into(),
            notes: "".into(),
            signature: "sig1".into(),
            timestamp: 0,
        }];
        let second = Signature {
            key_id: "human:other".into(),
            role: "approver:product".into(),
            notes: "".into(),
            signature: "sig2".into(),
            timestamp: 0,
        };
        apply_signature(&mut sigs, second);
        assert_eq!(sigs.len(), 2);
    }
}
