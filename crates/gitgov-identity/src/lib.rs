// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]
//! gitgov-identity
//!
//! Actor identity: self-signing bootstrap creation, signing other records
//! on an actor's behalf, revocation, and key rotation with succession
//! chains. Generic over the [`gitgov_store`] collaborator traits so callers
//! choose the in-memory or filesystem backend.

mod adapter;
mod error;
mod keys;

pub use adapter::{CreateActorInput, IdentityAdapter, RevokeReason};
pub use error::{IdentityError, Result};
pub use keys::{decode_signing_key, decode_verifying_key, encode_signing_key, generate_keypair};
