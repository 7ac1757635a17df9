// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]
//! gitgov-agent
//!
//! Agent manifest CRUD, anchored to a `type == "agent"` identity actor.
//! Unlike [`gitgov_identity::IdentityAdapter::sign_record`], agent
//! manifests have no mock-signature fallback: an agent without a stored
//! private key cannot register.

mod adapter;
mod error;

pub use adapter::AgentAdapter;
pub use error::{AgentError, Result};
