// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]
//! gitgov-store
//!
//! The external-collaborator interfaces GitGov's adapters depend on
//! (spec.md §6) — [`RecordStore`], [`KeyProvider`], [`SessionManager`] —
//! plus two concrete implementations: an in-memory one for tests and
//! embedders with their own persistence, and a filesystem one reproducing
//! the `.gitgov/` on-disk layout.

mod error;
mod fs;
mod memory;
mod traits;

pub use error::{Result, StoreError};
pub use fs::{FsKeyProvider, FsSessionManager, FsStore};
pub use memory::{MemoryKeyProvider, MemorySessionManager, MemoryStore};
pub use traits::{KeyProvider, RecordStore, SessionManager};
