// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]
//! gitgov-feedback
//!
//! Feedback creation (with a duplicate-assignment guard) and resolution.
//! Resolution is modeled as a brand-new record referencing the original via
//! `resolvesFeedbackId`, never a mutation — see
//! [`FeedbackAdapter::get_unresolved_blocking`] for how callers reduce that
//! chain back into an "is this still blocking?" answer.

mod adapter;
mod error;

pub use adapter::{FeedbackAdapter, SYSTEM_ACTOR_ID};
pub use error::{FeedbackError, Result};
