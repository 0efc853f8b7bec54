//! # tracelab Testkit
//!
//! Test utilities for tracelab.
//!
//! This crate provides:
//! - Test fixtures: a music store with a capturing log
//! - Property-based test generators using proptest
//! - A race harness that forces concurrent upserts to interleave
//! - Goodness-of-fit helpers for checking random choices
//!
//! ## Usage
//!
//! ```rust
//! use tracelab_testkit::prelude::*;
//!
//! with_lab(|lab| {
//!     let coordinator = lab.coordinator(1);
//!     coordinator
//!         .resolve_or_create_atomic(&lab.cx(), "Captain", "A", "Smoke on the Water")
//!         .unwrap();
//!     assert_eq!(lab.singer_count(), 1);
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod stats;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stats::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use stats::*;
pub use stress::*;
