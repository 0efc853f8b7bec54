//! # tracelab Core
//!
//! Entity resolution and upsert strategies over a transactional store, plus
//! a synthetic workload that mixes reads with upserts.
//!
//! This crate provides:
//! - [`EntityResolver`]: natural key to surrogate id, standalone or inside a
//!   caller's read-write transaction
//! - [`UpsertCoordinator`]: resolve-or-create a singer and album with either
//!   independent transactions or one atomic transaction
//! - [`Queries`]: the read templates
//! - [`Simulator`]: uniformly drawn actions and synthetic records
//! - [`AppLog`]: leveled logging correlated with trace and span ids
//!
//! ## Example
//!
//! ```rust
//! use tracelab_core::{music_store, AppLog, Context, IdGenerator, UpsertCoordinator};
//! use tracelab_store::StoreConfig;
//!
//! let store = music_store(StoreConfig::default());
//! let coordinator = UpsertCoordinator::new(&store, IdGenerator::new(42), AppLog::tracing(None));
//! let cx = Context::background();
//!
//! let outcome = coordinator
//!     .resolve_or_create_atomic(&cx, "Captain", "A", "Smoke on the Water")
//!     .unwrap();
//! assert!(outcome.album_id().is_some());
//!
//! // The singer exists now, so the atomic strategy returns early.
//! let again = coordinator
//!     .resolve_or_create_atomic(&cx, "Captain", "A", "Smoke on the Water")
//!     .unwrap();
//! assert_eq!(again.album, None);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod applog;
mod config;
mod context;
pub mod coordinator;
mod error;
pub mod queries;
pub mod resolver;
pub mod schema;
pub mod simulator;
mod types;
pub mod workload;

pub use applog::{AppLog, LogEntry, LogSink, MemorySink, Severity, Span, TracingSink};
pub use config::{LabConfig, QueryConfig};
pub use context::{Context, SpanContext, SpanId, TraceId};
pub use coordinator::{
    Atomic, IdGenerator, Independent, ResolveOrCreate, Strategy, UpsertCoordinator,
};
pub use error::{CoreError, CoreResult};
pub use queries::Queries;
pub use resolver::{lookup_album_id, lookup_singer_id, EntityResolver};
pub use schema::{music_schema, music_store};
pub use simulator::{ActionStats, SimulationReport, Simulator};
pub use types::{AlbumId, Resolved, SingerId, UpsertOutcome};
pub use workload::{next_action, random_synthetic_record, Action, SyntheticRecord};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
