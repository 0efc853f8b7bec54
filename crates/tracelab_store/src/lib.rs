//! # tracelab Store
//!
//! The store gateway seam and an in-memory transactional store behind it.
//!
//! This crate provides:
//! - [`StoreGateway`]: the interface the core needs from a transactional store
//!   (strongly consistent single reads, read-only snapshot transactions, and
//!   read-write transactions with automatic retry of transient conflicts)
//! - A small statement model ([`Statement`]) with SQL rendering for logs
//! - Rows, values and typed column decoding ([`Row`], [`Value`], [`FromValue`])
//! - [`MemoryStore`]: an MVCC, insert-only store with optimistic conflict
//!   detection, primary key and foreign key enforcement, cancellation,
//!   simulated latency and fault injection
//!
//! ## Example
//!
//! ```rust
//! use tracelab_store::{
//!     CallContext, ColumnType, MemoryStore, ReadContext, ReadWriteContext, Schema, Statement,
//!     StoreConfig, StoreError, StoreGateway, TableDef,
//! };
//!
//! let schema = Schema::new().with_table(
//!     TableDef::new("Items")
//!         .with_column("ItemId", ColumnType::Int64)
//!         .with_column("Name", ColumnType::String)
//!         .with_primary_key(["ItemId"]),
//! );
//! let store = MemoryStore::new(schema, StoreConfig::default());
//! let call = CallContext::new();
//!
//! store
//!     .read_write_transaction(&call, |txn| -> Result<(), StoreError> {
//!         let insert = Statement::insert("Items").value("ItemId", 1).value("Name", "lamp");
//!         txn.update(&insert.into())?;
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! let mut rows = store
//!     .single(&call)
//!     .query(&Statement::select("Items").columns(["Name"]).into())
//!     .unwrap();
//! let row = rows.next().unwrap().unwrap();
//! assert_eq!(row.get::<String>(0).unwrap(), "lamp");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod gateway;
mod memory;
mod retry;
mod schema;
mod statement;
mod value;

pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use gateway::{
    CallContext, CancellationToken, Committed, ReadContext, ReadWriteContext, StoreGateway,
    TransactionError,
};
pub use memory::{
    FaultInjector, MemoryStore, MemoryTransaction, ReadOnlyTransaction, SingleRead, StoreStats,
};
pub use retry::RetryConfig;
pub use schema::{ColumnDef, ColumnType, ForeignKey, IndexDef, Schema, TableDef};
pub use statement::{Insert, Join, Select, Statement};
pub use value::{FromValue, Row, RowIterator, Value};
