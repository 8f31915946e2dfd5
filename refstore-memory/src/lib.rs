//! In-memory storage backend for refstore.
//!
//! This crate provides a thread-safe, in-memory implementation of the
//! `StoreBackend` trait. Collections keep their documents in insertion
//! order behind an async-aware read-write lock. It is ideal for
//! development, testing, and small-scale deployments.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using an
//!   async-aware RwLock
//! - **Insertion-ordered scans** - `scan` returns documents in the order
//!   they were inserted
//! - **Shared-handle connector** - `MemoryConnector` hands out handles to
//!   one store, so a reconnect observes the same data
//!
//! # Quick Start
//!
//! ```ignore
//! use refstore::{fields, RefStore, memory::MemoryConnector};
//! use refstore::schema::FieldSpec;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = RefStore::new(MemoryConnector::new());
//!     store.define("mealtypes", vec![
//!         FieldSpec::int("_id"),
//!         FieldSpec::string("type"),
//!     ])?;
//!     store.connect("memory://meal").await?;
//!
//!     let mealtypes = store.collection("mealtypes")?;
//!     mealtypes.insert(fields! { "_id": 1, "type": "breakfast" }).await?;
//!
//!     store.disconnect().await?;
//!     Ok(())
//! }
//! ```

pub mod store;

pub use store::{MemoryConnector, MemoryStore};
