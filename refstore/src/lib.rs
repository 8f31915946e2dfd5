//! Main refstore crate providing a schema-typed document data layer.
//!
//! This crate is the primary entry point for users of the refstore
//! framework. It re-exports the core types from the sub-crates and
//! provides convenient access to the in-memory storage backend.
//!
//! # Features
//!
//! - **Schema-typed collections** - Declare field kinds, references and
//!   embedded sequences per collection; writes are validated synchronously
//! - **Reference population** - Resolve pointer-by-identifier fields into
//!   embedded target documents in one deduplicated pass
//! - **Positional updates** - Set exactly the first array element matched
//!   by the selecting filter, per document, from a single matcher pass
//! - **Explicit sessions** - Connection lifecycle as a state machine with
//!   observable events, no ambient global handle
//!
//! # Quick Start
//!
//! ```ignore
//! use refstore::{fields, prelude::*, memory::MemoryConnector};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = RefStore::new(MemoryConnector::new());
//!
//!     store.define("mealtypes", vec![
//!         FieldSpec::int("_id"),
//!         FieldSpec::string("type"),
//!     ])?;
//!     store.define("meals", vec![
//!         FieldSpec::reference("type", "mealtypes"),
//!         FieldSpec::embedded("foods", vec![FieldSpec::string("menu")]),
//!     ])?;
//!
//!     store.connect("memory://meal").await?;
//!
//!     let mealtypes = store.collection("mealtypes")?;
//!     mealtypes.insert(fields! { "_id": 1, "type": "breakfast" }).await?;
//!
//!     let meals = store.collection("meals")?;
//!     meals.insert(fields! {
//!         "type": 1,
//!         "foods": vec![
//!             Value::from(fields! { "menu": "egg" }),
//!             Value::from(fields! { "menu": "milk" }),
//!             Value::from(fields! { "menu": "toast" }),
//!         ],
//!     }).await?;
//!
//!     // Who had breakfast? Resolve the meal type while we're at it.
//!     let breakfasts = meals
//!         .find(Filter::eq("type", 1))
//!         .populate("type")
//!         .exec()
//!         .await?;
//!     println!("breakfasts: {breakfasts:?}");
//!
//!     // Swap the first milk entry of every meal that has one.
//!     let result = meals
//!         .update_many(
//!             &Filter::eq("foods.menu", "milk"),
//!             &Update::set("foods.$.menu", "orange juice"),
//!         )
//!         .await?;
//!     println!("matched {} modified {}", result.matched_count, result.modified_count);
//!
//!     store.disconnect().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Session events
//!
//! Connection transitions are observable; logging consumers subscribe
//! instead of the core printing anything itself:
//!
//! ```ignore
//! use futures::StreamExt;
//!
//! let mut events = store.subscribe().await;
//! store.connect("memory://meal").await?;
//!
//! while let Some(event) = events.next().await {
//!     println!("session event: {event:?}");
//! }
//! ```
//!
//! # Backends
//!
//! - [`memory`] - Fast in-memory storage for development and testing.
//!   Persistent backends implement
//!   [`StoreBackend`](backend::StoreBackend) and
//!   [`StoreConnector`](backend::StoreConnector) from [`backend`].

pub mod prelude;

pub use refstore_core::{
    backend, collection, document, error, matcher, populate, query, schema, session, store,
    update,
};

pub use refstore_core::fields;
pub use refstore_core::store::RefStore;

/// In-memory storage backend implementations.
pub mod memory {
    pub use refstore_memory::{MemoryConnector, MemoryStore};
}
