//! A minimal document-oriented data layer with schema-typed collections,
//! cross-collection reference population and positional array updates.
//!
//! This crate is the core of the refstore project and provides:
//!
//! - **Document model** ([`document`]) - Identifiers, tagged values and the
//!   document record itself
//! - **Schema registry** ([`schema`]) - Per-collection field declarations,
//!   write-time validation and reference targets
//! - **Query language** ([`query`]) - Path-based filters and set-style
//!   update specifications
//! - **Matcher** ([`matcher`]) - Filter evaluation with existential
//!   sequence semantics and first-match position tracking
//! - **Populate engine** ([`populate`]) - Batch resolution of reference
//!   fields into embedded target documents
//! - **Update executor** ([`update`], [`collection`]) - Positional
//!   matched-element sets, batch updates and deletes with honest counts
//! - **Session manager** ([`session`]) - Connection lifecycle, state
//!   transitions and observable events
//! - **Store backend abstraction** ([`backend`]) - Traits the storage
//!   collaborator implements
//! - **Store entry point** ([`store`]) - Schemas, session and collections
//!   under one handle
//! - **Error handling** ([`error`]) - Error and result types
//!
//! # Example
//!
//! ```ignore
//! use refstore::{fields, RefStore, memory::MemoryConnector};
//! use refstore::schema::FieldSpec;
//! use refstore::query::{Filter, Update};
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
//!     let meals = store.collection("meals")?;
//!     meals.insert(fields! {
//!         "type": 1,
//!         "foods": vec![
//!             refstore::document::Value::from(fields! { "menu": "egg" }),
//!             refstore::document::Value::from(fields! { "menu": "milk" }),
//!         ],
//!     }).await?;
//!
//!     let breakfasts = meals
//!         .find(Filter::eq("type", 1))
//!         .populate("type")
//!         .exec()
//!         .await?;
//!
//!     meals.update_many(
//!         &Filter::eq("foods.menu", "milk"),
//!         &Update::set("foods.$.menu", "orange juice"),
//!     ).await?;
//!
//!     store.disconnect().await?;
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod collection;
pub mod document;
pub mod error;
pub mod matcher;
pub mod populate;
pub mod query;
pub mod schema;
pub mod session;
pub mod store;
pub mod update;
