//! Convenient re-exports of commonly used types from refstore.
//!
//! Import this prelude module to quickly access the most frequently used
//! types and traits without needing to import from multiple sub-modules:
//!
//! ```ignore
//! use refstore::prelude::*;
//! ```
//!
//! This provides access to:
//! - The store entry point and collection handles
//! - The document model
//! - Schema declaration types
//! - Query, update and matcher types
//! - Session lifecycle types
//! - Storage backend traits
//! - Error types

pub use refstore_core::{
    backend::{StoreBackend, StoreConnector},
    collection::{Collection, FindQuery},
    document::{Document, Fields, Id, Value},
    error::{RefStoreError, RefStoreResult},
    matcher::{DocumentMatcher, MatchReport},
    query::{CmpOp, Filter, Path, Segment, Update},
    schema::{FieldKind, FieldSpec, Schema, SchemaHandle, SchemaRegistry},
    session::{Session, SessionEvent, SessionEvents, SessionState},
    store::RefStore,
    update::{DeleteResult, UpdateResult},
};
