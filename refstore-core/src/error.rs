//! Error types and result types for data layer operations.
//!
//! This module provides error handling for schema definition, validation,
//! querying, updating and connection management. Use [`RefStoreResult<T>`]
//! as the return type for fallible operations.
//!
//! A missed identifier lookup is never an error: [`fetch_by_id`] and the
//! populate engine report missing targets as `None` / dangling values, since
//! referential integrity is not enforced at write time.
//!
//! [`fetch_by_id`]: crate::backend::StoreBackend::fetch_by_id

use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when interacting with the
/// data layer.
///
/// This enum covers schema registration and validation, query and update
/// construction, connection lifecycle and backend I/O failures.
#[derive(Error, Debug)]
pub enum RefStoreError {
    /// A value written to a collection does not satisfy the declared field
    /// types. The first argument is the collection name, the second the
    /// reason. Fatal to the single write, not to the session.
    #[error("Schema violation in collection {0}: {1}")]
    SchemaViolation(String, String),
    /// A schema was already defined for the collection. Schemas are
    /// immutable once published; redefinition fails instead of silently
    /// overwriting.
    #[error("Schema already defined for collection {0}")]
    DuplicateSchema(String),
    /// No schema has been defined for the collection.
    #[error("Schema not found for collection {0}")]
    SchemaNotFound(String),
    /// A document with the given identifier already exists in the collection.
    /// The first argument is the identifier, the second the collection name.
    #[error("Document {0} already exists in collection {1}")]
    DocumentAlreadyExists(String, String),
    /// The targeted document does not exist in the collection.
    /// The first argument is the identifier, the second the collection name.
    #[error("Document not found {0} in collection {1}")]
    DocumentNotFound(String, String),
    /// Transport or authentication failure while opening a connection.
    /// The session moves to `Failed`; the core performs no automatic retry.
    #[error("Connection error: {0}")]
    Connection(String),
    /// An operation was issued against a session that is not `Connected`.
    #[error("Session is not connected")]
    NotConnected,
    /// An I/O failure in the underlying storage backend.
    #[error("Store error: {0}")]
    Store(String),
    /// A batch update or delete failed partway through. `completed` reports
    /// the writes that actually took effect before the failure; the batch is
    /// never silently reported as fully applied.
    #[error("Store failure after {completed} of {attempted} writes: {reason}")]
    PartialBatch {
        /// Writes applied before the failure.
        completed: u64,
        /// Writes the batch intended to apply.
        attempted: u64,
        /// The underlying store failure.
        reason: String,
    },
    /// A filter or populate request that cannot be evaluated, e.g.
    /// populating a field that is not a reference.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    /// An update specification that cannot be applied, e.g. a positional
    /// set whose array carries no filter clause.
    #[error("Invalid update: {0}")]
    InvalidUpdate(String),
    /// Serialization/deserialization error when converting documents.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// A specialized `Result` type for data layer operations.
///
/// This type alias is used throughout the crate to indicate operations that
/// may fail with a [`RefStoreError`].
pub type RefStoreResult<T> = Result<T, RefStoreError>;

impl From<SerdeJsonError> for RefStoreError {
    fn from(err: SerdeJsonError) -> Self {
        RefStoreError::Serialization(err.to_string())
    }
}
