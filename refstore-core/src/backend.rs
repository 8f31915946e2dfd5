//! Storage backend abstraction for the data layer.
//!
//! The data layer does not implement durable persistence itself; it
//! consumes a [`StoreBackend`] that provides keyed document collections.
//! The engine only ever asks the store for the primitives below: inserting
//! and replacing whole documents, point lookups by identifier, an
//! insertion-ordered scan, a single-path update and a single-document
//! delete. Matching, population and positional resolution all happen on the
//! engine side.
//!
//! # Traits
//!
//! - [`StoreBackend`]: the storage operations themselves
//! - [`StoreConnector`]: opens a backend from a target address; the session
//!   manager drives it through its connection lifecycle
//!
//! # Thread safety
//!
//! Implementations must be thread-safe (`Send + Sync`) and tolerate
//! concurrent operations; the session issues reads and writes concurrently
//! once connected. A caller that stops awaiting an operation gets
//! at-least-attempted semantics: a dispatched write may still take effect.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    document::{Document, Id, Value},
    error::RefStoreResult,
    query::Path,
};

/// Abstract interface over a document store.
///
/// Implementers provide durable (or in-memory) keyed collections. A
/// collection that was never written to behaves as empty: lookups return
/// `None` and scans return no documents.
///
/// # Error handling
///
/// Operations return [`RefStoreResult`]. A missing document in
/// [`fetch_by_id`](Self::fetch_by_id) is `Ok(None)`, never an error;
/// referential integrity is not enforced at write time, so resolution code
/// must tolerate identifiers that point nowhere.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Inserts a new document.
    ///
    /// # Errors
    ///
    /// Fails with [`DocumentAlreadyExists`](crate::error::RefStoreError::DocumentAlreadyExists)
    /// if the identifier is already present in the collection.
    async fn insert(&self, collection: &str, document: Document) -> RefStoreResult<()>;

    /// Replaces a stored document with the same identifier in its entirety.
    ///
    /// # Errors
    ///
    /// Fails with [`DocumentNotFound`](crate::error::RefStoreError::DocumentNotFound)
    /// if no document carries that identifier.
    async fn replace(&self, collection: &str, document: Document) -> RefStoreResult<()>;

    /// Retrieves a document by identifier. A miss is a normal result value.
    async fn fetch_by_id(&self, collection: &str, id: &Id) -> RefStoreResult<Option<Document>>;

    /// Returns every document of the collection in insertion order.
    async fn scan(&self, collection: &str) -> RefStoreResult<Vec<Document>>;

    /// Sets the value at a concrete field path of one document, leaving
    /// every other field untouched. The path must not contain unresolved
    /// positional segments.
    ///
    /// Returns whether the stored value actually changed.
    async fn apply_update(
        &self,
        collection: &str,
        id: &Id,
        path: &Path,
        value: Value,
    ) -> RefStoreResult<bool>;

    /// Deletes a document by identifier. Returns whether a document was
    /// removed; deleting an absent identifier is not an error.
    async fn delete(&self, collection: &str, id: &Id) -> RefStoreResult<bool>;

    /// Cleanly shuts down the backend, releasing its resources.
    ///
    /// The default implementation is a no-op; backends holding connections
    /// or file handles should override this.
    async fn close(self) -> RefStoreResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

#[async_trait]
impl<B> StoreBackend for &B
where
    B: StoreBackend,
{
    async fn insert(&self, collection: &str, document: Document) -> RefStoreResult<()> {
        (*self).insert(collection, document).await
    }

    async fn replace(&self, collection: &str, document: Document) -> RefStoreResult<()> {
        (*self).replace(collection, document).await
    }

    async fn fetch_by_id(&self, collection: &str, id: &Id) -> RefStoreResult<Option<Document>> {
        (*self).fetch_by_id(collection, id).await
    }

    async fn scan(&self, collection: &str) -> RefStoreResult<Vec<Document>> {
        (*self).scan(collection).await
    }

    async fn apply_update(
        &self,
        collection: &str,
        id: &Id,
        path: &Path,
        value: Value,
    ) -> RefStoreResult<bool> {
        (*self)
            .apply_update(collection, id, path, value)
            .await
    }

    async fn delete(&self, collection: &str, id: &Id) -> RefStoreResult<bool> {
        (*self).delete(collection, id).await
    }
}

/// Factory that opens a [`StoreBackend`] from a target address.
///
/// The session manager calls [`open`](Self::open) while transitioning
/// through `Connecting`; a failure surfaces as a
/// [`Connection`](crate::error::RefStoreError::Connection) error and moves
/// the session to `Failed`.
#[async_trait]
pub trait StoreConnector: Send + Sync {
    type Backend: StoreBackend + 'static;

    /// Opens a backend for the given target address.
    async fn open(&self, target: &str) -> RefStoreResult<Self::Backend>;
}
