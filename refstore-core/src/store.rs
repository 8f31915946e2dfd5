//! Main entry point tying schemas, session and collections together.
//!
//! A [`RefStore`] owns the schema registry and the session for one store
//! connection. Collections are obtained by name once their schema is
//! defined; all operations issued through them share the session's
//! connection. There is no ambient global handle: the store is an explicit
//! value passed by reference to whoever needs it.
//!
//! # Example
//!
//! ```ignore
//! use refstore::{RefStore, memory::MemoryConnector, schema::FieldSpec, query::Filter};
//!
//! let store = RefStore::new(MemoryConnector::new());
//!
//! store.define("mealtypes", vec![
//!     FieldSpec::int("_id"),
//!     FieldSpec::string("type"),
//! ])?;
//! store.define("meals", vec![
//!     FieldSpec::reference("type", "mealtypes"),
//!     FieldSpec::embedded("foods", vec![FieldSpec::string("menu")]),
//! ])?;
//!
//! store.connect("memory://meal").await?;
//!
//! let meals = store.collection("meals")?;
//! let breakfasts = meals.find(Filter::eq("type", 1)).populate("type").exec().await?;
//!
//! store.disconnect().await?;
//! ```

use crate::{
    backend::StoreConnector,
    collection::Collection,
    error::{RefStoreError, RefStoreResult},
    schema::{FieldSpec, SchemaHandle, SchemaRegistry},
    session::{Session, SessionEvents, SessionState},
};

/// A document store bound to a specific connector.
pub struct RefStore<C: StoreConnector> {
    schemas: SchemaRegistry,
    session: Session<C>,
}

impl<C: StoreConnector> RefStore<C> {
    /// Creates a disconnected store over the given connector.
    pub fn new(connector: C) -> Self {
        Self {
            schemas: SchemaRegistry::new(),
            session: Session::new(connector),
        }
    }

    /// Publishes a schema for a collection.
    ///
    /// # Errors
    ///
    /// Returns [`RefStoreError::DuplicateSchema`] on redefinition.
    pub fn define(
        &self,
        collection: impl Into<String>,
        specs: Vec<FieldSpec>,
    ) -> RefStoreResult<SchemaHandle> {
        self.schemas.define(collection, specs)
    }

    /// Returns the schema registry.
    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    /// Returns the session owning the connection.
    pub fn session(&self) -> &Session<C> {
        &self.session
    }

    /// Returns the current connection state.
    pub async fn state(&self) -> SessionState {
        self.session.state().await
    }

    /// Subscribes to connection lifecycle events.
    pub async fn subscribe(&self) -> SessionEvents {
        self.session.subscribe().await
    }

    /// Opens the connection to `target`.
    pub async fn connect(&self, target: &str) -> RefStoreResult<()> {
        self.session.connect(target).await
    }

    /// Takes the connection down. Idempotent.
    pub async fn disconnect(&self) -> RefStoreResult<()> {
        self.session.disconnect().await
    }

    /// Returns a handle to a collection with a published schema.
    ///
    /// # Errors
    ///
    /// Returns [`RefStoreError::SchemaNotFound`] if no schema was defined
    /// for the collection.
    pub fn collection(&self, name: &str) -> RefStoreResult<Collection<'_, C>> {
        let schema = self
            .schemas
            .resolve(name)
            .ok_or_else(|| RefStoreError::SchemaNotFound(name.to_string()))?;

        Ok(Collection::new(name.to_string(), schema, &self.session))
    }
}
