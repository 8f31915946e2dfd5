//! Collection handles and the operations issued through them.
//!
//! A [`Collection`] binds a name, its published schema and the session
//! whose connection carries the store traffic. It exposes the full
//! operation surface: schema-validated inserts and replaces, lazy
//! filtered finds with reference population, positional batch updates and
//! batch deletes.
//!
//! # Example
//!
//! ```ignore
//! use refstore::query::{Filter, Update};
//!
//! let meals = store.collection("meals")?;
//!
//! let breakfasts = meals.find(Filter::eq("type", 1)).populate("type").exec().await?;
//!
//! let result = meals
//!     .update_many(
//!         &Filter::eq("foods.menu", "milk"),
//!         &Update::set("foods.$.menu", "orange juice"),
//!     )
//!     .await?;
//! assert_eq!(result.matched_count, 2);
//! ```

use log::{debug, warn};

use crate::{
    backend::{StoreBackend, StoreConnector},
    document::{Document, Fields, Id, Value},
    error::{RefStoreError, RefStoreResult},
    matcher::{DocumentMatcher, MatchReport},
    populate::populate,
    query::{Filter, Path, Update},
    schema::SchemaHandle,
    session::Session,
    update::{DeleteResult, UpdateResult, resolve_positional},
};

/// A handle to one collection, bound to a schema and a session.
pub struct Collection<'a, C: StoreConnector> {
    name: String,
    schema: SchemaHandle,
    session: &'a Session<C>,
}

impl<'a, C: StoreConnector> std::fmt::Debug for Collection<'a, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

impl<'a, C: StoreConnector> Collection<'a, C> {
    pub(crate) fn new(name: String, schema: SchemaHandle, session: &'a Session<C>) -> Self {
        Self { name, schema, session }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the published schema of this collection.
    pub fn schema(&self) -> &SchemaHandle {
        &self.schema
    }

    /// Inserts a document, returning its identifier.
    ///
    /// The fields are schema-validated and normalized first. An explicit
    /// `_id` field supplies the identifier; otherwise one is assigned.
    ///
    /// # Errors
    ///
    /// [`SchemaViolation`](RefStoreError::SchemaViolation) on a type
    /// mismatch,
    /// [`DocumentAlreadyExists`](RefStoreError::DocumentAlreadyExists) on a
    /// duplicate explicit identifier.
    pub async fn insert(&self, fields: Fields) -> RefStoreResult<Id> {
        let backend = self.session.backend().await?;
        let mut normalized = self.schema.validate(fields)?;

        let id = match normalized.remove("_id") {
            None => Id::generate(),
            Some(Value::Int(i)) => Id::Int(i),
            Some(Value::String(s)) => Id::String(s),
            Some(other) => {
                return Err(RefStoreError::SchemaViolation(
                    self.name.clone(),
                    format!("`_id` must be an integer or string, got {other:?}"),
                ));
            }
        };

        backend
            .insert(&self.name, Document::new(id.clone(), normalized))
            .await?;
        debug!("inserted {id} into {}", self.name);

        Ok(id)
    }

    /// Retrieves a document by identifier. A miss is `Ok(None)`.
    pub async fn fetch(&self, id: &Id) -> RefStoreResult<Option<Document>> {
        let backend = self.session.backend().await?;
        backend.fetch_by_id(&self.name, id).await
    }

    /// Overwrites the document with the given identifier in its entirety.
    ///
    /// The new fields are schema-validated and normalized like an insert;
    /// the identifier is taken from the argument, never from the fields.
    pub async fn replace(&self, id: &Id, fields: Fields) -> RefStoreResult<()> {
        let backend = self.session.backend().await?;
        let mut normalized = self.schema.validate(fields)?;
        normalized.remove("_id");

        backend
            .replace(&self.name, Document::new(id.clone(), normalized))
            .await
    }

    /// Starts a find over this collection.
    ///
    /// The returned query is lazy and restartable: no store traffic happens
    /// until [`exec`](FindQuery::exec), and every `exec` re-runs the scan.
    /// Results come back in collection insertion order; no other ordering
    /// is guaranteed. An empty filter selects every document.
    pub fn find(&self, filter: Filter) -> FindQuery<'_, 'a, C> {
        FindQuery {
            collection: self,
            filter,
            populate_fields: Vec::new(),
        }
    }

    /// Applies set instructions to every document matching the filter.
    ///
    /// A positional `$` segment targets, per document, the first embedded
    /// element that satisfied the filter's predicate through that sequence,
    /// taken from the same matcher pass that selected the document. All
    /// other elements and fields are untouched.
    ///
    /// Returns how many documents matched and how many actually changed.
    ///
    /// # Errors
    ///
    /// [`SchemaViolation`](RefStoreError::SchemaViolation) if a set path or
    /// value does not fit the schema,
    /// [`InvalidUpdate`](RefStoreError::InvalidUpdate) for a positional set
    /// whose sequence carries no filter predicate, and
    /// [`PartialBatch`](RefStoreError::PartialBatch) when the store fails
    /// mid-batch, reporting the documents completed before the failure.
    pub async fn update_many(
        &self,
        filter: &Filter,
        update: &Update,
    ) -> RefStoreResult<UpdateResult> {
        let backend = self.session.backend().await?;

        // Type-check the set instructions once, up front.
        let mut sets: Vec<(Path, Value)> = Vec::with_capacity(update.sets().len());
        for (path, value) in update.sets() {
            let kind = self.schema.kind_at(path).ok_or_else(|| {
                RefStoreError::SchemaViolation(
                    self.name.clone(),
                    format!("unknown field path `{path}`"),
                )
            })?;
            let value = self
                .schema
                .check_value(path.as_str(), kind, value.clone())?;
            sets.push((path.clone(), value));
        }

        let matches = self.matching_reports(&*backend, filter).await?;
        let attempted = matches.len() as u64;
        let mut completed = 0u64;
        let mut modified = 0u64;

        for (id, report) in &matches {
            let mut changed = false;

            for (path, value) in &sets {
                let concrete = resolve_positional(path, report)?;

                match backend
                    .apply_update(&self.name, id, &concrete, value.clone())
                    .await
                {
                    Ok(applied) => changed |= applied,
                    Err(err) => {
                        warn!(
                            "update on {} aborted after {completed} of {attempted} documents: {err}",
                            self.name
                        );
                        return Err(RefStoreError::PartialBatch {
                            completed,
                            attempted,
                            reason: err.to_string(),
                        });
                    }
                }
            }

            completed += 1;
            if changed {
                modified += 1;
            }
        }

        debug!(
            "updated {} (matched {attempted}, modified {modified})",
            self.name
        );

        Ok(UpdateResult { matched_count: attempted, modified_count: modified })
    }

    /// Deletes every document matching the filter.
    ///
    /// # Errors
    ///
    /// [`PartialBatch`](RefStoreError::PartialBatch) when the store fails
    /// mid-batch, reporting the count actually deleted; the batch is never
    /// silently reported as complete.
    pub async fn delete_many(&self, filter: &Filter) -> RefStoreResult<DeleteResult> {
        let backend = self.session.backend().await?;

        let ids: Vec<Id> = self
            .matching_reports(&*backend, filter)
            .await?
            .into_iter()
            .map(|(id, _)| id)
            .collect();

        let attempted = ids.len() as u64;
        let mut deleted = 0u64;

        for id in &ids {
            match backend.delete(&self.name, id).await {
                Ok(true) => deleted += 1,
                Ok(false) => {}
                Err(err) => {
                    warn!(
                        "delete on {} aborted after {deleted} of {attempted} documents: {err}",
                        self.name
                    );
                    return Err(RefStoreError::PartialBatch {
                        completed: deleted,
                        attempted,
                        reason: err.to_string(),
                    });
                }
            }
        }

        debug!("deleted {deleted} documents from {}", self.name);

        Ok(DeleteResult { deleted_count: deleted })
    }

    /// One matcher pass over the collection: identifier plus match report
    /// for every satisfying document, in insertion order.
    async fn matching_reports(
        &self,
        backend: &C::Backend,
        filter: &Filter,
    ) -> RefStoreResult<Vec<(Id, MatchReport)>> {
        let documents = backend.scan(&self.name).await?;
        let mut matches = Vec::new();

        for document in &documents {
            let report = DocumentMatcher::new(document).evaluate(filter);
            if report.matched() {
                matches.push((document.id().clone(), report));
            }
        }

        Ok(matches)
    }
}

/// A lazy, restartable find over one collection.
///
/// Nothing is fetched until [`exec`](Self::exec); each `exec` re-runs the
/// scan against the current store contents.
pub struct FindQuery<'q, 'a, C: StoreConnector> {
    collection: &'q Collection<'a, C>,
    filter: Filter,
    populate_fields: Vec<String>,
}

impl<C: StoreConnector> FindQuery<'_, '_, C> {
    /// Requests resolution of a top-level reference field in the results.
    ///
    /// Each named field is resolved in a single deduplicated pass during
    /// [`exec`](Self::exec); identifiers that point nowhere come back as
    /// dangling markers rather than errors.
    pub fn populate(mut self, field: impl Into<String>) -> Self {
        self.populate_fields.push(field.into());
        self
    }

    /// Runs the query, returning matching documents in insertion order.
    pub async fn exec(&self) -> RefStoreResult<Vec<Document>> {
        let backend = self.collection.session.backend().await?;

        let mut results: Vec<Document> = backend
            .scan(&self.collection.name)
            .await?
            .into_iter()
            .filter(|document| {
                DocumentMatcher::new(document)
                    .evaluate(&self.filter)
                    .matched()
            })
            .collect();

        for field in &self.populate_fields {
            populate(&*backend, &self.collection.schema, &mut results, field).await?;
        }

        Ok(results)
    }
}
