//! In-memory storage implementation.
//!
//! This module provides a simple in-memory backend that keeps each
//! collection as an insertion-ordered vector of documents behind an
//! async-safe read-write lock.

use async_trait::async_trait;
use log::debug;
use mea::rwlock::RwLock;
use std::{collections::HashMap, sync::Arc};

use refstore_core::{
    backend::{StoreBackend, StoreConnector},
    document::{Document, Fields, Id, Value},
    error::{RefStoreError, RefStoreResult},
    query::{Path, Segment},
};

type StoreMap = HashMap<String, Vec<Document>>;

/// Thread-safe in-memory document storage backend.
///
/// Documents live in insertion-ordered vectors keyed by collection name.
/// The store is cloneable with `Arc`-shared internal state, so multiple
/// handles (for example from repeated [`MemoryConnector::open`] calls)
/// observe the same data.
///
/// # Performance
///
/// Point lookups and updates scan the collection vector (no indexing). For
/// the small to medium datasets this backend targets, that is acceptable;
/// use a persistent backend for anything larger.
#[derive(Default, Clone, Debug)]
pub struct MemoryStore {
    collections: Arc<RwLock<StoreMap>>,
}

impl MemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StoreBackend for MemoryStore {
    async fn insert(&self, collection: &str, document: Document) -> RefStoreResult<()> {
        let mut store = self.collections.write().await;
        let documents = store.entry(collection.to_string()).or_default();

        if documents.iter().any(|doc| doc.id() == document.id()) {
            return Err(RefStoreError::DocumentAlreadyExists(
                document.id().to_string(),
                collection.to_string(),
            ));
        }

        documents.push(document);

        Ok(())
    }

    async fn replace(&self, collection: &str, document: Document) -> RefStoreResult<()> {
        let mut store = self.collections.write().await;
        let documents = store.entry(collection.to_string()).or_default();

        match documents.iter_mut().find(|doc| doc.id() == document.id()) {
            Some(stored) => {
                *stored = document;
                Ok(())
            }
            None => Err(RefStoreError::DocumentNotFound(
                document.id().to_string(),
                collection.to_string(),
            )),
        }
    }

    async fn fetch_by_id(&self, collection: &str, id: &Id) -> RefStoreResult<Option<Document>> {
        let store = self.collections.read().await;

        Ok(store
            .get(collection)
            .and_then(|documents| documents.iter().find(|doc| doc.id() == id))
            .cloned())
    }

    async fn scan(&self, collection: &str) -> RefStoreResult<Vec<Document>> {
        let store = self.collections.read().await;

        Ok(store.get(collection).cloned().unwrap_or_default())
    }

    async fn apply_update(
        &self,
        collection: &str,
        id: &Id,
        path: &Path,
        value: Value,
    ) -> RefStoreResult<bool> {
        let mut store = self.collections.write().await;
        let document = store
            .get_mut(collection)
            .and_then(|documents| documents.iter_mut().find(|doc| doc.id() == id))
            .ok_or_else(|| {
                RefStoreError::DocumentNotFound(id.to_string(), collection.to_string())
            })?;

        apply_to_fields(document.fields_mut(), path.segments(), path, value)
    }

    async fn delete(&self, collection: &str, id: &Id) -> RefStoreResult<bool> {
        let mut store = self.collections.write().await;
        let Some(documents) = store.get_mut(collection) else {
            return Ok(false);
        };

        match documents.iter().position(|doc| doc.id() == id) {
            Some(index) => {
                documents.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

fn apply_to_fields(
    fields: &mut Fields,
    segments: &[Segment],
    path: &Path,
    value: Value,
) -> RefStoreResult<bool> {
    let [Segment::Field(name), rest @ ..] = segments else {
        return Err(invalid_path(path));
    };

    if rest.is_empty() {
        let changed = fields.get(name.as_str()) != Some(&value);
        fields.insert(name.clone(), value);
        return Ok(changed);
    }

    match fields.get_mut(name.as_str()) {
        Some(child) => apply_to_value(child, rest, path, value),
        None => Err(invalid_path(path)),
    }
}

fn apply_to_value(
    current: &mut Value,
    segments: &[Segment],
    path: &Path,
    value: Value,
) -> RefStoreResult<bool> {
    match segments {
        [Segment::Field(_), ..] => match current {
            Value::Map(fields) => apply_to_fields(fields, segments, path, value),
            _ => Err(invalid_path(path)),
        },
        [Segment::Index(index), rest @ ..] => match current {
            Value::Array(items) => {
                let Some(element) = items.get_mut(*index) else {
                    return Err(invalid_path(path));
                };

                if rest.is_empty() {
                    let changed = *element != value;
                    *element = value;
                    Ok(changed)
                } else {
                    apply_to_value(element, rest, path, value)
                }
            }
            _ => Err(invalid_path(path)),
        },
        [Segment::Positional, ..] => Err(RefStoreError::Store(format!(
            "path `{path}` reached the store with an unresolved positional segment"
        ))),
        [] => Err(invalid_path(path)),
    }
}

fn invalid_path(path: &Path) -> RefStoreError {
    RefStoreError::Store(format!("path `{path}` does not address a stored value"))
}

/// Connector handing out shared handles to one [`MemoryStore`].
///
/// The target address is accepted verbatim; every `open` returns a handle
/// to the same underlying store, so disconnecting and reconnecting a
/// session preserves the data.
#[derive(Default, Clone, Debug)]
pub struct MemoryConnector {
    store: MemoryStore,
}

impl MemoryConnector {
    /// Creates a connector over a fresh empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a connector over an existing store handle.
    pub fn with_store(store: MemoryStore) -> Self {
        Self { store }
    }

    /// Returns a handle to the underlying store.
    pub fn store(&self) -> MemoryStore {
        self.store.clone()
    }
}

#[async_trait]
impl StoreConnector for MemoryConnector {
    type Backend = MemoryStore;

    async fn open(&self, target: &str) -> RefStoreResult<MemoryStore> {
        debug!("opening in-memory store for {target}");

        Ok(self.store.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use refstore_core::fields;

    fn meal(id: i64, menus: &[&str]) -> Document {
        Document::new(
            Id::Int(id),
            fields! {
                "foods": menus
                    .iter()
                    .map(|menu| Value::from(fields! { "menu": *menu }))
                    .collect::<Vec<_>>(),
            },
        )
    }

    #[tokio::test]
    async fn insert_then_fetch_round_trips() {
        let store = MemoryStore::new();
        let doc = meal(1, &["egg", "milk"]);

        store.insert("meals", doc.clone()).await.unwrap();
        let fetched = store.fetch_by_id("meals", &Id::Int(1)).await.unwrap();

        assert_eq!(fetched, Some(doc));
    }

    #[tokio::test]
    async fn fetch_miss_is_a_normal_result() {
        let store = MemoryStore::new();

        assert_eq!(store.fetch_by_id("meals", &Id::Int(9)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn duplicate_insert_is_rejected() {
        let store = MemoryStore::new();
        store.insert("meals", meal(1, &["egg"])).await.unwrap();

        let err = store.insert("meals", meal(1, &["toast"])).await.unwrap_err();
        assert!(matches!(err, RefStoreError::DocumentAlreadyExists(id, _) if id == "1"));
    }

    #[tokio::test]
    async fn scan_preserves_insertion_order() {
        let store = MemoryStore::new();
        for id in [3, 1, 2] {
            store.insert("meals", meal(id, &["egg"])).await.unwrap();
        }

        let ids: Vec<Id> = store
            .scan("meals")
            .await
            .unwrap()
            .iter()
            .map(|doc| doc.id().clone())
            .collect();

        assert_eq!(ids, vec![Id::Int(3), Id::Int(1), Id::Int(2)]);
    }

    #[tokio::test]
    async fn scan_of_unknown_collection_is_empty() {
        assert!(MemoryStore::new().scan("meals").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn replace_overwrites_the_whole_document() {
        let store = MemoryStore::new();
        store.insert("meals", meal(1, &["egg", "milk"])).await.unwrap();

        let replacement = meal(1, &["stew"]);
        store.replace("meals", replacement.clone()).await.unwrap();

        assert_eq!(
            store.fetch_by_id("meals", &Id::Int(1)).await.unwrap(),
            Some(replacement)
        );
    }

    #[tokio::test]
    async fn replace_of_a_missing_document_fails() {
        let err = MemoryStore::new()
            .replace("meals", meal(1, &["egg"]))
            .await
            .unwrap_err();

        assert!(matches!(err, RefStoreError::DocumentNotFound(_, _)));
    }

    #[tokio::test]
    async fn apply_update_sets_one_array_element_field() {
        let store = MemoryStore::new();
        store.insert("meals", meal(1, &["egg", "milk", "toast"])).await.unwrap();

        let changed = store
            .apply_update(
                "meals",
                &Id::Int(1),
                &Path::parse("foods.1.menu"),
                Value::from("orange juice"),
            )
            .await
            .unwrap();
        assert!(changed);

        let doc = store.fetch_by_id("meals", &Id::Int(1)).await.unwrap().unwrap();
        let Some(Value::Array(items)) = doc.get("foods") else {
            panic!("expected foods array");
        };
        assert_eq!(items[0], Value::Map(fields! { "menu": "egg" }));
        assert_eq!(items[1], Value::Map(fields! { "menu": "orange juice" }));
        assert_eq!(items[2], Value::Map(fields! { "menu": "toast" }));
    }

    #[tokio::test]
    async fn apply_update_reports_unchanged_values() {
        let store = MemoryStore::new();
        store.insert("meals", meal(1, &["egg"])).await.unwrap();

        let changed = store
            .apply_update(
                "meals",
                &Id::Int(1),
                &Path::parse("foods.0.menu"),
                Value::from("egg"),
            )
            .await
            .unwrap();

        assert!(!changed);
    }

    #[tokio::test]
    async fn apply_update_rejects_paths_that_address_nothing() {
        let store = MemoryStore::new();
        store.insert("meals", meal(1, &["egg"])).await.unwrap();

        let err = store
            .apply_update(
                "meals",
                &Id::Int(1),
                &Path::parse("foods.7.menu"),
                Value::from("stew"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RefStoreError::Store(_)));

        let err = store
            .apply_update(
                "meals",
                &Id::Int(1),
                &Path::parse("foods.$.menu"),
                Value::from("stew"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RefStoreError::Store(_)));
    }

    #[tokio::test]
    async fn delete_reports_whether_a_document_was_removed() {
        let store = MemoryStore::new();
        store.insert("meals", meal(1, &["egg"])).await.unwrap();

        assert!(store.delete("meals", &Id::Int(1)).await.unwrap());
        assert!(!store.delete("meals", &Id::Int(1)).await.unwrap());
    }

    #[tokio::test]
    async fn connector_hands_out_shared_handles() {
        let connector = MemoryConnector::new();

        let first = connector.open("memory://meal").await.unwrap();
        first.insert("meals", meal(1, &["egg"])).await.unwrap();

        let second = connector.open("memory://meal").await.unwrap();
        assert!(second.fetch_by_id("meals", &Id::Int(1)).await.unwrap().is_some());
    }
}
