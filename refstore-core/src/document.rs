//! Core types for document representation.
//!
//! This module provides the building blocks every other component works
//! with: document identifiers, the tagged [`Value`] enum, the ordered
//! [`Fields`] map and the [`Document`] record itself.
//!
//! A cross-collection relation is represented as a tagged
//! [`Value::Reference`] holding the target's identifier, distinct from an
//! embedded [`Value::Map`]. The referencing document never owns the target;
//! resolution happens only through an explicit populate call, which rewrites
//! the value to [`Value::Populated`] or [`Value::Dangling`].
//!
//! # Example
//!
//! ```ignore
//! use refstore::{fields, document::{Document, Id, Value}};
//!
//! let doc = Document::new(
//!     Id::Int(1),
//!     fields! {
//!         "type": Value::Reference(Id::Int(1)),
//!         "foods": vec![
//!             Value::from(fields! { "menu": "egg" }),
//!             Value::from(fields! { "menu": "milk" }),
//!         ],
//!     },
//! );
//!
//! assert_eq!(doc.id(), &Id::Int(1));
//! ```

use bson::Uuid;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A document identifier, either caller-supplied or store-assigned.
///
/// Explicit identifiers come from an `_id` field at insert time;
/// store-assigned identifiers are generated with [`Id::generate`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Id {
    /// Integer identifier.
    Int(i64),
    /// String identifier.
    String(String),
    /// Store-assigned UUID identifier.
    Uuid(Uuid),
}

impl Id {
    /// Generates a fresh store-assigned identifier.
    pub fn generate() -> Self {
        Id::Uuid(Uuid::new())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Int(value) => write!(f, "{value}"),
            Id::String(value) => write!(f, "{value}"),
            Id::Uuid(value) => write!(f, "{value}"),
        }
    }
}

impl From<i64> for Id {
    fn from(value: i64) -> Self {
        Id::Int(value)
    }
}

impl From<i32> for Id {
    fn from(value: i32) -> Self {
        Id::Int(value as i64)
    }
}

impl From<&str> for Id {
    fn from(value: &str) -> Self {
        Id::String(value.to_string())
    }
}

impl From<String> for Id {
    fn from(value: String) -> Self {
        Id::String(value)
    }
}

impl From<Uuid> for Id {
    fn from(value: Uuid) -> Self {
        Id::Uuid(value)
    }
}

/// An ordered mapping from field name to [`Value`].
pub type Fields = BTreeMap<String, Value>;

/// A tagged document value.
///
/// Scalars, embedded sequences and references are distinct variants so that
/// the matcher and the populate engine can tell a pointer-by-identifier
/// apart from inline content without consulting the schema.
///
/// The reference lifecycle is expressed in three variants:
///
/// - [`Value::Reference`] - the stored pointer, as written,
/// - [`Value::Populated`] - the pointer replaced by its fetched target,
/// - [`Value::Dangling`] - the pointer was resolved but no target exists;
///   an expected, tolerated condition rather than an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Double(f64),
    /// String value.
    String(String),
    /// Timestamp value.
    DateTime(DateTime<Utc>),
    /// Sequence of values, e.g. embedded sub-documents.
    Array(Vec<Value>),
    /// Embedded sub-document, owned by the parent and addressable only
    /// through it.
    Map(Fields),
    /// Unresolved pointer to a document in another collection.
    Reference(Id),
    /// Reference resolved to its target document by a populate call.
    Populated(Box<Document>),
    /// Reference whose target did not exist when it was resolved.
    Dangling(Id),
}

impl Value {
    /// Returns the identifier carried by a reference-typed value,
    /// resolved or not.
    pub fn reference_id(&self) -> Option<&Id> {
        match self {
            Value::Reference(id) | Value::Dangling(id) => Some(id),
            Value::Populated(doc) => Some(doc.id()),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value as i64)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::DateTime(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl From<Fields> for Value {
    fn from(value: Fields) -> Self {
        Value::Map(value)
    }
}

impl From<Id> for Value {
    fn from(value: Id) -> Self {
        Value::Reference(value)
    }
}

/// One record in a collection: an identifier plus its fields.
///
/// The identifier is kept outside the field map; it serializes as `_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "_id")]
    id: Id,
    #[serde(flatten)]
    fields: Fields,
}

impl Document {
    /// Creates a document from an identifier and its fields.
    pub fn new(id: Id, fields: Fields) -> Self {
        Self { id, fields }
    }

    /// Returns this document's identifier.
    pub fn id(&self) -> &Id {
        &self.id
    }

    /// Returns the field map.
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Returns the field map mutably.
    pub fn fields_mut(&mut self) -> &mut Fields {
        &mut self.fields
    }

    /// Returns the value of a top-level field, if present.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Consumes the document, returning its fields.
    pub fn into_fields(self) -> Fields {
        self.fields
    }
}

/// Builds a [`Fields`] map from `"name": value` pairs.
///
/// Values go through [`Value::from`], so scalars, `Vec<Value>` and nested
/// `Fields` can be given directly:
///
/// ```ignore
/// let fields = fields! {
///     "type": 1,
///     "foods": vec![Value::from(fields! { "menu": "toast" })],
/// };
/// ```
#[macro_export]
macro_rules! fields {
    () => { $crate::document::Fields::new() };
    ($($key:literal : $value:expr),+ $(,)?) => {{
        let mut fields = $crate::document::Fields::new();
        $(
            fields.insert($key.to_string(), $crate::document::Value::from($value));
        )+
        fields
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields;

    #[test]
    fn id_display_forms() {
        assert_eq!(Id::Int(42).to_string(), "42");
        assert_eq!(Id::String("breakfast".into()).to_string(), "breakfast");
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(Id::generate(), Id::generate());
    }

    #[test]
    fn fields_macro_builds_nested_values() {
        let fields = fields! {
            "type": 1,
            "name": "monday morning",
            "foods": vec![
                Value::from(fields! { "menu": "egg" }),
                Value::from(fields! { "menu": "milk" }),
            ],
        };

        assert_eq!(fields.get("type"), Some(&Value::Int(1)));
        match fields.get("foods") {
            Some(Value::Array(items)) => {
                assert_eq!(items.len(), 2);
                assert_eq!(
                    items[0],
                    Value::Map(fields! { "menu": "egg" })
                );
            }
            other => panic!("expected array, got {other:?}"),
        }
    }

    #[test]
    fn document_serde_round_trip() {
        let doc = Document::new(
            Id::Int(1),
            fields! {
                "type": Value::Reference(Id::Int(2)),
                "foods": vec![Value::from(fields! { "menu": "toast" })],
            },
        );

        let json = serde_json::to_value(&doc).unwrap();
        let back: Document = serde_json::from_value(json).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn reference_id_unwraps_all_reference_shapes() {
        let target = Document::new(Id::Int(7), Fields::new());

        assert_eq!(
            Value::Reference(Id::Int(7)).reference_id(),
            Some(&Id::Int(7))
        );
        assert_eq!(
            Value::Dangling(Id::Int(7)).reference_id(),
            Some(&Id::Int(7))
        );
        assert_eq!(
            Value::Populated(Box::new(target)).reference_id(),
            Some(&Id::Int(7))
        );
        assert_eq!(Value::Int(7).reference_id(), None);
    }
}
