//! Runtime schema declarations for collections.
//!
//! A schema declares, per field, a scalar kind, a reference to another
//! collection, or an embedded sequence of sub-documents. Schemas are
//! registered once through the [`SchemaRegistry`] and are immutable after
//! publication: redefining a collection fails with
//! [`RefStoreError::DuplicateSchema`] instead of silently overwriting, so
//! query and update code never observes a schema mid-change.
//!
//! Validation is an explicit, synchronous step at write time. It returns a
//! typed failure rather than silently coercing, with one normalization:
//! values assigned to reference fields are rewritten into tagged
//! [`Value::Reference`] pointers.
//!
//! # Example
//!
//! ```ignore
//! use refstore::schema::{FieldSpec, SchemaRegistry};
//!
//! let registry = SchemaRegistry::new();
//! registry.define("mealtypes", vec![
//!     FieldSpec::int("_id"),
//!     FieldSpec::string("type"),
//! ])?;
//! registry.define("meals", vec![
//!     FieldSpec::reference("type", "mealtypes"),
//!     FieldSpec::embedded("foods", vec![FieldSpec::string("menu")]),
//! ])?;
//! ```

use parking_lot::RwLock;
use std::collections::HashMap;
use std::ops::Deref;
use std::sync::Arc;

use crate::{
    document::{Fields, Id, Value},
    error::{RefStoreError, RefStoreResult},
    query::{Path, Segment},
};

/// The declared type of a document field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Boolean scalar.
    Bool,
    /// Integer scalar.
    Int,
    /// Floating point scalar. Integer values are accepted and widened.
    Double,
    /// String scalar.
    String,
    /// Timestamp scalar.
    DateTime,
    /// Pointer-by-identifier to a document in the named collection.
    /// The field stores only the identifier until explicitly populated.
    Reference(String),
    /// Inline sequence of sub-documents, each satisfying the inner specs.
    Embedded(Vec<FieldSpec>),
}

/// Declaration of a single field: its name and kind.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    name: String,
    kind: FieldKind,
}

impl FieldSpec {
    /// Creates a field spec from a name and kind.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self { name: name.into(), kind }
    }

    /// Declares a boolean field.
    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Bool)
    }

    /// Declares an integer field.
    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Int)
    }

    /// Declares a floating point field.
    pub fn double(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Double)
    }

    /// Declares a string field.
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::String)
    }

    /// Declares a timestamp field.
    pub fn datetime(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::DateTime)
    }

    /// Declares a reference field pointing into `target` collection.
    pub fn reference(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Reference(target.into()))
    }

    /// Declares an embedded sequence field with the given element specs.
    pub fn embedded(name: impl Into<String>, specs: Vec<FieldSpec>) -> Self {
        Self::new(name, FieldKind::Embedded(specs))
    }

    /// Returns the field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared kind.
    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }
}

/// The published, immutable schema of one collection.
#[derive(Debug)]
pub struct Schema {
    collection: String,
    specs: Vec<FieldSpec>,
}

impl Schema {
    fn new(collection: String, specs: Vec<FieldSpec>) -> Self {
        Self { collection, specs }
    }

    /// Returns the collection this schema describes.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Returns all field specs.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.specs
    }

    /// Returns the spec of a top-level field, if declared.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.specs.iter().find(|spec| spec.name == name)
    }

    /// Type-checks a field map against this schema, returning the
    /// normalized fields.
    ///
    /// Declared fields may be absent; present fields must match their
    /// declared kind and undeclared fields are rejected. Values assigned to
    /// reference fields are normalized into [`Value::Reference`] pointers
    /// (raw scalars become identifiers; populated or dangling values
    /// collapse back to the identifier they carry). `Null` is accepted for
    /// any declared field.
    ///
    /// # Errors
    ///
    /// Returns [`RefStoreError::SchemaViolation`] on the first mismatch.
    pub fn validate(&self, fields: Fields) -> RefStoreResult<Fields> {
        let mut normalized = Fields::new();

        for (name, value) in fields {
            if name == "_id" && self.field("_id").is_none() {
                normalized.insert(name, value);
                continue;
            }

            let spec = self.field(&name).ok_or_else(|| {
                self.violation(format!("unknown field `{name}`"))
            })?;

            let value = self.check_value(&name, spec.kind(), value)?;
            normalized.insert(name, value);
        }

        Ok(normalized)
    }

    /// Resolves the declared kind at a dot-separated path. Positional and
    /// index segments descend into embedded sequences.
    pub fn kind_at(&self, path: &Path) -> Option<&FieldKind> {
        let mut specs = self.fields();
        let mut current: Option<&FieldKind> = None;

        for segment in path.segments() {
            match segment {
                Segment::Field(name) => {
                    let spec = specs.iter().find(|spec| spec.name() == name)?;
                    current = Some(spec.kind());
                    if let FieldKind::Embedded(inner) = spec.kind() {
                        specs = inner;
                    } else {
                        specs = &[];
                    }
                }
                Segment::Index(_) | Segment::Positional => {
                    if !matches!(current, Some(FieldKind::Embedded(_))) {
                        return None;
                    }
                }
            }
        }

        current
    }

    pub(crate) fn check_value(
        &self,
        field: &str,
        kind: &FieldKind,
        value: Value,
    ) -> RefStoreResult<Value> {
        if matches!(value, Value::Null) {
            return Ok(value);
        }

        match (kind, value) {
            (FieldKind::Bool, value @ Value::Bool(_)) => Ok(value),
            (FieldKind::Int, value @ Value::Int(_)) => Ok(value),
            (FieldKind::Double, value @ Value::Double(_)) => Ok(value),
            (FieldKind::Double, Value::Int(i)) => Ok(Value::Double(i as f64)),
            (FieldKind::String, value @ Value::String(_)) => Ok(value),
            (FieldKind::DateTime, value @ Value::DateTime(_)) => Ok(value),
            (FieldKind::Reference(_), Value::Reference(id)) => Ok(Value::Reference(id)),
            (FieldKind::Reference(_), Value::Populated(doc)) => {
                Ok(Value::Reference(doc.id().clone()))
            }
            (FieldKind::Reference(_), Value::Dangling(id)) => Ok(Value::Reference(id)),
            (FieldKind::Reference(_), Value::Int(i)) => Ok(Value::Reference(Id::Int(i))),
            (FieldKind::Reference(_), Value::String(s)) => Ok(Value::Reference(Id::String(s))),
            (FieldKind::Embedded(specs), Value::Array(items)) => {
                let mut checked = Vec::with_capacity(items.len());

                for item in items {
                    let Value::Map(entry) = item else {
                        return Err(self.violation(format!(
                            "field `{field}` expects embedded sub-documents"
                        )));
                    };
                    checked.push(Value::Map(self.check_embedded(field, specs, entry)?));
                }

                Ok(Value::Array(checked))
            }
            (kind, value) => Err(self.violation(format!(
                "field `{field}` expects {kind:?}, got {value:?}"
            ))),
        }
    }

    fn check_embedded(
        &self,
        field: &str,
        specs: &[FieldSpec],
        entry: Fields,
    ) -> RefStoreResult<Fields> {
        let mut normalized = Fields::new();

        for (name, value) in entry {
            let spec = specs.iter().find(|spec| spec.name() == name).ok_or_else(|| {
                self.violation(format!("unknown field `{field}.{name}`"))
            })?;

            let value =
                self.check_value(&format!("{field}.{name}"), spec.kind(), value)?;
            normalized.insert(name, value);
        }

        Ok(normalized)
    }

    fn violation(&self, reason: String) -> RefStoreError {
        RefStoreError::SchemaViolation(self.collection.clone(), reason)
    }
}

/// A cheap, cloneable handle to a published [`Schema`].
#[derive(Debug, Clone)]
pub struct SchemaHandle(Arc<Schema>);

impl Deref for SchemaHandle {
    type Target = Schema;

    fn deref(&self) -> &Schema {
        &self.0
    }
}

/// Registry of per-collection schemas.
///
/// Definition and resolution are synchronous; the registry is shared across
/// concurrent operations behind a read-write lock.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: RwLock<HashMap<String, SchemaHandle>>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a schema for a collection.
    ///
    /// # Errors
    ///
    /// Returns [`RefStoreError::DuplicateSchema`] if the collection already
    /// has a schema; published schemas are never replaced.
    pub fn define(
        &self,
        collection: impl Into<String>,
        specs: Vec<FieldSpec>,
    ) -> RefStoreResult<SchemaHandle> {
        let collection = collection.into();
        let mut schemas = self.schemas.write();

        if schemas.contains_key(&collection) {
            return Err(RefStoreError::DuplicateSchema(collection));
        }

        let handle = SchemaHandle(Arc::new(Schema::new(collection.clone(), specs)));
        schemas.insert(collection, handle.clone());

        Ok(handle)
    }

    /// Resolves the schema published for a collection.
    pub fn resolve(&self, collection: &str) -> Option<SchemaHandle> {
        self.schemas.read().get(collection).cloned()
    }

    /// Lists the collections with a published schema.
    pub fn collections(&self) -> Vec<String> {
        self.schemas.read().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields;

    fn meal_schema() -> Schema {
        Schema::new(
            "meals".to_string(),
            vec![
                FieldSpec::reference("type", "mealtypes"),
                FieldSpec::embedded("foods", vec![FieldSpec::string("menu")]),
            ],
        )
    }

    #[test]
    fn redefinition_fails_with_duplicate_schema() {
        let registry = SchemaRegistry::new();
        registry
            .define("mealtypes", vec![FieldSpec::string("type")])
            .unwrap();

        let err = registry
            .define("mealtypes", vec![FieldSpec::int("type")])
            .unwrap_err();
        assert!(matches!(err, RefStoreError::DuplicateSchema(name) if name == "mealtypes"));

        // The original definition is still the published one.
        let handle = registry.resolve("mealtypes").unwrap();
        assert_eq!(handle.field("type").unwrap().kind(), &FieldKind::String);
    }

    #[test]
    fn resolve_unknown_collection_is_none() {
        assert!(SchemaRegistry::new().resolve("meals").is_none());
    }

    #[test]
    fn validate_normalizes_scalars_into_references() {
        let schema = meal_schema();
        let normalized = schema.validate(fields! { "type": 1 }).unwrap();

        assert_eq!(
            normalized.get("type"),
            Some(&Value::Reference(Id::Int(1)))
        );
    }

    #[test]
    fn validate_collapses_populated_values_back_to_references() {
        let schema = meal_schema();
        let target = crate::document::Document::new(Id::Int(3), Fields::new());
        let normalized = schema
            .validate(fields! { "type": Value::Populated(Box::new(target)) })
            .unwrap();

        assert_eq!(
            normalized.get("type"),
            Some(&Value::Reference(Id::Int(3)))
        );
    }

    #[test]
    fn validate_rejects_unknown_fields() {
        let err = meal_schema()
            .validate(fields! { "beverage": "tea" })
            .unwrap_err();
        assert!(matches!(err, RefStoreError::SchemaViolation(_, _)));
    }

    #[test]
    fn validate_rejects_kind_mismatch_inside_embedded_sequence() {
        let err = meal_schema()
            .validate(fields! {
                "foods": vec![Value::from(fields! { "menu": 9 })],
            })
            .unwrap_err();
        assert!(matches!(err, RefStoreError::SchemaViolation(_, reason) if reason.contains("menu")));
    }

    #[test]
    fn validate_allows_missing_declared_fields() {
        assert!(meal_schema().validate(Fields::new()).is_ok());
    }

    #[test]
    fn kind_at_descends_through_positional_segments() {
        let schema = meal_schema();

        assert_eq!(
            schema.kind_at(&Path::parse("foods.$.menu")),
            Some(&FieldKind::String)
        );
        assert_eq!(
            schema.kind_at(&Path::parse("foods.0.menu")),
            Some(&FieldKind::String)
        );
        assert!(matches!(
            schema.kind_at(&Path::parse("type")),
            Some(FieldKind::Reference(target)) if target == "mealtypes"
        ));
        assert_eq!(schema.kind_at(&Path::parse("foods.menu.extra")), None);
        assert_eq!(schema.kind_at(&Path::parse("nope")), None);
    }
}
