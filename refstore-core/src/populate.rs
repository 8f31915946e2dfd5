//! Reference resolution ("population") across collections.
//!
//! A reference field stores only the target's identifier. Population
//! replaces that pointer with the fetched target document, or with a
//! dangling marker when the identifier points nowhere; a missing target is
//! an expected condition and never aborts the batch.
//!
//! Resolution is a single pass per call: target lookups are deduplicated by
//! identifier so documents sharing a reference cost one store round-trip
//! (a batch join, not one join per document).

use log::debug;
use std::collections::HashMap;

use crate::{
    backend::StoreBackend,
    document::{Document, Id, Value},
    error::{RefStoreError, RefStoreResult},
    schema::{FieldKind, Schema},
};

/// Resolves the top-level reference field `field` of every document in
/// `documents`, in place.
///
/// The schema names the target collection; each document's
/// [`Value::Reference`] becomes [`Value::Populated`] with the fetched
/// target, or [`Value::Dangling`] when no target exists. Documents without
/// the field, and values that are not references, are left untouched.
///
/// # Errors
///
/// Returns [`RefStoreError::InvalidQuery`] if the schema does not declare
/// `field` as a reference, and propagates store failures from the target
/// lookups.
pub async fn populate<B: StoreBackend>(
    backend: &B,
    schema: &Schema,
    documents: &mut [Document],
    field: &str,
) -> RefStoreResult<()> {
    let target = match schema.field(field).map(|spec| spec.kind()) {
        Some(FieldKind::Reference(target)) => target.clone(),
        Some(_) => {
            return Err(RefStoreError::InvalidQuery(format!(
                "field `{field}` of collection {} is not a reference",
                schema.collection()
            )));
        }
        None => {
            return Err(RefStoreError::InvalidQuery(format!(
                "field `{field}` is not declared in collection {}",
                schema.collection()
            )));
        }
    };

    // One lookup per distinct identifier within this call.
    let mut resolved: HashMap<Id, Option<Document>> = HashMap::new();

    for document in documents.iter_mut() {
        let Some(value) = document.fields_mut().get_mut(field) else {
            continue;
        };
        let id = match value {
            Value::Reference(id) | Value::Dangling(id) => id.clone(),
            _ => continue,
        };

        if !resolved.contains_key(&id) {
            let fetched = backend.fetch_by_id(&target, &id).await?;
            resolved.insert(id.clone(), fetched);
        }

        *value = match resolved.get(&id).and_then(Clone::clone) {
            Some(target_doc) => Value::Populated(Box::new(target_doc)),
            None => Value::Dangling(id),
        };
    }

    debug!(
        "populated `{field}` on {} documents from {target} ({} lookups)",
        documents.len(),
        resolved.len()
    );

    Ok(())
}
