//! Positional update resolution.
//!
//! A positional set path such as `foods.$.menu` does not name an element by
//! itself; it is defined in terms of the filter that selected the document.
//! [`resolve_positional`] substitutes the `$` segment with the index the
//! matcher recorded for that sequence, so selection and application come
//! from the same pass and can never target different elements, even when a
//! document has several satisfying elements.

use crate::{
    error::{RefStoreError, RefStoreResult},
    matcher::MatchReport,
    query::{Path, Segment},
};

/// Counts reported by an update batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateResult {
    /// Documents that satisfied the filter.
    pub matched_count: u64,
    /// Documents whose stored content actually changed.
    pub modified_count: u64,
}

/// Counts reported by a delete batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeleteResult {
    /// Documents removed from the collection.
    pub deleted_count: u64,
}

/// Resolves the positional segment of a set path against a match report,
/// producing a concrete path the store can apply.
///
/// Paths without a positional segment pass through unchanged. At most one
/// positional segment is supported.
///
/// # Errors
///
/// Returns [`RefStoreError::InvalidUpdate`] if the path has more than one
/// `$` segment or if the report holds no position for the sequence the `$`
/// refers to (the filter carried no predicate through that sequence).
pub fn resolve_positional(path: &Path, report: &MatchReport) -> RefStoreResult<Path> {
    if !path.is_positional() {
        return Ok(path.clone());
    }

    let mut resolved = Vec::with_capacity(path.segments().len());
    let mut prefix = String::new();
    let mut substituted = false;

    for segment in path.segments() {
        match segment {
            Segment::Positional => {
                if substituted {
                    return Err(RefStoreError::InvalidUpdate(format!(
                        "path `{path}` has more than one positional segment"
                    )));
                }

                let index = report.position(&prefix).ok_or_else(|| {
                    RefStoreError::InvalidUpdate(format!(
                        "positional path `{path}` requires a filter predicate on `{prefix}`"
                    ))
                })?;

                substituted = true;
                push_prefix(&mut prefix, &index.to_string());
                resolved.push(Segment::Index(index));
            }
            Segment::Field(name) => {
                push_prefix(&mut prefix, name);
                resolved.push(segment.clone());
            }
            Segment::Index(index) => {
                push_prefix(&mut prefix, &index.to_string());
                resolved.push(segment.clone());
            }
        }
    }

    Ok(Path::from_segments(resolved))
}

fn push_prefix(prefix: &mut String, part: &str) {
    if !prefix.is_empty() {
        prefix.push('.');
    }
    prefix.push_str(part);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        document::{Document, Id, Value},
        fields,
        matcher::DocumentMatcher,
        query::Filter,
    };

    fn report_for(menus: &[&str], filter: &Filter) -> MatchReport {
        let doc = Document::new(
            Id::Int(1),
            fields! {
                "foods": menus
                    .iter()
                    .map(|menu| Value::from(fields! { "menu": *menu }))
                    .collect::<Vec<_>>(),
            },
        );
        DocumentMatcher::new(&doc).evaluate(filter)
    }

    #[test]
    fn positional_segment_resolves_to_first_matched_index() {
        let report = report_for(&["egg", "milk", "milk"], &Filter::eq("foods.menu", "milk"));
        let resolved = resolve_positional(&Path::parse("foods.$.menu"), &report).unwrap();

        assert_eq!(resolved.as_str(), "foods.1.menu");
    }

    #[test]
    fn plain_paths_pass_through() {
        let report = report_for(&["egg"], &Filter::empty());
        let resolved = resolve_positional(&Path::parse("type"), &report).unwrap();

        assert_eq!(resolved.as_str(), "type");
    }

    #[test]
    fn positional_without_sequence_predicate_is_rejected() {
        let report = report_for(&["egg"], &Filter::empty());
        let err = resolve_positional(&Path::parse("foods.$.menu"), &report).unwrap_err();

        assert!(matches!(err, RefStoreError::InvalidUpdate(_)));
    }

    #[test]
    fn repeated_positional_segments_are_rejected() {
        let report = report_for(&["milk"], &Filter::eq("foods.menu", "milk"));
        let err = resolve_positional(&Path::parse("foods.$.$"), &report).unwrap_err();

        assert!(matches!(err, RefStoreError::InvalidUpdate(_)));
    }
}
