//! Query and update construction for the data layer.
//!
//! A filter is a conjunction of clauses, each mapping a dot-separated
//! [`Path`] to an expected value under a comparison operator. Paths whose
//! intermediate segment addresses an embedded sequence carry existential
//! semantics: the clause holds if at least one element satisfies the
//! remainder of the path.
//!
//! # Filter API
//!
//! [`Filter`] provides static constructors in the comparison-operator
//! family (`eq`, `ne`, `gt`, `gte`, `lt`, `lte`) combined with chainable
//! `and`:
//!
//! ```ignore
//! use refstore::query::Filter;
//!
//! let breakfast = Filter::eq("type", 1);
//! let milk_meals = Filter::eq("foods.menu", "milk").and(Filter::gt("type", 0));
//! let everything = Filter::empty();
//! ```
//!
//! # Update API
//!
//! [`Update`] carries `set` instructions. A `$` path segment is the
//! positional operator: it targets the first embedded element that
//! satisfied the filter's array predicate for each matched document:
//!
//! ```ignore
//! use refstore::query::{Filter, Update};
//!
//! // Replace the first milk entry of every meal that has one.
//! let filter = Filter::eq("foods.menu", "milk");
//! let update = Update::set("foods.$.menu", "orange juice");
//! ```

use std::fmt;

use crate::document::Value;

/// One segment of a dot-separated field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// A named field.
    Field(String),
    /// A concrete array index.
    Index(usize),
    /// The positional operator `$`, resolved against a match report.
    Positional,
}

/// A parsed dot-separated field path, e.g. `foods.menu` or `foods.$.menu`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    raw: String,
    segments: Vec<Segment>,
}

impl Path {
    /// Parses a dot-separated path. `$` becomes the positional segment and
    /// bare numbers become array indices; everything else is a field name.
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let segments = raw
            .split('.')
            .map(|part| {
                if part == "$" {
                    Segment::Positional
                } else if let Ok(index) = part.parse::<usize>() {
                    Segment::Index(index)
                } else {
                    Segment::Field(part.to_string())
                }
            })
            .collect();

        Self { raw, segments }
    }

    /// Returns the parsed segments.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns the original dotted form.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether this path contains the positional operator.
    pub fn is_positional(&self) -> bool {
        self.segments.contains(&Segment::Positional)
    }

    pub(crate) fn from_segments(segments: Vec<Segment>) -> Self {
        let raw = segments
            .iter()
            .map(|segment| match segment {
                Segment::Field(name) => name.clone(),
                Segment::Index(index) => index.to_string(),
                Segment::Positional => "$".to_string(),
            })
            .collect::<Vec<_>>()
            .join(".");

        Self { raw, segments }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for Path {
    fn from(raw: &str) -> Self {
        Path::parse(raw)
    }
}

impl From<String> for Path {
    fn from(raw: String) -> Self {
        Path::parse(raw)
    }
}

/// Comparison operators for filter clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    /// Equal to (exact match).
    Eq,
    /// Not equal to.
    Ne,
    /// Greater than.
    Gt,
    /// Greater than or equal to.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal to.
    Lte,
}

/// A single `path <op> value` condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    /// The field path the clause addresses.
    pub path: Path,
    /// The comparison operator.
    pub op: CmpOp,
    /// The expected value.
    pub value: Value,
}

/// A conjunction of clauses selecting documents in a collection.
///
/// An empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<Clause>,
}

impl Filter {
    /// Creates a filter that matches every document.
    pub fn empty() -> Self {
        Self::default()
    }

    fn clause(path: impl Into<Path>, op: CmpOp, value: impl Into<Value>) -> Self {
        Self {
            clauses: vec![Clause { path: path.into(), op, value: value.into() }],
        }
    }

    /// Creates an equality filter clause.
    pub fn eq(path: impl Into<Path>, value: impl Into<Value>) -> Self {
        Self::clause(path, CmpOp::Eq, value)
    }

    /// Creates a not-equal filter clause.
    pub fn ne(path: impl Into<Path>, value: impl Into<Value>) -> Self {
        Self::clause(path, CmpOp::Ne, value)
    }

    /// Creates a greater-than filter clause.
    pub fn gt(path: impl Into<Path>, value: impl Into<Value>) -> Self {
        Self::clause(path, CmpOp::Gt, value)
    }

    /// Creates a greater-than-or-equal filter clause.
    pub fn gte(path: impl Into<Path>, value: impl Into<Value>) -> Self {
        Self::clause(path, CmpOp::Gte, value)
    }

    /// Creates a less-than filter clause.
    pub fn lt(path: impl Into<Path>, value: impl Into<Value>) -> Self {
        Self::clause(path, CmpOp::Lt, value)
    }

    /// Creates a less-than-or-equal filter clause.
    pub fn lte(path: impl Into<Path>, value: impl Into<Value>) -> Self {
        Self::clause(path, CmpOp::Lte, value)
    }

    /// Combines this filter with another; all clauses must hold.
    pub fn and(mut self, other: Filter) -> Self {
        self.clauses.extend(other.clauses);
        self
    }

    /// Returns the clauses of this filter.
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Whether this filter matches every document.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

/// A set-style update specification.
///
/// Each instruction assigns a value at a path; a `$` segment addresses the
/// first embedded element matched by the selecting filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    sets: Vec<(Path, Value)>,
}

impl Update {
    /// Creates an update with a single set instruction.
    pub fn set(path: impl Into<Path>, value: impl Into<Value>) -> Self {
        Self { sets: vec![(path.into(), value.into())] }
    }

    /// Appends another set instruction.
    pub fn and_set(mut self, path: impl Into<Path>, value: impl Into<Value>) -> Self {
        self.sets.push((path.into(), value.into()));
        self
    }

    /// Returns the set instructions.
    pub fn sets(&self) -> &[(Path, Value)] {
        &self.sets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_parsing_recognizes_segment_kinds() {
        let path = Path::parse("foods.$.menu");
        assert_eq!(
            path.segments(),
            &[
                Segment::Field("foods".into()),
                Segment::Positional,
                Segment::Field("menu".into()),
            ]
        );
        assert!(path.is_positional());

        let indexed = Path::parse("foods.2.menu");
        assert_eq!(indexed.segments()[1], Segment::Index(2));
        assert!(!indexed.is_positional());
    }

    #[test]
    fn path_round_trips_through_segments() {
        let path = Path::from_segments(vec![
            Segment::Field("foods".into()),
            Segment::Index(1),
            Segment::Field("menu".into()),
        ]);
        assert_eq!(path.as_str(), "foods.1.menu");
        assert_eq!(path, Path::parse("foods.1.menu"));
    }

    #[test]
    fn filters_accumulate_clauses_with_and() {
        let filter = Filter::eq("type", 1).and(Filter::ne("foods.menu", "milk"));
        assert_eq!(filter.clauses().len(), 2);
        assert_eq!(filter.clauses()[1].op, CmpOp::Ne);
    }

    #[test]
    fn empty_filter_has_no_clauses() {
        assert!(Filter::empty().is_empty());
    }

    #[test]
    fn updates_accumulate_set_instructions() {
        let update = Update::set("foods.$.menu", "juice").and_set("type", 2);
        assert_eq!(update.sets().len(), 2);
        assert_eq!(update.sets()[0].0.as_str(), "foods.$.menu");
    }
}
