//! Filter evaluation against documents.
//!
//! The matcher walks each clause path through a document. A path segment
//! that lands on an embedded sequence is evaluated existentially: the
//! clause holds if at least one element satisfies the remainder, and the
//! index of the first satisfying element is recorded in the
//! [`MatchReport`]. The update executor consumes that report to resolve
//! positional `$` segments, so matching and positional resolution come from
//! one pass and can never disagree about which element was selected.
//!
//! Reference fields match against their stored identifier; targets are
//! never resolved during matching.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::{
    document::{Document, Id, Value},
    query::{Clause, CmpOp, Filter, Path, Segment},
};

/// The result of evaluating a filter against one document.
#[derive(Debug, Clone, Default)]
pub struct MatchReport {
    matched: bool,
    positions: HashMap<String, usize>,
}

impl MatchReport {
    /// Whether the document satisfied every clause.
    pub fn matched(&self) -> bool {
        self.matched
    }

    /// The index of the first element of the sequence at `array_path` that
    /// satisfied a clause, if any clause matched through that sequence.
    pub fn position(&self, array_path: &str) -> Option<usize> {
        self.positions.get(array_path).copied()
    }
}

/// Evaluates filter clauses against a single document.
pub struct DocumentMatcher<'a> {
    document: &'a Document,
}

impl<'a> DocumentMatcher<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    /// Evaluates the filter, returning the match flag and the first-match
    /// positions of every sequence traversed existentially.
    ///
    /// An empty filter matches every document; missing path segments match
    /// nothing without raising an error.
    pub fn evaluate(&self, filter: &Filter) -> MatchReport {
        let mut report = MatchReport { matched: true, positions: HashMap::new() };

        for clause in filter.clauses() {
            if !self.clause_matches(clause, &mut report.positions) {
                report.matched = false;
                break;
            }
        }

        report
    }

    fn clause_matches(&self, clause: &Clause, positions: &mut HashMap<String, usize>) -> bool {
        // Negation is evaluated as the absence of an equal element, so a
        // not-equal clause over a sequence holds only when no element
        // matches. Nothing "satisfied" the predicate, so no position is
        // recorded.
        if clause.op == CmpOp::Ne {
            let mut scratch = HashMap::new();
            return !self.path_matches(&clause.path, CmpOp::Eq, &clause.value, &mut scratch);
        }

        self.path_matches(&clause.path, clause.op, &clause.value, positions)
    }

    fn path_matches(
        &self,
        path: &Path,
        op: CmpOp,
        expected: &Value,
        positions: &mut HashMap<String, usize>,
    ) -> bool {
        let segments = path.segments();

        let Some(Segment::Field(first)) = segments.first() else {
            return false;
        };

        if first == "_id" && segments.len() == 1 {
            return compare_leaf(&id_value(self.document.id()), op, expected);
        }

        let Some(value) = self.document.get(first) else {
            return false;
        };

        self.walk(value, &segments[1..], first.clone(), op, expected, positions)
    }

    /// Walks `value` (located at `prefix`) down the remaining segments.
    fn walk(
        &self,
        value: &Value,
        segments: &[Segment],
        prefix: String,
        op: CmpOp,
        expected: &Value,
        positions: &mut HashMap<String, usize>,
    ) -> bool {
        let Some(segment) = segments.first() else {
            return self.leaf(value, prefix, op, expected, positions);
        };

        match (segment, value) {
            (Segment::Field(name), Value::Map(fields)) => match fields.get(name) {
                Some(child) => self.walk(
                    child,
                    &segments[1..],
                    format!("{prefix}.{name}"),
                    op,
                    expected,
                    positions,
                ),
                None => false,
            },
            (Segment::Index(index), Value::Array(items)) => match items.get(*index) {
                Some(child) => self.walk(
                    child,
                    &segments[1..],
                    format!("{prefix}.{index}"),
                    op,
                    expected,
                    positions,
                ),
                None => false,
            },
            // A named segment against a sequence: existential semantics.
            // The first element satisfying the remaining path decides the
            // clause and its index is recorded for positional updates.
            (Segment::Field(_), Value::Array(items)) => {
                for (index, element) in items.iter().enumerate() {
                    if self.walk(element, segments, prefix.clone(), op, expected, positions) {
                        positions.entry(prefix).or_insert(index);
                        return true;
                    }
                }
                false
            }
            _ => false,
        }
    }

    fn leaf(
        &self,
        value: &Value,
        prefix: String,
        op: CmpOp,
        expected: &Value,
        positions: &mut HashMap<String, usize>,
    ) -> bool {
        if let (Value::Array(items), false) = (value, matches!(expected, Value::Array(_))) {
            for (index, element) in items.iter().enumerate() {
                if compare_leaf(element, op, expected) {
                    positions.entry(prefix).or_insert(index);
                    return true;
                }
            }
            return false;
        }

        compare_leaf(value, op, expected)
    }
}

fn compare_leaf(value: &Value, op: CmpOp, expected: &Value) -> bool {
    match op {
        CmpOp::Eq => values_equal(value, expected),
        CmpOp::Ne => !values_equal(value, expected),
        CmpOp::Gt | CmpOp::Gte | CmpOp::Lt | CmpOp::Lte => {
            match compare(value, expected) {
                Some(ordering) => match op {
                    CmpOp::Gt => ordering == Ordering::Greater,
                    CmpOp::Gte => ordering != Ordering::Less,
                    CmpOp::Lt => ordering == Ordering::Less,
                    CmpOp::Lte => ordering != Ordering::Greater,
                    _ => unreachable!(),
                },
                None => false,
            }
        }
    }
}

/// Structural equality with numeric normalization and reference unwrapping.
pub(crate) fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::DateTime(a), Value::DateTime(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Value::Map(a), Value::Map(b)) => {
            a.len() == b.len()
                && a.iter().zip(b).all(|((ka, va), (kb, vb))| {
                    ka == kb && values_equal(va, vb)
                })
        }
        _ => match (as_number(left), as_number(right)) {
            (Some(a), Some(b)) => a == b,
            _ => match (reference_value(left), reference_value(right)) {
                (Some(a), Some(b)) => values_equal(&a, &b),
                (Some(a), None) => values_equal(&a, right),
                (None, Some(b)) => values_equal(left, &b),
                (None, None) => false,
            },
        },
    }
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (as_number(left), as_number(right)) {
        return a.partial_cmp(&b);
    }

    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => a.partial_cmp(b),
        (Value::String(a), Value::String(b)) => a.partial_cmp(b),
        (Value::DateTime(a), Value::DateTime(b)) => a.partial_cmp(b),
        _ => None,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Int(i) => Some(*i as f64),
        Value::Double(d) => Some(*d),
        _ => None,
    }
}

/// A reference-typed value matches by its stored identifier.
fn reference_value(value: &Value) -> Option<Value> {
    value.reference_id().map(id_value)
}

fn id_value(id: &Id) -> Value {
    match id {
        Id::Int(i) => Value::Int(*i),
        Id::String(s) => Value::String(s.clone()),
        Id::Uuid(u) => Value::String(u.to_string()),
    }
}
