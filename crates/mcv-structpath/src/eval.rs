//! Expression evaluation
//!
//! Each segment consumes the output set of the previous one and produces a
//! new set; matches under several parents are flattened in document order.
//! Evaluation never fails: a step that does not apply to a node's shape
//! simply contributes nothing.

use crate::expr::{CompareOp, Filter, Literal, PathExpression, Segment};
use crate::value::Snapshot;

impl PathExpression {
    /// Evaluate against a snapshot, returning every matched sub-value
    ///
    /// The result borrows from `root`; an empty vector means no match.
    #[must_use]
    pub fn evaluate<'s>(&self, root: &'s Snapshot) -> Vec<&'s Snapshot> {
        let mut current = vec![root];
        for segment in self.segments() {
            let mut next = Vec::new();
            for node in current {
                segment.select(node, &mut next);
            }
            if next.is_empty() {
                return next;
            }
            current = next;
        }
        current
    }

    /// Number of matches against a snapshot
    #[inline]
    #[must_use]
    pub fn count(&self, root: &Snapshot) -> usize {
        self.evaluate(root).len()
    }
}

impl Segment {
    fn select<'s>(&self, node: &'s Snapshot, out: &mut Vec<&'s Snapshot>) {
        match (self, node) {
            (Self::Field(name), Snapshot::Mapping(map)) => out.extend(map.get(name)),
            (Self::Wildcard, Snapshot::Sequence(items)) => out.extend(items),
            (Self::Wildcard, Snapshot::Mapping(map)) => out.extend(map.values()),
            (Self::Index(index), Snapshot::Sequence(items)) => {
                out.extend(resolve_index(*index, items.len()).map(|i| &items[i]));
            }
            (Self::Filter(filter), Snapshot::Sequence(items)) => {
                out.extend(items.iter().filter(|item| filter.accepts(item)));
            }
            _ => {}
        }
    }
}

fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let resolved = if index < 0 { len + index } else { index };
    if (0..len).contains(&resolved) {
        usize::try_from(resolved).ok()
    } else {
        None
    }
}

impl Filter {
    /// Whether a candidate element passes this predicate
    ///
    /// A missing sub-field is never equal to any literal.
    #[must_use]
    pub fn accepts(&self, candidate: &Snapshot) -> bool {
        let field = self
            .path
            .iter()
            .try_fold(candidate, |node, name| node.get(name));
        let equal = field.is_some_and(|value| self.literal.matches(value));
        match self.op {
            CompareOp::Eq => equal,
            CompareOp::Ne => !equal,
        }
    }
}

impl Literal {
    /// Typed equality against a snapshot scalar
    ///
    /// Strings compare as strings and numbers numerically; values of
    /// different kinds are never equal.
    #[must_use]
    pub fn matches(&self, value: &Snapshot) -> bool {
        match (self, value) {
            (Self::String(expected), Snapshot::String(actual)) => expected == actual,
            (Self::Number(expected), Snapshot::Number(actual)) => {
                actual.as_f64().is_some_and(|n| (n - expected).abs() < f64::EPSILON)
            }
            (Self::Bool(expected), Snapshot::Bool(actual)) => expected == actual,
            (Self::Null, Snapshot::Null) => true,
            _ => false,
        }
    }
}
