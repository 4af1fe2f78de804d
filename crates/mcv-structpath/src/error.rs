//! Error types for path queries
//!
//! - [`ParseError`]: malformed expression text, fatal to that expression
//! - [`AssertionFailed`]: well-formed expression, wrong number of matches
//! - [`ValidationError`]: either of the above, as surfaced by a `Validator`

use crate::assertion::Expectation;

/// Malformed path expression
///
/// Every variant carries the offending expression text and the byte offset
/// the parser stopped at.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Nothing to parse
    #[error("empty path expression")]
    Empty,

    /// A bracket or brace was never closed, or closed without being opened
    #[error("unbalanced '{delimiter}' at offset {offset} in `{expression}`")]
    Unbalanced {
        expression: String,
        delimiter: char,
        offset: usize,
    },

    /// Filter predicate uses an operator outside `==` / `!=`
    #[error("unknown predicate operator `{operator}` at offset {offset} in `{expression}`")]
    UnknownOperator {
        expression: String,
        operator: String,
        offset: usize,
    },

    /// String literal without its closing quote
    #[error("unterminated string literal at offset {offset} in `{expression}`")]
    UnterminatedString { expression: String, offset: usize },

    /// Sequence index that does not fit an integer
    #[error("invalid index `{text}` at offset {offset} in `{expression}`")]
    InvalidIndex {
        expression: String,
        text: String,
        offset: usize,
    },

    /// Any other token in the wrong place
    #[error("expected {expected} at offset {offset} in `{expression}`, found {found}")]
    Unexpected {
        expression: String,
        expected: &'static str,
        found: String,
        offset: usize,
    },
}

impl ParseError {
    /// Byte offset into the expression where parsing stopped
    #[must_use]
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::Empty => None,
            Self::Unbalanced { offset, .. }
            | Self::UnknownOperator { offset, .. }
            | Self::UnterminatedString { offset, .. }
            | Self::InvalidIndex { offset, .. }
            | Self::Unexpected { offset, .. } => Some(*offset),
        }
    }
}

/// A well-formed expression matched the wrong number of elements
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected `{expression}` to {expectation}, found {matches} match(es)")]
pub struct AssertionFailed {
    /// Expression source text
    pub expression: String,
    /// Expected cardinality
    pub expectation: Expectation,
    /// Number of elements actually matched
    pub matches: usize,
}

/// Failure surfaced by a [`Validator`](crate::Validator) chain
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// An expression in the chain did not parse
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// An assertion in the chain did not hold
    #[error(transparent)]
    Assertion(#[from] AssertionFailed),
}

impl ValidationError {
    /// Whether re-evaluating against a newer snapshot could succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Assertion(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_display_names_operator() {
        let err = ParseError::UnknownOperator {
            expression: "[?(@.a =~ 'x')]".to_string(),
            operator: "=~".to_string(),
            offset: 7,
        };
        let msg = err.to_string();
        assert!(msg.contains("`=~`"));
        assert!(msg.contains("offset 7"));
        assert_eq!(err.offset(), Some(7));
    }

    #[test]
    fn assertion_failed_display() {
        let err = AssertionFailed {
            expression: ".configs[*]".to_string(),
            expectation: Expectation::MustExist,
            matches: 0,
        };
        assert_eq!(
            err.to_string(),
            "expected `.configs[*]` to match at least one element, found 0 match(es)"
        );
    }

    #[test]
    fn only_assertions_are_retryable() {
        assert!(!ValidationError::from(ParseError::Empty).is_retryable());
        let failed = AssertionFailed {
            expression: ".a".to_string(),
            expectation: Expectation::MustNotExist,
            matches: 2,
        };
        assert!(ValidationError::from(failed).is_retryable());
    }
}
