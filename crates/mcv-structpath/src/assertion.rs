//! Cardinality assertions over snapshots
//!
//! An [`Assertion`] pairs a [`PathExpression`] with an [`Expectation`].
//! [`Validator`] chains several of them against one snapshot and keeps the
//! first failure, so callers can write
//!
//! ```rust,ignore
//! let cluster = format!(
//!     "{{.configs[*].dynamicActiveClusters[?(@.cluster.name == {})]}}",
//!     quote(&name)
//! );
//! Validator::new(&dump)
//!     .exists(&cluster)
//!     .not_exists("{.configs[*].staticClusters[*]}")
//!     .check()?;
//! ```

use crate::error::{AssertionFailed, ParseError, ValidationError};
use crate::expr::PathExpression;
use crate::value::Snapshot;
use std::fmt::{self, Display, Formatter};

/// Expected match cardinality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Expectation {
    /// At least one match
    MustExist,
    /// Zero matches
    MustNotExist,
}

impl Expectation {
    /// Whether `matches` satisfies this expectation
    #[inline]
    #[must_use]
    pub fn holds(self, matches: usize) -> bool {
        match self {
            Self::MustExist => matches > 0,
            Self::MustNotExist => matches == 0,
        }
    }
}

impl Display for Expectation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::MustExist => f.write_str("match at least one element"),
            Self::MustNotExist => f.write_str("match nothing"),
        }
    }
}

/// Path expression plus expected cardinality
#[derive(Debug, Clone, PartialEq)]
pub struct Assertion {
    expression: PathExpression,
    expectation: Expectation,
}

impl Assertion {
    /// Create from a parsed expression
    #[inline]
    #[must_use]
    pub fn new(expression: PathExpression, expectation: Expectation) -> Self {
        Self {
            expression,
            expectation,
        }
    }

    /// Parse `text` and require at least one match
    ///
    /// # Errors
    /// Returns `ParseError` if `text` is malformed
    pub fn exists(text: &str) -> Result<Self, ParseError> {
        Ok(Self::new(PathExpression::parse(text)?, Expectation::MustExist))
    }

    /// Parse `text` and require zero matches
    ///
    /// # Errors
    /// Returns `ParseError` if `text` is malformed
    pub fn not_exists(text: &str) -> Result<Self, ParseError> {
        Ok(Self::new(
            PathExpression::parse(text)?,
            Expectation::MustNotExist,
        ))
    }

    /// Get the expression
    #[inline]
    #[must_use]
    pub fn expression(&self) -> &PathExpression {
        &self.expression
    }

    /// Get the expectation
    #[inline]
    #[must_use]
    pub fn expectation(&self) -> Expectation {
        self.expectation
    }

    /// Evaluate against a snapshot
    ///
    /// # Returns
    /// The number of matches when the expectation holds
    ///
    /// # Errors
    /// Returns `AssertionFailed` with the expression text and match count
    /// when it does not
    pub fn check(&self, snapshot: &Snapshot) -> Result<usize, AssertionFailed> {
        let matches = self.expression.count(snapshot);
        if self.expectation.holds(matches) {
            Ok(matches)
        } else {
            Err(AssertionFailed {
                expression: self.expression.to_string(),
                expectation: self.expectation,
                matches,
            })
        }
    }
}

impl Display for Assertion {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` must {}", self.expression, self.expectation)
    }
}

/// Chainable checker over one snapshot
///
/// Steps after the first failure are skipped; [`Validator::check`] reports
/// that failure.
#[derive(Debug)]
#[must_use = "a validator does nothing until `check` is called"]
pub struct Validator<'a> {
    snapshot: &'a Snapshot,
    failure: Option<ValidationError>,
}

impl<'a> Validator<'a> {
    /// Start validating `snapshot`
    #[inline]
    pub fn new(snapshot: &'a Snapshot) -> Self {
        Self {
            snapshot,
            failure: None,
        }
    }

    /// Require at least one match for `text`
    pub fn exists(self, text: &str) -> Self {
        self.step(text, Expectation::MustExist)
    }

    /// Require zero matches for `text`
    pub fn not_exists(self, text: &str) -> Self {
        self.step(text, Expectation::MustNotExist)
    }

    /// Apply an already-parsed assertion
    pub fn assert(mut self, assertion: &Assertion) -> Self {
        if self.failure.is_none() {
            if let Err(err) = assertion.check(self.snapshot) {
                self.failure = Some(err.into());
            }
        }
        self
    }

    /// Report the first failure, if any
    ///
    /// # Errors
    /// Returns the first `ParseError` or `AssertionFailed` in the chain
    pub fn check(self) -> Result<(), ValidationError> {
        match self.failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn step(self, text: &str, expectation: Expectation) -> Self {
        if self.failure.is_some() {
            return self;
        }
        match PathExpression::parse(text) {
            Ok(expression) => self.assert(&Assertion::new(expression, expectation)),
            Err(err) => Self {
                failure: Some(err.into()),
                ..self
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dump() -> Snapshot {
        Snapshot::from(json!({"routes": [{"name": "a:80"}, {"name": "b:80"}]}))
    }

    #[test]
    fn exists_holds_and_counts() {
        let assertion = Assertion::exists(".routes[*]").unwrap();
        assert_eq!(assertion.check(&dump()), Ok(2));
    }

    #[test]
    fn exists_fails_with_diagnostic() {
        let assertion = Assertion::exists(".routes[?(@.name == 'c:80')]").unwrap();
        let err = assertion.check(&dump()).unwrap_err();
        assert_eq!(err.expression, ".routes[?(@.name == 'c:80')]");
        assert_eq!(err.expectation, Expectation::MustExist);
        assert_eq!(err.matches, 0);
    }

    #[test]
    fn not_exists_reports_match_count() {
        let assertion = Assertion::not_exists(".routes[*]").unwrap();
        let err = assertion.check(&dump()).unwrap_err();
        assert_eq!(err.matches, 2);
        assert_eq!(assertion.check(&Snapshot::Null), Ok(0));
    }

    #[test]
    fn assertion_display() {
        let assertion = Assertion::not_exists(".a").unwrap();
        assert_eq!(assertion.to_string(), "`.a` must match nothing");
    }

    #[test]
    fn validator_chain_passes() {
        let snap = dump();
        let result = Validator::new(&snap)
            .exists(".routes[?(@.name == 'a:80')]")
            .not_exists(".routes[?(@.name == 'z:80')]")
            .check();
        assert!(result.is_ok());
    }

    #[test]
    fn validator_keeps_first_failure() {
        let snap = dump();
        let result = Validator::new(&snap)
            .exists(".missing")
            .exists("[[[")
            .check();
        match result {
            Err(ValidationError::Assertion(failed)) => assert_eq!(failed.expression, ".missing"),
            other => panic!("expected assertion failure, got {other:?}"),
        }
    }

    #[test]
    fn validator_surfaces_parse_error() {
        let snap = dump();
        let result = Validator::new(&snap).exists("{.routes").check();
        assert!(matches!(result, Err(ValidationError::Parse(_))));
    }
}
