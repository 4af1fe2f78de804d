//! Expected backend identity

use regex::Regex;
use std::fmt;
use std::str::FromStr;

/// Pattern a responding backend's identity must contain
///
/// Matching is a search, not a full match: anchor the pattern with `^`/`$`
/// to constrain the whole identity. An empty match never counts.
#[derive(Debug, Clone)]
pub struct OriginMatcher {
    regex: Regex,
}

impl OriginMatcher {
    /// Compile a matcher
    ///
    /// # Errors
    /// Returns `regex::Error` if `pattern` is not a valid regular expression
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }

    /// Check whether `identity` contains a non-empty match
    #[must_use]
    pub fn matches(&self, identity: &str) -> bool {
        self.regex.find(identity).is_some_and(|m| !m.is_empty())
    }

    /// Source pattern
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl FromStr for OriginMatcher {
    type Err = regex::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for OriginMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
