//! Path expressions
//!
//! Provides [`PathExpression`], the parsed form of a query such as
//!
//! ```text
//! {.configs[*].dynamicActiveClusters[?(@.cluster.name == 'outbound|80||b.svc')]}
//! ```
//!
//! Accepted syntax:
//! - `.name` / `['name']`: field of a mapping
//! - `[*]` / `.*`: every element of a sequence or value of a mapping
//! - `[n]`: n-th element of a sequence, negative counts from the end
//! - `[?(@.sub.field == literal)]`, `!=`: keep sequence elements whose
//!   sub-field compares to the literal
//!
//! A leading `$` and an enclosing `{ }` pair are both optional.

use crate::error::ParseError;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Parsed, immutable path expression
///
/// Built once, evaluated many times against different snapshots. Keeps its
/// source text for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct PathExpression {
    source: String,
    segments: Vec<Segment>,
}

/// One traversal step
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Named field of a mapping
    Field(String),
    /// Every element of a sequence or value of a mapping
    Wildcard,
    /// Indexed sequence element
    Index(i64),
    /// Filtered sequence elements
    Filter(Filter),
}

/// Filter predicate `@.path op literal`
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// Field path relative to the candidate element
    pub path: Vec<String>,
    /// Comparison
    pub op: CompareOp,
    /// Right-hand side
    pub literal: Literal,
}

/// Filter comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
}

/// Literal on the right-hand side of a filter
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Quoted string
    String(String),
    /// Number, compared numerically
    Number(f64),
    /// `true` / `false`
    Bool(bool),
    /// `null`
    Null,
}

impl PathExpression {
    /// Parse expression text
    ///
    /// # Errors
    /// Returns `ParseError` for malformed syntax: unbalanced brackets or
    /// braces, unknown predicate operators, unterminated strings, bad
    /// indices, or an empty expression
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        if text.trim().is_empty() {
            return Err(ParseError::Empty);
        }
        Parser::new(text).expression()
    }

    /// Source text, trimmed
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Parsed segments, in evaluation order
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

impl Display for PathExpression {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl FromStr for PathExpression {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Render text as a string literal that can be embedded in an expression
///
/// Hostnames and cluster names routinely contain `|` and `.`; quotes and
/// backslashes are escaped.
#[must_use]
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for c in text.chars() {
        if matches!(c, '\'' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('\'');
    out
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

fn is_operator_char(c: char) -> bool {
    c.is_ascii_punctuation() && !matches!(c, '\'' | '"' | '(' | ')' | '[' | ']' | '-' | '.' | '@')
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn expression(mut self) -> Result<PathExpression, ParseError> {
        self.skip_ws();
        let brace_at = self.pos;
        let braced = self.eat('{');
        self.skip_ws();
        let rooted = self.eat('$');

        let mut segments = Vec::new();
        loop {
            match self.peek() {
                Some('.') => segments.push(self.dot_segment()?),
                Some('[') => segments.push(self.bracket_segment()?),
                _ => break,
            }
        }

        self.skip_ws();
        if braced {
            match self.peek() {
                Some('}') => {
                    self.bump();
                    self.skip_ws();
                }
                None => return Err(self.unbalanced('{', brace_at)),
                Some(_) => return Err(self.unexpected("'.', '[' or '}'")),
            }
        }

        match self.peek() {
            None => {}
            Some(c @ ('}' | ']' | ')')) => return Err(self.unbalanced(c, self.pos)),
            Some(_) => return Err(self.unexpected("'.' or '['")),
        }

        if segments.is_empty() && !rooted {
            return Err(ParseError::Empty);
        }

        Ok(PathExpression {
            source: self.text.trim().to_string(),
            segments,
        })
    }

    fn dot_segment(&mut self) -> Result<Segment, ParseError> {
        self.bump();
        if self.eat('*') {
            return Ok(Segment::Wildcard);
        }
        Ok(Segment::Field(self.name()?))
    }

    fn bracket_segment(&mut self) -> Result<Segment, ParseError> {
        let open = self.pos;
        self.bump();
        self.skip_ws();
        let segment = match self.peek() {
            Some('*') => {
                self.bump();
                Segment::Wildcard
            }
            Some(q @ ('\'' | '"')) => Segment::Field(self.quoted(q)?),
            Some(c) if c == '-' || c.is_ascii_digit() => Segment::Index(self.index()?),
            Some('?') => Segment::Filter(self.filter()?),
            None => return Err(self.unbalanced('[', open)),
            Some(_) => return Err(self.unexpected("'*', index, quoted field or filter")),
        };

        self.skip_ws();
        match self.peek() {
            Some(']') => {
                self.bump();
                Ok(segment)
            }
            None => Err(self.unbalanced('[', open)),
            Some(_) => Err(self.unexpected("']'")),
        }
    }

    fn filter(&mut self) -> Result<Filter, ParseError> {
        self.bump();
        let paren = self.pos;
        if !self.eat('(') {
            return Err(self.unexpected("'('"));
        }
        self.skip_ws();
        if !self.eat('@') {
            return Err(self.unexpected("'@'"));
        }

        let mut path = Vec::new();
        while self.eat('.') {
            path.push(self.name()?);
        }
        if path.is_empty() {
            return Err(self.unexpected("'.' after '@'"));
        }

        self.skip_ws();
        let op = self.operator()?;
        self.skip_ws();
        let literal = self.literal()?;
        self.skip_ws();

        match self.peek() {
            Some(')') => {
                self.bump();
                Ok(Filter { path, op, literal })
            }
            None | Some(']') => Err(self.unbalanced('(', paren)),
            Some(_) => Err(self.unexpected("')'")),
        }
    }

    fn operator(&mut self) -> Result<CompareOp, ParseError> {
        let start = self.pos;
        while self.peek().is_some_and(is_operator_char) {
            self.bump();
        }
        if self.pos == start {
            while self.peek().is_some_and(|c| c.is_alphanumeric()) {
                self.bump();
            }
        }
        match &self.text[start..self.pos] {
            "==" => Ok(CompareOp::Eq),
            "!=" => Ok(CompareOp::Ne),
            "" => Err(self.unexpected("comparison operator")),
            other => Err(ParseError::UnknownOperator {
                expression: self.text.to_string(),
                operator: other.to_string(),
                offset: start,
            }),
        }
    }

    fn literal(&mut self) -> Result<Literal, ParseError> {
        match self.peek() {
            Some(q @ ('\'' | '"')) => Ok(Literal::String(self.quoted(q)?)),
            Some(c) if c == '-' || c.is_ascii_digit() => self.number(),
            Some(c) if c.is_ascii_alphabetic() => {
                let start = self.pos;
                while self.peek().is_some_and(|c| c.is_ascii_alphanumeric()) {
                    self.bump();
                }
                match &self.text[start..self.pos] {
                    "true" => Ok(Literal::Bool(true)),
                    "false" => Ok(Literal::Bool(false)),
                    "null" => Ok(Literal::Null),
                    word => Err(ParseError::Unexpected {
                        expression: self.text.to_string(),
                        expected: "literal",
                        found: format!("`{word}`"),
                        offset: start,
                    }),
                }
            }
            _ => Err(self.unexpected("literal")),
        }
    }

    fn number(&mut self) -> Result<Literal, ParseError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E'))
        {
            self.bump();
        }
        let text = &self.text[start..self.pos];
        text.parse::<f64>()
            .map(Literal::Number)
            .map_err(|_| ParseError::Unexpected {
                expression: self.text.to_string(),
                expected: "number",
                found: format!("`{text}`"),
                offset: start,
            })
    }

    fn index(&mut self) -> Result<i64, ParseError> {
        let start = self.pos;
        self.eat('-');
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        let text = &self.text[start..self.pos];
        text.parse().map_err(|_| ParseError::InvalidIndex {
            expression: self.text.to_string(),
            text: text.to_string(),
            offset: start,
        })
    }

    fn quoted(&mut self, quote: char) -> Result<String, ParseError> {
        let start = self.pos;
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('\\') => match self.bump() {
                    Some(c) => out.push(c),
                    None => break,
                },
                Some(c) if c == quote => return Ok(out),
                Some(c) => out.push(c),
                None => break,
            }
        }
        Err(ParseError::UnterminatedString {
            expression: self.text.to_string(),
            offset: start,
        })
    }

    fn name(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        while self.peek().is_some_and(is_name_char) {
            self.bump();
        }
        if self.pos == start {
            return Err(self.unexpected("field name"));
        }
        Ok(self.text[start..self.pos].to_string())
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn unbalanced(&self, delimiter: char, offset: usize) -> ParseError {
        ParseError::Unbalanced {
            expression: self.text.to_string(),
            delimiter,
            offset,
        }
    }

    fn unexpected(&self, expected: &'static str) -> ParseError {
        let found = match self.peek() {
            Some(c) => format!("'{c}'"),
            None => "end of input".to_string(),
        };
        ParseError::Unexpected {
            expression: self.text.to_string(),
            expected,
            found,
            offset: self.pos,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str) -> Segment {
        Segment::Field(name.to_string())
    }

    #[test]
    fn parse_dotted_fields() {
        let expr = PathExpression::parse(".configs.bootstrap").unwrap();
        assert_eq!(expr.segments(), &[field("configs"), field("bootstrap")]);
    }

    #[test]
    fn parse_braced_template_with_root() {
        let expr = PathExpression::parse("{$.a[*].b}").unwrap();
        assert_eq!(expr.segments(), &[field("a"), Segment::Wildcard, field("b")]);
        assert_eq!(expr.to_string(), "{$.a[*].b}");
    }

    #[test]
    fn parse_bracketed_field_and_index() {
        let expr = PathExpression::parse("['odd.key'][-1][0]").unwrap();
        assert_eq!(
            expr.segments(),
            &[field("odd.key"), Segment::Index(-1), Segment::Index(0)]
        );
    }

    #[test]
    fn parse_filter_with_nested_field() {
        let expr = PathExpression::parse("[?(@.cluster.name == 'outbound|80||b')]").unwrap();
        let Segment::Filter(filter) = &expr.segments()[0] else {
            panic!("expected filter");
        };
        assert_eq!(filter.path, vec!["cluster".to_string(), "name".to_string()]);
        assert_eq!(filter.op, CompareOp::Eq);
        assert_eq!(filter.literal, Literal::String("outbound|80||b".to_string()));
    }

    #[test]
    fn parse_filter_literal_kinds() {
        let cases = [
            ("[?(@.port==80)]", Literal::Number(80.0)),
            ("[?(@.on != true)]", Literal::Bool(true)),
            ("[?(@.x == null)]", Literal::Null),
            ("[?(@.x == \"dq\")]", Literal::String("dq".to_string())),
            ("[?(@.x == -1.5)]", Literal::Number(-1.5)),
        ];
        for (text, expected) in cases {
            let expr = PathExpression::parse(text).unwrap();
            let Segment::Filter(filter) = &expr.segments()[0] else {
                panic!("expected filter in {text}");
            };
            assert_eq!(filter.literal, expected, "{text}");
        }
    }

    #[test]
    fn parse_escaped_quote() {
        let expr = PathExpression::parse(r"[?(@.name == 'it\'s')]").unwrap();
        let Segment::Filter(filter) = &expr.segments()[0] else {
            panic!("expected filter");
        };
        assert_eq!(filter.literal, Literal::String("it's".to_string()));
    }

    #[test]
    fn quote_round_trips_through_parser() {
        let raw = r"we'ird\name|80";
        let expr = PathExpression::parse(&format!("[?(@.name == {})]", quote(raw))).unwrap();
        let Segment::Filter(filter) = &expr.segments()[0] else {
            panic!("expected filter");
        };
        assert_eq!(filter.literal, Literal::String(raw.to_string()));
    }

    #[test]
    fn reject_empty() {
        assert_eq!(PathExpression::parse("   "), Err(ParseError::Empty));
        assert_eq!(PathExpression::parse("{}"), Err(ParseError::Empty));
    }

    #[test]
    fn reject_unbalanced_bracket() {
        let err = PathExpression::parse(".a[*").unwrap_err();
        assert!(matches!(err, ParseError::Unbalanced { delimiter: '[', offset: 2, .. }));
    }

    #[test]
    fn reject_unbalanced_brace() {
        let err = PathExpression::parse("{.a.b").unwrap_err();
        assert!(matches!(err, ParseError::Unbalanced { delimiter: '{', offset: 0, .. }));

        let err = PathExpression::parse(".a.b}").unwrap_err();
        assert!(matches!(err, ParseError::Unbalanced { delimiter: '}', .. }));
    }

    #[test]
    fn reject_unclosed_filter_paren() {
        let err = PathExpression::parse("[?(@.a == 'x']").unwrap_err();
        assert!(matches!(err, ParseError::Unbalanced { delimiter: '(', offset: 2, .. }));
    }

    #[test]
    fn reject_unknown_operator() {
        for op in ["=~", "<", ">=", "contains", "="] {
            let err = PathExpression::parse(&format!("[?(@.a {op} 'x')]")).unwrap_err();
            match err {
                ParseError::UnknownOperator { operator, .. } => assert_eq!(operator, op),
                other => panic!("expected UnknownOperator for {op}, got {other:?}"),
            }
        }
    }

    #[test]
    fn reject_unterminated_string() {
        let err = PathExpression::parse("[?(@.a == 'x)]").unwrap_err();
        assert!(matches!(err, ParseError::UnterminatedString { offset: 10, .. }));
    }

    #[test]
    fn reject_bad_index_and_names() {
        assert!(matches!(
            PathExpression::parse("[-]"),
            Err(ParseError::InvalidIndex { .. })
        ));
        assert!(matches!(
            PathExpression::parse(".a..b"),
            Err(ParseError::Unexpected { expected: "field name", .. })
        ));
        assert!(matches!(
            PathExpression::parse("[?(@ == 'x')]"),
            Err(ParseError::Unexpected { .. })
        ));
        assert!(matches!(
            PathExpression::parse(".a b"),
            Err(ParseError::Unexpected { .. })
        ));
    }
}
