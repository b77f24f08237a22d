#![forbid(unsafe_code)]

//! A small container-query evaluator.
//!
//! Supports size features only, which is all the fixtures need:
//!
//! ```text
//! query   := clause ( "and" clause )*
//! clause  := "(" feature ":" length ")"          -- min-width, max-height, ...
//!          | "(" dimension op length ")"         -- width >= 400px
//! op      := "<" | "<=" | ">" | ">="
//! length  := number "px"?
//! ```

use std::fmt;

/// Element size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dimension {
    Width,
    Height,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparison {
    Less,
    LessEq,
    Greater,
    GreaterEq,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Clause {
    dimension: Dimension,
    comparison: Comparison,
    value: f32,
}

impl Clause {
    fn evaluate(self, size: Size) -> bool {
        let actual = match self.dimension {
            Dimension::Width => size.width,
            Dimension::Height => size.height,
        };
        match self.comparison {
            Comparison::Less => actual < self.value,
            Comparison::LessEq => actual <= self.value,
            Comparison::Greater => actual > self.value,
            Comparison::GreaterEq => actual >= self.value,
        }
    }
}

/// A parsed container query.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerQuery {
    clauses: Vec<Clause>,
}

/// Why a query string was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryParseError {
    /// The query was empty or only whitespace.
    Empty,
    /// A clause was not wrapped in parentheses.
    Unparenthesized(String),
    /// The feature or dimension name is not supported.
    UnknownFeature(String),
    /// The length could not be parsed.
    BadLength(String),
}

impl fmt::Display for QueryParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty container query"),
            Self::Unparenthesized(c) => write!(f, "clause is not parenthesized: {c}"),
            Self::UnknownFeature(name) => write!(f, "unsupported container feature: {name}"),
            Self::BadLength(v) => write!(f, "invalid length: {v}"),
        }
    }
}

impl std::error::Error for QueryParseError {}

impl ContainerQuery {
    /// Parse `input`.
    pub fn parse(input: &str) -> Result<Self, QueryParseError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(QueryParseError::Empty);
        }
        let clauses = input
            .split(" and ")
            .map(parse_clause)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { clauses })
    }

    /// Whether `size` satisfies every clause.
    #[must_use]
    pub fn evaluate(&self, size: Size) -> bool {
        self.clauses.iter().all(|c| c.evaluate(size))
    }
}

fn parse_clause(raw: &str) -> Result<Clause, QueryParseError> {
    let body = raw
        .trim()
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| QueryParseError::Unparenthesized(raw.trim().to_string()))?
        .trim();

    if let Some((feature, value)) = body.split_once(':') {
        let (comparison, dimension) = match feature.trim() {
            "min-width" => (Comparison::GreaterEq, Dimension::Width),
            "max-width" => (Comparison::LessEq, Dimension::Width),
            "min-height" => (Comparison::GreaterEq, Dimension::Height),
            "max-height" => (Comparison::LessEq, Dimension::Height),
            other => return Err(QueryParseError::UnknownFeature(other.to_string())),
        };
        return Ok(Clause {
            dimension,
            comparison,
            value: parse_length(value)?,
        });
    }

    // Two-character operators first so ">=" is not read as ">".
    for (op, comparison) in [
        (">=", Comparison::GreaterEq),
        ("<=", Comparison::LessEq),
        (">", Comparison::Greater),
        ("<", Comparison::Less),
    ] {
        if let Some((name, value)) = body.split_once(op) {
            let dimension = match name.trim() {
                "width" => Dimension::Width,
                "height" => Dimension::Height,
                other => return Err(QueryParseError::UnknownFeature(other.to_string())),
            };
            return Ok(Clause {
                dimension,
                comparison,
                value: parse_length(value)?,
            });
        }
    }
    Err(QueryParseError::UnknownFeature(body.to_string()))
}

fn parse_length(raw: &str) -> Result<f32, QueryParseError> {
    let trimmed = raw.trim();
    let number = trimmed.strip_suffix("px").unwrap_or(trimmed).trim();
    number
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| QueryParseError::BadLength(trimmed.to_string()))
}
