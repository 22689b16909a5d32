//! Equality-based selectors over record attributes.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Implemented by records that expose string attributes to selectors.
pub trait Labeled {
    fn label(&self, key: &str) -> Option<&str>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Eq,
    NotEq,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Requirement {
    key: String,
    op: Op,
    value: String,
}

/// A conjunction of `key=value` / `key!=value` requirements.
///
/// The empty selector matches every record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    requirements: Vec<Requirement>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SelectorError {
    #[error("expected key=value or key!=value, got {0:?}")]
    MalformedTerm(String),
    #[error("empty key in selector term {0:?}")]
    EmptyKey(String),
}

impl Selector {
    /// Matches every record.
    pub fn everything() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    /// Parse a comma-separated requirement list, e.g. `state=failure,job!=flaky`.
    /// Whitespace around terms is ignored; the empty string selects everything.
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let mut requirements = Vec::new();
        for term in input.split(',') {
            let term = term.trim();
            if term.is_empty() {
                continue;
            }
            let (key, op, value) = if let Some((key, value)) = term.split_once("!=") {
                (key, Op::NotEq, value)
            } else if let Some((key, value)) = term.split_once('=') {
                (key, Op::Eq, value)
            } else {
                return Err(SelectorError::MalformedTerm(term.to_string()));
            };
            let key = key.trim();
            if key.is_empty() {
                return Err(SelectorError::EmptyKey(term.to_string()));
            }
            requirements.push(Requirement {
                key: key.to_string(),
                op,
                value: value.trim().to_string(),
            });
        }
        Ok(Self { requirements })
    }

    /// Whether every requirement holds for `record`. Absent attributes
    /// fail `=` requirements and satisfy `!=` requirements.
    pub fn matches(&self, record: &impl Labeled) -> bool {
        self.requirements.iter().all(|r| {
            let actual = record.label(&r.key);
            match r.op {
                Op::Eq => actual == Some(r.value.as_str()),
                Op::NotEq => actual != Some(r.value.as_str()),
            }
        })
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, r) in self.requirements.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            let op = match r.op {
                Op::Eq => "=",
                Op::NotEq => "!=",
            };
            write!(f, "{}{}{}", r.key, op, r.value)?;
        }
        Ok(())
    }
}
