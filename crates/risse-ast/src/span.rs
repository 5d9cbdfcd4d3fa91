//! Source positions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A byte range in the source text together with the 1-based line and column
/// of its start.
///
/// The all-zero span marks nodes that were fabricated by the compiler rather
/// than parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub fn new(start: u32, end: u32, line: u32, column: u32) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// True for spans of compiler-fabricated nodes.
    pub fn is_synthetic(&self) -> bool {
        *self == Span::default()
    }

    pub fn merge(&self, other: &Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            line: self.line.min(other.line),
            column: self.column.min(other.column),
        }
    }

    /// Zero-length span at the end of this one.
    pub fn end_point(&self) -> Span {
        Span {
            start: self.end,
            end: self.end,
            line: self.line,
            column: self.column,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
