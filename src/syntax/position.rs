use std::fmt;

use serde::{Deserialize, Serialize};

/// A 1-based line/column location in query source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Source range covered by a token or syntax node.
///
/// `start_offset`/`end_offset` are char offsets into the source, used to
/// slice the original text back out for labels and directive ownership.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
    pub start_offset: usize,
    pub end_offset: usize,
}

impl Span {
    pub fn new(start: Position, end: Position, start_offset: usize, end_offset: usize) -> Self {
        Self {
            start,
            end,
            start_offset,
            end_offset,
        }
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start,
            end: other.end,
            start_offset: self.start_offset,
            end_offset: other.end_offset,
        }
    }
}
