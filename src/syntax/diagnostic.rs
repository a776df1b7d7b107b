use thiserror::Error;

use crate::syntax::position::Position;

/// Static failure of a query: syntax, unknown identifiers, arity or type
/// mismatches, malformed nesting. Compilation never partially succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{position}: {message}")]
pub struct CompileError {
    pub position: Position,
    pub message: String,
}

impl CompileError {
    pub fn new(position: Position, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}
