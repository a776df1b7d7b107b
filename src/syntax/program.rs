use std::fmt;

use crate::syntax::{position::Span, statement::Statement};

#[derive(Debug, Clone, Default)]
pub struct Program {
    pub statements: Vec<Statement>,
    pub span: Span,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn span(&self) -> Span {
        self.span
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.statements.iter().map(|s| s.to_string()).collect();
        write!(f, "{}", parts.join("; "))
    }
}
