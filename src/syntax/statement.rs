use std::fmt;

use crate::syntax::{expression::Expression, position::Span};

/// A `# @msg` template attached to a statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub template: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Assign {
        name: String,
        value: Expression,
        span: Span,
    },
    Expression {
        expression: Expression,
        message: Option<Message>,
        span: Span,
    },
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::Assign { span, .. } | Statement::Expression { span, .. } => *span,
        }
    }

    pub(crate) fn attach_message(&mut self, msg: Message) {
        if let Statement::Expression { message, .. } = self {
            *message = Some(msg);
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Assign { name, value, .. } => write!(f, "{} = {}", name, value),
            Statement::Expression { expression, .. } => write!(f, "{}", expression),
        }
    }
}
