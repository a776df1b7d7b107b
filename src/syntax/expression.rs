use std::fmt;

use crate::syntax::{position::Span, statement::Statement};

/// A call argument, optionally named (`user(name: 'root')`).
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: Option<String>,
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Identifier {
        name: String,
        span: Span,
    },
    /// The `_` binding of a block.
    SelfRef {
        span: Span,
    },
    Integer {
        value: i64,
        span: Span,
    },
    Float {
        value: f64,
        span: Span,
    },
    String {
        value: String,
        span: Span,
    },
    Boolean {
        value: bool,
        span: Span,
    },
    Null {
        span: Span,
    },
    Array {
        elements: Vec<Expression>,
        span: Span,
    },
    Map {
        entries: Vec<(String, Expression)>,
        span: Span,
    },
    Prefix {
        operator: String,
        right: Box<Expression>,
        span: Span,
    },
    Infix {
        left: Box<Expression>,
        operator: String,
        right: Box<Expression>,
        span: Span,
    },
    MemberAccess {
        object: Box<Expression>,
        member: String,
        span: Span,
    },
    Call {
        function: Box<Expression>,
        arguments: Vec<Argument>,
        span: Span,
    },
    Index {
        left: Box<Expression>,
        index: Box<Expression>,
        span: Span,
    },
    /// `expr { ... }` block projection.
    Block {
        object: Box<Expression>,
        body: Vec<Statement>,
        span: Span,
    },
    If {
        condition: Box<Expression>,
        consequence: Vec<Statement>,
        alternative: Option<Vec<Statement>>,
        span: Span,
    },
}

impl Expression {
    pub fn span(&self) -> Span {
        match self {
            Expression::Identifier { span, .. }
            | Expression::SelfRef { span }
            | Expression::Integer { span, .. }
            | Expression::Float { span, .. }
            | Expression::String { span, .. }
            | Expression::Boolean { span, .. }
            | Expression::Null { span }
            | Expression::Array { span, .. }
            | Expression::Map { span, .. }
            | Expression::Prefix { span, .. }
            | Expression::Infix { span, .. }
            | Expression::MemberAccess { span, .. }
            | Expression::Call { span, .. }
            | Expression::Index { span, .. }
            | Expression::Block { span, .. }
            | Expression::If { span, .. } => *span,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Expression::Integer { .. }
                | Expression::Float { .. }
                | Expression::String { .. }
                | Expression::Boolean { .. }
                | Expression::Null { .. }
        )
    }
}

fn write_statements(f: &mut fmt::Formatter<'_>, statements: &[Statement]) -> fmt::Result {
    let parts: Vec<String> = statements.iter().map(|s| s.to_string()).collect();
    write!(f, "{{ {} }}", parts.join("; "))
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Identifier { name, .. } => write!(f, "{}", name),
            Expression::SelfRef { .. } => write!(f, "_"),
            Expression::Integer { value, .. } => write!(f, "{}", value),
            Expression::Float { value, .. } => write!(f, "{}", value),
            Expression::String { value, .. } => write!(f, "{:?}", value),
            Expression::Boolean { value, .. } => write!(f, "{}", value),
            Expression::Null { .. } => write!(f, "null"),
            Expression::Array { elements, .. } => {
                let items: Vec<String> = elements.iter().map(|e| e.to_string()).collect();
                write!(f, "[{}]", items.join(", "))
            }
            Expression::Map { entries, .. } => {
                let items: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v))
                    .collect();
                write!(f, "{{{}}}", items.join(", "))
            }
            Expression::Prefix {
                operator, right, ..
            } => write!(f, "({}{})", operator, right),
            Expression::Infix {
                left,
                operator,
                right,
                ..
            } => write!(f, "({} {} {})", left, operator, right),
            Expression::MemberAccess { object, member, .. } => {
                write!(f, "{}.{}", object, member)
            }
            Expression::Call {
                function,
                arguments,
                ..
            } => {
                let args: Vec<String> = arguments
                    .iter()
                    .map(|arg| match &arg.name {
                        Some(name) => format!("{}: {}", name, arg.value),
                        None => arg.value.to_string(),
                    })
                    .collect();
                write!(f, "{}({})", function, args.join(", "))
            }
            Expression::Index { left, index, .. } => write!(f, "{}[{}]", left, index),
            Expression::Block { object, body, .. } => {
                write!(f, "{} ", object)?;
                write_statements(f, body)
            }
            Expression::If {
                condition,
                consequence,
                alternative,
                ..
            } => {
                write!(f, "if ({}) ", condition)?;
                write_statements(f, consequence)?;
                if let Some(alt) = alternative {
                    write!(f, " else ")?;
                    write_statements(f, alt)?;
                }
                Ok(())
            }
        }
    }
}
