//! Human labels for entrypoints and datapoints, derived from the syntax
//! that produced them (`mondoo.version`, `users.all()`, `params[Port]`).

use crate::{
    bytecode::{chunk::ChunkRef, code_bundle::AssertionKind},
    syntax::expression::Expression,
};

use super::{Compiler, methods::QUANTIFIERS};

/// Label of a whole statement. Literals, and projections or indexes taken
/// directly on a literal, have none, so printers show only their value.
pub(super) fn statement_label(expression: &Expression) -> String {
    if literal_rooted(expression) {
        String::new()
    } else {
        expression_label(expression)
    }
}

fn literal_rooted(expression: &Expression) -> bool {
    match expression {
        Expression::Block { object, .. } => literal_rooted(object),
        Expression::Index { left, .. } => literal_rooted(left),
        Expression::Array { .. } | Expression::Map { .. } => true,
        other => other.is_literal(),
    }
}

pub(super) fn expression_label(expression: &Expression) -> String {
    match expression {
        Expression::Identifier { name, .. } => name.clone(),
        Expression::SelfRef { .. } => "_".to_string(),
        Expression::Integer { value, .. } => value.to_string(),
        Expression::Float { value, .. } => value.to_string(),
        Expression::String { value, .. } => format!("{value:?}"),
        Expression::Boolean { value, .. } => value.to_string(),
        Expression::Null { .. } => "null".to_string(),
        Expression::Array { .. } => "[]".to_string(),
        Expression::Map { .. } => "{}".to_string(),
        Expression::Prefix {
            operator, right, ..
        } => format!("{operator}{}", expression_label(right)),
        Expression::Infix {
            left,
            operator,
            right,
            ..
        } => format!(
            "{} {operator} {}",
            expression_label(left),
            expression_label(right)
        ),
        Expression::MemberAccess { object, member, .. } => member_label(object, member),
        Expression::Call { function, .. } => match function.as_ref() {
            Expression::MemberAccess { object, member, .. }
                if QUANTIFIERS.contains(&member.as_str()) =>
            {
                format!("{}()", member_label(object, member))
            }
            other => expression_label(other),
        },
        Expression::Index { left, index, .. } => {
            let key = match index.as_ref() {
                Expression::String { value, .. } => value.clone(),
                other => expression_label(other),
            };
            format!("{}[{key}]", expression_label(left))
        }
        Expression::Block { object, .. } => expression_label(object),
        Expression::If { .. } => "if".to_string(),
    }
}

fn member_label(object: &Expression, member: &str) -> String {
    match object {
        Expression::SelfRef { .. } => member.to_string(),
        other => format!("{}.{member}", expression_label(other)),
    }
}

impl Compiler<'_> {
    /// Labels for the datapoints of an assertion, taken from the operands
    /// of the asserting expression.
    pub(super) fn datapoint_labels(
        &self,
        expression: &Expression,
        kind: &AssertionKind,
    ) -> Vec<(ChunkRef, String)> {
        let mut labels = Vec::new();
        match (kind, expression) {
            (
                AssertionKind::Comparison {
                    actual, expected, ..
                },
                Expression::Infix { left, right, .. },
            ) => {
                labels.push((*actual, expression_label(left)));
                if let Some(r) = expected.as_ref() {
                    labels.push((r, expression_label(right)));
                }
            }
            (
                AssertionKind::Quantifier {
                    offending, source, ..
                },
                Expression::Call { function, .. },
            ) if matches!(function.as_ref(), Expression::MemberAccess { .. }) => {
                if let Expression::MemberAccess { object, .. } = function.as_ref() {
                    let base = expression_label(object);
                    if offending != source {
                        labels.push((*offending, format!("{base}.where")));
                    }
                    labels.push((*source, base));
                }
            }
            (
                AssertionKind::Quantifier { source, .. },
                Expression::MemberAccess { object, .. },
            ) => labels.push((*source, expression_label(object))),
            (kind, _) => {
                let assertion = crate::bytecode::code_bundle::Assertion {
                    kind: kind.clone(),
                    message: None,
                };
                for r in assertion.datapoints() {
                    let id = self.chunk(r).and_then(|c| c.id()).unwrap_or_default();
                    labels.push((r, id.to_string()));
                }
            }
        }
        labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{parse, statement::Statement};

    fn label(source: &str) -> String {
        let program = parse(source).unwrap();
        match &program.statements[0] {
            Statement::Expression { expression, .. } => statement_label(expression),
            other => panic!("expected expression, got {other:?}"),
        }
    }

    #[test]
    fn labels_follow_query_structure() {
        assert_eq!(label("mondoo.version"), "mondoo.version");
        assert_eq!(label("mondoo.build == 1"), "mondoo.build == 1");
        assert_eq!(label("x == 'a'"), "x == \"a\"");
        assert_eq!(label("users.all(uid < 1000)"), "users.all()");
        assert_eq!(label("user(name: 'x').authorizedkeys.file"), "user.authorizedkeys.file");
        assert_eq!(label("sshd.config.params['Port']"), "sshd.config.params[Port]");
        assert_eq!(label("_.split('-')"), "split");
        assert_eq!(label("if (true) { 1 }"), "if");
        assert_eq!(label("[1, 2]"), "");
        assert_eq!(label("{}"), "");
        assert_eq!(label("['1-2'] { _.split('-') }"), "");
        assert_eq!(label("[1, 2][-1]"), "");
        assert_eq!(label("{a: 1}['a']"), "");
    }
}
