use crate::{
    bytecode::{code_bundle::AssertionKind, template::MessageTemplate, types::Type},
    syntax::{diagnostic::CompileError, position::Span},
};

use super::{CompileResult, Compiler};

/// Fields a message reference may read from a value.
const TEMPLATE_FIELDS: &[&str] = &["length"];

impl Compiler<'_> {
    /// Checks that every `${...}` reference of an `@msg` template can be
    /// resolved against the values its assertion produces.
    pub(super) fn check_template(
        &self,
        template: &MessageTemplate,
        kind: &AssertionKind,
        span: Span,
    ) -> CompileResult<()> {
        for (expected, path) in template.references() {
            let Some(root) = self.template_root(kind, expected) else {
                return Err(CompileError::new(
                    span.start,
                    "$expected is not available for this assertion",
                ));
            };

            let mut ty = root;
            for segment in path {
                ty = match (segment.as_str(), &ty) {
                    (
                        "length",
                        Type::Array(_) | Type::Map(..) | Type::String | Type::Dict | Type::Any,
                    ) => Type::Int,
                    (field, _) if TEMPLATE_FIELDS.contains(&field) => {
                        return Err(CompileError::new(
                            span.start,
                            format!("cannot read '{field}' of {} in message", ty.label()),
                        ));
                    }
                    (field, _) => {
                        return Err(CompileError::new(
                            span.start,
                            format!(
                                "unknown message reference '{field}', expected one of: {}",
                                TEMPLATE_FIELDS.join(", ")
                            ),
                        ));
                    }
                };
            }
        }
        Ok(())
    }

    /// Type of the value `${...}` (or `${$expected...}`) starts from.
    fn template_root(&self, kind: &AssertionKind, expected: bool) -> Option<Type> {
        match (kind, expected) {
            (AssertionKind::Comparison { actual, .. }, false) => Some(self.chunk_type(*actual)),
            (AssertionKind::Comparison { expected, .. }, true) => Some(match expected.as_ref() {
                Some(r) => self.chunk_type(r),
                None => expected.ty(),
            }),
            (AssertionKind::Quantifier { offending, .. }, false) => {
                Some(self.chunk_type(*offending))
            }
            (AssertionKind::Quantifier { source, .. }, true) => Some(self.chunk_type(*source)),
            (AssertionKind::Value, false) => Some(Type::Bool),
            (AssertionKind::Value, true) => None,
        }
    }
}
