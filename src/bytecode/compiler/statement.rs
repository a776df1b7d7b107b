use crate::{
    bytecode::{
        chunk::{Chunk, ChunkRef, Primitive},
        code_bundle::{Assertion, AssertionKind},
        operators::{is_comparison, split_operator},
        template::MessageTemplate,
        types::Type,
    },
    schema::LIST_FIELD,
    syntax::{
        diagnostic::CompileError,
        expression::Expression,
        position::Span,
        statement::{Message, Statement},
    },
};

use super::{CompileResult, Compiled, Compiler, Operand, labels::statement_label, methods::QUANTIFIERS};

impl Compiler<'_> {
    /// Compiles the statements of the current block. The final chunk of
    /// every expression statement becomes an entrypoint; assignments only
    /// bind a name. Boolean statements of block 1 are assertions; inside
    /// `if` and projection bodies only those carrying an `@msg` are.
    pub(super) fn compile_statements(&mut self, statements: &[Statement]) -> CompileResult<()> {
        for statement in statements {
            match statement {
                Statement::Assign { name, value, .. } => {
                    let compiled = self.compile_expression(value)?;
                    let r = self.materialize(&compiled);
                    self.define_variable(name, r, compiled.ty);
                }
                Statement::Expression {
                    expression,
                    message,
                    span,
                } => {
                    self.compile_expression_statement(expression, message.as_ref(), *span)?
                }
            }
        }
        Ok(())
    }

    fn compile_expression_statement(
        &mut self,
        expression: &Expression,
        message: Option<&Message>,
        span: Span,
    ) -> CompileResult<()> {
        let mut label = statement_label(expression);
        let (r, ty) = match expression {
            // A bare variable gets its own chunk so it can be an entrypoint
            // of this statement.
            Expression::Identifier { name, .. } if self.is_variable(name) => {
                let Some(Compiled {
                    operand: Operand::Ref(local),
                    ty,
                }) = self.lookup_variable(name)
                else {
                    return Err(CompileError::new(span.start, format!("unknown identifier '{name}'")));
                };
                let r = self.emit(Chunk::typed_primitive(Primitive::Ref(local), ty.clone()));
                (r, ty)
            }
            _ => {
                let mut value = self.compile_expression(expression)?;
                if self.is_list_resource(&value.ty) {
                    value = self.as_collection(value);
                    label = format!("{label}.{LIST_FIELD}");
                }
                (self.materialize(&value), value.ty)
            }
        };

        self.add_entrypoint(r);
        self.labels.insert(r, label);

        if ty != Type::Bool || !(self.is_top_level() || message.is_some()) {
            return match message {
                Some(message) => Err(CompileError::new(
                    message.span.start,
                    "@msg must be followed by an assertion",
                )),
                None => Ok(()),
            };
        }

        let mut assertion = Assertion {
            kind: self.assertion_kind(r),
            message: None,
        };
        for (datapoint, label) in self.datapoint_labels(expression, &assertion.kind) {
            self.add_datapoint(datapoint);
            self.labels.entry(datapoint).or_insert(label);
        }
        if let Some(message) = message {
            let template = MessageTemplate::parse(&message.template)
                .map_err(|err| CompileError::new(message.span.start, err))?;
            self.check_template(&template, &assertion.kind, message.span)?;
            assertion.message = Some(template);
        }
        self.assertions.insert(r, assertion);
        Ok(())
    }

    /// Classifies the assertion ending at `r` by the chunk that produced it.
    fn assertion_kind(&self, r: ChunkRef) -> AssertionKind {
        let Some(chunk) = self.chunk(r) else {
            return AssertionKind::Value;
        };
        let (Some(id), Some(function)) = (chunk.id(), chunk.function()) else {
            return AssertionKind::Value;
        };
        let Some(binding) = function.binding else {
            return AssertionKind::Value;
        };

        if let Some((operator, _)) = split_operator(id)
            && is_comparison(operator)
        {
            return AssertionKind::Comparison {
                operator: operator.to_string(),
                actual: binding,
                expected: function.args.first().cloned().unwrap_or(Primitive::Nil),
            };
        }

        if let Some(quantifier) = id.strip_prefix('$')
            && QUANTIFIERS.contains(&quantifier)
        {
            let filter = self.chunk(binding);
            let source = match filter.and_then(|f| f.id()) {
                Some("where" | "$whereNot") => filter.and_then(|f| f.binding()),
                _ => None,
            };
            let (offending, source) = match source {
                Some(source) if quantifier == "any" => (source, source),
                Some(source) => (binding, source),
                None => (binding, binding),
            };
            return AssertionKind::Quantifier {
                quantifier: quantifier.to_string(),
                offending,
                source,
            };
        }

        AssertionKind::Value
    }
}
