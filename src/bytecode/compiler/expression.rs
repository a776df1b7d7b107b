use std::collections::BTreeMap;

use crate::{
    bytecode::{
        chunk::{Chunk, ChunkRef, Function, Primitive},
        types::Type,
    },
    schema::LIST_FIELD,
    syntax::{
        diagnostic::CompileError,
        expression::{Argument, Expression},
        position::Span,
        statement::Statement,
    },
};

use super::{CompileResult, Compiled, Compiler, Operand, dependency_array};

impl Compiler<'_> {
    pub(super) fn compile_expression(&mut self, expression: &Expression) -> CompileResult<Compiled> {
        match expression {
            Expression::Integer { value, .. } => Ok(Compiled::literal(Primitive::Int(*value))),
            Expression::Float { value, .. } => Ok(Compiled::literal(Primitive::Float(*value))),
            Expression::String { value, .. } => {
                Ok(Compiled::literal(Primitive::String(value.clone())))
            }
            Expression::Boolean { value, .. } => Ok(Compiled::literal(Primitive::Bool(*value))),
            Expression::Null { .. } => Ok(Compiled::literal(Primitive::Nil)),
            Expression::Array { elements, .. } => self.compile_array(elements),
            Expression::Map { entries, .. } => self.compile_map(entries),
            Expression::SelfRef { span } => self.compile_self(*span),
            Expression::Identifier { name, span } => self.compile_identifier(name, *span),
            Expression::MemberAccess {
                object,
                member,
                span,
            } => self.compile_member_access(object, member, *span),
            Expression::Call {
                function,
                arguments,
                span,
            } => self.compile_call(function, arguments, *span),
            Expression::Index { left, index, span } => self.compile_index(left, index, *span),
            Expression::Block { object, body, span } => {
                self.compile_projection(object, body, *span)
            }
            Expression::If {
                condition,
                consequence,
                alternative,
                span,
            } => self.compile_if(condition, consequence, alternative.as_deref(), *span),
            Expression::Prefix {
                operator,
                right,
                span,
            } => self.compile_prefix(operator, right, *span),
            Expression::Infix {
                left,
                operator,
                right,
                span,
            } => self.compile_infix(left, operator, right, *span),
        }
    }

    // Literals

    fn compile_array(&mut self, elements: &[Expression]) -> CompileResult<Compiled> {
        let mut items = Vec::with_capacity(elements.len());
        let mut types = Vec::with_capacity(elements.len());
        for element in elements {
            let value = self.compile_expression(element)?;
            items.push(value.as_arg());
            types.push(value.ty);
        }
        let element = common_type(&types);
        Ok(Compiled {
            operand: Operand::Literal(Primitive::Array {
                element: element.clone(),
                items,
            }),
            ty: Type::array(element),
        })
    }

    fn compile_map(&mut self, entries: &[(String, Expression)]) -> CompileResult<Compiled> {
        let mut map = BTreeMap::new();
        let mut types = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            let value = self.compile_expression(value)?;
            types.push(value.ty.clone());
            map.insert(key.clone(), value.as_arg());
        }
        let value_type = common_type(&types);
        Ok(Compiled {
            operand: Operand::Literal(Primitive::Map {
                value: value_type.clone(),
                entries: map,
            }),
            ty: Type::map(Type::String, value_type),
        })
    }

    // Names

    fn compile_self(&mut self, span: Span) -> CompileResult<Compiled> {
        match &self.scope().self_binding {
            Some((r, ty)) => Ok(Compiled::chunk(*r, ty.clone())),
            None => Err(CompileError::new(
                span.start,
                "`_` can only be used inside a block",
            )),
        }
    }

    /// Identifiers resolve to variables, then fields of the innermost self
    /// resource, then global resources.
    fn compile_identifier(&mut self, name: &str, span: Span) -> CompileResult<Compiled> {
        if let Some(variable) = self.lookup_variable(name) {
            return Ok(variable);
        }

        let schema = self.schema;
        if let Some((self_ref, Type::Resource(resource))) = self.scope().self_binding.clone()
            && let Some(ty) = schema
                .resource(&resource)
                .and_then(|info| info.field_type(name))
        {
            return Ok(self.emit_field(self_ref, name, ty));
        }

        if schema.contains(name) {
            return Ok(self.emit_resource(name, Vec::new()));
        }

        Err(self.unknown_identifier_error(name, span))
    }

    pub(super) fn is_variable(&self, name: &str) -> bool {
        self.scopes.iter().any(|s| s.variables.contains_key(name))
    }

    /// Dotted resource name spelled by `object.member` (`sshd.config`).
    fn dotted_resource(&self, object: &Expression, member: &str) -> Option<String> {
        fn path(compiler: &Compiler<'_>, expression: &Expression) -> Option<String> {
            match expression {
                Expression::Identifier { name, .. } if !compiler.is_variable(name) => {
                    Some(name.clone())
                }
                Expression::MemberAccess { object, member, .. } => {
                    path(compiler, object).map(|p| format!("{p}.{member}"))
                }
                _ => None,
            }
        }
        let full = format!("{}.{member}", path(self, object)?);
        self.schema.contains(&full).then_some(full)
    }

    fn compile_member_access(
        &mut self,
        object: &Expression,
        member: &str,
        span: Span,
    ) -> CompileResult<Compiled> {
        if let Some(resource) = self.dotted_resource(object, member) {
            return Ok(self.emit_resource(&resource, Vec::new()));
        }
        if let Expression::Identifier { name, .. } = object
            && !self.is_variable(name)
            && !self.schema.contains(name)
            && self.schema.has_namespace(name)
        {
            return Err(self.unknown_identifier_error(&format!("{name}.{member}"), span));
        }
        let value = self.compile_expression(object)?;
        self.compile_method(value, member, None, span)
    }

    fn compile_call(
        &mut self,
        function: &Expression,
        arguments: &[Argument],
        span: Span,
    ) -> CompileResult<Compiled> {
        match function {
            Expression::Identifier { name, .. }
                if !self.is_variable(name) && self.schema.contains(name) =>
            {
                self.compile_resource_init(name, arguments, span)
            }
            Expression::MemberAccess { object, member, .. } => {
                if let Some(resource) = self.dotted_resource(object, member) {
                    return self.compile_resource_init(&resource, arguments, span);
                }
                let value = self.compile_expression(object)?;
                self.compile_method(value, member, Some(arguments), span)
            }
            Expression::Identifier { name, span } => {
                Err(self.unknown_identifier_error(name, *span))
            }
            other => Err(CompileError::new(
                other.span().start,
                format!("`{other}` cannot be called"),
            )),
        }
    }

    // Resources

    pub(super) fn emit_resource(&mut self, name: &str, args: Vec<Primitive>) -> Compiled {
        let ty = Type::resource(name);
        let function = (!args.is_empty()).then_some(Function {
            binding: None,
            args,
        });
        let r = self.emit(Chunk::call(name, ty.clone(), function));
        Compiled::chunk(r, ty)
    }

    pub(super) fn emit_field(&mut self, binding: ChunkRef, field: &str, ty: Type) -> Compiled {
        let r = self.emit(Chunk::call(
            field,
            ty.clone(),
            Some(Function {
                binding: Some(binding),
                args: Vec::new(),
            }),
        ));
        Compiled::chunk(r, ty)
    }

    fn compile_resource_init(
        &mut self,
        name: &str,
        arguments: &[Argument],
        span: Span,
    ) -> CompileResult<Compiled> {
        let schema = self.schema;
        let Some(info) = schema.resource(name) else {
            return Err(self.unknown_identifier_error(name, span));
        };

        let mut args = Vec::with_capacity(arguments.len() * 2);
        let mut seen: Vec<&str> = Vec::new();
        for (idx, argument) in arguments.iter().enumerate() {
            let init = match &argument.name {
                Some(arg_name) => info
                    .init
                    .iter()
                    .find(|a| a.name == *arg_name)
                    .ok_or_else(|| {
                        CompileError::new(
                            argument.value.span().start,
                            format!("resource '{name}' has no argument '{arg_name}'"),
                        )
                    })?,
                None => info.init.get(idx).ok_or_else(|| {
                    CompileError::new(
                        argument.value.span().start,
                        format!(
                            "resource '{name}' takes {} argument(s), got {}",
                            info.init.len(),
                            arguments.len()
                        ),
                    )
                })?,
            };
            if seen.contains(&init.name.as_str()) {
                return Err(CompileError::new(
                    argument.value.span().start,
                    format!("argument '{}' of '{name}' is given twice", init.name),
                ));
            }
            seen.push(&init.name);

            let value = self.compile_expression(&argument.value)?;
            if !assignable(&init.ty, &value.ty) {
                return Err(CompileError::new(
                    argument.value.span().start,
                    format!(
                        "argument '{}' of '{name}' must be {}, got {}",
                        init.name,
                        init.ty.label(),
                        value.ty.label()
                    ),
                ));
            }
            args.push(Primitive::String(init.name.clone()));
            args.push(value.as_arg());
        }

        Ok(self.emit_resource(name, args))
    }

    /// List resources are used as collections through their implicit
    /// `list` field.
    pub(super) fn as_collection(&mut self, value: Compiled) -> Compiled {
        let Type::Resource(resource) = &value.ty else {
            return value;
        };
        let Some(element) = self
            .schema
            .resource(resource)
            .and_then(|info| info.list.clone())
        else {
            return value;
        };
        let binding = self.materialize(&value);
        self.emit_field(binding, LIST_FIELD, Type::array(element))
    }

    pub(super) fn is_list_resource(&self, ty: &Type) -> bool {
        ty.resource_name()
            .and_then(|name| self.schema.resource(name))
            .is_some_and(|info| info.list.is_some())
    }

    // Collections and blocks

    fn compile_index(
        &mut self,
        left: &Expression,
        index: &Expression,
        span: Span,
    ) -> CompileResult<Compiled> {
        let value = self.compile_expression(left)?;
        let value = self.as_collection(value);
        let binding = self.materialize(&value);
        let key = self.compile_expression(index)?;

        let ty = match (&value.ty, &key.ty) {
            (Type::Array(element), Type::Int) => (**element).clone(),
            (Type::Map(key_type, value_type), key_ty)
                if **key_type == *key_ty || matches!(key_ty, Type::Any | Type::Dict) =>
            {
                (**value_type).clone()
            }
            (Type::Dict | Type::Any, _) => Type::Dict,
            (container, key_ty) => {
                return Err(CompileError::new(
                    span.start,
                    format!(
                        "cannot index {} with {}",
                        container.label(),
                        key_ty.label()
                    ),
                ));
            }
        };

        let r = self.emit(Chunk::call(
            "[]",
            ty.clone(),
            Some(Function {
                binding: Some(binding),
                args: vec![key.as_arg()],
            }),
        ));
        Ok(Compiled::chunk(r, ty))
    }

    /// `value { ... }` runs the block with `value` bound to `_`, once per item
    /// when `value` is a list.
    fn compile_projection(
        &mut self,
        object: &Expression,
        body: &[Statement],
        span: Span,
    ) -> CompileResult<Compiled> {
        let value = self.compile_expression(object)?;
        let value = self.as_collection(value);
        let binding = self.materialize(&value);

        let (self_type, result_type) = match &value.ty {
            Type::Array(element) => ((**element).clone(), Type::array(Type::Block)),
            other => (other.clone(), Type::Block),
        };

        let block = self.open_block(Some(self_type), span)?;
        self.compile_statements(body)?;
        let deps = self.close_block();

        let mut args = vec![Primitive::Block(block)];
        if !deps.is_empty() {
            args.push(dependency_array(&deps));
        }
        let r = self.emit(Chunk::call(
            "{}",
            result_type.clone(),
            Some(Function {
                binding: Some(binding),
                args,
            }),
        ));
        Ok(Compiled::chunk(r, result_type))
    }

    fn compile_if(
        &mut self,
        condition: &Expression,
        consequence: &[Statement],
        alternative: Option<&[Statement]>,
        span: Span,
    ) -> CompileResult<Compiled> {
        let condition = self.compile_expression(condition)?;
        let mut args = vec![condition.as_arg()];

        for branch in std::iter::once(consequence).chain(alternative) {
            let block = self.open_block(None, span)?;
            self.compile_statements(branch)?;
            let deps = self.close_block();
            args.push(Primitive::Block(block));
            args.push(dependency_array(&deps));
        }

        let r = self.emit(Chunk::call(
            "if",
            Type::Block,
            Some(Function {
                binding: None,
                args,
            }),
        ));
        Ok(Compiled::chunk(r, Type::Block))
    }

    // Operators

    fn compile_prefix(
        &mut self,
        operator: &str,
        right: &Expression,
        span: Span,
    ) -> CompileResult<Compiled> {
        let value = self.compile_expression(right)?;
        match (operator, &value.operand) {
            ("-", Operand::Literal(Primitive::Int(i))) => {
                Ok(Compiled::literal(Primitive::Int(i.wrapping_neg())))
            }
            ("-", Operand::Literal(Primitive::Float(x))) => {
                Ok(Compiled::literal(Primitive::Float(-x)))
            }
            ("!", Operand::Literal(Primitive::Bool(b))) => {
                Ok(Compiled::literal(Primitive::Bool(!b)))
            }
            ("!", _) => Ok(self.emit_unary("!", &value, Type::Bool)),
            ("-", _) if value.ty.is_numeric() => {
                let ty = value.ty.clone();
                Ok(self.emit_unary("-", &value, ty))
            }
            _ => Err(CompileError::new(
                span.start,
                format!("cannot apply '{operator}' to {}", value.ty.label()),
            )),
        }
    }

    fn emit_unary(&mut self, operator: &str, value: &Compiled, ty: Type) -> Compiled {
        let binding = self.materialize(value);
        let r = self.emit(Chunk::call(
            operator,
            ty.clone(),
            Some(Function {
                binding: Some(binding),
                args: Vec::new(),
            }),
        ));
        Compiled::chunk(r, ty)
    }

    fn compile_infix(
        &mut self,
        left: &Expression,
        operator: &str,
        right: &Expression,
        span: Span,
    ) -> CompileResult<Compiled> {
        let left_value = self.compile_expression(left)?;
        let binding = self.materialize(&left_value);
        let right_value = self.compile_expression(right)?;
        let ty = self.operator_type(operator, &left_value.ty, &right_value.ty, span)?;

        let r = self.emit(Chunk::call(
            format!("{operator}{}", right_value.ty.encode()),
            ty.clone(),
            Some(Function {
                binding: Some(binding),
                args: vec![right_value.as_arg()],
            }),
        ));
        Ok(Compiled::chunk(r, ty))
    }

    fn operator_type(
        &self,
        operator: &str,
        left: &Type,
        right: &Type,
        span: Span,
    ) -> CompileResult<Type> {
        let loose = |t: &Type| matches!(t, Type::Any | Type::Dict);
        let ty = match operator {
            "==" | "!=" | "&&" | "||" => Type::Bool,
            "<" | "<=" | ">" | ">=" if left.is_orderable_with(right) => Type::Bool,
            "+" if *left == Type::String && *right == Type::String => Type::String,
            "+" | "-" | "*" | "/" => match (left, right) {
                (Type::Int, Type::Int) => Type::Int,
                (l, r) if l.is_numeric() && r.is_numeric() => Type::Float,
                (l, r) if loose(l) || loose(r) => Type::Any,
                _ => return Err(self.type_mismatch_error(operator, left, right, span)),
            },
            _ => return Err(self.type_mismatch_error(operator, left, right, span)),
        };
        Ok(ty)
    }
}

/// The shared type of literal elements; mixed elements are `any`.
fn common_type(types: &[Type]) -> Type {
    match types.split_first() {
        None => Type::Any,
        Some((first, rest)) if rest.iter().all(|t| t == first) => first.clone(),
        Some(_) if types.iter().all(Type::is_numeric) => Type::Float,
        Some(_) => Type::Any,
    }
}

fn assignable(expected: &Type, got: &Type) -> bool {
    expected == got
        || matches!(expected, Type::Any | Type::Dict)
        || matches!(got, Type::Any | Type::Dict | Type::Nil)
        || (*expected == Type::Float && *got == Type::Int)
}
