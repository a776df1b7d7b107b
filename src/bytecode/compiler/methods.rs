use crate::{
    bytecode::{
        chunk::{Chunk, ChunkRef, Function, Primitive},
        types::Type,
    },
    syntax::{diagnostic::CompileError, expression::Argument, position::Span},
};

use super::{CompileResult, Compiled, Compiler, dependency_array, labels::expression_label};

pub(super) const QUANTIFIERS: [&str; 4] = ["all", "none", "any", "one"];

const LIST_METHODS: &[&str] = &[
    "length",
    "where",
    "all",
    "none",
    "any",
    "one",
    "map",
    "contains",
    "duplicates",
    "first",
    "last",
];
const STRING_METHODS: &[&str] = &["length", "contains", "split", "trim", "downcase", "upcase"];
const MAP_METHODS: &[&str] = &["length", "keys", "values"];

impl Compiler<'_> {
    /// Compiles `value.name` (`arguments` is `None`) or `value.name(...)`.
    pub(super) fn compile_method(
        &mut self,
        value: Compiled,
        name: &str,
        arguments: Option<&[Argument]>,
        span: Span,
    ) -> CompileResult<Compiled> {
        let args = arguments.unwrap_or(&[]);
        if let Some(named) = args.iter().find_map(|a| a.name.as_ref()) {
            return Err(CompileError::new(
                span.start,
                format!("{name}() does not take named arguments (got '{named}')"),
            ));
        }

        match value.ty.clone() {
            Type::Resource(resource) => self.resource_member(value, &resource, name, arguments, span),
            Type::Array(element) => self.list_method(value, *element, name, args, span),
            Type::String => self.string_method(value, name, args, span),
            Type::Map(key, item) => self.map_method(value, *key, *item, name, args, span),
            Type::Dict | Type::Any => {
                self.map_method(value, Type::String, Type::Dict, name, args, span)
            }
            other => Err(self.unknown_method_error(&other, name, &[], span)),
        }
    }

    fn resource_member(
        &mut self,
        value: Compiled,
        resource: &str,
        name: &str,
        arguments: Option<&[Argument]>,
        span: Span,
    ) -> CompileResult<Compiled> {
        let schema = self.schema;
        let Some(info) = schema.resource(resource) else {
            return Err(self.unknown_identifier_error(resource, span));
        };

        if let Some(ty) = info.field_type(name) {
            if arguments.is_some_and(|a| !a.is_empty()) {
                return Err(CompileError::new(
                    span.start,
                    format!("'{name}' is a field of '{resource}' and takes no arguments"),
                ));
            }
            let binding = self.materialize(&value);
            return Ok(self.emit_field(binding, name, ty));
        }

        if info.list.is_some() {
            let list = self.as_collection(value);
            return self.compile_method(list, name, arguments, span);
        }

        Err(self.unknown_field_error(resource, name, span))
    }

    fn list_method(
        &mut self,
        value: Compiled,
        element: Type,
        name: &str,
        args: &[Argument],
        span: Span,
    ) -> CompileResult<Compiled> {
        let list_type = value.ty.clone();
        match name {
            "length" => {
                self.expect_arity(name, args, 0, span)?;
                Ok(self.emit_builtin(&value, name, Type::Int, Vec::new()))
            }
            "first" | "last" => {
                self.expect_arity(name, args, 0, span)?;
                Ok(self.emit_builtin(&value, name, element, Vec::new()))
            }
            "where" => {
                self.expect_arity(name, args, 1, span)?;
                self.emit_item_block_call(&value, element, name, list_type, &args[0], span)
            }
            "map" => {
                self.expect_arity(name, args, 1, span)?;
                let binding = self.materialize(&value);
                let (block, result, deps) = self.compile_item_block(element, &args[0], span)?;
                Ok(self.emit_block_call(
                    Compiled::chunk(binding, list_type),
                    name,
                    Type::array(result),
                    block,
                    deps,
                ))
            }
            "contains" => {
                self.expect_arity(name, args, 1, span)?;
                self.emit_item_block_call(&value, element, name, Type::Bool, &args[0], span)
            }
            "duplicates" => match args {
                [] => Ok(self.emit_builtin(&value, name, list_type, Vec::new())),
                [key] => self.emit_item_block_call(&value, element, name, list_type, key, span),
                _ => Err(self.arity_error(name, "0 or 1 arguments", args.len(), span)),
            },
            quantifier if QUANTIFIERS.contains(&quantifier) => {
                self.compile_quantifier(value, element, quantifier, args, span)
            }
            _ => Err(self.unknown_method_error(&list_type, name, LIST_METHODS, span)),
        }
    }

    /// `all(cond)` filters the items that fail `cond`, `none`/`any`/`one`
    /// filter the items that match; a reduction chunk then judges the
    /// filtered list. Every item is evaluated so that failures can list all
    /// offending items.
    fn compile_quantifier(
        &mut self,
        value: Compiled,
        element: Type,
        quantifier: &str,
        args: &[Argument],
        span: Span,
    ) -> CompileResult<Compiled> {
        let reduction = format!("${quantifier}");
        match args {
            [] if quantifier == "all" => Err(CompileError::new(
                span.start,
                "all() requires a condition",
            )),
            [] => Ok(self.emit_builtin(&value, &reduction, Type::Bool, Vec::new())),
            [condition] => {
                let filter_id = if quantifier == "all" { "$whereNot" } else { "where" };
                let list_type = value.ty.clone();
                let filtered =
                    self.emit_item_block_call(&value, element, filter_id, list_type, condition, span)?;
                Ok(self.emit_builtin(&filtered, &reduction, Type::Bool, Vec::new()))
            }
            _ => Err(self.arity_error(quantifier, "0 or 1 arguments", args.len(), span)),
        }
    }

    fn string_method(
        &mut self,
        value: Compiled,
        name: &str,
        args: &[Argument],
        span: Span,
    ) -> CompileResult<Compiled> {
        match name {
            "length" => {
                self.expect_arity(name, args, 0, span)?;
                Ok(self.emit_builtin(&value, name, Type::Int, Vec::new()))
            }
            "trim" | "downcase" | "upcase" => {
                self.expect_arity(name, args, 0, span)?;
                Ok(self.emit_builtin(&value, name, Type::String, Vec::new()))
            }
            "contains" | "split" => {
                self.expect_arity(name, args, 1, span)?;
                let binding = self.materialize(&value);
                let needle = self.compile_expression(&args[0].value)?;
                if !matches!(needle.ty, Type::String | Type::Any | Type::Dict) {
                    return Err(CompileError::new(
                        args[0].value.span().start,
                        format!("{name}() expects a string, got {}", needle.ty.label()),
                    ));
                }
                let ty = if name == "split" {
                    Type::array(Type::String)
                } else {
                    Type::Bool
                };
                Ok(self.emit_builtin(
                    &Compiled::chunk(binding, Type::String),
                    name,
                    ty,
                    vec![needle.as_arg()],
                ))
            }
            _ => Err(self.unknown_method_error(&Type::String, name, STRING_METHODS, span)),
        }
    }

    fn map_method(
        &mut self,
        value: Compiled,
        key: Type,
        item: Type,
        name: &str,
        args: &[Argument],
        span: Span,
    ) -> CompileResult<Compiled> {
        let ty = match name {
            "length" => Type::Int,
            "keys" => Type::array(key),
            "values" => Type::array(item),
            _ => return Err(self.unknown_method_error(&value.ty, name, MAP_METHODS, span)),
        };
        self.expect_arity(name, args, 0, span)?;
        Ok(self.emit_builtin(&value, name, ty, Vec::new()))
    }

    // Helpers

    fn expect_arity(
        &self,
        name: &str,
        args: &[Argument],
        expected: usize,
        span: Span,
    ) -> CompileResult<()> {
        if args.len() == expected {
            return Ok(());
        }
        let wanted = match expected {
            0 => "no arguments".to_string(),
            1 => "1 argument".to_string(),
            n => format!("{n} arguments"),
        };
        Err(self.arity_error(name, &wanted, args.len(), span))
    }

    fn emit_builtin(&mut self, value: &Compiled, id: &str, ty: Type, args: Vec<Primitive>) -> Compiled {
        let binding = self.materialize(value);
        let r = self.emit(Chunk::call(
            id,
            ty.clone(),
            Some(Function {
                binding: Some(binding),
                args,
            }),
        ));
        Compiled::chunk(r, ty)
    }

    fn emit_item_block_call(
        &mut self,
        value: &Compiled,
        element: Type,
        id: &str,
        ty: Type,
        argument: &Argument,
        span: Span,
    ) -> CompileResult<Compiled> {
        let binding = self.materialize(value);
        let (block, _, deps) = self.compile_item_block(element, argument, span)?;
        Ok(self.emit_block_call(
            Compiled::chunk(binding, value.ty.clone()),
            id,
            ty,
            block,
            deps,
        ))
    }

    /// Emits a call that runs `block` per item of `list`. The list is
    /// passed both as binding and as first argument.
    fn emit_block_call(
        &mut self,
        list: Compiled,
        id: &str,
        ty: Type,
        block: u32,
        deps: Vec<ChunkRef>,
    ) -> Compiled {
        let binding = self.materialize(&list);
        let mut args = vec![Primitive::Ref(binding), Primitive::Block(block)];
        if !deps.is_empty() {
            args.push(dependency_array(&deps));
        }
        let r = self.emit(Chunk::call(
            id,
            ty.clone(),
            Some(Function {
                binding: Some(binding),
                args,
            }),
        ));
        Compiled::chunk(r, ty)
    }

    /// Compiles `argument` as a block whose `_` is one list item. Returns
    /// the block index, the type of its result and the outer refs it reads.
    fn compile_item_block(
        &mut self,
        element: Type,
        argument: &Argument,
        span: Span,
    ) -> CompileResult<(u32, Type, Vec<ChunkRef>)> {
        let block = self.open_block(Some(element), span)?;
        let value = self.compile_expression(&argument.value)?;
        let result = self.materialize(&value);
        self.add_entrypoint(result);
        let label = expression_label(&argument.value);
        self.labels.insert(result, label);
        let deps = self.close_block();
        Ok((block, value.ty, deps))
    }
}
