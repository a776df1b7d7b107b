use std::collections::BTreeMap;

use rayon::prelude::*;
use tracing::{debug, trace};

use crate::{
    bytecode::{
        chunk::{Chunk, ChunkKind, ChunkRef, Function, Primitive},
        code_bundle::{Block, CodeBundle},
        operators::split_operator,
        types::Type,
    },
    config::Feature,
    runtime::{
        context::ExecutionContext,
        resource::ResourceError,
        results::{Execution, ExecutionError, RawResult},
        value::{BlockEntry, ItemDetail, RawData, Value},
    },
};

use frame::Frame;

mod collection_ops;
mod comparison_ops;
mod frame;
mod string_ops;
mod verify;

#[cfg(test)]
mod comparison_ops_test;
#[cfg(test)]
mod verify_test;

/// Executes `bundle` against one context. Resource failures become error
/// values on the affected results; only engine failures are returned as
/// `Err`. A cancelled run returns the results computed so far with
/// `interrupted` set.
pub fn execute(bundle: &CodeBundle, context: &ExecutionContext) -> Result<Execution, ExecutionError> {
    verify::verify(bundle)?;
    let dropped = context.apply_invalidations();
    if dropped > 0 {
        debug!(dropped, "re-executing after invalidations");
    }

    let executor = Executor {
        bundle,
        context,
        trace: context.features().is_enabled(Feature::Trace),
    };
    let mut frame = Frame::root();
    let interrupted = match executor.run_block(&mut frame) {
        Ok(()) => None,
        Err(ExecutionError::Cancelled) => Some(ExecutionError::Cancelled),
        Err(err) => return Err(err),
    };

    let mut results = BTreeMap::new();
    if let Some(block) = bundle.block(1) {
        for r in block.entrypoints.iter().chain(&block.datapoints) {
            let Some(data) = frame.lookup(*r) else {
                continue;
            };
            results.insert(
                *r,
                RawResult {
                    code_ref: *r,
                    label: bundle.label(*r).to_string(),
                    data: data.clone(),
                    items: frame.items(r.chunk).map(<[_]>::to_vec).unwrap_or_default(),
                },
            );
        }
    }

    debug!(
        bundle = %bundle.id,
        context = context.name(),
        results = results.len(),
        cancelled = interrupted.is_some(),
        "executed bundle"
    );
    Ok(Execution {
        bundle_id: bundle.id.clone(),
        results,
        interrupted,
    })
}

/// Runs one bundle against many contexts in parallel. Each context keeps
/// its own cache; results come back in context order.
pub fn execute_assets(
    bundle: &CodeBundle,
    contexts: &[ExecutionContext],
) -> Vec<Result<Execution, ExecutionError>> {
    contexts
        .par_iter()
        .map(|context| execute(bundle, context))
        .collect()
}

/// Value of a chunk plus the per-item details of filter chunks.
struct Evaluated {
    data: RawData,
    items: Option<Vec<ItemDetail>>,
}

impl From<RawData> for Evaluated {
    fn from(data: RawData) -> Self {
        Self { data, items: None }
    }
}

struct Executor<'a> {
    bundle: &'a CodeBundle,
    context: &'a ExecutionContext,
    trace: bool,
}

impl Executor<'_> {
    fn block(&self, idx: u32) -> Result<&Block, ExecutionError> {
        self.bundle
            .block(idx)
            .ok_or_else(|| ExecutionError::Malformed(format!("block {idx} does not exist")))
    }

    fn run_block(&self, frame: &mut Frame<'_>) -> Result<(), ExecutionError> {
        let block = self.block(frame.block)?;
        for (idx, chunk) in block.chunks.iter().enumerate() {
            if self.context.is_cancelled() {
                return Err(ExecutionError::Cancelled);
            }
            let at = ChunkRef::new(frame.block, idx as u32 + 1);
            let evaluated = self.eval_chunk(at, chunk, frame)?;
            if self.trace {
                trace!(chunk = %at, id = chunk.id().unwrap_or("literal"), value = ?evaluated.data.value, "evaluated chunk");
            }
            frame.push(evaluated.data, evaluated.items);
        }
        Ok(())
    }

    /// Runs a nested block to completion with `_` bound to `self_value`.
    fn run_nested<'p>(
        &self,
        block: u32,
        self_value: Option<RawData>,
        parent: &'p Frame<'p>,
    ) -> Result<Frame<'p>, ExecutionError> {
        let mut frame = Frame::child(block, self_value, parent);
        self.run_block(&mut frame)?;
        Ok(frame)
    }

    fn lookup(&self, frame: &Frame<'_>, r: ChunkRef) -> Result<RawData, ExecutionError> {
        frame
            .lookup(r)
            .cloned()
            .ok_or_else(|| ExecutionError::Malformed(format!("{r} is read before it is computed")))
    }

    fn eval_chunk(
        &self,
        at: ChunkRef,
        chunk: &Chunk,
        frame: &Frame<'_>,
    ) -> Result<Evaluated, ExecutionError> {
        match &chunk.kind {
            ChunkKind::Primitive(Primitive::Context(_)) => frame
                .self_value()
                .cloned()
                .map(Evaluated::from)
                .ok_or_else(|| {
                    ExecutionError::Malformed(format!("{at} reads `_` but block has no binding"))
                }),
            ChunkKind::Primitive(primitive) => {
                let mut data = self.arg(primitive, frame)?;
                if !matches!(primitive, Primitive::Ref(_)) {
                    data.ty = chunk.ty.clone();
                }
                Ok(data.into())
            }
            ChunkKind::Call { id, function } => {
                let empty = Function {
                    binding: None,
                    args: Vec::new(),
                };
                let function = function.as_ref().unwrap_or(&empty);
                match function.binding {
                    None if id == "if" => self.eval_if(function, &chunk.ty, frame).map(Into::into),
                    None => self
                        .create_resource(id, function, &chunk.ty, frame)
                        .map(Into::into),
                    Some(binding) => {
                        let bound = self.lookup(frame, binding)?;
                        self.call(at, id, function, bound, &chunk.ty, frame)
                    }
                }
            }
        }
    }

    /// Value of an argument primitive. Refs read earlier results; literal
    /// containers holding a failed ref fail as a whole.
    fn arg(&self, primitive: &Primitive, frame: &Frame<'_>) -> Result<RawData, ExecutionError> {
        let ty = primitive.ty();
        let data = match primitive {
            Primitive::Nil => RawData::nil(ty),
            Primitive::Bool(b) => RawData::new(ty, Value::Bool(*b)),
            Primitive::Int(i) => RawData::new(ty, Value::Int(*i)),
            Primitive::Float(x) => RawData::new(ty, Value::Float(*x)),
            Primitive::String(s) => RawData::new(ty, Value::String(s.clone())),
            Primitive::Regex(r) => RawData::new(ty, Value::Regex(r.clone())),
            Primitive::Ref(r) => self.lookup(frame, *r)?,
            Primitive::Array { items, .. } => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    match self.arg(item, frame)?.value {
                        Ok(value) => values.push(value),
                        Err(err) => return Ok(RawData::error(ty, err)),
                    }
                }
                RawData::new(ty, Value::Array(values))
            }
            Primitive::Map { entries, .. } => {
                let mut values = BTreeMap::new();
                for (key, item) in entries {
                    match self.arg(item, frame)?.value {
                        Ok(value) => {
                            values.insert(key.clone(), value);
                        }
                        Err(err) => return Ok(RawData::error(ty, err)),
                    }
                }
                RawData::new(ty, Value::Map(values))
            }
            Primitive::Block(_) | Primitive::Context(_) => {
                return Err(ExecutionError::Malformed(format!(
                    "`{}` is not a value",
                    primitive.render("")
                )));
            }
        };
        Ok(data)
    }

    /// Values of plain call arguments, or the first error among them.
    fn args(
        &self,
        function: &Function,
        frame: &Frame<'_>,
    ) -> Result<Result<Vec<Value>, ResourceError>, ExecutionError> {
        let mut values = Vec::with_capacity(function.args.len());
        for arg in &function.args {
            match self.arg(arg, frame)?.value {
                Ok(value) => values.push(value),
                Err(err) => return Ok(Err(err)),
            }
        }
        Ok(Ok(values))
    }

    fn create_resource(
        &self,
        resource: &str,
        function: &Function,
        ty: &Type,
        frame: &Frame<'_>,
    ) -> Result<RawData, ExecutionError> {
        let mut args = BTreeMap::new();
        for pair in function.args.chunks(2) {
            let [Primitive::String(name), value] = pair else {
                return Err(ExecutionError::Malformed(format!(
                    "arguments of '{resource}' must be name/value pairs"
                )));
            };
            match self.arg(value, frame)?.value {
                Ok(value) => {
                    args.insert(name.clone(), value);
                }
                Err(err) => return Ok(RawData::error(ty.clone(), err)),
            }
        }
        let created = self
            .context
            .create_resource(resource, &args)
            .map(Value::Resource);
        Ok(RawData::from_result(ty.clone(), created))
    }

    fn eval_if(
        &self,
        function: &Function,
        ty: &Type,
        frame: &Frame<'_>,
    ) -> Result<RawData, ExecutionError> {
        let condition = match function.args.first() {
            Some(arg) => self.arg(arg, frame)?,
            None => return Err(ExecutionError::Malformed("`if` without condition".into())),
        };
        if let Err(err) = condition.value {
            return Ok(RawData::error(ty.clone(), err));
        }
        let branches: Vec<u32> = block_args(function).collect();
        let chosen = if condition.is_truthy() {
            branches.first()
        } else {
            branches.get(1)
        };
        match chosen {
            Some(block) => {
                let nested = self.run_nested(*block, None, frame)?;
                Ok(RawData::new(ty.clone(), Value::Block(self.entries(*block, &nested)?)))
            }
            None => Ok(RawData::nil(ty.clone())),
        }
    }

    /// Entrypoint results of a finished nested block. Assertions keep the
    /// values their message reads.
    fn entries(&self, block: u32, frame: &Frame<'_>) -> Result<Vec<BlockEntry>, ExecutionError> {
        self.block(block)?
            .entrypoints
            .iter()
            .map(|r| {
                let datapoints: Vec<BlockEntry> = match self.bundle.assertions.get(r) {
                    Some(assertion) => assertion
                        .datapoints()
                        .into_iter()
                        .map(|dp| self.entry(frame, dp, Vec::new()))
                        .collect::<Result<_, _>>()?,
                    None => Vec::new(),
                };
                self.entry(frame, *r, datapoints)
            })
            .collect()
    }

    fn entry(
        &self,
        frame: &Frame<'_>,
        r: ChunkRef,
        datapoints: Vec<BlockEntry>,
    ) -> Result<BlockEntry, ExecutionError> {
        Ok(BlockEntry {
            label: self.bundle.label(r).to_string(),
            reference: r,
            data: self.lookup(frame, r)?,
            datapoints,
        })
    }

    fn call(
        &self,
        at: ChunkRef,
        id: &str,
        function: &Function,
        bound: RawData,
        ty: &Type,
        frame: &Frame<'_>,
    ) -> Result<Evaluated, ExecutionError> {
        if id == "{}" {
            return self.project(function, bound, ty, frame).map(Into::into);
        }
        let value = match bound.value {
            Ok(value) => value,
            Err(err) => return Ok(RawData::error(ty.clone(), err).into()),
        };
        if let Some(block) = block_args(function).next() {
            return self.block_call(at, id, value, &bound.ty, block, ty, frame);
        }

        if function.args.is_empty()
            && let Some(result) = comparison_ops::unary(id, &value)
        {
            return Ok(RawData::from_result(ty.clone(), result).into());
        }
        if let Some((operator, _)) = split_operator(id)
            && let Some(right) = function.args.first()
        {
            return self.binary(at, operator, &value, right, ty, frame).map(Into::into);
        }

        let args = match self.args(function, frame)? {
            Ok(args) => args,
            Err(err) => return Ok(RawData::error(ty.clone(), err).into()),
        };
        let result = match &value {
            Value::Resource(handle) => Some(self.context.field(handle, id)),
            Value::Array(items) => collection_ops::array(id, items, &args),
            Value::Map(entries) => collection_ops::map(id, entries, &args),
            Value::String(s) => string_ops::call(id, s, &args),
            Value::Nil => Some(Ok(Value::Nil)),
            _ => None,
        };
        match result {
            Some(result) => Ok(RawData::from_result(ty.clone(), result).into()),
            None => Err(ExecutionError::UnknownOperation {
                id: id.to_string(),
                kind: value.kind(),
                at,
            }),
        }
    }

    fn binary(
        &self,
        at: ChunkRef,
        operator: &str,
        left: &Value,
        right: &Primitive,
        ty: &Type,
        frame: &Frame<'_>,
    ) -> Result<RawData, ExecutionError> {
        let right = self.arg(right, frame)?;
        let right = match right.value {
            Ok(value) => value,
            // The left side alone decides these.
            Err(_) if operator == "&&" && !left.is_truthy() => {
                return Ok(RawData::new(ty.clone(), Value::Bool(false)));
            }
            Err(_) if operator == "||" && left.is_truthy() => {
                return Ok(RawData::new(ty.clone(), Value::Bool(true)));
            }
            Err(err) => return Ok(RawData::error(ty.clone(), err)),
        };
        match comparison_ops::binary(operator, left, &right) {
            Some(result) => Ok(RawData::from_result(ty.clone(), result)),
            None => Err(ExecutionError::UnknownOperation {
                id: operator.to_string(),
                kind: left.kind(),
                at,
            }),
        }
    }

    /// `value { ... }`: runs the block with `_` bound to the value, or once
    /// per item for lists. A failed value projects into a block whose
    /// entries all carry the failure.
    fn project(
        &self,
        function: &Function,
        bound: RawData,
        ty: &Type,
        frame: &Frame<'_>,
    ) -> Result<RawData, ExecutionError> {
        let block = block_args(function)
            .next()
            .ok_or_else(|| ExecutionError::Malformed("`{}` without block".into()))?;

        match bound.value {
            Err(err) => {
                let entries = self
                    .block(block)?
                    .entrypoints
                    .iter()
                    .map(|r| BlockEntry {
                        label: self.bundle.label(*r).to_string(),
                        reference: *r,
                        data: RawData::error(
                            self.bundle.chunk(*r).map(|c| c.ty.clone()).unwrap_or(Type::Any),
                            err.clone(),
                        ),
                        datapoints: Vec::new(),
                    })
                    .collect();
                Ok(RawData::new(ty.clone(), Value::Block(entries)))
            }
            Ok(Value::Nil) => Ok(RawData::nil(ty.clone())),
            Ok(Value::Array(items)) if matches!(ty, Type::Array(_)) => {
                let element = bound.ty.element().cloned().unwrap_or(Type::Any);
                let mut blocks = Vec::with_capacity(items.len());
                for item in items {
                    let nested =
                        self.run_nested(block, Some(RawData::new(element.clone(), item)), frame)?;
                    blocks.push(Value::Block(self.entries(block, &nested)?));
                }
                Ok(RawData::new(ty.clone(), Value::Array(blocks)))
            }
            Ok(value) => {
                let nested = self.run_nested(block, Some(RawData::new(bound.ty, value)), frame)?;
                Ok(RawData::new(ty.clone(), Value::Block(self.entries(block, &nested)?)))
            }
        }
    }

    /// Calls that run a block per list item: filters, `map`, `contains`
    /// and keyed `duplicates`. Every item is evaluated.
    #[allow(clippy::too_many_arguments)]
    fn block_call(
        &self,
        at: ChunkRef,
        id: &str,
        value: Value,
        list_type: &Type,
        block: u32,
        ty: &Type,
        frame: &Frame<'_>,
    ) -> Result<Evaluated, ExecutionError> {
        let items = match value {
            Value::Array(items) => items,
            Value::Nil => return Ok(RawData::nil(ty.clone()).into()),
            other => {
                return Err(ExecutionError::UnknownOperation {
                    id: id.to_string(),
                    kind: other.kind(),
                    at,
                });
            }
        };
        let element = list_type.element().cloned().unwrap_or(Type::Any);
        let block_def = self.block(block)?;
        let result_ref = block_def.last_entrypoint().ok_or_else(|| {
            ExecutionError::Malformed(format!("block {block} has no entrypoint"))
        })?;

        let mut outcomes = Vec::with_capacity(items.len());
        let mut details = Vec::with_capacity(items.len());
        for item in &items {
            let nested =
                self.run_nested(block, Some(RawData::new(element.clone(), item.clone())), frame)?;
            outcomes.push(self.lookup(&nested, result_ref)?);
            details.push(ItemDetail {
                item: item.clone(),
                fields: self.self_fields(block, block_def, &nested, item),
            });
        }

        // A predicate that failed on any item fails the whole call; the
        // details stay for reporting.
        if let Some(err) = outcomes.iter().find_map(|outcome| outcome.value.as_ref().err()) {
            return Ok(Evaluated {
                data: RawData::error(ty.clone(), err.clone()),
                items: Some(details),
            });
        }

        let data = match id {
            "where" | "$whereNot" => {
                let keep = id == "where";
                let (kept, kept_details): (Vec<Value>, Vec<ItemDetail>) = items
                    .into_iter()
                    .zip(details)
                    .zip(&outcomes)
                    .filter(|(_, outcome)| outcome.is_truthy() == keep)
                    .map(|((item, detail), _)| (item, detail))
                    .unzip();
                return Ok(Evaluated {
                    data: RawData::new(ty.clone(), Value::Array(kept)),
                    items: Some(kept_details),
                });
            }
            "map" => RawData::new(
                ty.clone(),
                Value::Array(outcomes.into_iter().filter_map(|o| o.value.ok()).collect()),
            ),
            "contains" => {
                RawData::new(ty.clone(), Value::Bool(outcomes.iter().any(RawData::is_truthy)))
            }
            "duplicates" => {
                let keys: Vec<Value> = outcomes.into_iter().filter_map(|o| o.value.ok()).collect();
                RawData::new(
                    ty.clone(),
                    Value::Array(collection_ops::duplicates(&items, &keys)),
                )
            }
            _ => {
                return Err(ExecutionError::UnknownOperation {
                    id: id.to_string(),
                    kind: "array",
                    at,
                });
            }
        };
        Ok(data.into())
    }

    /// Fields the block read directly from a resource item.
    fn self_fields(
        &self,
        block: u32,
        block_def: &Block,
        frame: &Frame<'_>,
        item: &Value,
    ) -> Vec<BlockEntry> {
        if !matches!(item, Value::Resource(_)) {
            return Vec::new();
        }
        let self_ref = ChunkRef::new(block, 1);
        let mut fields: Vec<BlockEntry> = Vec::new();
        for (idx, chunk) in block_def.chunks.iter().enumerate() {
            let Some(id) = chunk.id() else { continue };
            if chunk.binding() != Some(self_ref)
                || split_operator(id).is_some()
                || id == "{}"
                || fields.iter().any(|f| f.label == id)
            {
                continue;
            }
            let reference = ChunkRef::new(block, idx as u32 + 1);
            if let Some(data) = frame.lookup(reference) {
                fields.push(BlockEntry {
                    label: id.to_string(),
                    reference,
                    data: data.clone(),
                    datapoints: Vec::new(),
                });
            }
        }
        fields
    }
}

fn block_args(function: &Function) -> impl Iterator<Item = u32> + '_ {
    function.args.iter().filter_map(|arg| match arg {
        Primitive::Block(block) => Some(*block),
        _ => None,
    })
}
