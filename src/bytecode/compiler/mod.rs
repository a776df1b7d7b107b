use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::{
    bytecode::{
        chunk::{Chunk, ChunkRef, Primitive},
        code_bundle::{Assertion, Block, CodeBundle},
        types::Type,
    },
    config::CompilerConfig,
    schema::Schema,
    syntax::{self, diagnostic::CompileError, position::Span},
};

mod errors;
mod expression;
mod labels;
mod methods;
mod statement;
mod suggestions;
mod templates;

type CompileResult<T> = Result<T, CompileError>;

/// Compiles query source into a code bundle. Compilation never partially
/// succeeds: the first error aborts it.
pub fn compile(
    source: &str,
    schema: &Schema,
    config: &CompilerConfig,
) -> Result<CodeBundle, CompileError> {
    let program = syntax::parse(source)?;
    let mut compiler = Compiler::new(schema, config);
    compiler.open_block(None, program.span)?;
    compiler.compile_statements(&program.statements)?;
    compiler.close_block();

    let bundle = compiler.finish(source);
    debug!(
        id = %bundle.id,
        blocks = bundle.blocks.len(),
        chunks = bundle.chunk_count(),
        "compiled query"
    );
    Ok(bundle)
}

/// Result of compiling an expression: either a literal that has not been
/// emitted yet, or a chunk of the current block.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Operand {
    Literal(Primitive),
    Ref(ChunkRef),
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct Compiled {
    pub operand: Operand,
    pub ty: Type,
}

impl Compiled {
    pub fn literal(value: Primitive) -> Self {
        let ty = value.ty();
        Self {
            operand: Operand::Literal(value),
            ty,
        }
    }

    pub fn chunk(r: ChunkRef, ty: Type) -> Self {
        Self {
            operand: Operand::Ref(r),
            ty,
        }
    }

    /// The operand as a call argument: literals inline, chunks by ref.
    pub fn as_arg(&self) -> Primitive {
        match &self.operand {
            Operand::Literal(p) => p.clone(),
            Operand::Ref(r) => Primitive::Ref(*r),
        }
    }
}

/// Compile-time state of one block.
#[derive(Debug, Default)]
pub(super) struct Scope {
    pub block: u32,
    pub self_binding: Option<(ChunkRef, Type)>,
    pub variables: HashMap<String, (ChunkRef, Type)>,
    /// Outer refs already pulled into this block, and where.
    pub captures: HashMap<ChunkRef, ChunkRef>,
    /// Outer refs this block reads, in capture order.
    pub dependencies: Vec<ChunkRef>,
}

pub struct Compiler<'a> {
    pub(super) schema: &'a Schema,
    pub(super) config: &'a CompilerConfig,
    pub(super) blocks: Vec<Block>,
    pub(super) scopes: Vec<Scope>,
    pub(super) labels: BTreeMap<ChunkRef, String>,
    pub(super) assertions: BTreeMap<ChunkRef, Assertion>,
}

#[cfg(test)]
mod compiler_test;

impl<'a> Compiler<'a> {
    pub fn new(schema: &'a Schema, config: &'a CompilerConfig) -> Self {
        Self {
            schema,
            config,
            blocks: Vec::new(),
            scopes: Vec::new(),
            labels: BTreeMap::new(),
            assertions: BTreeMap::new(),
        }
    }

    fn finish(self, source: &str) -> CodeBundle {
        let mut bundle = CodeBundle {
            id: String::new(),
            source: source.to_string(),
            blocks: self.blocks,
            labels: self.labels,
            assertions: self.assertions,
        };
        bundle.id = bundle.compute_id();
        bundle
    }

    // Scopes

    pub(super) fn scope(&self) -> &Scope {
        // The block 1 scope lives for the whole compilation.
        &self.scopes[self.scopes.len() - 1]
    }

    pub(super) fn scope_mut(&mut self) -> &mut Scope {
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    pub(super) fn current_block(&self) -> u32 {
        self.scope().block
    }

    pub(super) fn is_top_level(&self) -> bool {
        self.scopes.len() == 1
    }

    /// Starts a new block. With a self type, chunk 1 of the block is the
    /// self binding injected per execution.
    pub(super) fn open_block(&mut self, self_type: Option<Type>, span: Span) -> CompileResult<u32> {
        if self.scopes.len() >= self.config.max_depth {
            return Err(CompileError::new(
                span.start,
                format!(
                    "malformed block nesting: blocks nest deeper than {}",
                    self.config.max_depth
                ),
            ));
        }

        self.blocks.push(Block::default());
        let block = self.blocks.len() as u32;
        self.scopes.push(Scope {
            block,
            ..Scope::default()
        });

        if let Some(ty) = self_type {
            let self_ref = self.emit(Chunk::typed_primitive(
                Primitive::Context(ty.clone()),
                ty.clone(),
            ));
            self.blocks[block as usize - 1].parameters = 1;
            self.scope_mut().self_binding = Some((self_ref, ty));
        }
        Ok(block)
    }

    /// Ends the current block and returns the outer refs it captured.
    pub(super) fn close_block(&mut self) -> Vec<ChunkRef> {
        self.scopes
            .pop()
            .map(|scope| scope.dependencies)
            .unwrap_or_default()
    }

    // Emission

    pub(super) fn emit(&mut self, chunk: Chunk) -> ChunkRef {
        let block = self.current_block();
        let chunks = &mut self.blocks[block as usize - 1].chunks;
        chunks.push(chunk);
        ChunkRef::new(block, chunks.len() as u32)
    }

    pub(super) fn chunk_type(&self, r: ChunkRef) -> Type {
        self.blocks
            .get(r.block as usize - 1)
            .and_then(|b| b.chunk(r.chunk))
            .map(|c| c.ty.clone())
            .unwrap_or(Type::Any)
    }

    pub(super) fn chunk(&self, r: ChunkRef) -> Option<&Chunk> {
        self.blocks
            .get(r.block as usize - 1)
            .and_then(|b| b.chunk(r.chunk))
    }

    /// Emits a literal operand as its own chunk; chunk operands pass
    /// through.
    pub(super) fn materialize(&mut self, value: &Compiled) -> ChunkRef {
        match &value.operand {
            Operand::Ref(r) => *r,
            Operand::Literal(p) => self.emit(Chunk::typed_primitive(p.clone(), value.ty.clone())),
        }
    }

    pub(super) fn add_entrypoint(&mut self, r: ChunkRef) {
        let block = &mut self.blocks[r.block as usize - 1];
        if !block.entrypoints.contains(&r) {
            block.entrypoints.push(r);
        }
    }

    pub(super) fn add_datapoint(&mut self, r: ChunkRef) {
        let block = &mut self.blocks[r.block as usize - 1];
        if !block.entrypoints.contains(&r) && !block.datapoints.contains(&r) {
            block.datapoints.push(r);
        }
    }

    // Variables

    pub(super) fn define_variable(&mut self, name: &str, r: ChunkRef, ty: Type) {
        self.scope_mut().variables.insert(name.to_string(), (r, ty));
    }

    /// Resolves a variable visible from the current block. Variables of an
    /// enclosing block are pulled in through a ref chunk, once per block.
    pub(super) fn lookup_variable(&mut self, name: &str) -> Option<Compiled> {
        let (depth, (r, ty)) = self
            .scopes
            .iter()
            .enumerate()
            .rev()
            .find_map(|(depth, scope)| scope.variables.get(name).map(|v| (depth, v.clone())))?;

        if depth == self.scopes.len() - 1 {
            return Some(Compiled::chunk(r, ty));
        }
        Some(Compiled::chunk(self.capture(r, ty.clone()), ty))
    }

    fn capture(&mut self, outer: ChunkRef, ty: Type) -> ChunkRef {
        if let Some(local) = self.scope().captures.get(&outer) {
            return *local;
        }
        let local = self.emit(Chunk::typed_primitive(Primitive::Ref(outer), ty));
        let scope = self.scope_mut();
        scope.captures.insert(outer, local);
        scope.dependencies.push(outer);
        local
    }

    pub(super) fn variable_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .scopes
            .iter()
            .flat_map(|s| s.variables.keys().cloned())
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

/// The dependency array carried by block-opening chunks.
pub(super) fn dependency_array(deps: &[ChunkRef]) -> Primitive {
    Primitive::Array {
        element: Type::Ref,
        items: deps.iter().map(|r| Primitive::Ref(*r)).collect(),
    }
}
