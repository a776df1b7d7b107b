use crate::{
    bytecode::{
        chunk::{Chunk, ChunkRef, Function, Primitive},
        code_bundle::{Block, CodeBundle},
        types::Type,
    },
    runtime::results::ExecutionError,
};

use super::verify::verify;

fn block(chunks: Vec<Chunk>, entrypoints: Vec<ChunkRef>) -> Block {
    Block {
        chunks,
        entrypoints,
        ..Block::default()
    }
}

fn bound(id: &str, binding: ChunkRef, args: Vec<Primitive>) -> Chunk {
    Chunk::call(
        id,
        Type::Any,
        Some(Function {
            binding: Some(binding),
            args,
        }),
    )
}

fn bundle(blocks: Vec<Block>) -> CodeBundle {
    CodeBundle {
        blocks,
        ..CodeBundle::default()
    }
}

#[test]
fn accepts_refs_into_enclosing_blocks() {
    let outer = block(
        vec![
            Chunk::primitive(Primitive::Int(3)),
            Chunk::call(
                "if",
                Type::Block,
                Some(Function {
                    binding: None,
                    args: vec![Primitive::Bool(true), Primitive::Block(2)],
                }),
            ),
        ],
        vec![ChunkRef::new(1, 2)],
    );
    let inner = block(
        vec![Chunk::primitive(Primitive::Ref(ChunkRef::new(1, 1)))],
        vec![ChunkRef::new(2, 1)],
    );
    assert_eq!(verify(&bundle(vec![outer, inner])), Ok(()));
}

#[test]
fn rejects_forward_refs() {
    let only = block(
        vec![
            bound("length", ChunkRef::new(1, 2), vec![]),
            Chunk::primitive(Primitive::Int(1)),
        ],
        vec![ChunkRef::new(1, 1)],
    );
    assert!(matches!(
        verify(&bundle(vec![only])),
        Err(ExecutionError::Malformed(msg)) if msg.contains("<1,2>")
    ));
}

#[test]
fn rejects_refs_into_sibling_blocks() {
    let outer = block(
        vec![
            Chunk::primitive(Primitive::Array {
                element: Type::Int,
                items: vec![],
            }),
            bound("where", ChunkRef::new(1, 1), vec![Primitive::Block(2)]),
            bound("where", ChunkRef::new(1, 1), vec![Primitive::Block(3)]),
        ],
        vec![ChunkRef::new(1, 3)],
    );
    let first = block(
        vec![Chunk::primitive(Primitive::Context(Type::Int))],
        vec![ChunkRef::new(2, 1)],
    );
    let second = block(
        vec![
            Chunk::primitive(Primitive::Context(Type::Int)),
            bound("==\u{5}", ChunkRef::new(2, 1), vec![Primitive::Int(1)]),
        ],
        vec![ChunkRef::new(3, 2)],
    );
    assert!(verify(&bundle(vec![outer, first, second])).is_err());
}

#[test]
fn rejects_missing_blocks() {
    let outer = block(
        vec![
            Chunk::primitive(Primitive::Int(1)),
            bound("{}", ChunkRef::new(1, 1), vec![Primitive::Block(5)]),
        ],
        vec![ChunkRef::new(1, 2)],
    );
    assert!(verify(&bundle(vec![outer])).is_err());
    assert!(verify(&bundle(vec![])).is_err());
}
