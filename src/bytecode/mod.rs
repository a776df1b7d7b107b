pub mod chunk;
pub mod code_bundle;
pub mod compiler;
pub mod operators;
pub mod template;
pub mod types;

pub use chunk::{Chunk, ChunkKind, ChunkRef, Function, Primitive};
pub use code_bundle::{Assertion, AssertionKind, Block, CodeBundle};
pub use compiler::compile;
pub use template::{MessageTemplate, TemplatePart};
pub use types::Type;
