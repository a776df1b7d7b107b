pub mod assessment;
pub mod bytecode;
pub mod config;
pub mod printer;
pub mod providers;
pub mod runtime;
pub mod schema;
pub mod syntax;

pub use assessment::{Assessment, AssessmentItem, assess, assess_entry};
pub use bytecode::{CodeBundle, compile};
pub use config::{CompilerConfig, Feature, Features};
pub use runtime::{ExecutionContext, Provider, execute, execute_assets};
pub use schema::{LoadError, ResourceInfo, Schema};
pub use syntax::diagnostic::CompileError;
