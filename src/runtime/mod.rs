//! Execution of code bundles: values, the resource contract, per-context
//! caching and the bytecode executor.

pub mod cache;
pub mod context;
pub mod registry;
pub mod resource;
pub mod results;
pub mod value;
pub mod vm;

pub use cache::{CacheStats, ResourceCache};
pub use context::{CancelToken, ExecutionContext};
pub use registry::{RegistryError, ResourceRegistry};
pub use resource::{Invalidation, Provider, ResourceError, ResourceHandle};
pub use results::{Execution, ExecutionError, RawResult};
pub use value::{BlockEntry, ItemDetail, RawData, Value};
pub use vm::{execute, execute_assets};
