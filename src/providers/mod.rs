//! Resource providers that do not need a live system: a TOML backed mock
//! and a recorder that captures another provider's answers.

pub mod mock;
pub mod recording;

pub use mock::MockProvider;
pub use recording::{RecordedAsset, Recorder, Recording};
