//! Test helpers shared across steward crates.

pub mod embed;
pub mod model;
pub mod tools;

pub use embed::{FailingEmbedder, KeywordEmbedder};
pub use model::{FailingModel, FixedModel, RecordingModel, ScriptedModel, SlowModel};
pub use tools::{DummyInvoker, FailingInvoker};
