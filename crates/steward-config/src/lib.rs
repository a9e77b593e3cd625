//! Configuration models and loading.
//!
//! This crate owns the steward config schema, its validation rules, and
//! the JSON5 file loader used by embedding applications.

mod error;
mod loader;
mod model;

/// Error type shared by the loading and validation APIs.
pub use error::ConfigError;
/// Configuration schema models.
pub use model::*;
