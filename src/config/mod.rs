//! Configuration loading and validation.
//!
//! - `types` - the immutable [`ProjectConfig`] and its settings groups
//! - `duration` - "2s" / "500ms" style durations
//! - `parser` - YAML discovery, parsing, and the environment overlay
//! - `validation` - aggregated validation (every issue reported in one pass)

mod duration;
mod parser;
mod types;
mod validation;

pub use duration::*;
pub use parser::*;
pub use types::*;
pub use validation::*;
