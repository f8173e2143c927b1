//! Schema compilation and record execution.
//!
//! This module turns declarative field descriptors into compiled pipelines
//! and applies them to records.

pub mod compiler;
pub mod source_config;
pub mod config_loader;

// Re-export key types
pub use compiler::{compile, ActionStep, FieldSpec, FUNCTIONS, NEW_FIELD_NAME, OLD_FIELD_NAME};
pub use source_config::SourceConfig;
pub use config_loader::Schema;
