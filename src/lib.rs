//! # Recast: Declarative Record Transformation
//!
//! Recast turns a per-source schema of field descriptors into compiled
//! pipelines of named actions, then applies them to records.
//!
//! ## Features
//!
//! - **Static action registry**: name to function lookup, built once at startup
//! - **Eager validation**: unknown actions and missing keys reject a source before any record runs
//! - **Ordered action chains**: each field's actions run left to right on a copy of the record
//! - **Built-in text actions**: HTML stripping, name normalization, tag splitting, stopword removal
//!
//! ## Example: Schema
//!
//! ```yaml
//! CSV1:
//!   - old_field_name: html
//!     new_field_name: text
//!     functions:
//!       - clean_html:
//!   - old_field_name: tags
//!     new_field_name: tags
//!     functions:
//!       - format_tags: {separator: ','}
//! ```
//!
//! ## Example: Parsing a record
//!
//! ```
//! use recast::{builtin_registry, record_from_json, Schema};
//! use serde_json::json;
//!
//! let yaml = "CSV1:\n  - old_field_name: tags\n    new_field_name: tags\n    functions:\n      - format_tags: {separator: ','}\n";
//! let schema = Schema::from_yaml_str(yaml, &builtin_registry()).unwrap();
//!
//! let record = record_from_json(json!({"tags": "a,b,c"})).unwrap();
//! let output = schema.parse("CSV1", &record).unwrap();
//! assert_eq!(output["tags"], json!(["a", "b", "c"]));
//! ```

// Core modules
pub mod error;
pub mod record;
pub mod action_registry;
pub mod actions;

// Schema compilation and execution
pub mod runtime;

// Re-export key types
pub use error::{ActionError, ExecutionError, RegistryError, SchemaError};
pub use record::{is_falsy, record_from_json, Record};
pub use action_registry::{ActionEntry, ActionFn, ActionRegistry, Params};
pub use actions::{builtin_registry, register_builtins};

// Re-export runtime types
pub use runtime::{compile, ActionStep, FieldSpec, Schema, SourceConfig};
