//! Multi-source schema loading.
//!
//! A schema maps each source id to its list of field descriptors:
//!
//! ```yaml
//! CSV1:
//!   - old_field_name: author
//!     new_field_name: author
//!     functions:
//!       - format_name:
//!   - old_field_name: title
//!     new_field_name: title
//! ```
//!
//! Every source is compiled up front; one bad source rejects the schema.

use std::fs;
use std::path::Path;
use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::action_registry::ActionRegistry;
use crate::error::{ExecutionError, SchemaError};
use crate::record::{is_falsy, Record};
use crate::runtime::source_config::SourceConfig;

/// Compiled configurations for every source of a schema.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    /// Source configurations, in declaration order
    sources: IndexMap<String, SourceConfig>,
}

impl Schema {
    /// Compile an already-deserialized schema.
    ///
    /// # Arguments
    /// * `raw` - Mapping of source id to field descriptor list
    /// * `registry` - Actions available to the schema
    ///
    /// # Errors
    /// Returns the first compilation error of any source
    pub fn compile(raw: &JsonValue, registry: &ActionRegistry) -> Result<Self, SchemaError> {
        let sources_raw = match raw {
            JsonValue::Object(map) => map,
            empty if is_falsy(empty) => return Ok(Self::default()),
            other => {
                return Err(SchemaError::invalid(
                    "<schema>",
                    format!("expected a mapping of source ids, got {}", other),
                ))
            }
        };

        let mut sources = IndexMap::with_capacity(sources_raw.len());
        for (source_id, raw_fields) in sources_raw {
            let config = SourceConfig::new(source_id.clone(), Some(raw_fields), registry)?;
            sources.insert(source_id.clone(), config);
        }

        debug!(sources = sources.len(), "compiled schema");

        Ok(Self { sources })
    }

    /// Parse YAML text and compile it.
    ///
    /// # Example
    /// ```
    /// use recast::{builtin_registry, Schema};
    ///
    /// let yaml = "CSV1:\n  - old_field_name: tags\n    new_field_name: tags\n    functions:\n      - format_tags: {separator: ','}\n";
    /// let schema = Schema::from_yaml_str(yaml, &builtin_registry()).unwrap();
    /// assert!(schema.has_source("CSV1"));
    /// ```
    pub fn from_yaml_str(text: &str, registry: &ActionRegistry) -> Result<Self, SchemaError> {
        let raw: JsonValue = serde_yaml::from_str(text)?;
        Self::compile(&raw, registry)
    }

    /// Load a YAML schema file and compile it.
    ///
    /// # Example
    /// ```ignore
    /// use recast::{builtin_registry, Schema};
    ///
    /// let schema = Schema::load_from_file("config/sources.yaml", &builtin_registry())?;
    /// println!("Sources: {:?}", schema.source_ids());
    /// ```
    pub fn load_from_file<P: AsRef<Path>>(path: P, registry: &ActionRegistry) -> Result<Self, SchemaError> {
        let path = path.as_ref();

        let contents = fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(path = %path.display(), "loading schema file");

        Self::from_yaml_str(&contents, registry)
    }

    /// Get a source configuration by id.
    pub fn source(&self, source_id: &str) -> Option<&SourceConfig> {
        self.sources.get(source_id)
    }

    /// Check if a source is defined.
    pub fn has_source(&self, source_id: &str) -> bool {
        self.sources.contains_key(source_id)
    }

    /// Source ids in declaration order.
    pub fn source_ids(&self) -> Vec<&str> {
        self.sources.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Parse a record with the configuration of `source_id`.
    pub fn parse(&self, source_id: &str, record: &Record) -> Result<Record, ExecutionError> {
        self.source(source_id)
            .ok_or_else(|| ExecutionError::UnknownSource(source_id.to_string()))?
            .parse(record)
    }
}
