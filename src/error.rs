//! Error types for registry lookups, schema compilation and record execution.
//!
//! Compilation errors (`SchemaError`) reject a whole source configuration
//! before any record is processed. Execution errors (`ExecutionError`) are
//! reported per record to the caller of `parse`.

use std::path::PathBuf;
use thiserror::Error;

/// Error returned by a registry lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Action not found: {0}")]
    UnknownAction(String),
}

/// Error raised by an action while transforming a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    /// The value handed to the action has a shape the action cannot handle.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A named parameter has the wrong type or an unusable value.
    #[error("Invalid parameter '{param}': {reason}")]
    InvalidParam { param: String, reason: String },

    #[error("Action failed: {0}")]
    Failed(String),
}

/// Error raised while compiling a schema into source configurations.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Field descriptor #{index} in source '{source_id}' is missing required key '{key}'")]
    MissingRequiredKey {
        source_id: String,
        index: usize,
        key: &'static str,
    },

    #[error("No such action '{name}' in '{source_id}' map")]
    UnknownAction { name: String, source_id: String },

    #[error("Action '{action}' in source '{source_id}' does not accept parameter '{parameter}'")]
    UnknownParameter {
        source_id: String,
        action: String,
        parameter: String,
    },

    #[error("Invalid schema for source '{source_id}': {reason}")]
    InvalidDescriptor { source_id: String, reason: String },

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to read schema file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SchemaError {
    pub(crate) fn invalid(source_id: &str, reason: impl Into<String>) -> Self {
        SchemaError::InvalidDescriptor {
            source_id: source_id.to_string(),
            reason: reason.into(),
        }
    }
}

/// Error raised while applying a compiled configuration to one record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error("Action '{action}' failed on field '{field}' of source '{source_id}': {source}")]
    ActionFailed {
        source_id: String,
        field: String,
        action: String,
        #[source]
        source: ActionError,
    },

    #[error("Unknown source: {0}")]
    UnknownSource(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_action_message_names_source() {
        let err = SchemaError::UnknownAction {
            name: "fromat_name".to_string(),
            source_id: "CSV1".to_string(),
        };
        assert_eq!(err.to_string(), "No such action 'fromat_name' in 'CSV1' map");
    }

    #[test]
    fn test_action_failed_exposes_source() {
        use std::error::Error as _;

        let err = ExecutionError::ActionFailed {
            source_id: "CSV1".to_string(),
            field: "tags".to_string(),
            action: "format_tags".to_string(),
            source: ActionError::InvalidInput("expected string".to_string()),
        };
        assert!(err.to_string().contains("field 'tags'"));
        assert!(err.source().is_some());
    }
}
