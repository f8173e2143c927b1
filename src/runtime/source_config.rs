//! Compiled per-source configuration and the record executor.

use serde_json::Value;
use tracing::{debug, trace};

use crate::action_registry::ActionRegistry;
use crate::error::{ExecutionError, SchemaError};
use crate::record::{is_falsy, Record};
use crate::runtime::compiler::{compile, FieldSpec};

/// Holds the compiled field pipeline for one data source.
///
/// Built once when the schema is loaded and immutable afterwards. A changed
/// schema means building a new `SourceConfig`. `parse` only reads `self`, so
/// one configuration can serve many threads at once.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    source_id: String,
    fields: Vec<FieldSpec>,
}

impl SourceConfig {
    /// Compile the raw field descriptors of `source_id`.
    ///
    /// # Errors
    /// Any missing key, malformed descriptor or unknown action rejects the
    /// whole source.
    pub fn new(
        source_id: impl Into<String>,
        raw_fields: Option<&Value>,
        registry: &ActionRegistry,
    ) -> Result<Self, SchemaError> {
        let source_id = source_id.into();
        let fields = compile(&source_id, raw_fields, registry)?;

        debug!(source = %source_id, fields = fields.len(), "compiled source configuration");

        Ok(Self { source_id, fields })
    }

    /// Build a configuration from already compiled fields.
    pub fn from_fields(source_id: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        Self {
            source_id: source_id.into(),
            fields,
        }
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    /// Compiled fields, in schema order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// JSON view of the compiled fields: names and parameters of each step.
    pub fn describe(&self) -> serde_json::Result<Value> {
        serde_json::to_value(&self.fields)
    }

    /// Apply every field specification to a copy of `record`.
    ///
    /// Fields are processed in schema order and read from the working copy,
    /// so a field may consume the output of an earlier one. A missing or
    /// falsy source value yields `""` without running any action. The input
    /// record is never modified.
    ///
    /// # Errors
    /// The first failing action aborts the record with
    /// `ExecutionError::ActionFailed`.
    pub fn parse(&self, record: &Record) -> Result<Record, ExecutionError> {
        let mut output = record.clone();

        for field in &self.fields {
            let value = self.parse_field(field, &output)?;
            output.insert(field.target_name.clone(), value);
        }

        Ok(output)
    }

    fn parse_field(&self, field: &FieldSpec, item: &Record) -> Result<Value, ExecutionError> {
        let value = match item.get(&field.source_name) {
            Some(value) if !is_falsy(value) => value.clone(),
            _ => {
                trace!(
                    source = %self.source_id,
                    field = %field.target_name,
                    "empty source value, skipping actions"
                );
                return Ok(Value::String(String::new()));
            }
        };

        trace!(
            source = %self.source_id,
            field = %field.target_name,
            actions = field.actions.len(),
            "applying action chain"
        );

        field.actions.iter().try_fold(value, |value, step| {
            step.func()
                .apply(value, &step.params)
                .map_err(|source| ExecutionError::ActionFailed {
                    source_id: self.source_id.clone(),
                    field: field.target_name.clone(),
                    action: step.name.clone(),
                    source,
                })
        })
    }
}
