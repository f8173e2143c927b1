//! Schema compiler: raw field descriptors to resolved field specifications.
//!
//! A field descriptor is the already-deserialized form of:
//!
//! ```yaml
//! - old_field_name: tags
//!   new_field_name: tags
//!   functions:
//!     - format_tags: {separator: ','}
//! ```
//!
//! Compilation only validates and resolves; no action is executed here.

use std::fmt;
use std::sync::Arc;
use serde::Serialize;
use serde_json::Value;

use crate::action_registry::{ActionFn, ActionRegistry, Params};
use crate::error::SchemaError;
use crate::record::is_falsy;

/// Key holding the source field name in a descriptor.
pub const OLD_FIELD_NAME: &str = "old_field_name";
/// Key holding the target field name in a descriptor.
pub const NEW_FIELD_NAME: &str = "new_field_name";
/// Key holding the ordered action list in a descriptor.
pub const FUNCTIONS: &str = "functions";

/// One resolved action of a field's chain.
#[derive(Clone, Serialize)]
pub struct ActionStep {
    /// Registered name the action was resolved from
    pub name: String,
    pub params: Params,
    #[serde(skip)]
    func: Arc<dyn ActionFn>,
}

impl ActionStep {
    pub fn new(name: impl Into<String>, func: Arc<dyn ActionFn>, params: Params) -> Self {
        Self {
            name: name.into(),
            params,
            func,
        }
    }

    pub fn func(&self) -> &dyn ActionFn {
        self.func.as_ref()
    }
}

impl fmt::Debug for ActionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionStep")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Compiled instruction for one output field.
#[derive(Debug, Clone, Serialize)]
pub struct FieldSpec {
    /// Key written in the output record
    pub target_name: String,
    /// Key read from the record
    pub source_name: String,
    /// Actions applied left to right; empty means copy with rename
    pub actions: Vec<ActionStep>,
}

/// Compile the field descriptors of one source.
///
/// `raw_fields` absent or empty (`null`, `[]`, `{}`, `""`) compiles to no fields.
/// The first invalid descriptor or unknown action aborts the whole source.
///
/// # Example
/// ```
/// use recast::{compile, builtin_registry};
/// use serde_json::json;
///
/// let raw = json!([
///     {"old_field_name": "tags", "new_field_name": "tags",
///      "functions": [{"format_tags": {"separator": ","}}]}
/// ]);
/// let fields = compile("CSV1", Some(&raw), &builtin_registry()).unwrap();
/// assert_eq!(fields[0].actions[0].name, "format_tags");
/// ```
pub fn compile(
    source_id: &str,
    raw_fields: Option<&Value>,
    registry: &ActionRegistry,
) -> Result<Vec<FieldSpec>, SchemaError> {
    let descriptors = match raw_fields {
        None => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(empty) if is_falsy(empty) => return Ok(Vec::new()),
        Some(other) => {
            return Err(SchemaError::invalid(
                source_id,
                format!("expected a list of field descriptors, got {}", other),
            ))
        }
    };

    descriptors
        .iter()
        .enumerate()
        .map(|(index, descriptor)| compile_field(source_id, index, descriptor, registry))
        .collect()
}

fn compile_field(
    source_id: &str,
    index: usize,
    descriptor: &Value,
    registry: &ActionRegistry,
) -> Result<FieldSpec, SchemaError> {
    let map = descriptor.as_object().ok_or_else(|| {
        SchemaError::invalid(
            source_id,
            format!("field descriptor #{} is not a mapping", index),
        )
    })?;

    let target_name = required_name(source_id, index, map, NEW_FIELD_NAME)?;
    let source_name = required_name(source_id, index, map, OLD_FIELD_NAME)?;
    let actions = compile_actions(source_id, &target_name, map.get(FUNCTIONS), registry)?;

    Ok(FieldSpec {
        target_name,
        source_name,
        actions,
    })
}

fn required_name(
    source_id: &str,
    index: usize,
    map: &serde_json::Map<String, Value>,
    key: &'static str,
) -> Result<String, SchemaError> {
    match map.get(key) {
        None => Err(SchemaError::MissingRequiredKey {
            source_id: source_id.to_string(),
            index,
            key,
        }),
        // Names are taken verbatim: no trimming or case folding
        Some(Value::String(name)) => Ok(name.clone()),
        Some(other) => Err(SchemaError::invalid(
            source_id,
            format!("'{}' of field descriptor #{} must be a string, got {}", key, index, other),
        )),
    }
}

fn compile_actions(
    source_id: &str,
    field: &str,
    raw_actions: Option<&Value>,
    registry: &ActionRegistry,
) -> Result<Vec<ActionStep>, SchemaError> {
    let entries = match raw_actions {
        None => return Ok(Vec::new()),
        Some(Value::Array(entries)) => entries,
        Some(empty) if is_falsy(empty) => return Ok(Vec::new()),
        Some(other) => {
            return Err(SchemaError::invalid(
                source_id,
                format!("'{}' of field '{}' must be a list, got {}", FUNCTIONS, field, other),
            ))
        }
    };

    entries
        .iter()
        .map(|entry| compile_action(source_id, field, entry, registry))
        .collect()
}

fn compile_action(
    source_id: &str,
    field: &str,
    entry: &Value,
    registry: &ActionRegistry,
) -> Result<ActionStep, SchemaError> {
    let (name, raw_params) = match entry.as_object() {
        Some(map) if map.len() == 1 => map.iter().next().ok_or_else(|| {
            SchemaError::invalid(source_id, format!("empty action entry on field '{}'", field))
        })?,
        _ => {
            return Err(SchemaError::invalid(
                source_id,
                format!(
                    "action entries of field '{}' must be single-key mappings, got {}",
                    field, entry
                ),
            ))
        }
    };

    let action = registry
        .entry(name)
        .map_err(|_| SchemaError::UnknownAction {
            name: name.clone(),
            source_id: source_id.to_string(),
        })?;

    // An empty declaration of any shape means no parameters
    let params: Params = match raw_params {
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        empty if is_falsy(empty) => Params::new(),
        other => {
            return Err(SchemaError::invalid(
                source_id,
                format!("parameters of action '{}' must be a mapping, got {}", name, other),
            ))
        }
    };

    if let Some(parameter) = params.keys().find(|p| !action.accepts_param(p)) {
        return Err(SchemaError::UnknownParameter {
            source_id: source_id.to_string(),
            action: name.clone(),
            parameter: parameter.clone(),
        });
    }

    Ok(ActionStep::new(name.clone(), action.func(), params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ActionError;
    use serde_json::json;

    fn registry() -> ActionRegistry {
        let mut registry = ActionRegistry::new();
        registry.register("upper", |value: Value, _params: &Params| {
            Ok(Value::String(value.as_str().unwrap_or_default().to_uppercase()))
        });
        registry.register_with_params("split", &["separator"], |value, _params| Ok(value));
        registry.register("boom", |_value, _params| {
            Err(ActionError::Failed("must not run at compile time".to_string()))
        });
        registry
    }

    #[test]
    fn test_compile_absent_or_empty() {
        let registry = registry();
        assert!(compile("S", None, &registry).unwrap().is_empty());
        assert!(compile("S", Some(&Value::Null), &registry).unwrap().is_empty());
        assert!(compile("S", Some(&json!([])), &registry).unwrap().is_empty());
    }

    #[test]
    fn test_compile_empty_field_list_of_any_shape() {
        let registry = registry();
        for raw in [json!({}), json!(""), json!(false), json!(0)] {
            assert!(compile("S", Some(&raw), &registry).unwrap().is_empty(), "{raw}");
        }
    }

    #[test]
    fn test_compile_empty_functions_of_any_shape() {
        let registry = registry();
        for functions in [json!(null), json!([]), json!({}), json!(""), json!(false)] {
            let raw = json!([{"old_field_name": "a", "new_field_name": "a", "functions": functions}]);
            let fields = compile("S", Some(&raw), &registry).unwrap();
            assert!(fields[0].actions.is_empty(), "{functions}");
        }
    }

    #[test]
    fn test_compile_empty_params_of_any_shape() {
        let registry = registry();
        for params in [json!(null), json!({}), json!(""), json!([]), json!(false), json!(0)] {
            let raw = json!([{"old_field_name": "a", "new_field_name": "a", "functions": [{"split": params}]}]);
            let fields = compile("S", Some(&raw), &registry).unwrap();
            assert_eq!(fields[0].actions[0].name, "split");
            assert!(fields[0].actions[0].params.is_empty(), "{params}");
        }
    }

    #[test]
    fn test_compile_preserves_names_verbatim() {
        let raw = json!([{"old_field_name": " Title ", "new_field_name": "TITLE"}]);
        let fields = compile("S", Some(&raw), &registry()).unwrap();

        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].source_name, " Title ");
        assert_eq!(fields[0].target_name, "TITLE");
        assert!(fields[0].actions.is_empty());
    }

    #[test]
    fn test_compile_preserves_action_order_and_duplicates() {
        let raw = json!([{
            "old_field_name": "a",
            "new_field_name": "b",
            "functions": [
                {"upper": null},
                {"split": {"separator": ","}},
                {"upper": {}},
                {"split": {"separator": ";"}}
            ]
        }]);
        let fields = compile("S", Some(&raw), &registry()).unwrap();
        let names: Vec<&str> = fields[0].actions.iter().map(|a| a.name.as_str()).collect();

        assert_eq!(names, vec!["upper", "split", "upper", "split"]);
        assert!(fields[0].actions[0].params.is_empty());
        assert_eq!(fields[0].actions[1].params["separator"], json!(","));
        assert_eq!(fields[0].actions[3].params["separator"], json!(";"));
    }

    #[test]
    fn test_compile_missing_required_keys() {
        let raw = json!([{"old_field_name": "a", "new_field_name": "a"}, {"old_field_name": "b"}]);
        let err = compile("S", Some(&raw), &registry()).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::MissingRequiredKey { index: 1, key: NEW_FIELD_NAME, .. }
        ));

        let raw = json!([{"new_field_name": "b"}]);
        let err = compile("S", Some(&raw), &registry()).unwrap_err();
        assert!(matches!(err, SchemaError::MissingRequiredKey { key: OLD_FIELD_NAME, .. }));
    }

    #[test]
    fn test_compile_unknown_action_carries_source() {
        let raw = json!([{
            "old_field_name": "a",
            "new_field_name": "a",
            "functions": [{"upper": null}, {"uper": null}]
        }]);
        let err = compile("CSV1", Some(&raw), &registry()).unwrap_err();

        match err {
            SchemaError::UnknownAction { name, source_id } => {
                assert_eq!(name, "uper");
                assert_eq!(source_id, "CSV1");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_compile_does_not_run_actions() {
        let raw = json!([{"old_field_name": "a", "new_field_name": "a", "functions": [{"boom": null}]}]);
        let fields = compile("S", Some(&raw), &registry()).unwrap();
        assert_eq!(fields[0].actions[0].name, "boom");
    }

    #[test]
    fn test_compile_rejects_undeclared_parameter() {
        let raw = json!([{
            "old_field_name": "a",
            "new_field_name": "a",
            "functions": [{"split": {"sep": ","}}]
        }]);
        let err = compile("S", Some(&raw), &registry()).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::UnknownParameter { ref action, ref parameter, .. }
                if action == "split" && parameter == "sep"
        ));
    }

    #[test]
    fn test_compile_allows_any_parameter_when_undeclared() {
        let raw = json!([{
            "old_field_name": "a",
            "new_field_name": "a",
            "functions": [{"upper": {"whatever": 1}}]
        }]);
        assert!(compile("S", Some(&raw), &registry()).is_ok());
    }

    #[test]
    fn test_compile_rejects_malformed_descriptors() {
        let registry = registry();
        let cases = [
            json!({"old_field_name": "a"}),
            json!("CSV1"),
            json!(["not a mapping"]),
            json!([{"old_field_name": 1, "new_field_name": "a"}]),
            json!([{"old_field_name": "a", "new_field_name": "a", "functions": "upper"}]),
            json!([{"old_field_name": "a", "new_field_name": "a", "functions": [{"upper": null, "split": null}]}]),
            json!([{"old_field_name": "a", "new_field_name": "a", "functions": [{"upper": [1]}]}]),
            json!([{"old_field_name": "a", "new_field_name": "a", "functions": [{"upper": "x"}]}]),
            json!([{"old_field_name": "a", "new_field_name": "a", "functions": {"upper": null}}]),
        ];
        for raw in cases {
            let err = compile("S", Some(&raw), &registry).unwrap_err();
            assert!(matches!(err, SchemaError::InvalidDescriptor { .. }), "{raw}: {err}");
        }
    }
}
