//! Action registry for looking up transformation functions by name.
//!
//! The registry is built once at startup and then only read. Compiled field
//! specifications hold `Arc` clones of the resolved actions, so a compiled
//! configuration does not borrow the registry it was built from.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{ActionError, RegistryError};

/// Named parameters passed to a single action invocation, in declared order.
pub type Params = IndexMap<String, Value>;

/// Trait for transformation functions
///
/// An action receives the current value of a field plus its named parameters
/// and returns the transformed value. Actions must not keep shared mutable
/// state: one compiled configuration may be applied from several threads.
pub trait ActionFn: Send + Sync {
    /// Apply the transformation to `value`.
    ///
    /// # Returns
    ///
    /// * `Ok(value)` - Transformed value (string, array, number, ...)
    /// * `Err(ActionError)` - The value or a parameter could not be handled
    fn apply(&self, value: Value, params: &Params) -> Result<Value, ActionError>;
}

/// Simple function-based implementation of ActionFn
impl<F> ActionFn for F
where
    F: Fn(Value, &Params) -> Result<Value, ActionError> + Send + Sync,
{
    fn apply(&self, value: Value, params: &Params) -> Result<Value, ActionError> {
        self(value, params)
    }
}

/// One registered action.
#[derive(Clone)]
pub struct ActionEntry {
    func: Arc<dyn ActionFn>,
    /// Accepted parameter names, when the action declares them.
    params: Option<Vec<String>>,
}

impl ActionEntry {
    pub fn func(&self) -> Arc<dyn ActionFn> {
        Arc::clone(&self.func)
    }

    /// Accepted parameter names, or `None` when any parameter is allowed.
    pub fn accepted_params(&self) -> Option<&[String]> {
        self.params.as_deref()
    }

    pub fn accepts_param(&self, name: &str) -> bool {
        self.params
            .as_ref()
            .map_or(true, |params| params.iter().any(|p| p == name))
    }
}

impl fmt::Debug for ActionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionEntry")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Registry mapping action names to transformation functions
#[derive(Clone, Default)]
pub struct ActionRegistry {
    actions: HashMap<String, ActionEntry>,
}

impl ActionRegistry {
    /// Create a new empty action registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an action that accepts any named parameters.
    ///
    /// Registering a name twice replaces the earlier action.
    ///
    /// # Example
    ///
    /// ```
    /// use recast::ActionRegistry;
    /// use serde_json::Value;
    ///
    /// let mut registry = ActionRegistry::new();
    /// registry.register("upper", |value, _params| {
    ///     Ok(Value::String(value.as_str().unwrap_or_default().to_uppercase()))
    /// });
    /// assert!(registry.has_action("upper"));
    /// ```
    pub fn register<F>(&mut self, name: impl Into<String>, func: F)
    where
        F: Fn(Value, &Params) -> Result<Value, ActionError> + Send + Sync + 'static,
    {
        self.insert(name.into(), Arc::new(func), None);
    }

    /// Register a type implementing `ActionFn` directly.
    pub fn register_action(&mut self, name: impl Into<String>, action: impl ActionFn + 'static) {
        self.insert(name.into(), Arc::new(action), None);
    }

    /// Register an action and the names of the parameters it accepts.
    ///
    /// Schemas that pass any other parameter to this action are rejected at
    /// compile time.
    pub fn register_with_params<F>(&mut self, name: impl Into<String>, params: &[&str], func: F)
    where
        F: Fn(Value, &Params) -> Result<Value, ActionError> + Send + Sync + 'static,
    {
        let params = params.iter().map(|p| p.to_string()).collect();
        self.insert(name.into(), Arc::new(func), Some(params));
    }

    fn insert(&mut self, name: String, func: Arc<dyn ActionFn>, params: Option<Vec<String>>) {
        self.actions.insert(name, ActionEntry { func, params });
    }

    /// Look up the registry entry for `name` (case-sensitive, exact match).
    pub fn entry(&self, name: &str) -> Result<&ActionEntry, RegistryError> {
        self.actions
            .get(name)
            .ok_or_else(|| RegistryError::UnknownAction(name.to_string()))
    }

    /// Resolve an action name to its function.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn ActionFn>, RegistryError> {
        self.entry(name).map(ActionEntry::func)
    }

    /// Check if an action is registered
    pub fn has_action(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    /// Get a sorted list of all registered action names
    pub fn action_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.actions.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("actions", &self.action_names())
            .finish()
    }
}
