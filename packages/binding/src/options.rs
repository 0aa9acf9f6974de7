use serde_json::{Map, Value};

/// Flags for one bind pass, handed through to every lifecycle hook.
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    /// Proceed with the save even when validation recorded errors; only
    /// fields that passed are applied.
    pub ignore_errors: bool,
    /// Free-form application data for hooks.
    pub context: Map<String, Value>,
}

impl SaveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ignoring_errors() -> Self {
        Self {
            ignore_errors: true,
            ..Self::default()
        }
    }

    pub fn with_context(mut self, key: &str, value: Value) -> Self {
        self.context.insert(key.to_string(), value);
        self
    }
}
