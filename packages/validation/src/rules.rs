use std::collections::HashMap;

/// A single declarative rule applied to one field.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// Field must be present and non-blank
    Required,
    /// Field must look like an email address
    Email,
    /// Field must be a number or a numeric string
    Numeric,
    /// Field must be a whole number
    Integer,
    /// Field must be a boolean or a boolean-like scalar
    Boolean,
    /// String must have at least this many characters
    MinLength(usize),
    /// String must have at most this many characters
    MaxLength(usize),
    /// Numeric value must be at least this large
    Min(f64),
    /// Numeric value must be at most this large
    Max(f64),
    /// Value must be one of the listed options
    In(Vec<String>),
}

impl Rule {
    /// Stable code used to key message overrides.
    pub fn code(&self) -> &'static str {
        match self {
            Rule::Required => "required",
            Rule::Email => "email",
            Rule::Numeric => "numeric",
            Rule::Integer => "integer",
            Rule::Boolean => "boolean",
            Rule::MinLength(_) => "min_length",
            Rule::MaxLength(_) => "max_length",
            Rule::Min(_) => "min",
            Rule::Max(_) => "max",
            Rule::In(_) => "in",
        }
    }
}

/// Declared rules per field, kept in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    fields: Vec<(String, Vec<Rule>)>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: &str, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.fields.push((name.to_string(), rules.into_iter().collect()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Names of all fields with declared rules.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Rule])> {
        self.fields
            .iter()
            .map(|(name, rules)| (name.as_str(), rules.as_slice()))
    }
}

/// Message overrides, looked up as `"field.code"` first, then `"field"`.
#[derive(Debug, Clone, Default)]
pub struct RuleMessages {
    overrides: HashMap<String, String>,
}

impl RuleMessages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: &str, message: &str) -> Self {
        self.overrides.insert(key.to_string(), message.to_string());
        self
    }

    pub fn lookup(&self, field: &str, code: &str) -> Option<&str> {
        self.overrides
            .get(&format!("{}.{}", field, code))
            .or_else(|| self.overrides.get(field))
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}

/// Display names substituted into default messages.
#[derive(Debug, Clone, Default)]
pub struct AttributeLabels {
    labels: HashMap<String, String>,
}

impl AttributeLabels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: &str, label: &str) -> Self {
        self.labels.insert(field.to_string(), label.to_string());
        self
    }

    /// Label for `field`, falling back to the raw field name.
    pub fn label_for<'a>(&'a self, field: &'a str) -> &'a str {
        self.labels.get(field).map(String::as_str).unwrap_or(field)
    }
}
