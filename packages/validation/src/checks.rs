use crate::rules::Rule;
use serde_json::Value;

pub struct RuleCheck;

impl RuleCheck {
    /// Whether `value` satisfies `rule`.
    ///
    /// Scalars arriving as strings are coerced where the rule calls for
    /// it, since request input is usually text.
    pub fn passes(rule: &Rule, value: &Value) -> bool {
        match rule {
            Rule::Required => !Self::is_blank(value),
            Rule::Email => Self::check_email(value),
            Rule::Numeric => Self::numeric(value).is_some(),
            Rule::Integer => Self::integer(value).is_some(),
            Rule::Boolean => Self::boolean(value).is_some(),
            Rule::MinLength(min) => Self::text_length(value).map_or(false, |len| len >= *min),
            Rule::MaxLength(max) => Self::text_length(value).map_or(false, |len| len <= *max),
            Rule::Min(min) => Self::numeric(value).map_or(false, |n| n >= *min),
            Rule::Max(max) => Self::numeric(value).map_or(false, |n| n <= *max),
            Rule::In(allowed) => {
                Self::scalar_text(value).map_or(false, |s| allowed.iter().any(|option| option == &s))
            }
        }
    }

    /// Default message for a failed rule, phrased around the field label.
    pub fn message(rule: &Rule, label: &str) -> String {
        match rule {
            Rule::Required => format!("{} cannot be empty", label),
            Rule::Email => format!("{} format is invalid", label),
            Rule::Numeric => format!("{} must be a number", label),
            Rule::Integer => format!("{} must be an integer", label),
            Rule::Boolean => format!("{} must be true or false", label),
            Rule::MinLength(min) => format!("{} must be at least {} characters long", label, min),
            Rule::MaxLength(max) => format!("{} must be at most {} characters long", label, max),
            Rule::Min(min) => format!("{} must be at least {}", label, min),
            Rule::Max(max) => format!("{} must be at most {}", label, max),
            Rule::In(allowed) => format!("{} must be one of: {}", label, allowed.join(", ")),
        }
    }

    /// Null and empty or whitespace-only strings count as blank.
    pub fn is_blank(value: &Value) -> bool {
        match value {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    fn check_email(value: &Value) -> bool {
        match value {
            Value::String(email) => {
                !email.trim().is_empty() && email.contains('@') && email.contains('.')
            }
            _ => false,
        }
    }

    fn numeric(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    fn integer(value: &Value) -> Option<i64> {
        match value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
    }

    fn boolean(value: &Value) -> Option<bool> {
        match value {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => match n.as_i64() {
                Some(0) => Some(false),
                Some(1) => Some(true),
                _ => None,
            },
            Value::String(s) => match s.as_str() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    fn text_length(value: &Value) -> Option<usize> {
        match value {
            Value::String(s) => Some(s.chars().count()),
            _ => None,
        }
    }

    fn scalar_text(value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}
