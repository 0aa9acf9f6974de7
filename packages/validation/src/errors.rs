use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;
use std::fmt;

/// A mapping of field names to their validation error messages.
///
/// Entries keep the order in which fields first received a message, so
/// "first error" lookups are stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    entries: Vec<(String, Vec<String>)>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message under `field`, creating the entry on first use.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        let message = message.into();
        match self.entries.iter_mut().find(|(name, _)| name == field) {
            Some((_, messages)) => messages.push(message),
            None => self.entries.push((field.to_string(), vec![message])),
        }
    }

    /// Fold another collection into this one, preserving both orders.
    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, messages) in other.entries {
            for message in messages {
                self.add(&field, message);
            }
        }
    }

    pub fn has(&self, field: &str) -> bool {
        self.entries.iter().any(|(name, _)| name == field)
    }

    /// All messages recorded for `field`, empty if none.
    pub fn get(&self, field: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, messages)| messages.as_slice())
            .unwrap_or(&[])
    }

    /// First message recorded for `field`.
    pub fn first_for(&self, field: &str) -> Option<&str> {
        self.get(field).first().map(String::as_str)
    }

    /// First message overall, in recording order.
    pub fn first(&self) -> Option<&str> {
        self.entries
            .first()
            .and_then(|(_, messages)| messages.first())
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of messages across all fields.
    pub fn len(&self) -> usize {
        self.entries.iter().map(|(_, messages)| messages.len()).sum()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(field, messages)| (field.as_str(), messages.as_slice()))
    }

    /// Snapshot as a plain map for display surfaces.
    pub fn to_map(&self) -> HashMap<String, Vec<String>> {
        self.entries.iter().cloned().collect()
    }

    /// Get a comma-separated list of all error messages
    pub fn to_message(&self) -> String {
        self.entries
            .iter()
            .flat_map(|(_, messages)| messages.iter())
            .cloned()
            .collect::<Vec<String>>()
            .join(", ")
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_message())
    }
}

impl Serialize for ValidationErrors {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (field, messages) in &self.entries {
            map.serialize_entry(field, messages)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_groups_messages_by_field() {
        let mut errors = ValidationErrors::new();
        errors.add("email", "Email cannot be empty");
        errors.add("email", "Email format is invalid");
        errors.add("password", "Password cannot be empty");

        assert_eq!(errors.get("email").len(), 2);
        assert_eq!(errors.get("password").len(), 1);
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_first_follows_recording_order() {
        let mut errors = ValidationErrors::new();
        errors.add("b", "second field");
        errors.add("a", "first field was recorded later");

        assert_eq!(errors.first(), Some("second field"));
        assert_eq!(errors.first_for("a"), Some("first field was recorded later"));
        assert_eq!(errors.first_for("missing"), None);
    }

    #[test]
    fn test_merge_appends_to_existing_fields() {
        let mut errors = ValidationErrors::new();
        errors.add("email", "Email cannot be empty");

        let mut other = ValidationErrors::new();
        other.add("email", "Email format is invalid");
        other.add("password", "Password cannot be empty");
        errors.merge(other);

        assert_eq!(errors.get("email").len(), 2);
        assert!(errors.has("password"));
        assert_eq!(errors.first(), Some("Email cannot be empty"));
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut errors = ValidationErrors::new();
        errors.add("email", "Email cannot be empty");
        errors.clear();

        assert!(errors.is_empty());
        assert_eq!(errors.first(), None);
        assert_eq!(errors.len(), 0);
    }

    #[test]
    fn test_display_joins_all_messages() {
        let mut errors = ValidationErrors::new();
        errors.add("email", "Email cannot be empty");
        errors.add("password", "Password cannot be empty");

        assert_eq!(
            errors.to_string(),
            "Email cannot be empty, Password cannot be empty"
        );
    }

    #[test]
    fn test_serializes_as_field_map() {
        let mut errors = ValidationErrors::new();
        errors.add("email", "Email cannot be empty");
        errors.add("email", "Email format is invalid");

        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "email": ["Email cannot be empty", "Email format is invalid"]
            })
        );
    }
}
