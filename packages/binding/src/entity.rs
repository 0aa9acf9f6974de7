use serde_json::Value;
use std::fmt;

/// Failure reported by the backing store when a record cannot be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistError {
    pub message: String,
}

impl PersistError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for PersistError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for PersistError {
    fn from(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message.as_str())
    }
}

/// Storage contract a record satisfies so request input can be bound to it.
pub trait Persistable {
    /// True once the record has been stored.
    fn exists(&self) -> bool;

    /// Field names allowed to be mass-assigned from request input.
    fn fillable(&self) -> &[&str] {
        &[]
    }

    /// Write one accepted input value onto the record.
    fn set_attribute(&mut self, field: &str, value: Value);

    /// Store the record. Implementations flip `exists` on success.
    fn save_record(&mut self) -> Result<(), PersistError>;
}
