use crate::entity::{Persistable, PersistError};
use crate::model::RequestModel;
use crate::options::SaveOptions;
use chrono::{NaiveDateTime, Utc};
use mockall::mock;
use serde_json::Value;
use uuid::Uuid;
use validation::{
    AttributeLabels, Input, Rule, RuleMessages, RuleSet, RuleValidator, ValidationErrors,
    ValidationReport,
};

pub fn input_from(value: Value) -> Input {
    match value {
        Value::Object(map) => map,
        _ => panic!("test input must be a JSON object"),
    }
}

mock! {
    pub Engine {}

    impl RuleValidator for Engine {
        fn validate(
            &self,
            input: &Input,
            rules: &RuleSet,
            messages: &RuleMessages,
            labels: &AttributeLabels,
        ) -> ValidationReport;
    }
}

/// In-memory stand-in for a stored user record.
#[derive(Debug)]
pub struct TestUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub age: Option<i64>,
    pub created_at: Option<NaiveDateTime>,
    pub exists: bool,
    pub fail_save: bool,
    pub saves: u32,
    pub errors: ValidationErrors,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            name: String::new(),
            email: String::new(),
            age: None,
            created_at: None,
            exists: false,
            fail_save: false,
            saves: 0,
            errors: ValidationErrors::new(),
        }
    }
}

impl Persistable for TestUser {
    fn exists(&self) -> bool {
        self.exists
    }

    fn fillable(&self) -> &[&str] {
        &["name", "email"]
    }

    fn set_attribute(&mut self, field: &str, value: Value) {
        match field {
            "name" => self.name = value.as_str().unwrap_or_default().to_string(),
            "email" => self.email = value.as_str().unwrap_or_default().to_string(),
            "age" => {
                self.age = value
                    .as_i64()
                    .or_else(|| value.as_str().and_then(|s| s.parse().ok()));
            }
            _ => {}
        }
    }

    fn save_record(&mut self) -> Result<(), PersistError> {
        if self.fail_save {
            return Err(PersistError::from("connection refused"));
        }
        self.saves += 1;
        self.exists = true;
        if self.created_at.is_none() {
            self.created_at = Some(Utc::now().naive_utc());
        }
        Ok(())
    }
}

impl RequestModel for TestUser {
    fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    fn errors_mut(&mut self) -> &mut ValidationErrors {
        &mut self.errors
    }

    fn rules(&self) -> RuleSet {
        RuleSet::new().field("age", [Rule::Numeric])
    }
}

/// Minimal record with no rules and no inline validators; captures what
/// gets assigned.
#[derive(Debug, Default)]
pub struct GuestEntry {
    pub assigned: Input,
    pub exists: bool,
    pub errors: ValidationErrors,
}

impl Persistable for GuestEntry {
    fn exists(&self) -> bool {
        self.exists
    }

    fn fillable(&self) -> &[&str] {
        &["name"]
    }

    fn set_attribute(&mut self, field: &str, value: Value) {
        self.assigned.insert(field.to_string(), value);
    }

    fn save_record(&mut self) -> Result<(), PersistError> {
        self.exists = true;
        Ok(())
    }
}

impl RequestModel for GuestEntry {
    fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    fn errors_mut(&mut self) -> &mut ValidationErrors {
        &mut self.errors
    }
}

/// Post-like fixture with every hook wired for observation.
#[derive(Debug, Default)]
pub struct HookedPost {
    pub title: String,
    pub slug: String,
    pub exists: bool,
    pub fail_save: bool,
    pub saves: u32,
    pub errors: ValidationErrors,
    pub calls: Vec<&'static str>,
    pub veto_after_validate: bool,
    pub veto_before_save: bool,
    pub reject_slug: bool,
    pub seen_was_new: Option<bool>,
    pub seen_persisted: Option<bool>,
}

impl Persistable for HookedPost {
    fn exists(&self) -> bool {
        self.exists
    }

    fn fillable(&self) -> &[&str] {
        &["title"]
    }

    fn set_attribute(&mut self, field: &str, value: Value) {
        match field {
            "title" => self.title = value.as_str().unwrap_or_default().to_string(),
            "slug" => self.slug = value.as_str().unwrap_or_default().to_string(),
            _ => {}
        }
    }

    fn save_record(&mut self) -> Result<(), PersistError> {
        if self.fail_save {
            return Err(PersistError::from("disk full"));
        }
        self.saves += 1;
        self.exists = true;
        Ok(())
    }
}

impl RequestModel for HookedPost {
    fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    fn errors_mut(&mut self) -> &mut ValidationErrors {
        &mut self.errors
    }

    fn before_validate(&mut self, input: &mut Input, _options: &SaveOptions) -> bool {
        self.calls.push("before_validate");
        if let Some(Value::String(title)) = input.get_mut("title") {
            *title = title.trim().to_string();
        }
        true
    }

    fn after_validate(&mut self, _input: &Input, _options: &SaveOptions) -> bool {
        self.calls.push("after_validate");
        !self.veto_after_validate
    }

    fn before_save(&mut self, _options: &SaveOptions) -> bool {
        self.calls.push("before_save");
        !self.veto_before_save
    }

    fn after_save(&mut self, _options: &SaveOptions, was_new: bool, persisted: bool) {
        self.calls.push("after_save");
        self.seen_was_new = Some(was_new);
        self.seen_persisted = Some(persisted);
    }

    fn validate_field(
        &mut self,
        field: &str,
        value: &Value,
        _input: &Input,
        _options: &SaveOptions,
    ) -> Option<bool> {
        if field != "slug" {
            return None;
        }
        self.calls.push("validate_slug");
        match value.as_str() {
            Some(slug) if !slug.trim().is_empty() && !self.reject_slug => Some(true),
            _ => {
                self.add_error("slug", "Slug is not available");
                Some(false)
            }
        }
    }
}

/// Fixture whose rule engine is injected, for interaction tests.
pub struct EnginedModel {
    pub engine: MockEngine,
    pub declared: RuleSet,
    pub exists: bool,
    pub errors: ValidationErrors,
    pub veto_before_validate: bool,
}

impl EnginedModel {
    pub fn new(engine: MockEngine) -> Self {
        Self {
            engine,
            declared: RuleSet::new(),
            exists: false,
            errors: ValidationErrors::new(),
            veto_before_validate: false,
        }
    }
}

impl Persistable for EnginedModel {
    fn exists(&self) -> bool {
        self.exists
    }

    fn set_attribute(&mut self, _field: &str, _value: Value) {}

    fn save_record(&mut self) -> Result<(), PersistError> {
        self.exists = true;
        Ok(())
    }
}

impl RequestModel for EnginedModel {
    fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    fn errors_mut(&mut self) -> &mut ValidationErrors {
        &mut self.errors
    }

    fn rules(&self) -> RuleSet {
        self.declared.clone()
    }

    fn rule_engine(&self) -> &dyn RuleValidator {
        &self.engine
    }

    fn before_validate(&mut self, _input: &mut Input, _options: &SaveOptions) -> bool {
        !self.veto_before_validate
    }
}
