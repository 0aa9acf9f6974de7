use crate::entity::{Persistable, PersistError};
use crate::options::SaveOptions;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use validation::{
    AttributeLabels, Input, RuleMessages, RuleSet, RuleValidator, StandardRuleValidator,
    ValidationErrors,
};

/// Lifecycle stage that vetoed an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    BeforeValidate,
    AfterValidate,
    BeforeSave,
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hook::BeforeValidate => f.write_str("before_validate"),
            Hook::AfterValidate => f.write_str("after_validate"),
            Hook::BeforeSave => f.write_str("before_save"),
        }
    }
}

/// Why a bind attempt failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveError {
    /// One or more fields were rejected; messages are on the model.
    Invalid,
    /// A lifecycle hook refused the operation, possibly without messages.
    Rejected(Hook),
    /// The backing store refused the record.
    Persistence(PersistError),
}

impl From<PersistError> for SaveError {
    fn from(error: PersistError) -> Self {
        SaveError::Persistence(error)
    }
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveError::Invalid => f.write_str("validation failed"),
            SaveError::Rejected(hook) => write!(f, "{} hook rejected the operation", hook),
            SaveError::Persistence(error) => write!(f, "save failed: {}", error),
        }
    }
}

/// A model refused by [`RequestModel::create_from_request`], returned
/// together with the failure so callers can still read the error
/// messages accumulated on it.
#[derive(Debug)]
pub struct CreateRejection<M> {
    pub model: M,
    pub error: SaveError,
}

/// Request-driven create/update/validate behaviour for a persistable
/// record.
///
/// Implementors supply error storage and may override the declaration
/// methods and hooks; the orchestration itself comes as provided
/// methods. Hooks default to accepting, declarations default to empty,
/// and the rule engine defaults to [`StandardRuleValidator`].
pub trait RequestModel: Persistable {
    /// Messages recorded by the most recent validation pass.
    fn errors(&self) -> &ValidationErrors;

    fn errors_mut(&mut self) -> &mut ValidationErrors;

    /// Declared rules per field.
    fn rules(&self) -> RuleSet {
        RuleSet::new()
    }

    /// Message overrides keyed `"field.code"` or `"field"`.
    fn rule_messages(&self) -> RuleMessages {
        RuleMessages::new()
    }

    /// Display labels substituted into default messages.
    fn attribute_labels(&self) -> AttributeLabels {
        AttributeLabels::new()
    }

    /// Engine evaluating the declared rules.
    fn rule_engine(&self) -> &dyn RuleValidator {
        &StandardRuleValidator
    }

    /// Runs before rules are evaluated and may rewrite the input.
    /// Returning false aborts the pass.
    fn before_validate(&mut self, _input: &mut Input, _options: &SaveOptions) -> bool {
        true
    }

    /// Runs on the filtered input once validation passed.
    fn after_validate(&mut self, _input: &Input, _options: &SaveOptions) -> bool {
        true
    }

    /// Last chance to refuse before the store is called.
    fn before_save(&mut self, _options: &SaveOptions) -> bool {
        true
    }

    /// Runs after a successful store. `was_new` is the existence state
    /// captured before persisting, so a hook can tell a create from an
    /// update; `persisted` is the state afterwards.
    fn after_save(&mut self, _options: &SaveOptions, _was_new: bool, _persisted: bool) {}

    /// Field-specific validator consulted for every input field.
    ///
    /// `None` means the model declares no validator for the field.
    /// `Some(true)` accepts the field into the filtered input even when
    /// no rule covers it; `Some(false)` leaves it out, and the
    /// implementation is expected to record a message via
    /// [`RequestModel::add_error`].
    fn validate_field(
        &mut self,
        _field: &str,
        _value: &Value,
        _input: &Input,
        _options: &SaveOptions,
    ) -> Option<bool> {
        None
    }

    fn add_error(&mut self, field: &str, message: impl Into<String>) {
        self.errors_mut().add(field, message);
    }

    fn has_errors(&self) -> bool {
        !self.errors().is_empty()
    }

    /// First message recorded for `field`.
    fn error(&self, field: &str) -> Option<&str> {
        self.errors().first_for(field)
    }

    /// First message overall.
    fn first_error(&self) -> Option<&str> {
        self.errors().first()
    }

    /// Build a fresh record from request input and store it.
    ///
    /// On failure the partially-populated instance is handed back inside
    /// the rejection so its error messages stay inspectable.
    fn create_from_request(
        input: Input,
        options: &SaveOptions,
    ) -> Result<Self, CreateRejection<Self>>
    where
        Self: Default,
    {
        let mut model = Self::default();
        match model.save_from_request(input, options) {
            Ok(()) => Ok(model),
            Err(error) => Err(CreateRejection { model, error }),
        }
    }

    /// Bind request input onto an existing record and store it.
    fn update_from_request(&mut self, input: Input, options: &SaveOptions) -> Result<(), SaveError> {
        self.save_from_request(input, options)
    }

    /// Validate, assign the accepted fields, and persist.
    ///
    /// Each step short-circuits: a validation failure or hook veto stops
    /// the sequence before the store is touched, and a store failure
    /// skips the after-save hook.
    fn save_from_request(&mut self, input: Input, options: &SaveOptions) -> Result<(), SaveError> {
        let accepted = self.validate_request(input, options)?;

        for (field, value) in accepted {
            self.set_attribute(&field, value);
        }

        if !self.before_save(options) {
            tracing::debug!(hook = %Hook::BeforeSave, "hook rejected the save");
            return Err(SaveError::Rejected(Hook::BeforeSave));
        }

        let was_new = !self.exists();
        if let Err(error) = self.save_record() {
            tracing::debug!(error = %error, "record save failed");
            return Err(SaveError::Persistence(error));
        }

        let persisted = self.exists();
        self.after_save(options, was_new, persisted);

        Ok(())
    }

    /// Validate request input against the declared rules and inline
    /// field validators, returning the filtered input on success.
    ///
    /// The filtered map contains exactly the fillable fields plus every
    /// field that passed validation; a field that failed never reaches
    /// it, `ignore_errors` or not.
    fn validate_request(&mut self, mut input: Input, options: &SaveOptions) -> Result<Input, SaveError> {
        // every pass starts from a clean slate
        self.errors_mut().clear();

        if !self.before_validate(&mut input, options) {
            tracing::debug!(hook = %Hook::BeforeValidate, "hook rejected the request");
            return Err(SaveError::Rejected(Hook::BeforeValidate));
        }

        let rules = self.rules();
        let mut accepted: HashSet<String> = HashSet::new();

        if !rules.is_empty() {
            let messages = self.rule_messages();
            let labels = self.attribute_labels();
            let report = self.rule_engine().validate(&input, &rules, &messages, &labels);
            for field in rules.fields() {
                if !report.has_error(field) {
                    accepted.insert(field.to_string());
                }
            }
            self.errors_mut().merge(report.into_errors());
        }

        // inline validators run regardless of rule coverage; acceptance
        // is the union of both
        for (field, value) in &input {
            if self.validate_field(field, value, &input, options) == Some(true) {
                accepted.insert(field.clone());
            }
        }

        if self.has_errors() && !options.ignore_errors {
            tracing::debug!(messages = self.errors().len(), "request validation failed");
            return Err(SaveError::Invalid);
        }

        let mut allowed = accepted;
        for field in self.fillable() {
            allowed.insert((*field).to_string());
        }
        input.retain(|field, _value| allowed.contains(field));

        if !self.after_validate(&input, options) {
            tracing::debug!(hook = %Hook::AfterValidate, "hook rejected the request");
            return Err(SaveError::Rejected(Hook::AfterValidate));
        }

        Ok(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use serde_json::json;

    #[test]
    fn test_no_rules_keeps_only_fillable_fields() {
        let mut entry = GuestEntry::default();
        let input = input_from(json!({ "name": "Bo", "extra": "z" }));

        let filtered = entry.validate_request(input, &SaveOptions::new()).unwrap();

        assert_eq!(filtered.len(), 1);
        assert!(filtered.contains_key("name"));
        assert!(!entry.has_errors());
    }

    #[test]
    fn test_failing_rule_blocks_save() {
        let mut user = TestUser::default();
        let input = input_from(json!({ "name": "Bo", "age": "x", "extra": "z" }));

        let result = user.save_from_request(input, &SaveOptions::new());

        assert_eq!(result, Err(SaveError::Invalid));
        assert!(user.has_errors());
        assert_eq!(user.error("age"), Some("age must be a number"));
        assert_eq!(user.saves, 0);
        assert_eq!(user.name, "");
    }

    #[test]
    fn test_passing_rules_filters_and_assigns() {
        let mut user = TestUser::default();
        let input = input_from(json!({ "name": "Bo", "age": "30", "extra": "z" }));

        user.save_from_request(input, &SaveOptions::new()).unwrap();

        assert_eq!(user.name, "Bo");
        assert_eq!(user.age, Some(30));
        assert!(user.exists);
        assert_eq!(user.saves, 1);
    }

    #[test]
    fn test_ignore_errors_saves_passing_fields_only() {
        let mut user = TestUser::default();
        let input = input_from(json!({ "name": "Bo", "age": "x" }));

        user.save_from_request(input, &SaveOptions::ignoring_errors())
            .unwrap();

        assert_eq!(user.name, "Bo");
        assert_eq!(user.age, None);
        assert!(user.has_errors());
        assert_eq!(user.saves, 1);
    }

    #[test]
    fn test_errors_reset_between_passes() {
        let mut user = TestUser::default();

        let result = user.validate_request(input_from(json!({ "age": "x" })), &SaveOptions::new());
        assert_eq!(result, Err(SaveError::Invalid));
        assert!(user.has_errors());

        user.validate_request(input_from(json!({ "age": "30" })), &SaveOptions::new())
            .unwrap();
        assert!(!user.has_errors());
    }

    #[test]
    fn test_inline_validator_accepts_field_outside_rules() {
        let mut post = HookedPost::default();
        let input = input_from(json!({ "title": "Hello", "slug": "hello" }));

        post.save_from_request(input, &SaveOptions::new()).unwrap();

        assert_eq!(post.title, "Hello");
        assert_eq!(post.slug, "hello");
    }

    #[test]
    fn test_inline_validator_rejection_records_message() {
        let mut post = HookedPost {
            reject_slug: true,
            ..HookedPost::default()
        };
        let input = input_from(json!({ "title": "Hello", "slug": "hello" }));

        let result = post.save_from_request(input, &SaveOptions::new());

        assert_eq!(result, Err(SaveError::Invalid));
        assert_eq!(post.error("slug"), Some("Slug is not available"));
        assert_eq!(post.saves, 0);
    }

    #[test]
    fn test_rejected_inline_field_is_excluded_when_ignoring_errors() {
        let mut post = HookedPost {
            reject_slug: true,
            ..HookedPost::default()
        };
        let input = input_from(json!({ "title": "Hello", "slug": "hello" }));

        post.save_from_request(input, &SaveOptions::ignoring_errors())
            .unwrap();

        assert_eq!(post.title, "Hello");
        assert_eq!(post.slug, "");
        assert!(post.has_errors());
    }

    #[test]
    fn test_before_validate_normalizes_input() {
        let mut post = HookedPost::default();
        let input = input_from(json!({ "title": "  Hello  " }));

        post.save_from_request(input, &SaveOptions::new()).unwrap();

        assert_eq!(post.title, "Hello");
    }

    #[test]
    fn test_before_save_veto_skips_store_and_records_nothing() {
        let mut post = HookedPost {
            veto_before_save: true,
            ..HookedPost::default()
        };
        let input = input_from(json!({ "title": "Hello" }));

        let result = post.save_from_request(input, &SaveOptions::new());

        assert_eq!(result, Err(SaveError::Rejected(Hook::BeforeSave)));
        assert_eq!(post.saves, 0);
        // a hook veto is a distinct reason, not a validation failure
        assert!(!post.has_errors());
    }

    #[test]
    fn test_after_validate_veto_aborts_after_filtering() {
        let mut post = HookedPost {
            veto_after_validate: true,
            ..HookedPost::default()
        };
        let input = input_from(json!({ "title": "Hello" }));

        let result = post.save_from_request(input, &SaveOptions::new());

        assert_eq!(result, Err(SaveError::Rejected(Hook::AfterValidate)));
        assert_eq!(post.title, "");
    }

    #[test]
    fn test_after_save_distinguishes_create_from_update() {
        let mut post = HookedPost::default();

        post.save_from_request(input_from(json!({ "title": "First" })), &SaveOptions::new())
            .unwrap();
        assert_eq!(post.seen_was_new, Some(true));
        assert_eq!(post.seen_persisted, Some(true));

        post.save_from_request(input_from(json!({ "title": "Second" })), &SaveOptions::new())
            .unwrap();
        assert_eq!(post.seen_was_new, Some(false));
        assert_eq!(post.seen_persisted, Some(true));
    }

    #[test]
    fn test_hooks_run_in_sequence() {
        let mut post = HookedPost::default();
        let input = input_from(json!({ "title": "Hello", "slug": "hello" }));

        post.save_from_request(input, &SaveOptions::new()).unwrap();

        assert_eq!(
            post.calls,
            vec![
                "before_validate",
                "validate_slug",
                "after_validate",
                "before_save",
                "after_save"
            ]
        );
    }

    #[test]
    fn test_persistence_failure_skips_after_save() {
        let mut post = HookedPost {
            fail_save: true,
            ..HookedPost::default()
        };
        let input = input_from(json!({ "title": "Hello" }));

        let result = post.save_from_request(input, &SaveOptions::new());

        assert!(matches!(result, Err(SaveError::Persistence(_))));
        assert!(!post.calls.contains(&"after_save"));
    }

    #[test]
    fn test_create_from_request_returns_stored_model() {
        let input = input_from(json!({ "name": "Bo", "age": 30 }));

        let user = TestUser::create_from_request(input, &SaveOptions::new()).unwrap();

        assert!(user.exists);
        assert_eq!(user.name, "Bo");
        assert_eq!(user.age, Some(30));
    }

    #[test]
    fn test_create_from_request_keeps_rejected_model() {
        let input = input_from(json!({ "name": "Bo", "age": "x" }));

        let rejection = TestUser::create_from_request(input, &SaveOptions::new()).unwrap_err();

        assert_eq!(rejection.error, SaveError::Invalid);
        assert!(!rejection.model.exists);
        assert_eq!(rejection.model.error("age"), Some("age must be a number"));
    }

    #[test]
    fn test_update_from_request_saves_existing_record() {
        let mut user = TestUser {
            exists: true,
            name: "Old".to_string(),
            ..TestUser::default()
        };
        let input = input_from(json!({ "name": "New" }));

        user.update_from_request(input, &SaveOptions::new()).unwrap();

        assert_eq!(user.name, "New");
        assert_eq!(user.saves, 1);
    }

    #[test]
    fn test_engine_not_invoked_without_rules() {
        let mut engine = MockEngine::new();
        engine.expect_validate().never();
        let mut model = EnginedModel::new(engine);

        model
            .validate_request(input_from(json!({ "anything": 1 })), &SaveOptions::new())
            .unwrap();
    }

    #[test]
    fn test_before_validate_veto_prevents_engine_call() {
        let mut engine = MockEngine::new();
        engine.expect_validate().never();
        let mut model = EnginedModel::new(engine);
        model.declared = validation::RuleSet::new().field("age", [validation::Rule::Numeric]);
        model.veto_before_validate = true;

        let result = model.validate_request(input_from(json!({ "age": 1 })), &SaveOptions::new());

        assert_eq!(result, Err(SaveError::Rejected(Hook::BeforeValidate)));
    }

    #[test]
    fn test_engine_report_drives_acceptance() {
        let mut engine = MockEngine::new();
        engine
            .expect_validate()
            .times(1)
            .withf(|input, _rules, _messages, _labels| input.contains_key("a"))
            .returning(|_input, _rules, _messages, _labels| {
                let mut report = validation::ValidationReport::default();
                report.add("a", "a is broken");
                report
            });
        let mut model = EnginedModel::new(engine);
        model.declared = validation::RuleSet::new()
            .field("a", [validation::Rule::Numeric])
            .field("b", [validation::Rule::Numeric]);

        let filtered = model
            .validate_request(
                input_from(json!({ "a": "x", "b": 2, "c": 3 })),
                &SaveOptions::ignoring_errors(),
            )
            .unwrap();

        // "b" passed the engine, "a" failed, "c" was never declared
        assert_eq!(filtered.len(), 1);
        assert!(filtered.contains_key("b"));
        assert_eq!(model.error("a"), Some("a is broken"));
    }
}
