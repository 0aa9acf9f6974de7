use crate::checks::RuleCheck;
use crate::errors::ValidationErrors;
use crate::rules::{AttributeLabels, Rule, RuleMessages, RuleSet};
use serde_json::{Map, Value};

/// Raw request data: field name mapped to its JSON value.
pub type Input = Map<String, Value>;

/// Outcome of one rule-validation pass over an input map.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    errors: ValidationErrors,
}

impl ValidationReport {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_error(&self, field: &str) -> bool {
        self.errors.has(field)
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn into_errors(self) -> ValidationErrors {
        self.errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors.add(field, message);
    }
}

/// Evaluates declared rules against raw request input.
pub trait RuleValidator {
    fn validate(
        &self,
        input: &Input,
        rules: &RuleSet,
        messages: &RuleMessages,
        labels: &AttributeLabels,
    ) -> ValidationReport;
}

/// Default rule engine.
///
/// A field missing from the input fails only `Required`; present values
/// run every declared rule and collect one message per failure, using the
/// override for `"field.code"` (then `"field"`) when one is set.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardRuleValidator;

impl RuleValidator for StandardRuleValidator {
    fn validate(
        &self,
        input: &Input,
        rules: &RuleSet,
        messages: &RuleMessages,
        labels: &AttributeLabels,
    ) -> ValidationReport {
        let mut report = ValidationReport::default();

        for (field, field_rules) in rules.iter() {
            let label = labels.label_for(field);
            match input.get(field) {
                None => {
                    if let Some(rule) = field_rules.iter().find(|rule| matches!(rule, Rule::Required)) {
                        report.add(field, failure_message(messages, field, rule, label));
                    }
                }
                Some(value) => {
                    for rule in field_rules {
                        if !RuleCheck::passes(rule, value) {
                            report.add(field, failure_message(messages, field, rule, label));
                        }
                    }
                }
            }
        }

        if report.has_errors() {
            tracing::debug!(messages = report.errors().len(), "rule validation recorded errors");
        }
        report
    }
}

fn failure_message(messages: &RuleMessages, field: &str, rule: &Rule, label: &str) -> String {
    messages
        .lookup(field, rule.code())
        .map(str::to_string)
        .unwrap_or_else(|| RuleCheck::message(rule, label))
}
