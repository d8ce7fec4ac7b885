use std::collections::BTreeMap;
use std::collections::HashSet;

use formwright_core::{AppError, AppResult};
use formwright_domain::{FieldSchema, FieldValue, FormValues};

use crate::validators::{ValidationIssue, ValidatorRule, build_validators};

/// Reactive state for one field's control: current value, validator set,
/// enablement, interaction flags, and error details.
#[derive(Debug, Clone)]
pub struct FormControl {
    value: FieldValue,
    validators: Vec<ValidatorRule>,
    enabled: bool,
    touched: bool,
    dirty: bool,
    errors: Vec<ValidationIssue>,
}

impl FormControl {
    fn new(value: FieldValue, validators: Vec<ValidatorRule>) -> Self {
        let mut control = Self {
            value,
            validators,
            enabled: true,
            touched: false,
            dirty: false,
            errors: Vec::new(),
        };
        control.revalidate();
        control
    }

    /// Returns the current value.
    #[must_use]
    pub fn value(&self) -> &FieldValue {
        &self.value
    }

    /// Returns whether the control participates in validation and payloads.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns whether the user has interacted with the control.
    #[must_use]
    pub fn is_touched(&self) -> bool {
        self.touched
    }

    /// Returns whether the user has changed the value.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns whether the current value passes every validator.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the current error details.
    #[must_use]
    pub fn errors(&self) -> &[ValidationIssue] {
        self.errors.as_slice()
    }

    /// Applies a user edit: stores the value, marks the control touched and
    /// dirty, and revalidates.
    pub fn set_value(&mut self, value: FieldValue) {
        self.value = value;
        self.touched = true;
        self.dirty = true;
        self.revalidate();
    }

    /// Patches the value silently, without marking the control dirty.
    pub fn patch_value(&mut self, value: FieldValue) {
        self.value = value;
        self.revalidate();
    }

    /// Marks the control touched.
    pub fn mark_touched(&mut self) {
        self.touched = true;
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub(crate) fn revalidate(&mut self) {
        self.errors = self
            .validators
            .iter()
            .filter_map(|rule| rule.check(&self.value))
            .collect();
    }
}

/// The field-keyed control map for one applied schema.
#[derive(Debug, Clone, Default)]
pub struct FormModel {
    controls: BTreeMap<String, FormControl>,
}

impl FormModel {
    /// Returns the control under the given key.
    #[must_use]
    pub fn control(&self, key: &str) -> Option<&FormControl> {
        self.controls.get(key)
    }

    /// Returns the control under the given key for mutation.
    pub fn control_mut(&mut self, key: &str) -> Option<&mut FormControl> {
        self.controls.get_mut(key)
    }

    /// Iterates controls in key order.
    pub fn controls(&self) -> impl Iterator<Item = (&str, &FormControl)> {
        self.controls
            .iter()
            .map(|(key, control)| (key.as_str(), control))
    }

    /// Takes a snapshot of enabled controls only. Disabled values are
    /// excluded from payloads.
    #[must_use]
    pub fn value_snapshot(&self) -> FormValues {
        self.controls
            .iter()
            .filter(|(_, control)| control.is_enabled())
            .map(|(key, control)| (key.clone(), control.value().clone()))
            .collect()
    }

    /// Takes a snapshot of every control regardless of enablement. Visibility
    /// rules evaluate against this view.
    #[must_use]
    pub fn raw_snapshot(&self) -> FormValues {
        self.controls
            .iter()
            .map(|(key, control)| (key.clone(), control.value().clone()))
            .collect()
    }

    /// Marks every control touched and revalidates it.
    pub fn mark_all_touched(&mut self) {
        for control in self.controls.values_mut() {
            control.mark_touched();
            control.revalidate();
        }
    }

    /// Returns whether every enabled control passes its validators.
    /// Disabled controls never count against validity.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.controls
            .values()
            .filter(|control| control.is_enabled())
            .all(FormControl::is_valid)
    }

    /// Collects error details of enabled, invalid controls by key.
    #[must_use]
    pub fn errors(&self) -> BTreeMap<String, Vec<ValidationIssue>> {
        self.controls
            .iter()
            .filter(|(_, control)| control.is_enabled() && !control.is_valid())
            .map(|(key, control)| (key.clone(), control.errors().to_vec()))
            .collect()
    }
}

/// Builds the control map from the field list and optional initial values.
///
/// Card, info-card, and button fields get no control. The initial value for
/// a control is `initial[control_key]` when present, else the field type's
/// default. Two fields resolving to the same control key is a schema error.
pub fn build_form_model(
    fields: &[FieldSchema],
    initial: Option<&FormValues>,
) -> AppResult<FormModel> {
    let mut controls = BTreeMap::new();
    let mut seen_keys = HashSet::new();

    for field in fields {
        if !field.field_type().is_input() {
            continue;
        }

        let key = field.control_key();
        if !seen_keys.insert(key.to_owned()) {
            return Err(AppError::Validation(format!(
                "duplicate control key '{key}' in form schema"
            )));
        }

        // explicit nulls in the initial value fall back to the type default
        let value = initial
            .and_then(|values| values.get(key))
            .filter(|value| !matches!(value, FieldValue::Null))
            .cloned()
            .unwrap_or_else(|| field.field_type().default_value());

        controls.insert(
            key.to_owned(),
            FormControl::new(value, build_validators(field)),
        );
    }

    Ok(FormModel { controls })
}

#[cfg(test)]
mod tests {
    use formwright_core::AppError;
    use formwright_domain::{FieldSchema, FieldValue, FormValues};
    use serde_json::json;

    use super::build_form_model;

    fn fields(raw: serde_json::Value) -> Vec<FieldSchema> {
        serde_json::from_value(raw).unwrap_or_else(|_| unreachable!("test schemas are valid"))
    }

    #[test]
    fn layout_fields_get_no_control() {
        let model = build_form_model(
            &fields(json!([
                {"id": "name", "type": "text"},
                {"id": "hint", "type": "card", "card": {"title": "Hi"}},
                {"id": "go", "type": "button", "button": {"label": "Go"}}
            ])),
            None,
        );

        assert!(model.is_ok());
        let model = model.unwrap_or_default();
        assert!(model.control("name").is_some());
        assert!(model.control("hint").is_none());
        assert!(model.control("go").is_none());
    }

    #[test]
    fn initial_values_take_precedence_over_type_defaults() {
        let mut initial = FormValues::new();
        initial.insert("agree".to_owned(), FieldValue::Bool(true));

        let model = build_form_model(
            &fields(json!([
                {"id": "agree", "type": "checkbox"},
                {"id": "color", "type": "select"},
                {"id": "bio", "type": "textarea"}
            ])),
            Some(&initial),
        );

        assert!(model.is_ok());
        let model = model.unwrap_or_default();
        assert_eq!(
            model.control("agree").map(|control| control.value().clone()),
            Some(FieldValue::Bool(true))
        );
        assert_eq!(
            model.control("color").map(|control| control.value().clone()),
            Some(FieldValue::Null)
        );
        assert_eq!(
            model.control("bio").map(|control| control.value().clone()),
            Some(FieldValue::Text(String::new()))
        );
    }

    #[test]
    fn duplicate_control_keys_are_a_schema_error() {
        let model = build_form_model(
            &fields(json!([
                {"id": "a", "name": "email", "type": "text"},
                {"id": "b", "name": "email", "type": "email"}
            ])),
            None,
        );

        assert!(matches!(model, Err(AppError::Validation(_))));
    }

    #[test]
    fn building_twice_yields_independent_models() {
        let parsed = fields(json!([{"id": "name", "type": "text"}]));
        let first = build_form_model(&parsed, None);
        let second = build_form_model(&parsed, None);
        assert!(first.is_ok());
        assert!(second.is_ok());

        let mut first = first.unwrap_or_default();
        let second = second.unwrap_or_default();
        if let Some(control) = first.control_mut("name") {
            control.set_value(FieldValue::Text("changed".to_owned()));
        }

        assert_eq!(
            second.control("name").map(|control| control.value().clone()),
            Some(FieldValue::Text(String::new()))
        );
    }

    #[test]
    fn snapshots_respect_enablement() {
        let parsed = fields(json!([
            {"id": "a", "type": "text"},
            {"id": "b", "type": "text"}
        ]));
        let model = build_form_model(&parsed, None);
        assert!(model.is_ok());
        let mut model = model.unwrap_or_default();

        if let Some(control) = model.control_mut("b") {
            control.set_value(FieldValue::Text("kept".to_owned()));
            control.set_enabled(false);
        }

        assert!(!model.value_snapshot().contains_key("b"));
        assert!(model.raw_snapshot().contains_key("b"));
    }

    #[test]
    fn disabled_controls_do_not_block_validity() {
        let parsed = fields(json!([{"id": "a", "type": "text", "required": true}]));
        let model = build_form_model(&parsed, None);
        assert!(model.is_ok());
        let mut model = model.unwrap_or_default();

        assert!(!model.is_valid());
        if let Some(control) = model.control_mut("a") {
            control.set_enabled(false);
        }
        assert!(model.is_valid());
    }

    #[test]
    fn set_value_marks_dirty_and_patch_does_not() {
        let parsed = fields(json!([{"id": "a", "type": "text"}]));
        let model = build_form_model(&parsed, None);
        assert!(model.is_ok());
        let mut model = model.unwrap_or_default();

        if let Some(control) = model.control_mut("a") {
            control.patch_value(FieldValue::Text("seed".to_owned()));
            assert!(!control.is_dirty());
            assert!(!control.is_touched());

            control.set_value(FieldValue::Text("typed".to_owned()));
            assert!(control.is_dirty());
            assert!(control.is_touched());
        }
    }
}
