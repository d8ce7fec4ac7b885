//! Per-field dependency rules over live form values.

use formwright_domain::{
    FieldSchema, FieldValue, FormSchema, FormValues, VisibilityMode, VisibilityOperator,
    VisibilityRule,
};
use serde_json::Value;

use crate::form_model::FormModel;

/// Evaluates one field's visibility schema against a snapshot.
///
/// A field without rules is always visible. The dependency token resolves
/// preferentially against a live control key, falling back to any field
/// whose id or name matches (using that field's control key).
#[must_use]
pub fn field_visible(field: &FieldSchema, fields: &[FieldSchema], values: &FormValues) -> bool {
    let Some(visibility) = field.visibility() else {
        return true;
    };

    if visibility.rules().is_empty() {
        return true;
    }

    let mut results = visibility
        .rules()
        .iter()
        .map(|rule| rule_matches(rule, dependency_value(rule, fields, values)));

    match visibility.mode() {
        VisibilityMode::Any => results.any(|matched| matched),
        VisibilityMode::All => results.all(|matched| matched),
    }
}

/// Recomputes visibility for every field of a schema and toggles control
/// enablement accordingly.
///
/// One raw snapshot is taken up front; every field's target state is
/// computed from it before any control is toggled, so a disable can never
/// feed back into the same pass.
pub fn recompute_visibility(schema: &FormSchema, model: &mut FormModel) {
    let snapshot = model.raw_snapshot();

    let targets: Vec<(String, bool)> = schema
        .fields()
        .iter()
        .filter(|field| field.field_type().is_input())
        .map(|field| {
            (
                field.control_key().to_owned(),
                field_visible(field, schema.fields(), &snapshot),
            )
        })
        .collect();

    for (key, visible) in targets {
        if let Some(control) = model.control_mut(key.as_str())
            && control.is_enabled() != visible
        {
            control.set_enabled(visible);
        }
    }
}

fn dependency_value<'a>(
    rule: &VisibilityRule,
    fields: &[FieldSchema],
    values: &'a FormValues,
) -> Option<&'a FieldValue> {
    let token = rule.depends_on();
    if let Some(value) = values.get(token) {
        return Some(value);
    }

    fields
        .iter()
        .find(|field| field.id() == token || field.name() == Some(token))
        .and_then(|field| values.get(field.control_key()))
}

fn rule_matches(rule: &VisibilityRule, value: Option<&FieldValue>) -> bool {
    match rule.operator() {
        VisibilityOperator::Checked => matches!(value, Some(FieldValue::Bool(true))),
        VisibilityOperator::Unchecked => !matches!(value, Some(FieldValue::Bool(true))),
        VisibilityOperator::HasValue => value.is_some_and(|value| !value.is_empty_like()),
        VisibilityOperator::NotHasValue => !value.is_some_and(|value| !value.is_empty_like()),
        VisibilityOperator::In => in_comparison(rule, value),
        VisibilityOperator::NotIn => !in_comparison(rule, value),
        VisibilityOperator::NotEquals => !equals_comparison(rule, value),
        VisibilityOperator::Equals | VisibilityOperator::Unrecognized => {
            equals_comparison(rule, value)
        }
    }
}

fn in_comparison(rule: &VisibilityRule, value: Option<&FieldValue>) -> bool {
    let Some(Value::Array(candidates)) = rule.value() else {
        return false;
    };

    let dependency = value.unwrap_or(&FieldValue::Null);
    candidates
        .iter()
        .any(|candidate| dependency.equals_json(candidate))
}

fn equals_comparison(rule: &VisibilityRule, value: Option<&FieldValue>) -> bool {
    let operand = rule.value().unwrap_or(&Value::Null);
    let dependency = value.unwrap_or(&FieldValue::Null);

    // A multi-valued dependency matches when the operand is one of its members.
    if let FieldValue::Array(members) = dependency {
        return members.iter().any(|member| member.equals_json(operand));
    }

    dependency.equals_json(operand)
}

#[cfg(test)]
mod tests {
    use formwright_domain::{FieldValue, FormSchema, FormValues, form_values_from_json};
    use serde_json::json;

    use super::{field_visible, recompute_visibility};
    use crate::form_model::build_form_model;

    fn schema(raw: serde_json::Value) -> FormSchema {
        serde_json::from_value(raw).unwrap_or_else(|_| unreachable!("test schemas are valid"))
    }

    fn values(raw: serde_json::Value) -> FormValues {
        form_values_from_json(raw)
    }

    #[test]
    fn fields_without_rules_are_always_visible() {
        let parsed = schema(json!({
            "id": "f",
            "fields": [{"id": "plain", "type": "text"}]
        }));

        assert!(field_visible(
            &parsed.fields()[0],
            parsed.fields(),
            &FormValues::new()
        ));
    }

    #[test]
    fn all_mode_requires_every_rule() {
        let parsed = schema(json!({
            "id": "f",
            "fields": [
                {"id": "subscribe", "type": "checkbox"},
                {"id": "country", "type": "select"},
                {
                    "id": "newsletter",
                    "type": "text",
                    "visibility": {
                        "mode": "ALL",
                        "rules": [
                            {"dependsOn": "subscribe", "operator": "CHECKED"},
                            {"dependsOn": "country", "operator": "EQUALS", "value": "DE"}
                        ]
                    }
                }
            ]
        }));
        let target = &parsed.fields()[2];

        let one_of_two = values(json!({"subscribe": true, "country": "FR"}));
        assert!(!field_visible(target, parsed.fields(), &one_of_two));

        let both = values(json!({"subscribe": true, "country": "DE"}));
        assert!(field_visible(target, parsed.fields(), &both));
    }

    #[test]
    fn any_mode_accepts_a_single_passing_rule() {
        let parsed = schema(json!({
            "id": "f",
            "fields": [
                {"id": "a", "type": "text"},
                {"id": "b", "type": "text"},
                {
                    "id": "target",
                    "type": "text",
                    "visibility": {
                        "mode": "ANY",
                        "rules": [
                            {"dependsOn": "a", "operator": "HAS_VALUE"},
                            {"dependsOn": "b", "operator": "HAS_VALUE"}
                        ]
                    }
                }
            ]
        }));
        let target = &parsed.fields()[2];

        assert!(field_visible(
            target,
            parsed.fields(),
            &values(json!({"a": "", "b": "x"}))
        ));
        assert!(!field_visible(
            target,
            parsed.fields(),
            &values(json!({"a": "", "b": ""}))
        ));
    }

    #[test]
    fn in_and_not_in_follow_array_membership() {
        let parsed = schema(json!({
            "id": "f",
            "fields": [
                {"id": "plan", "type": "select"},
                {
                    "id": "seats",
                    "type": "number",
                    "visibility": {
                        "rules": [
                            {"dependsOn": "plan", "operator": "IN", "value": ["team", "business"]}
                        ]
                    }
                },
                {
                    "id": "upsell",
                    "type": "text",
                    "visibility": {
                        "rules": [
                            {"dependsOn": "plan", "operator": "NOT_IN", "value": "not-an-array"}
                        ]
                    }
                }
            ]
        }));

        assert!(field_visible(
            &parsed.fields()[1],
            parsed.fields(),
            &values(json!({"plan": "team"}))
        ));
        assert!(!field_visible(
            &parsed.fields()[1],
            parsed.fields(),
            &values(json!({"plan": "solo"}))
        ));
        // NOT_IN with a non-array operand is vacuously true
        assert!(field_visible(
            &parsed.fields()[2],
            parsed.fields(),
            &values(json!({"plan": "solo"}))
        ));
    }

    #[test]
    fn equals_matches_membership_for_array_dependencies() {
        let parsed = schema(json!({
            "id": "f",
            "fields": [
                {"id": "tags", "type": "select", "multiple": true},
                {
                    "id": "detail",
                    "type": "text",
                    "visibility": {
                        "rules": [{"dependsOn": "tags", "operator": "EQUALS", "value": "vip"}]
                    }
                }
            ]
        }));
        let target = &parsed.fields()[1];

        assert!(field_visible(
            target,
            parsed.fields(),
            &values(json!({"tags": ["basic", "vip"]}))
        ));
        assert!(!field_visible(
            target,
            parsed.fields(),
            &values(json!({"tags": ["basic"]}))
        ));
    }

    #[test]
    fn unknown_operator_behaves_as_equals() {
        let parsed = schema(json!({
            "id": "f",
            "fields": [
                {"id": "mode", "type": "select"},
                {
                    "id": "extra",
                    "type": "text",
                    "visibility": {
                        "rules": [{"dependsOn": "mode", "operator": "SOMETHING_NEW", "value": "on"}]
                    }
                }
            ]
        }));
        let target = &parsed.fields()[1];

        assert!(field_visible(
            target,
            parsed.fields(),
            &values(json!({"mode": "on"}))
        ));
        assert!(!field_visible(
            target,
            parsed.fields(),
            &values(json!({"mode": "off"}))
        ));
    }

    #[test]
    fn dependency_token_falls_back_to_field_id_lookup() {
        // rule references the field's id, but the control lives under its name
        let parsed = schema(json!({
            "id": "f",
            "fields": [
                {"id": "field-7", "name": "consent", "type": "checkbox"},
                {
                    "id": "details",
                    "type": "text",
                    "visibility": {
                        "rules": [{"dependsOn": "field-7", "operator": "CHECKED"}]
                    }
                }
            ]
        }));
        let target = &parsed.fields()[1];

        assert!(field_visible(
            target,
            parsed.fields(),
            &values(json!({"consent": true}))
        ));
    }

    #[test]
    fn recompute_toggles_only_affected_controls() {
        let parsed = schema(json!({
            "id": "f",
            "fields": [
                {"id": "subscribe", "type": "checkbox"},
                {"id": "unrelated", "type": "text"},
                {
                    "id": "email",
                    "type": "email",
                    "visibility": {
                        "rules": [{"dependsOn": "subscribe", "operator": "CHECKED"}]
                    }
                }
            ]
        }));

        let model = build_form_model(parsed.fields(), None);
        assert!(model.is_ok());
        let mut model = model.unwrap_or_default();

        recompute_visibility(&parsed, &mut model);
        assert_eq!(
            model.control("email").map(|control| control.is_enabled()),
            Some(false)
        );
        assert_eq!(
            model.control("unrelated").map(|control| control.is_enabled()),
            Some(true)
        );

        if let Some(control) = model.control_mut("subscribe") {
            control.set_value(FieldValue::Bool(true));
        }
        recompute_visibility(&parsed, &mut model);
        assert_eq!(
            model.control("email").map(|control| control.is_enabled()),
            Some(true)
        );
        assert_eq!(
            model.control("unrelated").map(|control| control.is_enabled()),
            Some(true)
        );
    }
}
