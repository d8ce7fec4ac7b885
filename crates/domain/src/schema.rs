use serde::{Deserialize, Serialize};

use crate::api::{ActionApiConfig, ContentTypeMode, HttpMethod};
use crate::field::{FieldSchema, FieldType};

/// How the renderer paginates a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum FormKind {
    /// One flat page.
    #[default]
    Single,
    /// Ordered steps, each scoping a subset of fields.
    Multi,
    /// One page split into titled sections.
    SingleSectional,
}

/// One step of a multi-step form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormStep {
    id: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    order: i32,
    #[serde(default)]
    field_ids: Vec<String>,
}

impl FormStep {
    /// Returns the step identity.
    #[must_use]
    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    /// Returns the step label.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Returns the ordering rank.
    #[must_use]
    pub fn order(&self) -> i32 {
        self.order
    }

    /// Returns the ids of the fields scoped to this step.
    #[must_use]
    pub fn field_ids(&self) -> &[String] {
        self.field_ids.as_slice()
    }
}

/// One titled section of a sectional form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSection {
    id: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    order: i32,
    #[serde(default)]
    field_ids: Vec<String>,
}

impl FormSection {
    /// Returns the section identity.
    #[must_use]
    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    /// Returns the section label.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Returns the ordering rank.
    #[must_use]
    pub fn order(&self) -> i32 {
        self.order
    }

    /// Returns the ids of the fields scoped to this section.
    #[must_use]
    pub fn field_ids(&self) -> &[String] {
        self.field_ids.as_slice()
    }
}

/// Submit action configuration for a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FormActions {
    #[serde(default)]
    submit_label: Option<String>,
    #[serde(default)]
    cancel_label: Option<String>,
    #[serde(default)]
    submit_api_url: Option<String>,
    #[serde(default)]
    method: Option<HttpMethod>,
    #[serde(default)]
    payload_key: Option<String>,
    #[serde(default)]
    content_type: Option<ContentTypeMode>,
    #[serde(default)]
    submit_api: Option<ActionApiConfig>,
}

impl FormActions {
    /// Returns the submit button label.
    #[must_use]
    pub fn submit_label(&self) -> Option<&str> {
        self.submit_label.as_deref()
    }

    /// Returns the cancel button label.
    #[must_use]
    pub fn cancel_label(&self) -> Option<&str> {
        self.cancel_label.as_deref()
    }

    /// Returns the plain submit URL.
    #[must_use]
    pub fn submit_api_url(&self) -> Option<&str> {
        self.submit_api_url.as_deref()
    }

    /// Returns the submit method, defaulting to POST.
    #[must_use]
    pub fn method(&self) -> HttpMethod {
        self.method.unwrap_or(HttpMethod::Post)
    }

    /// Returns the payload wrapper key.
    #[must_use]
    pub fn payload_key(&self) -> Option<&str> {
        self.payload_key.as_deref()
    }

    /// Returns the content-type negotiation mode.
    #[must_use]
    pub fn content_type(&self) -> ContentTypeMode {
        self.content_type.unwrap_or_default()
    }

    /// Returns the full submit API descriptor when configured.
    #[must_use]
    pub fn submit_api(&self) -> Option<&ActionApiConfig> {
        self.submit_api.as_ref()
    }
}

/// A complete declarative form schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSchema {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    fields: Vec<FieldSchema>,
    #[serde(default)]
    actions: FormActions,
    #[serde(default)]
    form_type: FormKind,
    #[serde(default)]
    steps: Vec<FormStep>,
    #[serde(default)]
    sections: Vec<FormSection>,
}

impl FormSchema {
    /// Returns the schema identity.
    #[must_use]
    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    /// Returns the schema name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the schema description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the field list in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldSchema] {
        self.fields.as_slice()
    }

    /// Returns the submit action configuration.
    #[must_use]
    pub fn actions(&self) -> &FormActions {
        &self.actions
    }

    /// Returns the pagination kind.
    #[must_use]
    pub fn form_type(&self) -> FormKind {
        self.form_type
    }

    /// Returns the raw step list.
    #[must_use]
    pub fn steps(&self) -> &[FormStep] {
        self.steps.as_slice()
    }

    /// Returns the raw section list.
    #[must_use]
    pub fn sections(&self) -> &[FormSection] {
        self.sections.as_slice()
    }

    /// Returns steps sorted by their ordering rank.
    #[must_use]
    pub fn ordered_steps(&self) -> Vec<&FormStep> {
        let mut steps: Vec<&FormStep> = self.steps.iter().collect();
        steps.sort_by_key(|step| step.order());
        steps
    }

    /// Finds a field whose id or name matches the given token.
    #[must_use]
    pub fn find_field(&self, token: &str) -> Option<&FieldSchema> {
        self.fields
            .iter()
            .find(|field| field.id() == token || field.name() == Some(token))
    }

    /// Schema intake pass: canonicalizes the accept specification of every
    /// file field.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        for field in &mut self.fields {
            if field.field_type() == FieldType::File {
                field.normalize_accept_in_place();
            }
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{FormKind, FormSchema};
    use crate::api::HttpMethod;

    fn schema(raw: serde_json::Value) -> FormSchema {
        serde_json::from_value(raw).unwrap_or_else(|_| unreachable!("test schemas are valid"))
    }

    #[test]
    fn full_schema_deserializes_from_wire_json() {
        let parsed = schema(json!({
            "id": "signup",
            "name": "Signup",
            "formType": "multi",
            "fields": [
                {"id": "email", "type": "email", "required": true},
                {"id": "note", "type": "card", "card": {"title": "Welcome"}}
            ],
            "actions": {
                "submitLabel": "Send",
                "submitApiUrl": "/signup",
                "method": "POST",
                "contentType": "auto"
            },
            "steps": [
                {"id": "s2", "order": 2, "fieldIds": ["note"]},
                {"id": "s1", "order": 1, "fieldIds": ["email"]}
            ]
        }));

        assert_eq!(parsed.form_type(), FormKind::Multi);
        assert_eq!(parsed.fields().len(), 2);
        assert_eq!(parsed.actions().method(), HttpMethod::Post);
        assert_eq!(parsed.actions().submit_api_url(), Some("/signup"));

        let ordered: Vec<&str> = parsed.ordered_steps().iter().map(|step| step.id()).collect();
        assert_eq!(ordered, vec!["s1", "s2"]);
    }

    #[test]
    fn normalized_canonicalizes_file_accepts() {
        let parsed = schema(json!({
            "id": "upload",
            "fields": [
                {"id": "doc", "type": "file", "accept": "pdf"},
                {"id": "label", "type": "text", "accept": "pdf"}
            ]
        }))
        .normalized();

        assert_eq!(parsed.fields()[0].accept(), Some(".pdf,application/pdf"));
        // non-file fields keep their raw value untouched
        assert_eq!(parsed.fields()[1].accept(), Some("pdf"));
    }

    #[test]
    fn find_field_matches_id_and_name() {
        let parsed = schema(json!({
            "id": "f",
            "fields": [{"id": "field-1", "name": "country", "type": "select"}]
        }));

        assert!(parsed.find_field("field-1").is_some());
        assert!(parsed.find_field("country").is_some());
        assert!(parsed.find_field("missing").is_none());
    }

    #[test]
    fn kebab_case_form_kind_round_trips() {
        let kind: Result<FormKind, _> = serde_json::from_value(json!("single-sectional"));
        assert!(matches!(kind, Ok(FormKind::SingleSectional)));
    }
}
