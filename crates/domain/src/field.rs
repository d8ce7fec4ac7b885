use std::str::FromStr;

use formwright_core::AppError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::accept::normalize_accept;
use crate::api::{ApiEndpointConfig, HttpMethod};
use crate::value::FieldValue;
use crate::visibility::VisibilitySchema;

/// Supported declarative field types.
///
/// Card, info-card, and button fields are layout elements: they never carry
/// a backing control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Single-line text input.
    Text,
    /// Masked text input.
    Password,
    /// Numeric input.
    Number,
    /// Email input with implicit format validation.
    Email,
    /// Multi-line text input.
    Textarea,
    /// Option picker backed by static or remote options.
    Select,
    /// Boolean toggle.
    Checkbox,
    /// Exclusive option picker.
    Radio,
    /// Date input.
    Date,
    /// File picker.
    File,
    /// Informational card block, no control.
    Card,
    /// Informational card block (alternate wire name), no control.
    #[serde(rename = "info-card")]
    InfoCard,
    /// Action button, no control.
    Button,
}

impl FieldType {
    /// Returns the canonical wire value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Password => "password",
            Self::Number => "number",
            Self::Email => "email",
            Self::Textarea => "textarea",
            Self::Select => "select",
            Self::Checkbox => "checkbox",
            Self::Radio => "radio",
            Self::Date => "date",
            Self::File => "file",
            Self::Card => "card",
            Self::InfoCard => "info-card",
            Self::Button => "button",
        }
    }

    /// Returns whether fields of this type carry a backing control.
    #[must_use]
    pub fn is_input(&self) -> bool {
        !matches!(self, Self::Card | Self::InfoCard | Self::Button)
    }

    /// Returns the default control value for this type.
    #[must_use]
    pub fn default_value(&self) -> FieldValue {
        match self {
            Self::Checkbox => FieldValue::Bool(false),
            Self::Select | Self::Radio | Self::File => FieldValue::Null,
            _ => FieldValue::Text(String::new()),
        }
    }
}

impl FromStr for FieldType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "text" => Ok(Self::Text),
            "password" => Ok(Self::Password),
            "number" => Ok(Self::Number),
            "email" => Ok(Self::Email),
            "textarea" => Ok(Self::Textarea),
            "select" => Ok(Self::Select),
            "checkbox" => Ok(Self::Checkbox),
            "radio" => Ok(Self::Radio),
            "date" => Ok(Self::Date),
            "file" => Ok(Self::File),
            "card" => Ok(Self::Card),
            "info-card" => Ok(Self::InfoCard),
            "button" => Ok(Self::Button),
            _ => Err(AppError::Validation(format!("unknown field type '{value}'"))),
        }
    }
}

/// Boolean-ish required flag: schemas carry `true`/`false` or the strings
/// `"true"`/`"false"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequiredFlag {
    /// Plain boolean form.
    Flag(bool),
    /// String form.
    Text(String),
}

impl RequiredFlag {
    /// Returns whether the flag is effectively set.
    #[must_use]
    pub fn is_true(&self) -> bool {
        match self {
            Self::Flag(flag) => *flag,
            Self::Text(text) => text == "true",
        }
    }
}

/// Declarative validation knobs for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRules {
    #[serde(default)]
    required: Option<bool>,
    #[serde(default)]
    min_length: Option<u32>,
    #[serde(default)]
    max_length: Option<u32>,
    #[serde(default)]
    pattern: Option<String>,
    #[serde(default)]
    min: Option<f64>,
    #[serde(default)]
    max: Option<f64>,
}

impl ValidationRules {
    /// Returns the required override.
    #[must_use]
    pub fn required(&self) -> Option<bool> {
        self.required
    }

    /// Returns the minimum string length.
    #[must_use]
    pub fn min_length(&self) -> Option<u32> {
        self.min_length
    }

    /// Returns the maximum string length.
    #[must_use]
    pub fn max_length(&self) -> Option<u32> {
        self.max_length
    }

    /// Returns the full-match regex pattern.
    #[must_use]
    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }

    /// Returns the numeric lower bound.
    #[must_use]
    pub fn min(&self) -> Option<f64> {
        self.min
    }

    /// Returns the numeric upper bound.
    #[must_use]
    pub fn max(&self) -> Option<f64> {
        self.max
    }
}

/// One selectable option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOption {
    label: String,
    value: Value,
}

impl FieldOption {
    /// Creates one option.
    #[must_use]
    pub fn new(label: impl Into<String>, value: Value) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }

    /// Returns the display label.
    #[must_use]
    pub fn label(&self) -> &str {
        self.label.as_str()
    }

    /// Returns the submitted value.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// Where a select field's options come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OptionsSourceMode {
    /// Options are listed inline in the schema.
    Static,
    /// Options are loaded from a remote endpoint.
    Api,
}

/// Auth mode for option-loading calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SelectAuthType {
    /// No Authorization header.
    None,
    /// Bearer token attachment.
    Bearer,
}

/// Bearer token source for per-call auth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenFrom {
    /// Persistent per-origin storage.
    #[default]
    LocalStorage,
    /// Per-tab storage.
    SessionStorage,
    /// Caller-supplied callback.
    CustomCallback,
}

/// Projection from a raw options response onto label/value pairs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMapping {
    label_key: String,
    value_key: String,
    #[serde(default)]
    data_path: Option<String>,
}

impl ResponseMapping {
    /// Creates a response mapping.
    #[must_use]
    pub fn new(
        label_key: impl Into<String>,
        value_key: impl Into<String>,
        data_path: Option<String>,
    ) -> Self {
        Self {
            label_key: label_key.into(),
            value_key: value_key.into(),
            data_path,
        }
    }

    /// Returns the per-item label key.
    #[must_use]
    pub fn label_key(&self) -> &str {
        self.label_key.as_str()
    }

    /// Returns the per-item value key.
    #[must_use]
    pub fn value_key(&self) -> &str {
        self.value_key.as_str()
    }

    /// Returns the dotted path locating the item list in the response.
    #[must_use]
    pub fn data_path(&self) -> Option<&str> {
        self.data_path.as_deref()
    }
}

/// Remote endpoint description for API-sourced options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectOptionsApiConfig {
    url: String,
    #[serde(default)]
    method: HttpMethod,
    #[serde(default)]
    secured: Option<bool>,
    #[serde(default)]
    auth_type: Option<SelectAuthType>,
    #[serde(default)]
    token_from: Option<TokenFrom>,
    #[serde(default)]
    token_key: Option<String>,
    response_mapping: ResponseMapping,
}

impl SelectOptionsApiConfig {
    /// Returns the endpoint URL.
    #[must_use]
    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Returns whether the call opted into bearer auth.
    #[must_use]
    pub fn wants_bearer(&self) -> bool {
        self.secured == Some(true) && self.auth_type == Some(SelectAuthType::Bearer)
    }

    /// Returns the configured token source.
    #[must_use]
    pub fn token_from(&self) -> TokenFrom {
        self.token_from.unwrap_or_default()
    }

    /// Returns the configured token storage key.
    #[must_use]
    pub fn token_key(&self) -> Option<&str> {
        self.token_key.as_deref()
    }

    /// Returns the response projection.
    #[must_use]
    pub fn response_mapping(&self) -> &ResponseMapping {
        &self.response_mapping
    }
}

/// Declarative source of a select field's options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionsSource {
    mode: OptionsSourceMode,
    #[serde(default)]
    api: Option<SelectOptionsApiConfig>,
}

impl OptionsSource {
    /// Returns the source mode.
    #[must_use]
    pub fn mode(&self) -> OptionsSourceMode {
        self.mode
    }

    /// Returns the API descriptor for API mode.
    #[must_use]
    pub fn api(&self) -> Option<&SelectOptionsApiConfig> {
        self.api.as_ref()
    }
}

/// Non-input informational card block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfoCard {
    title: String,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    icon: Option<String>,
}

impl InfoCard {
    /// Returns the card title.
    #[must_use]
    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    /// Returns the card body text.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Returns the card icon token.
    #[must_use]
    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }
}

/// Supported button actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ButtonActionType {
    /// Execute the button's declarative API call.
    ApiCall,
}

/// Button action descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonElement {
    label: String,
    #[serde(default)]
    action_type: Option<ButtonActionType>,
    #[serde(default)]
    api: Option<ApiEndpointConfig>,
    #[serde(default)]
    success_message: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    trigger_validation: Option<bool>,
}

impl ButtonElement {
    /// Returns the button label.
    #[must_use]
    pub fn label(&self) -> &str {
        self.label.as_str()
    }

    /// Returns the action kind.
    #[must_use]
    pub fn action_type(&self) -> Option<ButtonActionType> {
        self.action_type
    }

    /// Returns the endpoint executed on click.
    #[must_use]
    pub fn api(&self) -> Option<&ApiEndpointConfig> {
        self.api.as_ref()
    }

    /// Returns the schema-configured success message.
    #[must_use]
    pub fn success_message(&self) -> Option<&str> {
        self.success_message.as_deref()
    }

    /// Returns the schema-configured failure message.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Returns whether the click validates the form first.
    #[must_use]
    pub fn trigger_validation(&self) -> bool {
        self.trigger_validation.unwrap_or(false)
    }
}

/// One declarative field definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchema {
    id: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type")]
    field_type: FieldType,
    #[serde(default)]
    placeholder: Option<String>,
    #[serde(default)]
    required: Option<RequiredFlag>,
    #[serde(default)]
    options: Option<Vec<FieldOption>>,
    #[serde(default)]
    options_source: Option<OptionsSource>,
    #[serde(default)]
    validations: Option<ValidationRules>,
    #[serde(default)]
    multiple: Option<bool>,
    #[serde(default)]
    accept: Option<String>,
    #[serde(default, rename = "maxSizeMB")]
    max_size_mb: Option<f64>,
    #[serde(default)]
    max_files: Option<u32>,
    #[serde(default)]
    card: Option<InfoCard>,
    #[serde(default)]
    button: Option<ButtonElement>,
    #[serde(default)]
    visibility: Option<VisibilitySchema>,
}

impl FieldSchema {
    /// Returns the stable field identity.
    #[must_use]
    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    /// Returns the display label.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Returns the optional alternate key.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the key this field's control lives under: `name`, else `id`.
    #[must_use]
    pub fn control_key(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(self.id.as_str())
    }

    /// Returns the field type.
    #[must_use]
    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Returns the placeholder text.
    #[must_use]
    pub fn placeholder(&self) -> Option<&str> {
        self.placeholder.as_deref()
    }

    /// Returns the effective required bit across the flag forms.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required.as_ref().is_some_and(RequiredFlag::is_true)
            || self
                .validations
                .as_ref()
                .is_some_and(|rules| rules.required() == Some(true))
    }

    /// Returns the static option list.
    #[must_use]
    pub fn options(&self) -> Option<&[FieldOption]> {
        self.options.as_deref()
    }

    /// Returns the options source descriptor.
    #[must_use]
    pub fn options_source(&self) -> Option<&OptionsSource> {
        self.options_source.as_ref()
    }

    /// Returns the validation knobs.
    #[must_use]
    pub fn validations(&self) -> Option<&ValidationRules> {
        self.validations.as_ref()
    }

    /// Returns whether the file field accepts several files.
    #[must_use]
    pub fn multiple(&self) -> bool {
        self.multiple.unwrap_or(false)
    }

    /// Returns the file-accept specification.
    #[must_use]
    pub fn accept(&self) -> Option<&str> {
        self.accept.as_deref()
    }

    /// Returns the per-file size ceiling in megabytes.
    #[must_use]
    pub fn max_size_mb(&self) -> Option<f64> {
        self.max_size_mb
    }

    /// Returns the file-count ceiling.
    #[must_use]
    pub fn max_files(&self) -> Option<u32> {
        self.max_files
    }

    /// Returns the card block for card fields.
    #[must_use]
    pub fn card(&self) -> Option<&InfoCard> {
        self.card.as_ref()
    }

    /// Returns the button descriptor for button fields.
    #[must_use]
    pub fn button(&self) -> Option<&ButtonElement> {
        self.button.as_ref()
    }

    /// Returns the visibility rules.
    #[must_use]
    pub fn visibility(&self) -> Option<&VisibilitySchema> {
        self.visibility.as_ref()
    }

    pub(crate) fn normalize_accept_in_place(&mut self) {
        self.accept = self
            .accept
            .take()
            .and_then(|accept| normalize_accept(accept.as_str()));
    }
}
