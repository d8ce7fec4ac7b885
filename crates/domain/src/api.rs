use std::collections::BTreeMap;
use std::str::FromStr;

use formwright_core::AppError;
use serde::{Deserialize, Serialize};

/// HTTP method for a declarative endpoint call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// Read request; body flattens into query parameters.
    #[default]
    Get,
    /// Create request.
    Post,
    /// Replace request.
    Put,
    /// Partial update request.
    Patch,
    /// Delete request.
    Delete,
}

impl HttpMethod {
    /// Returns the canonical wire value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// Returns whether requests of this method carry a body.
    #[must_use]
    pub fn allows_body(&self) -> bool {
        !matches!(self, Self::Get)
    }
}

impl FromStr for HttpMethod {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            _ => Err(AppError::Validation(format!(
                "unknown HTTP method '{value}'"
            ))),
        }
    }
}

/// One ordered key/value template pair for headers, query, or path params.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValuePair {
    key: String,
    value: String,
}

impl KeyValuePair {
    /// Creates one key/value pair.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Returns the key.
    #[must_use]
    pub fn key(&self) -> &str {
        self.key.as_str()
    }

    /// Returns the value template.
    #[must_use]
    pub fn value(&self) -> &str {
        self.value.as_str()
    }
}

/// Declarative HTTP call descriptor: method, URL with optional `{param}` or
/// `:param` placeholders, template-driven headers, query, and body mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEndpointConfig {
    #[serde(default)]
    method: HttpMethod,
    url: String,
    #[serde(default)]
    headers: Vec<KeyValuePair>,
    #[serde(default)]
    query_params: Vec<KeyValuePair>,
    #[serde(default)]
    body_mapping: Option<BTreeMap<String, String>>,
    #[serde(default)]
    path_params: Vec<KeyValuePair>,
}

impl ApiEndpointConfig {
    /// Creates a bare endpoint descriptor with no mappings.
    #[must_use]
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            query_params: Vec::new(),
            body_mapping: None,
            path_params: Vec::new(),
        }
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Returns the raw URL, absolute or relative.
    #[must_use]
    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns the declared header pairs in order.
    #[must_use]
    pub fn headers(&self) -> &[KeyValuePair] {
        self.headers.as_slice()
    }

    /// Returns the declared query pairs in order.
    #[must_use]
    pub fn query_params(&self) -> &[KeyValuePair] {
        self.query_params.as_slice()
    }

    /// Returns the body mapping, absent meaning raw form-value pass-through.
    #[must_use]
    pub fn body_mapping(&self) -> Option<&BTreeMap<String, String>> {
        self.body_mapping.as_ref()
    }

    /// Returns the declared path-parameter pairs in order.
    #[must_use]
    pub fn path_params(&self) -> &[KeyValuePair] {
        self.path_params.as_slice()
    }
}

/// Submit/button action API wrapper with renderer-facing messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionApiConfig {
    #[serde(default)]
    trigger_validation: Option<bool>,
    #[serde(default)]
    success_message: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
    api: ApiEndpointConfig,
}

impl ActionApiConfig {
    /// Returns whether this action validates the form before executing.
    #[must_use]
    pub fn trigger_validation(&self) -> bool {
        self.trigger_validation.unwrap_or(true)
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

    /// Returns the endpoint descriptor.
    #[must_use]
    pub fn api(&self) -> &ApiEndpointConfig {
        &self.api
    }
}

/// Content-type negotiation mode for outgoing bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContentTypeMode {
    /// Multipart when a file is present anywhere in the body, JSON otherwise.
    #[default]
    Auto,
    /// Always JSON.
    Json,
    /// Always multipart form data.
    Multipart,
}
