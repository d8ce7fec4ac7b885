use std::sync::Arc;

use formwright_core::{AppError, AppResult};
use formwright_domain::{FormSchema, HttpMethod};
use serde_json::Value;

use crate::config::FormEngineConfig;
use crate::execution::resolve_url;
use crate::ports::{HttpTransport, RequestBody, RequestPlan};

/// Fetches form schemas from the configured backend.
pub struct FormSchemaClient {
    config: FormEngineConfig,
    transport: Arc<dyn HttpTransport>,
}

impl FormSchemaClient {
    /// Creates a schema client over a transport.
    #[must_use]
    pub fn new(config: FormEngineConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self { config, transport }
    }

    /// Fetches and parses one schema by form id, using the configured path
    /// template (with its `{id}` placeholder) or `/{id}` by default.
    pub async fn fetch_by_id(&self, form_id: &str) -> AppResult<FormSchema> {
        if form_id.trim().is_empty() {
            return Err(AppError::Configuration("form id is required".to_owned()));
        }

        let path = match self.config.schema_path_template.as_deref() {
            Some(template) => template.replace("{id}", form_id),
            None => format!("/{form_id}"),
        };
        let url = resolve_url(self.config.api_base_url.as_deref(), path.as_str());

        let response = self
            .transport
            .send(RequestPlan {
                method: HttpMethod::Get,
                url,
                headers: Vec::new(),
                query: Vec::new(),
                body: RequestBody::None,
                skip_auth: false,
            })
            .await?;

        if !response.is_success() {
            return Err(AppError::Transport(format!(
                "schema fetch failed with status {}",
                response.status
            )));
        }

        parse_schema_body(&response.body)
    }
}

/// Parses a schema response body: unwraps a `form_data` envelope and accepts
/// schemas delivered as JSON strings.
pub fn parse_schema_body(body: &Value) -> AppResult<FormSchema> {
    let raw = body.get("form_data").unwrap_or(body);

    let parsed = match raw {
        Value::String(text) => serde_json::from_str::<FormSchema>(text.as_str()),
        other => serde_json::from_value::<FormSchema>(other.clone()),
    };

    parsed.map_err(|error| AppError::Validation(format!("invalid form schema: {error}")))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex, PoisonError};

    use async_trait::async_trait;
    use formwright_core::{AppError, AppResult};
    use serde_json::{Value, json};

    use super::{FormSchemaClient, parse_schema_body};
    use crate::config::FormEngineConfig;
    use crate::ports::{ApiResponse, HttpTransport, RequestPlan};

    struct RecordingTransport {
        urls: Mutex<Vec<String>>,
        body: Value,
    }

    #[async_trait]
    impl HttpTransport for RecordingTransport {
        async fn send(&self, plan: RequestPlan) -> AppResult<ApiResponse> {
            self.urls
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(plan.url);
            Ok(ApiResponse {
                status: 200,
                body: self.body.clone(),
            })
        }
    }

    fn minimal_schema_json() -> Value {
        json!({"id": "contact", "fields": [{"id": "name", "type": "text"}]})
    }

    #[test]
    fn parse_unwraps_form_data_envelopes() {
        let parsed = parse_schema_body(&json!({"form_data": minimal_schema_json()}));
        assert!(matches!(parsed, Ok(schema) if schema.id() == "contact"));
    }

    #[test]
    fn parse_accepts_json_string_payloads() {
        let text = minimal_schema_json().to_string();
        let parsed = parse_schema_body(&json!({"form_data": text}));
        assert!(matches!(parsed, Ok(schema) if schema.id() == "contact"));
    }

    #[test]
    fn parse_rejects_malformed_schemas() {
        let parsed = parse_schema_body(&json!({"fields": "not-a-list"}));
        assert!(matches!(parsed, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn fetch_uses_the_configured_path_template() {
        let transport = Arc::new(RecordingTransport {
            urls: Mutex::new(Vec::new()),
            body: minimal_schema_json(),
        });
        let client = FormSchemaClient::new(
            FormEngineConfig {
                api_base_url: Some("https://api.x/".to_owned()),
                schema_path_template: Some("/forms/{id}/schema".to_owned()),
                ..FormEngineConfig::default()
            },
            Arc::clone(&transport) as Arc<dyn HttpTransport>,
        );

        let fetched = client.fetch_by_id("contact").await;
        assert!(fetched.is_ok());

        let urls = transport
            .urls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        assert_eq!(urls, vec!["https://api.x/forms/contact/schema".to_owned()]);
    }
}
