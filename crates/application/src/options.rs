use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use formwright_core::{AppError, AppResult};
use formwright_domain::{
    ApiEndpointConfig, FieldOption, FieldSchema, FormValues, HttpMethod, OptionsSourceMode,
    ResponseMapping, SelectOptionsApiConfig,
};
use serde_json::Value;
use tokio::sync::OnceCell;

use crate::execution::{ApiExecutionEngine, BearerAuth, ExecutionContext};
use crate::resolver::json_at_path;

/// Structured cache key for one field's remote options.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OptionsCacheKey {
    field_id: String,
    method: HttpMethod,
    url: String,
    mapping: ResponseMapping,
}

impl OptionsCacheKey {
    fn new(field: &FieldSchema, api: &SelectOptionsApiConfig) -> Self {
        Self {
            field_id: field.id().to_owned(),
            method: api.method(),
            url: api.url().to_owned(),
            mapping: api.response_mapping().clone(),
        }
    }

    fn belongs_to(&self, field_id: &str) -> bool {
        self.field_id == field_id
    }
}

type OptionsCell = Arc<OnceCell<Vec<FieldOption>>>;

/// Loads select-field options through the execution engine, memoizing both
/// completed and in-flight loads per structured cache key.
///
/// Concurrent loads for the same key share one underlying request. A failed
/// load is not memoized unless `cache_failed_option_loads` is set, in which
/// case the failure sticks until cleared.
pub struct SelectOptionsLoader {
    engine: Arc<ApiExecutionEngine>,
    cells: Mutex<HashMap<OptionsCacheKey, OptionsCell>>,
    failed: Mutex<HashSet<OptionsCacheKey>>,
}

impl SelectOptionsLoader {
    /// Creates a loader over an execution engine.
    #[must_use]
    pub fn new(engine: Arc<ApiExecutionEngine>) -> Self {
        Self {
            engine,
            cells: Mutex::new(HashMap::new()),
            failed: Mutex::new(HashSet::new()),
        }
    }

    /// Resolves options for one field. Static sources (or fields without an
    /// options source) resolve immediately from the schema; API sources go
    /// through the engine with caching.
    pub async fn load(
        &self,
        field: &FieldSchema,
        form_values: &FormValues,
    ) -> AppResult<Vec<FieldOption>> {
        let api = match field.options_source() {
            Some(source) if source.mode() == OptionsSourceMode::Api => source.api(),
            _ => {
                return Ok(field.options().map(<[FieldOption]>::to_vec).unwrap_or_default());
            }
        };

        let Some(api) = api else {
            return Ok(Vec::new());
        };
        if api.url().trim().is_empty() {
            return Ok(Vec::new());
        }

        let key = OptionsCacheKey::new(field, api);
        if self.engine.config().cache_failed_option_loads
            && self
                .failed
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .contains(&key)
        {
            return Err(AppError::Transport("failed to load options".to_owned()));
        }

        let cell = {
            let mut cells = self.cells.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(cells.entry(key.clone()).or_default())
        };

        let loaded = cell
            .get_or_try_init(|| self.fetch(field, api, form_values))
            .await;

        match loaded {
            Ok(options) => Ok(options.clone()),
            Err(error) => {
                if self.engine.config().cache_failed_option_loads {
                    self.failed
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .insert(key);
                }

                Err(AppError::Transport(format!(
                    "failed to load options: {error}"
                )))
            }
        }
    }

    /// Clears one field's cache entries, or the entire cache.
    pub fn clear(&self, field_id: Option<&str>) {
        let mut cells = self.cells.lock().unwrap_or_else(PoisonError::into_inner);
        let mut failed = self.failed.lock().unwrap_or_else(PoisonError::into_inner);

        match field_id {
            Some(field_id) => {
                cells.retain(|key, _| !key.belongs_to(field_id));
                failed.retain(|key| !key.belongs_to(field_id));
            }
            None => {
                cells.clear();
                failed.clear();
            }
        }
    }

    async fn fetch(
        &self,
        field: &FieldSchema,
        api: &SelectOptionsApiConfig,
        form_values: &FormValues,
    ) -> AppResult<Vec<FieldOption>> {
        let wants_bearer = api.wants_bearer();
        let context = ExecutionContext {
            form_values: form_values.clone(),
            bearer_auth: wants_bearer.then(|| BearerAuth {
                source: api.token_from(),
                token_key: api.token_key().map(str::to_owned),
            }),
            // unsecured option loads must not pick up the global token
            skip_auth: !wants_bearer,
            base_url: self
                .engine
                .config()
                .select_options_base()
                .map(str::to_owned),
            ..ExecutionContext::default()
        };

        let endpoint = ApiEndpointConfig::new(api.method(), api.url());
        let response = self.engine.execute(&endpoint, &context).await?;
        if !response.is_success() {
            return Err(AppError::Transport(format!(
                "options endpoint returned status {}",
                response.status
            )));
        }

        Ok(map_options(&response.body, api.response_mapping()))
    }
}

/// Projects a raw options response through the configured mapping.
#[must_use]
pub fn map_options(body: &Value, mapping: &ResponseMapping) -> Vec<FieldOption> {
    let data = match mapping.data_path() {
        Some(path) => json_at_path(body, path),
        None => Some(body),
    };
    let Some(data) = data else {
        return Vec::new();
    };

    let items = match data.as_array() {
        Some(items) => items,
        None => match data.get("items").and_then(Value::as_array) {
            Some(items) => items,
            None => return Vec::new(),
        },
    };

    items
        .iter()
        .filter_map(|item| {
            let label = match item.get(mapping.label_key()) {
                Some(Value::String(text)) if !text.is_empty() => text.clone(),
                Some(Value::Number(number)) => number.to_string(),
                Some(Value::Bool(flag)) => flag.to_string(),
                _ => return None,
            };
            let value = item.get(mapping.value_key())?.clone();
            Some(FieldOption::new(label, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use formwright_core::{AppError, AppResult};
    use formwright_domain::{FieldSchema, FormValues, ResponseMapping};
    use serde_json::{Value, json};

    use super::{SelectOptionsLoader, map_options};
    use crate::config::FormEngineConfig;
    use crate::execution::ApiExecutionEngine;
    use crate::ports::{ApiResponse, HttpTransport, RequestPlan};

    struct CountingTransport {
        calls: AtomicUsize,
        responses: Vec<AppResult<ApiResponse>>,
    }

    impl CountingTransport {
        fn ok(body: Value) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                responses: vec![Ok(ApiResponse { status: 200, body })],
            }
        }

        fn sequence(responses: Vec<AppResult<ApiResponse>>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                responses,
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HttpTransport for CountingTransport {
        async fn send(&self, _plan: RequestPlan) -> AppResult<ApiResponse> {
            let index = self.calls.fetch_add(1, Ordering::SeqCst);
            match self
                .responses
                .get(index.min(self.responses.len().saturating_sub(1)))
            {
                Some(Ok(response)) => Ok(response.clone()),
                Some(Err(error)) => Err(AppError::Transport(error.to_string())),
                None => Err(AppError::Transport("no scripted response".to_owned())),
            }
        }
    }

    fn field(raw: serde_json::Value) -> FieldSchema {
        serde_json::from_value(raw).unwrap_or_else(|_| unreachable!("test schemas are valid"))
    }

    fn api_field() -> FieldSchema {
        field(json!({
            "id": "country",
            "type": "select",
            "optionsSource": {
                "mode": "API",
                "api": {
                    "url": "/countries",
                    "method": "GET",
                    "responseMapping": {"labelKey": "name", "valueKey": "code"}
                }
            }
        }))
    }

    fn loader_with(
        transport: Arc<CountingTransport>,
        cache_failures: bool,
    ) -> SelectOptionsLoader {
        let engine = ApiExecutionEngine::new(
            FormEngineConfig {
                cache_failed_option_loads: cache_failures,
                ..FormEngineConfig::default()
            },
            transport,
            None,
        );
        SelectOptionsLoader::new(Arc::new(engine))
    }

    #[tokio::test]
    async fn static_sources_resolve_from_the_schema() {
        let transport = Arc::new(CountingTransport::ok(Value::Null));
        let loader = loader_with(Arc::clone(&transport), false);

        let static_field = field(json!({
            "id": "color",
            "type": "select",
            "options": [{"label": "Red", "value": "r"}],
            "optionsSource": {"mode": "STATIC"}
        }));

        let options = loader.load(&static_field, &FormValues::new()).await;
        assert!(matches!(options, Ok(options) if options.len() == 1));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn repeated_loads_share_one_underlying_request() {
        let transport = Arc::new(CountingTransport::ok(
            json!([{"name": "Germany", "code": "DE"}]),
        ));
        let loader = loader_with(Arc::clone(&transport), false);
        let schema_field = api_field();

        let first = loader.load(&schema_field, &FormValues::new()).await;
        let second = loader.load(&schema_field, &FormValues::new()).await;

        assert!(matches!(first, Ok(options) if options.len() == 1));
        assert!(matches!(second, Ok(options) if options.len() == 1));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn clear_forces_a_fresh_request() {
        let transport = Arc::new(CountingTransport::ok(
            json!([{"name": "Germany", "code": "DE"}]),
        ));
        let loader = loader_with(Arc::clone(&transport), false);
        let schema_field = api_field();

        let first = loader.load(&schema_field, &FormValues::new()).await;
        assert!(first.is_ok());
        loader.clear(Some("country"));
        let second = loader.load(&schema_field, &FormValues::new()).await;
        assert!(second.is_ok());

        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn failures_are_retried_by_default() {
        let transport = Arc::new(CountingTransport::sequence(vec![
            Err(AppError::Transport("boom".to_owned())),
            Ok(ApiResponse {
                status: 200,
                body: json!([{"name": "Germany", "code": "DE"}]),
            }),
        ]));
        let loader = loader_with(Arc::clone(&transport), false);
        let schema_field = api_field();

        let first = loader.load(&schema_field, &FormValues::new()).await;
        assert!(matches!(first, Err(AppError::Transport(message)) if message.contains("failed to load options")));

        let second = loader.load(&schema_field, &FormValues::new()).await;
        assert!(matches!(second, Ok(options) if options.len() == 1));
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn failures_stick_when_configured_to_cache() {
        let transport = Arc::new(CountingTransport::sequence(vec![Err(AppError::Transport(
            "boom".to_owned(),
        ))]));
        let loader = loader_with(Arc::clone(&transport), true);
        let schema_field = api_field();

        let first = loader.load(&schema_field, &FormValues::new()).await;
        assert!(first.is_err());
        let second = loader.load(&schema_field, &FormValues::new()).await;
        assert!(second.is_err());

        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn non_success_status_surfaces_as_load_failure() {
        let transport = Arc::new(CountingTransport::sequence(vec![Ok(ApiResponse {
            status: 503,
            body: Value::Null,
        })]));
        let loader = loader_with(Arc::clone(&transport), false);

        let result = loader.load(&api_field(), &FormValues::new()).await;
        assert!(matches!(result, Err(AppError::Transport(message)) if message.contains("failed to load options")));
    }

    #[test]
    fn mapping_projects_items_and_skips_incomplete_entries() {
        let mapping = ResponseMapping::new("name", "code", Some("data.countries".to_owned()));
        let body = json!({
            "data": {
                "countries": [
                    {"name": "Germany", "code": "DE"},
                    {"name": "", "code": "XX"},
                    {"code": "YY"},
                    {"name": "France"}
                ]
            }
        });

        let options = map_options(&body, &mapping);
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].label(), "Germany");
        assert_eq!(options[0].value(), &json!("DE"));
    }

    #[test]
    fn mapping_falls_back_to_an_items_wrapper() {
        let mapping = ResponseMapping::new("label", "value", None);
        let body = json!({"items": [{"label": "A", "value": 1}]});

        let options = map_options(&body, &mapping);
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].value(), &json!(1));
    }
}
