use std::collections::BTreeMap;
use std::sync::Arc;

use formwright_core::{AppError, AppResult};
use formwright_domain::{
    ApiEndpointConfig, ContentTypeMode, FieldValue, FormValues, TokenFrom,
};

use crate::config::FormEngineConfig;
use crate::ports::{ApiResponse, HttpTransport, MultipartPart, RequestBody, RequestPlan, TokenStore};
use crate::resolver::{interpolate, resolve_expression};

const DEFAULT_TOKEN_KEY: &str = "access_token";

/// Per-request bearer configuration, mainly for option loads.
#[derive(Debug, Clone)]
pub struct BearerAuth {
    /// Token source to read from.
    pub source: TokenFrom,
    /// Storage key, defaulting to `access_token`.
    pub token_key: Option<String>,
}

/// Per-call execution context carrying live form data and auth choices.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    /// Current form-value snapshot used by template resolution.
    pub form_values: FormValues,
    /// Path parameters substituted into `{name}` and `:name` placeholders.
    pub path_params: BTreeMap<String, String>,
    /// Extra query pairs appended after the endpoint's declared ones.
    pub extra_query: Vec<(String, String)>,
    /// Wraps the outgoing payload under this key when no body mapping is set.
    pub payload_key: Option<String>,
    /// Content-type negotiation mode.
    pub content_type: ContentTypeMode,
    /// Per-request bearer auth.
    pub bearer_auth: Option<BearerAuth>,
    /// Signals the auth-attaching layer to leave this request alone.
    pub skip_auth: bool,
    /// Base URL override; the engine falls back to the configured API base.
    pub base_url: Option<String>,
}

/// Executes declarative endpoint descriptions against live form data.
///
/// Planning is pure and synchronous; only the transport call suspends.
pub struct ApiExecutionEngine {
    config: FormEngineConfig,
    transport: Arc<dyn HttpTransport>,
    token_store: Option<Arc<dyn TokenStore>>,
}

impl ApiExecutionEngine {
    /// Creates an engine over a transport and optional token store.
    #[must_use]
    pub fn new(
        config: FormEngineConfig,
        transport: Arc<dyn HttpTransport>,
        token_store: Option<Arc<dyn TokenStore>>,
    ) -> Self {
        Self {
            config,
            transport,
            token_store,
        }
    }

    /// Returns the engine configuration.
    #[must_use]
    pub fn config(&self) -> &FormEngineConfig {
        &self.config
    }

    /// Plans and sends one declarative call. Transport failures propagate
    /// untouched; HTTP status codes are carried in the response
    /// un-classified.
    pub async fn execute(
        &self,
        endpoint: &ApiEndpointConfig,
        context: &ExecutionContext,
    ) -> AppResult<ApiResponse> {
        let plan = self.plan(endpoint, context)?;
        self.transport.send(plan).await
    }

    /// Resolves a declarative endpoint into a concrete request plan.
    ///
    /// Fails fast with a configuration error when the endpoint URL is
    /// missing, before any network attempt.
    pub fn plan(
        &self,
        endpoint: &ApiEndpointConfig,
        context: &ExecutionContext,
    ) -> AppResult<RequestPlan> {
        if endpoint.url().trim().is_empty() {
            return Err(AppError::Configuration(
                "API endpoint url is required".to_owned(),
            ));
        }

        let base = context
            .base_url
            .as_deref()
            .or(self.config.api_base_url.as_deref());
        let mut url = resolve_url(base, endpoint.url());
        url = substitute_path_params(url.as_str(), endpoint, context);

        let headers = self.build_headers(endpoint, context);
        let mut query = build_declared_query(endpoint, context);

        let method = endpoint.method();
        let body = if method.allows_body() {
            negotiate_body(build_body(endpoint, context), context.content_type)
        } else {
            // GET carries no body; the constructed body flattens into the query
            flatten_into_query(&build_body(endpoint, context), &mut query);
            RequestBody::None
        };

        Ok(RequestPlan {
            method,
            url,
            headers,
            query,
            body,
            skip_auth: context.skip_auth,
        })
    }

    fn build_headers(
        &self,
        endpoint: &ApiEndpointConfig,
        context: &ExecutionContext,
    ) -> Vec<(String, String)> {
        let mut headers = Vec::new();
        for pair in endpoint.headers() {
            let key = pair.key().trim();
            if key.is_empty() {
                continue;
            }

            let resolved = interpolate(pair.value(), &context.form_values);
            if !resolved.is_empty() {
                headers.push((key.to_owned(), resolved));
            }
        }

        if let Some(auth) = context.bearer_auth.as_ref()
            && let Some(store) = self.token_store.as_ref()
        {
            let key = auth.token_key.as_deref().unwrap_or(DEFAULT_TOKEN_KEY);
            if let Some(token) = store.bearer_token(auth.source, key) {
                headers.push(("Authorization".to_owned(), format!("Bearer {token}")));
            }
        }

        headers
    }
}

/// Resolves a raw endpoint URL against an optional base URL.
///
/// Absolute URLs pass through; otherwise trailing slashes on the base and a
/// missing leading slash on the path collapse to exactly one separator. With
/// no base the path stays site-root-relative.
#[must_use]
pub fn resolve_url(base: Option<&str>, url: &str) -> String {
    let url = url.trim();
    if is_absolute(url) {
        return url.to_owned();
    }

    let base = base.unwrap_or("").trim_end_matches('/');
    let path = if url.starts_with('/') {
        url.to_owned()
    } else {
        format!("/{url}")
    };

    if base.is_empty() {
        path
    } else {
        format!("{base}{path}")
    }
}

fn is_absolute(url: &str) -> bool {
    let prefix = url.chars().take(8).collect::<String>().to_ascii_lowercase();
    prefix.starts_with("http://") || prefix.starts_with("https://")
}

fn substitute_path_params(
    url: &str,
    endpoint: &ApiEndpointConfig,
    context: &ExecutionContext,
) -> String {
    let mut params: BTreeMap<String, String> = endpoint
        .path_params()
        .iter()
        .filter(|pair| !pair.key().trim().is_empty())
        .map(|pair| {
            (
                pair.key().trim().to_owned(),
                interpolate(pair.value(), &context.form_values),
            )
        })
        .collect();
    params.extend(
        context
            .path_params
            .iter()
            .map(|(key, value)| (key.clone(), value.clone())),
    );

    let mut resolved = url.to_owned();
    for (key, value) in &params {
        resolved = resolved.replace(format!("{{{key}}}").as_str(), value);
        resolved = resolved.replace(format!(":{key}").as_str(), value);
    }

    resolved
}

fn build_declared_query(
    endpoint: &ApiEndpointConfig,
    context: &ExecutionContext,
) -> Vec<(String, String)> {
    let mut query = Vec::new();
    for pair in endpoint.query_params() {
        let key = pair.key().trim();
        if key.is_empty() {
            continue;
        }

        let resolved = interpolate(pair.value(), &context.form_values);
        if !resolved.is_empty() {
            query.push((key.to_owned(), resolved));
        }
    }

    query.extend(context.extra_query.iter().cloned());
    query
}

fn build_body(endpoint: &ApiEndpointConfig, context: &ExecutionContext) -> FieldValue {
    if let Some(mapping) = endpoint.body_mapping() {
        let mut body = BTreeMap::new();
        for (key, expr) in mapping {
            body.insert(
                key.clone(),
                resolve_expression(expr.as_str(), &context.form_values),
            );
        }

        return FieldValue::Object(body);
    }

    let raw = FieldValue::Object(context.form_values.clone());
    match context.payload_key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => {
            let mut wrapped = BTreeMap::new();
            wrapped.insert(key.to_owned(), raw);
            FieldValue::Object(wrapped)
        }
        _ => raw,
    }
}

fn negotiate_body(body: FieldValue, mode: ContentTypeMode) -> RequestBody {
    let multipart = match mode {
        ContentTypeMode::Multipart => true,
        ContentTypeMode::Auto => body.contains_file(),
        ContentTypeMode::Json => false,
    };

    if multipart {
        let mut parts = Vec::new();
        if let FieldValue::Object(map) = &body {
            for (key, value) in map {
                append_multipart(&mut parts, key, value);
            }
        }

        RequestBody::Multipart(parts)
    } else {
        RequestBody::Json(body.to_json())
    }
}

fn append_multipart(parts: &mut Vec<MultipartPart>, key: &str, value: &FieldValue) {
    match value {
        FieldValue::Null => {}
        FieldValue::File(file) => parts.push(MultipartPart::File {
            name: key.to_owned(),
            file: file.clone(),
        }),
        FieldValue::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                append_multipart(parts, format!("{key}[{index}]").as_str(), item);
            }
        }
        FieldValue::Object(map) => {
            for (sub_key, sub_value) in map {
                append_multipart(parts, format!("{key}.{sub_key}").as_str(), sub_value);
            }
        }
        _ => parts.push(MultipartPart::Text {
            name: key.to_owned(),
            value: value.to_display_string(),
        }),
    }
}

fn flatten_into_query(body: &FieldValue, query: &mut Vec<(String, String)>) {
    let FieldValue::Object(map) = body else {
        return;
    };

    for (key, value) in map {
        append_query(query, key, value);
    }
}

fn append_query(query: &mut Vec<(String, String)>, key: &str, value: &FieldValue) {
    match value {
        FieldValue::Null => {}
        FieldValue::Array(items) => {
            // each element becomes a repeated parameter under the same key
            for item in items {
                append_query(query, key, item);
            }
        }
        FieldValue::Object(_) => {
            query.push((key.to_owned(), value.to_json().to_string()));
        }
        _ => query.push((key.to_owned(), value.to_display_string())),
    }
}
