//! Headless Formwright runner: loads a schema, applies values, validates,
//! and optionally submits. The minimal stand-in for a real renderer.

#![forbid(unsafe_code)]

use std::env;
use std::sync::Arc;

use formwright_application::{
    ApiExecutionEngine, FormEngineConfig, FormSchemaClient, FormSession, HttpTransport,
    SubmitOutcome, parse_schema_body,
};
use formwright_core::{AppError, AppResult};
use formwright_domain::{FormSchema, form_values_from_json};
use formwright_infrastructure::{InMemoryTokenStore, ReqwestHttpTransport};
use serde_json::Value;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct RunnerConfig {
    schema_path: Option<String>,
    form_id: Option<String>,
    api_base_url: Option<String>,
    values_path: Option<String>,
    bearer_token: Option<String>,
    submit: bool,
}

impl RunnerConfig {
    fn load() -> AppResult<Self> {
        let schema_path = optional_env("FORM_SCHEMA_PATH");
        let form_id = optional_env("FORM_ID");
        if schema_path.is_none() && form_id.is_none() {
            return Err(AppError::Configuration(
                "either FORM_SCHEMA_PATH or FORM_ID is required".to_owned(),
            ));
        }

        let api_base_url = optional_env("FORM_API_BASE_URL");
        if form_id.is_some() && api_base_url.is_none() {
            return Err(AppError::Configuration(
                "FORM_API_BASE_URL is required when fetching by FORM_ID".to_owned(),
            ));
        }

        Ok(Self {
            schema_path,
            form_id,
            api_base_url,
            values_path: optional_env("FORM_VALUES_PATH"),
            bearer_token: optional_env("FORM_BEARER_TOKEN"),
            submit: env::var("FORM_SUBMIT")
                .unwrap_or_else(|_| "false".to_owned())
                .eq_ignore_ascii_case("true"),
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = RunnerConfig::load()?;
    let engine_config = FormEngineConfig {
        api_base_url: config.api_base_url.clone(),
        ..FormEngineConfig::default()
    };

    let transport: Arc<dyn HttpTransport> =
        Arc::new(ReqwestHttpTransport::new(reqwest::Client::new()));
    let token_store = Arc::new(InMemoryTokenStore::new());
    if let Some(token) = config.bearer_token.as_deref() {
        token_store.insert_local("access_token", token);
    }

    let engine = Arc::new(ApiExecutionEngine::new(
        engine_config.clone(),
        Arc::clone(&transport),
        Some(token_store),
    ));

    let schema = load_schema(&config, engine_config, Arc::clone(&transport)).await?;
    info!(form = schema.id(), fields = schema.fields().len(), "schema loaded");

    let mut session = FormSession::new(schema, None, engine)?;

    if let Some(path) = config.values_path.as_deref() {
        let values = read_json_file(path)?;
        session.patch_values(&form_values_from_json(values));
        info!(path, "values applied");
    }

    report_validity(&mut session);

    if config.submit {
        match session.submit().await? {
            SubmitOutcome::Rejected { errors } => {
                warn!(invalid = errors.len(), "submit rejected by validation");
            }
            SubmitOutcome::Local { payload } => {
                info!(keys = payload.len(), "no submit API configured; payload kept local");
            }
            SubmitOutcome::Submitted { response, .. } => {
                info!(status = response.status, "submitted");
            }
        }
    }

    Ok(())
}

async fn load_schema(
    config: &RunnerConfig,
    engine_config: FormEngineConfig,
    transport: Arc<dyn HttpTransport>,
) -> AppResult<FormSchema> {
    if let Some(path) = config.schema_path.as_deref() {
        let body = read_json_file(path)?;
        return parse_schema_body(&body);
    }

    let form_id = config
        .form_id
        .as_deref()
        .ok_or_else(|| AppError::Configuration("FORM_ID is required".to_owned()))?;
    let client = FormSchemaClient::new(engine_config, transport);
    client.fetch_by_id(form_id).await
}

fn report_validity(session: &mut FormSession) {
    session.mark_all_touched();
    let mut invalid = 0_usize;
    for (key, control) in session.model().controls() {
        if !control.is_enabled() {
            info!(key, "control disabled by visibility rules");
            continue;
        }

        if control.is_valid() {
            continue;
        }

        invalid += 1;
        let kinds: Vec<&str> = control
            .errors()
            .iter()
            .map(|issue| issue.kind())
            .collect();
        warn!(key, errors = kinds.join(",").as_str(), "control invalid");
    }

    if invalid == 0 {
        info!("form is valid");
    }
}

fn read_json_file(path: &str) -> AppResult<Value> {
    let text = std::fs::read_to_string(path)
        .map_err(|error| AppError::Configuration(format!("cannot read '{path}': {error}")))?;
    serde_json::from_str(text.as_str())
        .map_err(|error| AppError::Validation(format!("'{path}' is not valid JSON: {error}")))
}

fn optional_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
