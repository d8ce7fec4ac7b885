use std::collections::BTreeMap;
use std::sync::Arc;

use formwright_core::{AppError, AppResult};
use formwright_domain::{ApiEndpointConfig, FieldType, FieldValue, FormSchema, FormValues};

use crate::execution::{ApiExecutionEngine, ExecutionContext};
use crate::form_model::{FormControl, FormModel, build_form_model};
use crate::ports::ApiResponse;
use crate::validators::ValidationIssue;
use crate::visibility::recompute_visibility;

const DEFAULT_SUBMIT_ERROR: &str = "Failed to submit. Please try again.";

/// Outcome of one submit attempt.
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    /// Validation failed; error details by control key, no network call made.
    Rejected {
        /// Error details of enabled, invalid controls.
        errors: BTreeMap<String, Vec<ValidationIssue>>,
    },
    /// No submit API configured; the normalized payload is handed back.
    Local {
        /// Normalized payload.
        payload: FormValues,
    },
    /// Submit API executed successfully.
    Submitted {
        /// Normalized payload that was sent.
        payload: FormValues,
        /// Raw API response.
        response: ApiResponse,
    },
}

/// Live state for one applied schema: the normalized schema, its control
/// map, and the submit/button flows. Replaced wholesale when a new schema
/// is applied.
pub struct FormSession {
    schema: FormSchema,
    model: FormModel,
    engine: Arc<ApiExecutionEngine>,
}

impl FormSession {
    /// Applies a schema: normalizes it, builds the control map, patches
    /// initial values, and runs the initial visibility pass.
    pub fn new(
        schema: FormSchema,
        initial: Option<&FormValues>,
        engine: Arc<ApiExecutionEngine>,
    ) -> AppResult<Self> {
        let schema = schema.normalized();
        let mut model = build_form_model(schema.fields(), initial)?;
        recompute_visibility(&schema, &mut model);

        Ok(Self {
            schema,
            model,
            engine,
        })
    }

    /// Returns the applied schema.
    #[must_use]
    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    /// Returns the control map.
    #[must_use]
    pub fn model(&self) -> &FormModel {
        &self.model
    }

    /// Returns one control by key.
    #[must_use]
    pub fn control(&self, key: &str) -> Option<&FormControl> {
        self.model.control(key)
    }

    /// Applies one user edit and synchronously recomputes dependent
    /// visibility before returning.
    pub fn set_value(&mut self, key: &str, value: FieldValue) -> AppResult<()> {
        let control = self.model.control_mut(key).ok_or_else(|| {
            AppError::Validation(format!("no control under key '{key}'"))
        })?;
        control.set_value(value);
        recompute_visibility(&self.schema, &mut self.model);
        Ok(())
    }

    /// Silently patches values without marking controls dirty, then
    /// recomputes visibility. Unknown keys are ignored.
    pub fn patch_values(&mut self, values: &FormValues) {
        for (key, value) in values {
            if let Some(control) = self.model.control_mut(key.as_str()) {
                control.patch_value(value.clone());
            }
        }

        recompute_visibility(&self.schema, &mut self.model);
    }

    /// Marks every control touched, the renderer convention before showing
    /// errors.
    pub fn mark_all_touched(&mut self) {
        self.model.mark_all_touched();
    }

    /// Validates the fields of one step, marking them touched. Returns
    /// whether every enabled control among them is valid.
    pub fn validate_step(&mut self, step_id: &str) -> AppResult<bool> {
        let field_ids: Vec<String> = self
            .schema
            .steps()
            .iter()
            .find(|step| step.id() == step_id)
            .ok_or_else(|| AppError::Validation(format!("unknown step '{step_id}'")))?
            .field_ids()
            .to_vec();

        let keys: Vec<String> = self
            .schema
            .fields()
            .iter()
            .filter(|field| field.field_type().is_input())
            .filter(|field| field_ids.iter().any(|id| id == field.id()))
            .map(|field| field.control_key().to_owned())
            .collect();

        let mut valid = true;
        for key in keys {
            if let Some(control) = self.model.control_mut(key.as_str()) {
                control.mark_touched();
                control.revalidate();
                if control.is_enabled() && !control.is_valid() {
                    valid = false;
                }
            }
        }

        Ok(valid)
    }

    /// Normalizes the enabled-control snapshot for payload use: number
    /// fields map empty text to null and numeric text to numbers; other
    /// fields pass through untouched.
    #[must_use]
    pub fn normalize_payload(&self) -> FormValues {
        let snapshot = self.model.value_snapshot();
        let mut normalized = FormValues::new();

        for (key, value) in snapshot {
            let is_number_field = self
                .schema
                .fields()
                .iter()
                .any(|field| field.control_key() == key && field.field_type() == FieldType::Number);

            let value = if is_number_field {
                normalize_number(value)
            } else {
                value
            };
            normalized.insert(key, value);
        }

        normalized
    }

    /// Full submit flow: touch and validate everything, then either hand the
    /// payload back (no API configured) or execute the configured submit
    /// call. Validation failures never reach the network.
    pub async fn submit(&mut self) -> AppResult<SubmitOutcome> {
        self.model.mark_all_touched();
        if !self.model.is_valid() {
            return Ok(SubmitOutcome::Rejected {
                errors: self.model.errors(),
            });
        }

        let payload = self.normalize_payload();
        let actions = self.schema.actions();

        let endpoint = if let Some(action) = actions.submit_api() {
            Some(action.api().clone())
        } else {
            // a blank submit URL means "no API": hand the payload back locally
            actions
                .submit_api_url()
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(|url| ApiEndpointConfig::new(actions.method(), url))
        };
        let Some(endpoint) = endpoint else {
            return Ok(SubmitOutcome::Local { payload });
        };

        let context = ExecutionContext {
            form_values: payload.clone(),
            payload_key: actions.payload_key().map(str::to_owned),
            content_type: actions.content_type(),
            base_url: self.engine.config().submit_base().map(str::to_owned),
            ..ExecutionContext::default()
        };

        match self.engine.execute(&endpoint, &context).await {
            Ok(response) if response.is_success() => {
                Ok(SubmitOutcome::Submitted { payload, response })
            }
            Ok(response) => Err(AppError::Transport(self.submit_failure_message(
                response.message(),
                Some(format!("submit failed with status {}", response.status).as_str()),
            ))),
            Err(error) => Err(AppError::Transport(
                self.submit_failure_message(None, Some(error.to_string().as_str())),
            )),
        }
    }

    /// Executes one button field's declarative action.
    pub async fn trigger_button(&mut self, field_id: &str) -> AppResult<ApiResponse> {
        let field = self
            .schema
            .find_field(field_id)
            .filter(|field| field.field_type() == FieldType::Button)
            .ok_or_else(|| AppError::Validation(format!("no button field '{field_id}'")))?;
        let button = field.button().ok_or_else(|| {
            AppError::Configuration(format!("button field '{field_id}' has no action descriptor"))
        })?;
        let endpoint = button
            .api()
            .cloned()
            .ok_or_else(|| {
                AppError::Configuration(format!("button field '{field_id}' has no API config"))
            })?;
        let error_message = button.error_message().map(str::to_owned);

        if button.trigger_validation() {
            self.model.mark_all_touched();
            if !self.model.is_valid() {
                return Err(AppError::Validation(
                    "button action blocked by validation errors".to_owned(),
                ));
            }
        }

        let context = ExecutionContext {
            form_values: self.normalize_payload(),
            base_url: self.engine.config().submit_base().map(str::to_owned),
            ..ExecutionContext::default()
        };

        match self.engine.execute(&endpoint, &context).await {
            Ok(response) if response.is_success() => Ok(response),
            Ok(response) => {
                let message = error_message
                    .as_deref()
                    .or(response.message())
                    .map(str::to_owned)
                    .unwrap_or_else(|| format!("action failed with status {}", response.status));
                Err(AppError::Transport(message))
            }
            Err(error) => Err(AppError::Transport(
                error_message.unwrap_or_else(|| error.to_string()),
            )),
        }
    }

    fn submit_failure_message(&self, server: Option<&str>, transport: Option<&str>) -> String {
        self.schema
            .actions()
            .submit_api()
            .and_then(|action| action.error_message())
            .or(server)
            .or(transport)
            .unwrap_or(DEFAULT_SUBMIT_ERROR)
            .to_owned()
    }
}

fn normalize_number(value: FieldValue) -> FieldValue {
    match value {
        FieldValue::Text(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return FieldValue::Null;
            }

            match serde_json::Number::from_f64(
                trimmed.parse::<f64>().unwrap_or(f64::NAN),
            ) {
                Some(number) => FieldValue::Number(number),
                None => FieldValue::Null,
            }
        }
        other => other,
    }
}
