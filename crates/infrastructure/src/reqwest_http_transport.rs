use async_trait::async_trait;
use formwright_application::{ApiResponse, HttpTransport, MultipartPart, RequestBody, RequestPlan};
use formwright_core::{AppError, AppResult};
use formwright_domain::HttpMethod;
use serde_json::Value;

/// reqwest-backed HTTP transport adapter.
///
/// Serializes planned bodies as JSON or multipart form data and hands back
/// the raw status plus a best-effort JSON body. Status codes are not
/// classified here; that is the caller's concern.
pub struct ReqwestHttpTransport {
    http_client: reqwest::Client,
}

impl ReqwestHttpTransport {
    /// Creates a transport over an existing reqwest client.
    #[must_use]
    pub fn new(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }

    fn method(method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }

    fn multipart_form(parts: Vec<MultipartPart>) -> AppResult<reqwest::multipart::Form> {
        let mut form = reqwest::multipart::Form::new();
        for part in parts {
            match part {
                MultipartPart::Text { name, value } => {
                    form = form.text(name, value);
                }
                MultipartPart::File { name, file } => {
                    let mut file_part = reqwest::multipart::Part::bytes(file.content().to_vec())
                        .file_name(file.name().to_owned());
                    if !file.media_type().is_empty() {
                        file_part = file_part.mime_str(file.media_type()).map_err(|error| {
                            AppError::Validation(format!(
                                "invalid MIME type '{}': {error}",
                                file.media_type()
                            ))
                        })?;
                    }

                    form = form.part(name, file_part);
                }
            }
        }

        Ok(form)
    }
}

#[async_trait]
impl HttpTransport for ReqwestHttpTransport {
    async fn send(&self, plan: RequestPlan) -> AppResult<ApiResponse> {
        let mut builder = self
            .http_client
            .request(Self::method(plan.method), plan.url.as_str());

        if !plan.query.is_empty() {
            builder = builder.query(&plan.query);
        }

        for (key, value) in &plan.headers {
            builder = builder.header(key, value);
        }

        builder = match plan.body {
            RequestBody::None => builder,
            RequestBody::Json(body) => builder.json(&body),
            RequestBody::Multipart(parts) => builder.multipart(Self::multipart_form(parts)?),
        };

        let response = builder
            .send()
            .await
            .map_err(|error| AppError::Transport(format!("http request failed: {error}")))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|error| AppError::Transport(format!("failed to read response: {error}")))?;

        let body = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(text.as_str()).unwrap_or(Value::String(text))
        };

        tracing::debug!(status, url = plan.url.as_str(), "request completed");

        Ok(ApiResponse { status, body })
    }
}
