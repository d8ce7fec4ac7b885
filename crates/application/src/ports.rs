use async_trait::async_trait;
use formwright_core::AppResult;
use formwright_domain::{FileAttachment, HttpMethod, TokenFrom};
use serde_json::Value;

/// One part of a multipart body.
#[derive(Debug, Clone, PartialEq)]
pub enum MultipartPart {
    /// Plain text part.
    Text {
        /// Part name.
        name: String,
        /// Stringified value.
        value: String,
    },
    /// File part carrying raw content.
    File {
        /// Part name.
        name: String,
        /// The picked file.
        file: FileAttachment,
    },
}

/// Serialized request body decided by content negotiation.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// No body (GET requests).
    None,
    /// JSON body with an explicit content type.
    Json(Value),
    /// Multipart form-data body.
    Multipart(Vec<MultipartPart>),
}

/// A fully resolved HTTP request, ready for the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestPlan {
    /// HTTP method.
    pub method: HttpMethod,
    /// Final absolute or site-relative URL with path params substituted.
    pub url: String,
    /// Resolved header pairs in attachment order.
    pub headers: Vec<(String, String)>,
    /// Resolved query pairs in attachment order.
    pub query: Vec<(String, String)>,
    /// Negotiated body.
    pub body: RequestBody,
    /// Signals auth-attaching layers to leave this request untouched. The
    /// flag never crosses the process boundary.
    pub skip_auth: bool,
}

/// Raw response handed back by the transport. Status codes are carried
/// un-classified; callers decide what failure means.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Parsed JSON body, or the raw text as a JSON string, or null.
    pub body: Value,
}

impl ApiResponse {
    /// Returns whether the status is in the 2xx range.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns the server-supplied `message` field, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.body.get("message").and_then(Value::as_str)
    }
}

/// Port for issuing HTTP requests.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends one planned request and returns the raw response.
    async fn send(&self, plan: RequestPlan) -> AppResult<ApiResponse>;
}

/// Port yielding bearer tokens from the configurable sources.
pub trait TokenStore: Send + Sync {
    /// Returns the bearer token for the given source and storage key, if any.
    fn bearer_token(&self, source: TokenFrom, key: &str) -> Option<String>;
}
