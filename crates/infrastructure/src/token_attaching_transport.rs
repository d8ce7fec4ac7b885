use std::sync::Arc;

use async_trait::async_trait;
use formwright_application::{ApiResponse, HttpTransport, RequestPlan};
use formwright_core::AppResult;

/// Caller-supplied global token source.
pub type GlobalTokenProvider = Arc<dyn Fn() -> Option<String> + Send + Sync>;

/// Decorator that attaches a global bearer token to outgoing requests.
///
/// Requests flagged `skip_auth` pass through untouched; the flag is cleared
/// here so no trace of it travels further. When a base URL is configured,
/// only requests targeting it (or site-relative paths) get the token, which
/// keeps tokens away from third-party hosts. Requests that already carry an
/// Authorization header are left alone.
pub struct TokenAttachingTransport {
    inner: Arc<dyn HttpTransport>,
    provider: GlobalTokenProvider,
    base_url: Option<String>,
}

impl TokenAttachingTransport {
    /// Creates the decorator over an inner transport.
    #[must_use]
    pub fn new(
        inner: Arc<dyn HttpTransport>,
        provider: GlobalTokenProvider,
        base_url: Option<String>,
    ) -> Self {
        Self {
            inner,
            provider,
            base_url,
        }
    }

    fn in_scope(&self, url: &str) -> bool {
        match self.base_url.as_deref() {
            Some(base) => {
                let base = base.trim_end_matches('/');
                url.starts_with(base) || url.starts_with('/')
            }
            None => true,
        }
    }
}

#[async_trait]
impl HttpTransport for TokenAttachingTransport {
    async fn send(&self, mut plan: RequestPlan) -> AppResult<ApiResponse> {
        if plan.skip_auth {
            plan.skip_auth = false;
            return self.inner.send(plan).await;
        }

        let already_authorized = plan
            .headers
            .iter()
            .any(|(key, _)| key.eq_ignore_ascii_case("authorization"));

        if !already_authorized
            && self.in_scope(plan.url.as_str())
            && let Some(token) = (self.provider)()
        {
            plan.headers
                .push(("Authorization".to_owned(), format!("Bearer {token}")));
        }

        self.inner.send(plan).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex, PoisonError};

    use async_trait::async_trait;
    use formwright_application::{
        ApiResponse, HttpTransport, RequestBody, RequestPlan,
    };
    use formwright_core::AppResult;
    use formwright_domain::HttpMethod;
    use serde_json::Value;

    use super::TokenAttachingTransport;

    struct RecordingTransport {
        plans: Mutex<Vec<RequestPlan>>,
    }

    #[async_trait]
    impl HttpTransport for RecordingTransport {
        async fn send(&self, plan: RequestPlan) -> AppResult<ApiResponse> {
            self.plans
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(plan);
            Ok(ApiResponse {
                status: 200,
                body: Value::Null,
            })
        }
    }

    fn plan(url: &str, skip_auth: bool) -> RequestPlan {
        RequestPlan {
            method: HttpMethod::Get,
            url: url.to_owned(),
            headers: Vec::new(),
            query: Vec::new(),
            body: RequestBody::None,
            skip_auth,
        }
    }

    fn decorated(base: Option<&str>) -> (TokenAttachingTransport, Arc<RecordingTransport>) {
        let inner = Arc::new(RecordingTransport {
            plans: Mutex::new(Vec::new()),
        });
        let transport = TokenAttachingTransport::new(
            Arc::clone(&inner) as Arc<dyn HttpTransport>,
            Arc::new(|| Some("tok-9".to_owned())),
            base.map(str::to_owned),
        );
        (transport, inner)
    }

    fn recorded(inner: &RecordingTransport) -> Vec<RequestPlan> {
        inner
            .plans
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[tokio::test]
    async fn attaches_bearer_token_to_in_scope_requests() {
        let (transport, inner) = decorated(Some("https://api.x"));
        let sent = transport.send(plan("https://api.x/items", false)).await;
        assert!(sent.is_ok());

        let plans = recorded(&inner);
        assert!(
            plans[0]
                .headers
                .contains(&("Authorization".to_owned(), "Bearer tok-9".to_owned()))
        );
    }

    #[tokio::test]
    async fn skip_auth_passes_through_and_clears_the_flag() {
        let (transport, inner) = decorated(Some("https://api.x"));
        let sent = transport.send(plan("https://api.x/items", true)).await;
        assert!(sent.is_ok());

        let plans = recorded(&inner);
        assert!(plans[0].headers.is_empty());
        assert!(!plans[0].skip_auth);
    }

    #[tokio::test]
    async fn third_party_hosts_never_receive_the_token() {
        let (transport, inner) = decorated(Some("https://api.x"));
        let sent = transport.send(plan("https://elsewhere.y/items", false)).await;
        assert!(sent.is_ok());

        assert!(recorded(&inner)[0].headers.is_empty());
    }

    #[tokio::test]
    async fn existing_authorization_headers_are_left_alone() {
        let (transport, inner) = decorated(None);
        let mut request = plan("/items", false);
        request
            .headers
            .push(("Authorization".to_owned(), "Bearer per-call".to_owned()));

        let sent = transport.send(request).await;
        assert!(sent.is_ok());

        let plans = recorded(&inner);
        assert_eq!(plans[0].headers.len(), 1);
        assert_eq!(plans[0].headers[0].1, "Bearer per-call");
    }
}
