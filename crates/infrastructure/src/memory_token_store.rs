use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use formwright_application::TokenStore;
use formwright_domain::TokenFrom;

/// Caller-supplied token callback for [`TokenFrom::CustomCallback`].
pub type TokenCallback = Arc<dyn Fn() -> Option<String> + Send + Sync>;

/// In-memory token store standing in for the browser's local and session
/// storage scopes, with an optional custom callback.
#[derive(Default)]
pub struct InMemoryTokenStore {
    local: RwLock<HashMap<String, String>>,
    session: RwLock<HashMap<String, String>>,
    callback: Option<TokenCallback>,
}

impl InMemoryTokenStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with a custom-callback token source.
    #[must_use]
    pub fn with_callback(callback: TokenCallback) -> Self {
        Self {
            callback: Some(callback),
            ..Self::default()
        }
    }

    /// Stores a token under the local-storage scope.
    pub fn insert_local(&self, key: impl Into<String>, token: impl Into<String>) {
        self.local
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), token.into());
    }

    /// Stores a token under the session-storage scope.
    pub fn insert_session(&self, key: impl Into<String>, token: impl Into<String>) {
        self.session
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), token.into());
    }
}

impl TokenStore for InMemoryTokenStore {
    fn bearer_token(&self, source: TokenFrom, key: &str) -> Option<String> {
        match source {
            TokenFrom::LocalStorage => self
                .local
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .get(key)
                .cloned(),
            TokenFrom::SessionStorage => self
                .session
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .get(key)
                .cloned(),
            TokenFrom::CustomCallback => self.callback.as_ref().and_then(|callback| callback()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use formwright_application::TokenStore;
    use formwright_domain::TokenFrom;

    use super::InMemoryTokenStore;

    #[test]
    fn scopes_are_isolated() {
        let store = InMemoryTokenStore::new();
        store.insert_local("access_token", "local-tok");
        store.insert_session("access_token", "session-tok");

        assert_eq!(
            store.bearer_token(TokenFrom::LocalStorage, "access_token"),
            Some("local-tok".to_owned())
        );
        assert_eq!(
            store.bearer_token(TokenFrom::SessionStorage, "access_token"),
            Some("session-tok".to_owned())
        );
        assert_eq!(store.bearer_token(TokenFrom::LocalStorage, "other"), None);
    }

    #[test]
    fn custom_callback_source_delegates() {
        let store = InMemoryTokenStore::with_callback(Arc::new(|| Some("cb-tok".to_owned())));
        assert_eq!(
            store.bearer_token(TokenFrom::CustomCallback, "ignored"),
            Some("cb-tok".to_owned())
        );

        let without = InMemoryTokenStore::new();
        assert_eq!(without.bearer_token(TokenFrom::CustomCallback, "k"), None);
    }
}
