/// Engine-wide configuration, supplied once per integration.
#[derive(Debug, Clone, Default)]
pub struct FormEngineConfig {
    /// Base URL for schema fetches and generic API execution.
    pub api_base_url: Option<String>,
    /// Base URL override for submit and button action calls.
    pub submit_action_base_url: Option<String>,
    /// Base URL override for select option loads.
    pub select_options_base_url: Option<String>,
    /// Path template for schema fetches, with an `{id}` placeholder.
    pub schema_path_template: Option<String>,
    /// Caches failed option loads instead of retrying them on the next
    /// subscription.
    pub cache_failed_option_loads: bool,
}

impl FormEngineConfig {
    /// Returns the base URL for submit/button calls: the submit override,
    /// falling back to the API base.
    #[must_use]
    pub fn submit_base(&self) -> Option<&str> {
        self.submit_action_base_url
            .as_deref()
            .or(self.api_base_url.as_deref())
    }

    /// Returns the base URL for option loads: the options override, falling
    /// back to the API base.
    #[must_use]
    pub fn select_options_base(&self) -> Option<&str> {
        self.select_options_base_url
            .as_deref()
            .or(self.api_base_url.as_deref())
    }
}
