use examgen_core::Config;

/// Shared application state accessible from all handlers.
pub struct AppState {
    /// Base configuration; per-request API keys override its key.
    pub config: Config,
}

impl AppState {
    /// Pick the effective API key: request-supplied wins over server.
    pub fn api_key<'a>(&'a self, request_key: Option<&'a str>) -> Option<&'a str> {
        request_key
            .filter(|k| !k.trim().is_empty())
            .or(self.config.api_key.as_deref())
    }
}
