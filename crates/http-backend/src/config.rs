use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://localhost:8080/api/chat";

/// Builder for [`HttpBackendConfig`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct HttpBackendConfigBuilder {
    base_url: Option<String>,
    connect_timeout: Option<Duration>,
}

impl HttpBackendConfigBuilder {
    /// Creates a builder with default settings.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL of the chat API, e.g. `http://host/api/chat`.
    #[inline]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets a timeout for establishing connections.
    ///
    /// No timeout is applied to reading the streamed reply.
    #[inline]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Builds the configuration.
    #[inline]
    pub fn build(self) -> HttpBackendConfig {
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        HttpBackendConfig {
            base_url: base_url.trim_end_matches('/').to_owned(),
            connect_timeout: self.connect_timeout,
        }
    }
}

/// Configuration for the HTTP chat backend.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct HttpBackendConfig {
    pub(crate) base_url: String,
    pub(crate) connect_timeout: Option<Duration>,
}

impl HttpBackendConfig {
    /// Returns the base URL without a trailing slash.
    #[inline]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[inline]
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}
