use std::time::Duration;

/// Runtime configuration describing how to reach the backing REST service.
#[derive(Debug, Clone)]
pub struct HttpStoreConfig {
    /// Root URL of the service; `/api/` is appended to it.
    pub base_url: String,
    /// Token sent as `Authorization: Token <token>`.
    pub token: Option<String>,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl HttpStoreConfig {
    /// Construct a configuration from an explicit base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            request_timeout: Duration::from_secs(10),
        }
    }

    /// Attach the API token used to authenticate every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Override the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Endpoint root with exactly one trailing slash.
    pub fn api_root(&self) -> String {
        format!("{}/api/", self.base_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_root_normalizes_trailing_slash() {
        assert_eq!(
            HttpStoreConfig::new("http://localhost:8000/").api_root(),
            "http://localhost:8000/api/"
        );
        assert_eq!(
            HttpStoreConfig::new("https://resto.example").api_root(),
            "https://resto.example/api/"
        );
    }
}
