//! Connection settings for the provisioning API

use crate::error::{HttpError, Result};
use std::time::Duration;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for the HTTP adapter
#[derive(Clone)]
pub struct ApiConfig {
    /// Base URL, e.g. `https://api.example.cloud/v6`
    pub endpoint: String,

    /// Bearer token, sent when present
    pub token: Option<String>,

    pub user_agent: String,

    /// Upper bound for a single HTTP request
    pub request_timeout: Duration,
}

impl ApiConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            token: None,
            user_agent: format!("provisio/{}", env!("CARGO_PKG_VERSION")),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Create ApiConfig from environment variables
    pub fn from_env() -> Result<Self> {
        let endpoint = std::env::var("PROVISIO_API_URL")
            .map_err(|_| HttpError::MissingEnvVar("PROVISIO_API_URL".to_string()))?;
        let mut config = Self::new(endpoint);
        config.token = std::env::var("PROVISIO_TOKEN").ok().filter(|t| !t.is_empty());
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.endpoint.starts_with("https://") || self.endpoint.starts_with("http://")) {
            return Err(HttpError::InvalidConfig(format!(
                "endpoint must be an http(s) URL: {}",
                self.endpoint
            )));
        }
        Ok(())
    }

    /// Resolve a base-relative or absolute reference against the endpoint
    pub fn resolve(&self, reference: &str) -> String {
        if reference.starts_with("https://") || reference.starts_with("http://") {
            reference.to_string()
        } else {
            format!("{}/{}", self.endpoint, reference.trim_start_matches('/'))
        }
    }

    pub(crate) fn build_client(&self) -> Result<reqwest::Client> {
        self.validate()?;
        Ok(reqwest::Client::builder()
            .user_agent(&self.user_agent)
            .timeout(self.request_timeout)
            .build()?)
    }
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("endpoint", &self.endpoint)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("user_agent", &self.user_agent)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_references() {
        let config = ApiConfig::new("https://api.example.cloud/v6/");
        assert_eq!(config.endpoint, "https://api.example.cloud/v6");
        assert_eq!(
            config.resolve("/requests/42/status"),
            "https://api.example.cloud/v6/requests/42/status"
        );
        assert_eq!(
            config.resolve("https://other.example.cloud/requests/42/status"),
            "https://other.example.cloud/requests/42/status"
        );
    }

    #[test]
    fn test_from_env() {
        temp_env::with_vars(
            [
                ("PROVISIO_API_URL", Some("https://api.example.cloud/v6")),
                ("PROVISIO_TOKEN", Some("secret")),
            ],
            || {
                let config = ApiConfig::from_env().unwrap();
                assert_eq!(config.endpoint, "https://api.example.cloud/v6");
                assert_eq!(config.token.as_deref(), Some("secret"));
                assert!(!format!("{:?}", config).contains("secret"));
            },
        );
    }

    #[test]
    fn test_from_env_missing_url() {
        temp_env::with_var_unset("PROVISIO_API_URL", || {
            assert!(matches!(
                ApiConfig::from_env(),
                Err(HttpError::MissingEnvVar(_))
            ));
        });
    }

    #[test]
    fn test_invalid_endpoint() {
        assert!(matches!(
            ApiConfig::new("ftp://example").validate(),
            Err(HttpError::InvalidConfig(_))
        ));
    }
}
