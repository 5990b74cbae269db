//! Status queries over HTTP
//!
//! Every response is classified here, once, before it reaches the poller.

use crate::config::ApiConfig;
use crate::error::Result;
use crate::paths::ResourcePaths;
use async_trait::async_trait;
use provisio_core::{QueryError, QueryResult, RawStatus, ResourceKind, StatusClient, Target};

const MAX_MESSAGE_LEN: usize = 300;

/// [`StatusClient`] backed by the provisioning API
#[derive(Debug, Clone)]
pub struct HttpStatusClient {
    client: reqwest::Client,
    config: ApiConfig,
    paths: ResourcePaths,
}

impl HttpStatusClient {
    pub fn new(config: ApiConfig) -> Result<Self> {
        Ok(Self {
            client: config.build_client()?,
            config,
            paths: ResourcePaths::default(),
        })
    }

    pub fn with_paths(mut self, paths: ResourcePaths) -> Self {
        self.paths = paths;
        self
    }

    /// URL polled for `target`
    pub fn url_for(&self, target: &Target, kind: ResourceKind) -> String {
        match target {
            Target::Location(location) => self.config.resolve(location),
            Target::Resource { id, .. } => self.config.resolve(&self.paths.item(kind, id)),
        }
    }
}

#[async_trait]
impl StatusClient for HttpStatusClient {
    async fn query(
        &self,
        target: &Target,
        kind: ResourceKind,
    ) -> std::result::Result<QueryResult, QueryError> {
        let url = self.url_for(target, kind);
        tracing::debug!(kind = %kind, url = %url, "GET status");

        let mut request = self.client.get(&url);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| QueryError::Transient(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| QueryError::Transient(e.to_string()))?;

        classify_response(status, &body)
    }
}

/// Classify one HTTP response into a [`QueryResult`] or [`QueryError`]
///
/// 2xx is found, 404 is not found, timeouts, throttling and 5xx are
/// transient, every other status is rejected.
pub fn classify_response(
    status: u16,
    body: &str,
) -> std::result::Result<QueryResult, QueryError> {
    match status {
        200..=299 => {
            if body.trim().is_empty() {
                return Ok(QueryResult::Found(RawStatus::new(
                    status,
                    serde_json::Value::Null,
                )));
            }
            // a 2xx with a non-JSON body is usually an intermediary's page
            serde_json::from_str(body)
                .map(|json| QueryResult::Found(RawStatus::new(status, json)))
                .map_err(|e| QueryError::Transient(format!("unreadable {} response: {}", status, e)))
        }
        404 => Ok(QueryResult::NotFound),
        408 | 425 | 429 | 500..=599 => Err(QueryError::Transient(format!(
            "{}: {}",
            status,
            error_message(body)
        ))),
        _ => Err(QueryError::Rejected {
            status,
            message: error_message(body),
        }),
    }
}

/// Human readable message out of an error body
///
/// Understands `{"messages": [{"errorCode": .., "message": ..}]}` and
/// `{"message": ..}`, falling back to the (truncated) raw body.
pub fn error_message(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(first) = json.pointer("/messages/0") {
            let message = first.get("message").and_then(|m| m.as_str());
            let code = first.get("errorCode").and_then(|c| c.as_str());
            match (code, message) {
                (Some(code), Some(message)) => return format!("[{}] {}", code, message),
                (None, Some(message)) => return message.to_string(),
                _ => {}
            }
        }
        if let Some(message) = json.get("message").and_then(|m| m.as_str()) {
            return message.to_string();
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }
    trimmed.chars().take(MAX_MESSAGE_LEN).collect()
}
