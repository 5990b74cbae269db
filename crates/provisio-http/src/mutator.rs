//! Mutating calls that hand back operation handles

use crate::client::error_message;
use crate::config::ApiConfig;
use crate::error::{HttpError, Result};
use crate::paths::ResourcePaths;
use provisio_core::{Intent, OperationHandle, ResourceKind};
use reqwest::Method;

/// Accepted mutating call
#[derive(Debug, Clone)]
pub struct Mutation {
    pub kind: ResourceKind,

    /// HTTP status of the mutating call
    pub status: u16,

    /// `Location` header, pointing at the request status
    pub location: Option<String>,

    /// Identifier of the affected resource
    pub resource_id: Option<String>,

    pub body: serde_json::Value,
}

impl Mutation {
    /// Handle that polls the request status, if the API returned one
    pub fn location_handle(&self) -> Option<provisio_core::Result<OperationHandle>> {
        self.location.as_deref().map(OperationHandle::request)
    }

    /// Handle that polls the resource itself
    pub fn resource_handle(&self, intent: Intent) -> provisio_core::Result<OperationHandle> {
        let id = self.resource_id.as_deref().ok_or_else(|| {
            provisio_core::LroError::MalformedHandle(format!(
                "{} response carried neither a location nor an id",
                self.kind
            ))
        })?;
        OperationHandle::resource(id, intent, self.kind)
    }

    /// Preferred handle: the operation location, then the resource id
    pub fn into_handle(self, intent: Intent) -> provisio_core::Result<OperationHandle> {
        match self.location_handle() {
            Some(handle) => handle,
            None => self.resource_handle(intent),
        }
    }
}

/// Issues create, update and delete calls
#[derive(Debug, Clone)]
pub struct HttpMutator {
    client: reqwest::Client,
    config: ApiConfig,
    paths: ResourcePaths,
}

impl HttpMutator {
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

    /// POST `body` to the kind's collection (or to `parent`, when nested)
    pub async fn create(
        &self,
        kind: ResourceKind,
        parent: Option<&str>,
        body: &serde_json::Value,
    ) -> Result<Mutation> {
        let path = match parent {
            Some(parent) => format!(
                "{}{}",
                parent.trim_end_matches('/'),
                self.paths.collection(kind)
            ),
            None => self.paths.collection(kind).to_string(),
        };
        let mut mutation = self.send(Method::POST, kind, &path, Some(body)).await?;
        if mutation.resource_id.is_none() {
            mutation.resource_id = mutation.body.get("id").and_then(|v| v.as_str()).map(String::from);
        }

        tracing::info!(kind = %kind, id = ?mutation.resource_id, "Create accepted");
        Ok(mutation)
    }

    /// PATCH the resource with `body`
    pub async fn update(
        &self,
        kind: ResourceKind,
        id: &str,
        body: &serde_json::Value,
    ) -> Result<Mutation> {
        let path = self.paths.item(kind, id);
        let mut mutation = self.send(Method::PATCH, kind, &path, Some(body)).await?;
        mutation.resource_id = Some(id.to_string());

        tracing::info!(kind = %kind, id = %id, "Update accepted");
        Ok(mutation)
    }

    /// DELETE the resource; deleting something already gone succeeds
    pub async fn delete(&self, kind: ResourceKind, id: &str) -> Result<Mutation> {
        let path = self.paths.item(kind, id);
        let mutation = match self.send(Method::DELETE, kind, &path, None).await {
            Ok(mutation) => mutation,
            Err(HttpError::Api { status: 404, .. }) => {
                tracing::info!(kind = %kind, id = %id, "Already deleted");
                Mutation {
                    kind,
                    status: 404,
                    location: None,
                    resource_id: None,
                    body: serde_json::Value::Null,
                }
            }
            Err(e) => return Err(e),
        };

        tracing::info!(kind = %kind, id = %id, "Delete accepted");
        Ok(Mutation {
            resource_id: Some(id.to_string()),
            ..mutation
        })
    }

    async fn send(
        &self,
        method: Method,
        kind: ResourceKind,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<Mutation> {
        let url = self.config.resolve(path);
        tracing::debug!(kind = %kind, method = %method, url = %url, "Mutating call");

        let mut request = self.client.request(method, &url);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let location = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let text = response.text().await?;

        if !(200..300).contains(&status) {
            return Err(HttpError::Api {
                status,
                message: error_message(&text),
            });
        }

        let body = if text.trim().is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(&text)?
        };

        Ok(Mutation {
            kind,
            status,
            location,
            resource_id: None,
            body,
        })
    }
}
