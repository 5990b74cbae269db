//! Status client abstraction
//!
//! The control plane is reached through [`StatusClient`]. Implementations
//! pre-classify every response into found / not-found / transient / rejected
//! so the poll loop never inspects raw HTTP responses.

use crate::handle::Target;
use crate::kind::ResourceKind;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Read-only access to the remote control plane
#[async_trait]
pub trait StatusClient: Send + Sync {
    /// Query the current status behind `target`
    ///
    /// A well-formed response describing a failed operation is
    /// `Ok(QueryResult::Found(..))`; the failure lives in the body where a
    /// readiness predicate can inspect it.
    async fn query(
        &self,
        target: &Target,
        kind: ResourceKind,
    ) -> std::result::Result<QueryResult, QueryError>;
}

/// Outcome of a single status query
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Found(RawStatus),
    NotFound,
}

/// Query failures, already split into retryable and non-retryable
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// Network failure, 5xx, throttling. Retried within the deadline.
    #[error("transient query failure: {0}")]
    Transient(String),

    /// The request itself was refused (authentication, malformed path, ...)
    #[error("query rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },
}

impl QueryError {
    pub fn is_transient(&self) -> bool {
        matches!(self, QueryError::Transient(_))
    }
}

/// Raw status payload as returned by the control plane
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawStatus {
    /// HTTP status code of the response
    pub http_status: u16,

    /// Decoded JSON body (`null` for empty bodies)
    pub body: serde_json::Value,
}

impl RawStatus {
    pub fn new(http_status: u16, body: serde_json::Value) -> Self {
        Self { http_status, body }
    }

    /// Build a `200 OK` payload, mostly useful for stubs
    pub fn ok(body: serde_json::Value) -> Self {
        Self::new(200, body)
    }

    /// String at a JSON pointer such as `/metadata/state`
    pub fn pointer_str(&self, pointer: &str) -> Option<&str> {
        self.body.pointer(pointer).and_then(|v| v.as_str())
    }

    /// Generated resource identifier, if the body carries one
    pub fn id(&self) -> Option<&str> {
        self.pointer_str("/id")
    }

    /// Deserialize the body into a typed representation
    pub fn parse<T: serde::de::DeserializeOwned>(&self) -> crate::error::Result<T> {
        Ok(serde_json::from_value(self.body.clone())?)
    }
}
