//! HTTP adapter for Provisio
//!
//! Implements [`provisio_core::StatusClient`] against the HTTP/JSON
//! provisioning API and wraps the mutating calls whose responses become
//! [`provisio_core::OperationHandle`]s.
//!
//! # Response classification
//!
//! | status | result |
//! |---|---|
//! | 2xx | `Found` (JSON body) |
//! | 404 | `NotFound` |
//! | 408, 425, 429, 5xx, transport errors | `Transient` |
//! | other | `Rejected` |
//!
//! # Example
//!
//! ```ignore
//! use provisio_http::{ApiConfig, HttpMutator, HttpStatusClient};
//! use provisio_core::Intent;
//!
//! let config = ApiConfig::from_env()?;
//! let mutator = HttpMutator::new(config.clone())?;
//! let client = HttpStatusClient::new(config)?;
//!
//! let mutation = mutator.create(ResourceKind::K8sCluster, None, &body).await?;
//! let handle = mutation.resource_handle(Intent::BecomeReady)?;
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod mutator;
pub mod paths;

pub use client::{HttpStatusClient, classify_response};
pub use config::ApiConfig;
pub use error::{HttpError, Result};
pub use mutator::{HttpMutator, Mutation};
pub use paths::ResourcePaths;
