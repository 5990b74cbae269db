//! Resource kinds for Provisio
//!
//! Maps every [`provisio_core::ResourceKind`] onto the lifecycle vocabulary
//! of the provisioning API, so the poller never needs to know what
//! `AVAILABLE` or `DONE` mean.
//!
//! # Vocabulary
//!
//! - **Resources** (servers, volumes, NAT gateways, load balancers, ...):
//!   `/metadata/state`, ready on `AVAILABLE`
//! - **Clusters** (Kubernetes clusters, node pools, autoscaling groups):
//!   additionally ready on `ACTIVE`
//! - **Certificates**: additionally ready on `ISSUED`, failed on `REVOKED`
//! - **Database clusters**: `DEGRADED` keeps polling
//! - **Requests** (operation locations): `/metadata/status`, ready on `DONE`
//!
//! Every kind fails on the `FAILED` family and `ERROR`; anything else keeps
//! polling.
//!
//! # Example
//!
//! ```ignore
//! use provisio_kinds::default_registry;
//! use provisio_core::{Poller, PollerConfig};
//! use std::sync::Arc;
//!
//! let poller = Poller::new(client, Arc::new(default_registry()), PollerConfig::default());
//! ```

pub mod predicates;
pub mod states;

pub use predicates::{default_registry, predicate_for};
