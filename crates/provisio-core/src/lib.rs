//! Provisio reconciliation core
//!
//! Mutating calls against the provisioning API return before the remote
//! control plane has converged. This crate waits for that convergence and
//! undoes partial work when a multi-step provisioning sequence fails.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │        resource create / update / delete         │
//! └───────┬──────────────────────────────┬──────────┘
//!         │ OperationHandle              │ Step
//! ┌───────▼───────────────┐  ┌───────────▼──────────┐
//! │        Poller         │  │ CompensationCoordinator│
//! │  wait(ctx, handle, p) │  │  run(ctx, steps)       │
//! └───────┬───────────────┘  └──────────────────────┘
//!         │                 ┌──────────────────────┐
//!         ├────────────────►│  PredicateRegistry   │
//!         │                 │  kind -> predicate   │
//! ┌───────▼───────────────┐ └──────────────────────┘
//! │  trait StatusClient   │
//! └───────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use provisio_core::{OperationHandle, Poller, ResourceKind, WaitContext};
//! use std::time::Duration;
//!
//! let ctx = WaitContext::with_timeout(Duration::from_secs(600));
//! let handle = OperationHandle::ready(server_id, ResourceKind::Server)?;
//! let server = poller.resolve(&ctx, handle).await?;
//! ```

pub mod client;
pub mod compensation;
pub mod context;
pub mod error;
pub mod handle;
pub mod kind;
pub mod outcome;
pub mod poller;
pub mod predicate;

// Re-exports
pub use client::{QueryError, QueryResult, RawStatus, StatusClient};
pub use compensation::{
    CompensationCoordinator, CompensationStep, RollbackStatus, Step, Transaction,
    TransactionError, TransactionState, UndoFailure,
};
pub use context::WaitContext;
pub use error::{LroError, Result};
pub use handle::{Intent, OperationHandle, Target};
pub use kind::ResourceKind;
pub use outcome::PollOutcome;
pub use poller::{PollInterval, Poller, PollerConfig};
pub use predicate::{PredicateRegistry, Readiness, ReadinessPredicate, StatePredicate};
