//! Readiness predicates and their registry

use crate::client::RawStatus;
use crate::error::{LroError, Result};
use crate::kind::ResourceKind;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

/// Classification of one status payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Pending,
    Ready,
    Failed(String),
}

/// Pure classification of a raw status payload
///
/// Implementations must be total: a lifecycle state they do not recognise is
/// `Pending`, only an explicit set of states is `Failed`.
pub trait ReadinessPredicate: Send + Sync {
    fn classify(&self, status: &RawStatus) -> Readiness;
}

impl<F> ReadinessPredicate for F
where
    F: Fn(&RawStatus) -> Readiness + Send + Sync,
{
    fn classify(&self, status: &RawStatus) -> Readiness {
        self(status)
    }
}

/// Table-driven predicate over a lifecycle string found at a JSON pointer
#[derive(Debug, Clone)]
pub struct StatePredicate {
    state_pointer: String,
    message_pointer: Option<String>,
    ready: HashSet<String>,
    failed: HashSet<String>,
}

impl StatePredicate {
    pub fn new(state_pointer: impl Into<String>) -> Self {
        Self {
            state_pointer: state_pointer.into(),
            message_pointer: None,
            ready: HashSet::new(),
            failed: HashSet::new(),
        }
    }

    pub fn ready_on<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ready.extend(states.into_iter().map(Into::into));
        self
    }

    pub fn failed_on<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.failed.extend(states.into_iter().map(Into::into));
        self
    }

    /// Where a human readable failure message lives in the payload
    pub fn with_message(mut self, pointer: impl Into<String>) -> Self {
        self.message_pointer = Some(pointer.into());
        self
    }

    pub fn state_pointer(&self) -> &str {
        &self.state_pointer
    }
}

impl ReadinessPredicate for StatePredicate {
    fn classify(&self, status: &RawStatus) -> Readiness {
        let Some(state) = status.pointer_str(&self.state_pointer) else {
            return Readiness::Pending;
        };

        if self.ready.contains(state) {
            return Readiness::Ready;
        }

        if self.failed.contains(state) {
            let message = self
                .message_pointer
                .as_deref()
                .and_then(|pointer| status.pointer_str(pointer))
                .filter(|m| !m.is_empty());
            return Readiness::Failed(match message {
                Some(message) => format!("state {}: {}", state, message),
                None => format!("state {}", state),
            });
        }

        Readiness::Pending
    }
}

/// Mapping from resource kind to its readiness predicate
///
/// Filled once at start-up and shared read-only afterwards.
#[derive(Clone, Default)]
pub struct PredicateRegistry {
    predicates: BTreeMap<ResourceKind, Arc<dyn ReadinessPredicate>>,
}

impl PredicateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the predicate for `kind`
    pub fn register<P>(&mut self, kind: ResourceKind, predicate: P) -> &mut Self
    where
        P: ReadinessPredicate + 'static,
    {
        if self.predicates.insert(kind, Arc::new(predicate)).is_some() {
            tracing::debug!(kind = %kind, "Replaced readiness predicate");
        }
        self
    }

    pub fn with<P>(mut self, kind: ResourceKind, predicate: P) -> Self
    where
        P: ReadinessPredicate + 'static,
    {
        self.register(kind, predicate);
        self
    }

    /// Predicate for `kind`; a missing entry is a wiring defect
    pub fn lookup(&self, kind: ResourceKind) -> Result<Arc<dyn ReadinessPredicate>> {
        self.predicates
            .get(&kind)
            .cloned()
            .ok_or(LroError::UnknownKind(kind))
    }

    pub fn contains(&self, kind: ResourceKind) -> bool {
        self.predicates.contains_key(&kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = ResourceKind> + '_ {
        self.predicates.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

impl std::fmt::Debug for PredicateRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredicateRegistry")
            .field("kinds", &self.predicates.keys().collect::<Vec<_>>())
            .finish()
    }
}
