//! Readiness predicate per resource kind

use crate::states::*;
use provisio_core::{PredicateRegistry, ResourceKind, StatePredicate};

/// Plain resources: ready once `AVAILABLE`
pub fn resource() -> StatePredicate {
    StatePredicate::new(STATE_POINTER)
        .ready_on([AVAILABLE])
        .failed_on(PERMANENT_FAILURES)
        .with_message(STATE_MESSAGE_POINTER)
}

/// Managed clusters and their pools report `ACTIVE` as well
pub fn cluster() -> StatePredicate {
    resource().ready_on([ACTIVE])
}

pub fn certificate() -> StatePredicate {
    resource().ready_on([ISSUED]).failed_on([REVOKED])
}

/// Database clusters; `DEGRADED` heals by itself and keeps polling
pub fn database() -> StatePredicate {
    resource().ready_on([ACTIVE])
}

/// Request-status payload behind an operation location
pub fn request() -> StatePredicate {
    StatePredicate::new(REQUEST_STATUS_POINTER)
        .ready_on([DONE])
        .failed_on([FAILED])
        .with_message(REQUEST_MESSAGE_POINTER)
}

/// Predicate for `kind`
pub fn predicate_for(kind: ResourceKind) -> StatePredicate {
    match kind {
        ResourceKind::Datacenter
        | ResourceKind::Server
        | ResourceKind::Volume
        | ResourceKind::Lan
        | ResourceKind::NatGateway
        | ResourceKind::ApplicationLoadBalancer
        | ResourceKind::NetworkLoadBalancer
        | ResourceKind::FlowLog
        | ResourceKind::TargetGroup => resource(),
        ResourceKind::Certificate => certificate(),
        ResourceKind::K8sCluster | ResourceKind::K8sNodePool | ResourceKind::AutoscalingGroup => {
            cluster()
        }
        ResourceKind::PostgresCluster | ResourceKind::MongoCluster => database(),
        ResourceKind::Request => request(),
    }
}

/// Registry with a predicate for every known kind
pub fn default_registry() -> PredicateRegistry {
    let mut registry = PredicateRegistry::new();
    for kind in ResourceKind::ALL {
        registry.register(kind, predicate_for(kind));
    }
    tracing::debug!(kinds = registry.len(), "Built default predicate registry");
    registry
}
