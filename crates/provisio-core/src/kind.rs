//! Resource kinds managed by the provider

use crate::error::LroError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Kind of remote resource an operation targets
///
/// Each kind has exactly one readiness predicate in a [`crate::PredicateRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    Datacenter,
    Server,
    Volume,
    Lan,
    NatGateway,
    ApplicationLoadBalancer,
    NetworkLoadBalancer,
    FlowLog,
    TargetGroup,
    Certificate,
    K8sCluster,
    K8sNodePool,
    AutoscalingGroup,
    PostgresCluster,
    MongoCluster,
    /// Status resource behind an operation-location reference
    Request,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 16] = [
        ResourceKind::Datacenter,
        ResourceKind::Server,
        ResourceKind::Volume,
        ResourceKind::Lan,
        ResourceKind::NatGateway,
        ResourceKind::ApplicationLoadBalancer,
        ResourceKind::NetworkLoadBalancer,
        ResourceKind::FlowLog,
        ResourceKind::TargetGroup,
        ResourceKind::Certificate,
        ResourceKind::K8sCluster,
        ResourceKind::K8sNodePool,
        ResourceKind::AutoscalingGroup,
        ResourceKind::PostgresCluster,
        ResourceKind::MongoCluster,
        ResourceKind::Request,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Datacenter => "datacenter",
            ResourceKind::Server => "server",
            ResourceKind::Volume => "volume",
            ResourceKind::Lan => "lan",
            ResourceKind::NatGateway => "nat-gateway",
            ResourceKind::ApplicationLoadBalancer => "application-load-balancer",
            ResourceKind::NetworkLoadBalancer => "network-load-balancer",
            ResourceKind::FlowLog => "flow-log",
            ResourceKind::TargetGroup => "target-group",
            ResourceKind::Certificate => "certificate",
            ResourceKind::K8sCluster => "k8s-cluster",
            ResourceKind::K8sNodePool => "k8s-node-pool",
            ResourceKind::AutoscalingGroup => "autoscaling-group",
            ResourceKind::PostgresCluster => "postgres-cluster",
            ResourceKind::MongoCluster => "mongo-cluster",
            ResourceKind::Request => "request",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = LroError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| LroError::UnknownKindName(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kind_names() {
        assert_eq!(
            "nat-gateway".parse::<ResourceKind>().unwrap(),
            ResourceKind::NatGateway
        );
        assert_eq!(
            "k8s-node-pool".parse::<ResourceKind>().unwrap(),
            ResourceKind::K8sNodePool
        );
        assert!(matches!(
            "nat_gateway".parse::<ResourceKind>(),
            Err(LroError::UnknownKindName(_))
        ));
    }

    #[test]
    fn test_display_matches_serde_name() {
        for kind in ResourceKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind));
        }
    }
}
