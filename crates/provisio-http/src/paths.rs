//! Collection paths per resource kind

use provisio_core::ResourceKind;
use std::collections::HashMap;

/// Where each kind lives below the API endpoint
///
/// Nested resources (a server inside a datacenter, a flow log below a load
/// balancer) are addressed by passing an id that starts with `/`, which is
/// then used as the full path.
#[derive(Debug, Clone)]
pub struct ResourcePaths {
    overrides: HashMap<ResourceKind, String>,
}

impl ResourcePaths {
    pub fn new() -> Self {
        Self {
            overrides: HashMap::new(),
        }
    }

    pub fn with(mut self, kind: ResourceKind, path: impl Into<String>) -> Self {
        let path = path.into();
        self.overrides
            .insert(kind, format!("/{}", path.trim_matches('/')));
        self
    }

    pub fn collection(&self, kind: ResourceKind) -> &str {
        if let Some(path) = self.overrides.get(&kind) {
            return path;
        }
        match kind {
            ResourceKind::Datacenter => "/datacenters",
            ResourceKind::Server => "/servers",
            ResourceKind::Volume => "/volumes",
            ResourceKind::Lan => "/lans",
            ResourceKind::NatGateway => "/natgateways",
            ResourceKind::ApplicationLoadBalancer => "/applicationloadbalancers",
            ResourceKind::NetworkLoadBalancer => "/networkloadbalancers",
            ResourceKind::FlowLog => "/flowlogs",
            ResourceKind::TargetGroup => "/targetgroups",
            ResourceKind::Certificate => "/certificates",
            ResourceKind::K8sCluster => "/k8s",
            ResourceKind::K8sNodePool => "/nodepools",
            ResourceKind::AutoscalingGroup => "/groups",
            ResourceKind::PostgresCluster => "/clusters",
            ResourceKind::MongoCluster => "/mongoclusters",
            ResourceKind::Request => "/requests",
        }
    }

    /// Path of one resource, relative to the endpoint
    pub fn item(&self, kind: ResourceKind, id: &str) -> String {
        if id.starts_with('/') {
            return id.to_string();
        }
        match kind {
            ResourceKind::Request => format!("{}/{}/status", self.collection(kind), id),
            _ => format!("{}/{}", self.collection(kind), id),
        }
    }
}

impl Default for ResourcePaths {
    fn default() -> Self {
        Self::new()
    }
}
