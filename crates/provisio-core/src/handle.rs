//! Operation handles returned by mutating calls

use crate::error::{LroError, Result};
use crate::kind::ResourceKind;
use serde::{Deserialize, Serialize};

/// What a wait is trying to observe about a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// The resource should reach its ready lifecycle state
    BecomeReady,
    /// The resource should disappear (query answers not-found)
    BecomeAbsent,
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Intent::BecomeReady => write!(f, "ready"),
            Intent::BecomeAbsent => write!(f, "absent"),
        }
    }
}

/// What must be polled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// Opaque operation-location reference (usually the `Location` header)
    Location(String),
    /// The resource itself, polled by identifier
    Resource { id: String, intent: Intent },
}

impl Target {
    pub fn intent(&self) -> Intent {
        match self {
            Target::Location(_) => Intent::BecomeReady,
            Target::Resource { intent, .. } => *intent,
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Location(location) => write!(f, "{}", location),
            Target::Resource { id, intent } => write!(f, "{} ({})", id, intent),
        }
    }
}

/// Handle on an in-flight operation
///
/// Produced when a mutating call returns successfully and moved into exactly
/// one [`crate::Poller::wait`]. Fields are private, the handle never changes
/// after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationHandle {
    target: Target,
    resource_kind: ResourceKind,
}

impl OperationHandle {
    /// Handle on an operation-location reference
    pub fn location(location: impl Into<String>, resource_kind: ResourceKind) -> Result<Self> {
        let location = location.into();
        if location.trim().is_empty() {
            return Err(LroError::MalformedHandle(format!(
                "empty operation location for {}",
                resource_kind
            )));
        }
        Ok(Self {
            target: Target::Location(location),
            resource_kind,
        })
    }

    /// Handle on a request-status location
    pub fn request(location: impl Into<String>) -> Result<Self> {
        Self::location(location, ResourceKind::Request)
    }

    /// Handle on a resource that should become ready
    pub fn ready(id: impl Into<String>, resource_kind: ResourceKind) -> Result<Self> {
        Self::resource(id, Intent::BecomeReady, resource_kind)
    }

    /// Handle on a resource that should disappear
    pub fn absent(id: impl Into<String>, resource_kind: ResourceKind) -> Result<Self> {
        Self::resource(id, Intent::BecomeAbsent, resource_kind)
    }

    pub fn resource(
        id: impl Into<String>,
        intent: Intent,
        resource_kind: ResourceKind,
    ) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(LroError::MalformedHandle(format!(
                "empty resource id for {}",
                resource_kind
            )));
        }
        Ok(Self {
            target: Target::Resource { id, intent },
            resource_kind,
        })
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn resource_kind(&self) -> ResourceKind {
        self.resource_kind
    }

    pub fn intent(&self) -> Intent {
        self.target.intent()
    }

    /// Short description used in logs and timeout messages
    pub fn describe(&self) -> String {
        format!("{} {}", self.resource_kind, self.target)
    }
}
