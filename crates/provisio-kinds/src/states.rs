//! Lifecycle vocabulary of the provisioning API

/// JSON pointer of the lifecycle state on every resource representation
pub const STATE_POINTER: &str = "/metadata/state";

/// JSON pointer of the status on a request-status payload
pub const REQUEST_STATUS_POINTER: &str = "/metadata/status";

/// JSON pointer of the failure message on a request-status payload
pub const REQUEST_MESSAGE_POINTER: &str = "/metadata/message";

/// Optional failure message some resources attach to their metadata
pub const STATE_MESSAGE_POINTER: &str = "/metadata/stateMessage";

// Resource lifecycle states
pub const AVAILABLE: &str = "AVAILABLE";
pub const ACTIVE: &str = "ACTIVE";
pub const BUSY: &str = "BUSY";
pub const DEPLOYING: &str = "DEPLOYING";
pub const UPDATING: &str = "UPDATING";
pub const DESTROYING: &str = "DESTROYING";
pub const INACTIVE: &str = "INACTIVE";
pub const DEGRADED: &str = "DEGRADED";
pub const FAILED: &str = "FAILED";
pub const FAILED_SUSPENDED: &str = "FAILED_SUSPENDED";
pub const FAILED_UPDATING: &str = "FAILED_UPDATING";
pub const FAILED_DESTROYING: &str = "FAILED_DESTROYING";
pub const ERROR: &str = "ERROR";

// Certificate states
pub const ISSUED: &str = "ISSUED";
pub const REVOKED: &str = "REVOKED";

// Request statuses
pub const QUEUED: &str = "QUEUED";
pub const RUNNING: &str = "RUNNING";
pub const DONE: &str = "DONE";

/// States from which a resource never recovers on its own
pub const PERMANENT_FAILURES: [&str; 5] = [
    FAILED,
    FAILED_SUSPENDED,
    FAILED_UPDATING,
    FAILED_DESTROYING,
    ERROR,
];
