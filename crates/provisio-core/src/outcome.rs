//! Poll outcomes

use crate::client::RawStatus;
use crate::error::{LroError, Result};

/// Terminal result of a single [`crate::Poller::wait`]
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The operation completed; carries the last observed representation
    Ready(RawStatus),

    /// The remote system reported that the operation will never succeed
    Failed(String),

    /// The caller's deadline passed or its context was cancelled
    ///
    /// This says nothing about the remote side: the operation may still
    /// complete after the caller gave up.
    TimedOut {
        /// Last transient query error observed, if any
        last_error: Option<String>,
    },
}

impl PollOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, PollOutcome::Ready(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, PollOutcome::Failed(_))
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, PollOutcome::TimedOut { .. })
    }

    /// Convert into a `Result`, naming `what` in the error messages
    pub fn into_result(self, what: impl std::fmt::Display) -> Result<RawStatus> {
        match self {
            PollOutcome::Ready(status) => Ok(status),
            PollOutcome::Failed(reason) => {
                Err(LroError::OperationFailed(format!("{}: {}", what, reason)))
            }
            PollOutcome::TimedOut { last_error: None } => Err(LroError::TimedOut(what.to_string())),
            PollOutcome::TimedOut {
                last_error: Some(error),
            } => Err(LroError::TimedOut(format!(
                "{} (last error: {})",
                what, error
            ))),
        }
    }
}

impl std::fmt::Display for PollOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PollOutcome::Ready(_) => write!(f, "ready"),
            PollOutcome::Failed(reason) => write!(f, "failed: {}", reason),
            PollOutcome::TimedOut { .. } => write!(f, "timed out"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_into_result() {
        let ready = PollOutcome::Ready(RawStatus::ok(json!({ "id": "lb-1" })));
        assert_eq!(ready.into_result("lb").unwrap().id(), Some("lb-1"));

        let failed = PollOutcome::Failed("state FAILED".to_string());
        assert!(matches!(
            failed.into_result("lb"),
            Err(LroError::OperationFailed(msg)) if msg == "lb: state FAILED"
        ));

        let timed_out = PollOutcome::TimedOut {
            last_error: Some("connection reset".to_string()),
        };
        let err = timed_out.into_result("lb").unwrap_err();
        assert!(matches!(err, LroError::TimedOut(_)));
        assert!(err.to_string().contains("connection reset"));
    }
}
