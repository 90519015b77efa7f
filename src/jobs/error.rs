//! Failure taxonomy for job launch and polling.
//!
//! Every variant is terminal for its own poll loop and is surfaced verbatim;
//! nothing here escalates beyond the loop that produced it.

use super::task::{TaskId, TaskSnapshot};
use crate::http::{ApiError, ApiErrorKind};

/// The task never started.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LaunchError {
    #[error("Failed to start {endpoint}: {source}")]
    Request {
        endpoint: String,
        #[source]
        source: ApiError,
    },

    #[error("{endpoint} accepted the request but returned no task id")]
    MissingTaskId { endpoint: String },

    #[error("{action} is destructive and must be confirmed")]
    NotConfirmed { action: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// A status request failed. The poll loop stops after emitting one of these.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PollError {
    #[error("{target} no longer exists on the server")]
    Gone { target: String },

    #[error("Session rejected while polling {target}; sign in again")]
    Unauthorized { target: String },

    #[error("Server refused the status request for {target}: {message}")]
    Rejected { target: String, message: String },

    #[error("Unreadable status response for {target}: {message}")]
    Protocol { target: String, message: String },

    #[error("Status request for {target} failed after {attempts} attempt(s): {message}")]
    Transient {
        target: String,
        attempts: u32,
        message: String,
    },
}

impl PollError {
    /// Map a request failure onto the poll taxonomy. `attempts` counts the
    /// consecutive failed requests including this one.
    pub fn classify(target: &str, err: ApiError, attempts: u32) -> Self {
        let target = target.to_string();
        match err.kind {
            ApiErrorKind::NotFound | ApiErrorKind::Gone => PollError::Gone { target },
            ApiErrorKind::Unauthorized => PollError::Unauthorized { target },
            ApiErrorKind::Decode => PollError::Protocol {
                target,
                message: err.message,
            },
            ApiErrorKind::ClientError => PollError::Rejected {
                target,
                message: err.to_string(),
            },
            ApiErrorKind::RateLimited
            | ApiErrorKind::ServerError
            | ApiErrorKind::Network
            | ApiErrorKind::Timeout => PollError::Transient {
                target,
                attempts,
                message: err.to_string(),
            },
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, PollError::Transient { .. })
    }

    pub fn target(&self) -> &str {
        match self {
            PollError::Gone { target }
            | PollError::Unauthorized { target }
            | PollError::Rejected { target, .. }
            | PollError::Protocol { target, .. }
            | PollError::Transient { target, .. } => target,
        }
    }
}

/// Outcome of a tracked job that did not complete.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum JobError {
    #[error(transparent)]
    Launch(#[from] LaunchError),

    #[error(transparent)]
    Poll(#[from] PollError),

    /// The server reported that the job itself failed.
    #[error("Task {} failed: {}", .0.task_id, .0.error.as_deref().unwrap_or("unknown error"))]
    TaskFailed(Box<TaskSnapshot>),

    #[error("Stopped watching task {task_id}")]
    Cancelled { task_id: TaskId },
}
