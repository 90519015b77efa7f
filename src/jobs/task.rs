//! Server-side task snapshots as seen by the poller.
//!
//! # Invariants
//! - A snapshot is only ever produced from a status response; the client
//!   never edits status fields locally.
//! - `completed + failed + skipped <= total` is expected but not enforced.

use serde::{Deserialize, Deserializer, Serialize};

/// Opaque identifier the backend assigns at launch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Status of a server-side task.
///
/// # State Machine
/// ```text
/// Pending -> Running -> Completed
///                   \-> Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    /// Map a wire status string. Anything unrecognised counts as running so
    /// that polling continues.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" | "queued" => TaskStatus::Pending,
            "completed" | "done" | "success" => TaskStatus::Completed,
            "failed" | "error" => TaskStatus::Failed,
            _ => TaskStatus::Running,
        }
    }

    /// `true` if the task is Completed or Failed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

impl<'de> Deserialize<'de> for TaskStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(TaskStatus::parse(&raw))
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// One observation of a task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskSnapshot {
    pub task_id: TaskId,
    pub status: TaskStatus,
    /// Expected in [0, 100] and non-decreasing while running
    pub progress_percent: f64,
    pub completed: u64,
    pub failed: u64,
    pub skipped: u64,
    pub total: u64,
    /// Always `None` once the status is terminal
    pub estimated_seconds_remaining: Option<f64>,
    /// Server-supplied failure message
    pub error: Option<String>,
}

impl TaskSnapshot {
    /// The state a task is in right after launch, before the first poll.
    pub fn pending(task_id: TaskId) -> Self {
        Self {
            task_id,
            status: TaskStatus::Pending,
            progress_percent: 0.0,
            completed: 0,
            failed: 0,
            skipped: 0,
            total: 0,
            estimated_seconds_remaining: None,
            error: None,
        }
    }

    pub fn from_payload(task_id: TaskId, payload: StatusPayload) -> Self {
        let status = payload.status;
        Self {
            task_id,
            status,
            progress_percent: payload.progress.unwrap_or(0.0),
            completed: payload.completed.unwrap_or(0),
            failed: payload.failed.unwrap_or(0),
            skipped: payload.skipped.unwrap_or(0),
            total: payload.total.unwrap_or(0),
            estimated_seconds_remaining: if status.is_terminal() {
                None
            } else {
                payload.estimated_remaining_seconds
            },
            error: payload.error.filter(|e| !e.trim().is_empty()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Whether the per-outcome counts fit inside `total`.
    pub fn counts_consistent(&self) -> bool {
        self.completed
            .saturating_add(self.failed)
            .saturating_add(self.skipped)
            <= self.total
    }
}

/// Wire shape of `GET /admin/bulk-translation-status/{task_id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusPayload {
    pub status: TaskStatus,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub completed: Option<u64>,
    #[serde(default)]
    pub failed: Option<u64>,
    #[serde(default)]
    pub skipped: Option<u64>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub estimated_remaining_seconds: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
}
