//! Reusable state for any trigger or poll flow, plus the launch-and-watch
//! driver built on it.

use futures::StreamExt;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::error::JobError;
use super::launcher::{JobEndpoint, Launcher};
use super::poller::Poller;
use super::task::{TaskSnapshot, TaskStatus};

/// Lifecycle of one asynchronous operation.
///
/// # State Machine
/// ```text
/// Idle -> Running(partial) -> Succeeded
///                         \-> Failed
/// any -> start() -> Running(None)
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum AsyncOperation<T, E> {
    Idle,
    /// Holds the latest partial result, if any has arrived
    Running(Option<T>),
    Succeeded(T),
    Failed(E),
}

impl<T, E> Default for AsyncOperation<T, E> {
    fn default() -> Self {
        AsyncOperation::Idle
    }
}

impl<T, E> AsyncOperation<T, E> {
    /// Begin (or restart) the operation, discarding any previous outcome.
    pub fn start(&mut self) {
        *self = AsyncOperation::Running(None);
    }

    /// Record a partial result. Ignored unless running.
    pub fn update(&mut self, partial: T) {
        if let AsyncOperation::Running(slot) = self {
            *slot = Some(partial);
        }
    }

    pub fn succeed(&mut self, value: T) {
        *self = AsyncOperation::Succeeded(value);
    }

    pub fn fail(&mut self, error: E) {
        *self = AsyncOperation::Failed(error);
    }

    pub fn reset(&mut self) {
        *self = AsyncOperation::Idle;
    }

    pub fn is_running(&self) -> bool {
        matches!(self, AsyncOperation::Running(_))
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, AsyncOperation::Succeeded(_) | AsyncOperation::Failed(_))
    }

    /// The freshest value: the partial while running, the result once done.
    pub fn latest(&self) -> Option<&T> {
        match self {
            AsyncOperation::Running(partial) => partial.as_ref(),
            AsyncOperation::Succeeded(value) => Some(value),
            AsyncOperation::Idle | AsyncOperation::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&E> {
        match self {
            AsyncOperation::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Launch a job and follow it to a terminal state.
///
/// `on_change` observes every transition of the operation: the initial
/// running state, each snapshot, and the final outcome. Cancelling `cancel`
/// resets the operation to idle and returns [`JobError::Cancelled`].
pub async fn track<F>(
    launcher: &Launcher,
    poller: &Poller,
    endpoint: &JobEndpoint,
    body: Option<Value>,
    cancel: CancellationToken,
    mut on_change: F,
) -> Result<TaskSnapshot, JobError>
where
    F: FnMut(&AsyncOperation<TaskSnapshot, JobError>),
{
    let mut op = AsyncOperation::default();
    op.start();
    on_change(&op);

    let handle = match launcher.launch(endpoint, body).await {
        Ok(handle) => handle,
        Err(e) => {
            let err = JobError::from(e);
            op.fail(err.clone());
            on_change(&op);
            return Err(err);
        }
    };
    op.update(handle.initial_snapshot());
    on_change(&op);

    let stream = poller.poll(&handle, cancel);
    futures::pin_mut!(stream);

    while let Some(item) = stream.next().await {
        let snapshot = match item {
            Ok(snapshot) => snapshot,
            Err(e) => {
                let err = JobError::Poll(e);
                op.fail(err.clone());
                on_change(&op);
                return Err(err);
            }
        };
        match snapshot.status {
            TaskStatus::Completed => {
                op.succeed(snapshot.clone());
                on_change(&op);
                return Ok(snapshot);
            }
            TaskStatus::Failed => {
                let err = JobError::TaskFailed(Box::new(snapshot));
                op.fail(err.clone());
                on_change(&op);
                return Err(err);
            }
            TaskStatus::Pending | TaskStatus::Running => {
                op.update(snapshot);
                on_change(&op);
            }
        }
    }

    tracing::info!(task_id = %handle.task_id, "stopped tracking task");
    op.reset();
    on_change(&op);
    Err(JobError::Cancelled {
        task_id: handle.task_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::ScriptedTransport;
    use crate::http::ApiError;
    use crate::jobs::{PollError, PollPolicy};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn fast() -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(2),
            max_transient_retries: 0,
        }
    }

    fn wiring(responses: Vec<Result<Value, ApiError>>) -> (Launcher, Poller) {
        let transport: Arc<ScriptedTransport> = Arc::new(ScriptedTransport::new(responses));
        (
            Launcher::new(transport.clone()),
            Poller::new(transport, fast()),
        )
    }

    #[test]
    fn update_is_ignored_unless_running() {
        let mut op: AsyncOperation<u32, String> = AsyncOperation::default();
        op.update(1);
        assert_eq!(op, AsyncOperation::Idle);

        op.start();
        op.update(2);
        assert_eq!(op.latest(), Some(&2));

        op.succeed(3);
        op.update(4);
        assert_eq!(op, AsyncOperation::Succeeded(3));
        assert!(op.is_finished());
    }

    #[test]
    fn restart_clears_previous_failure() {
        let mut op: AsyncOperation<u32, String> = AsyncOperation::default();
        op.start();
        op.fail("boom".to_string());
        assert_eq!(op.error().map(String::as_str), Some("boom"));
        op.start();
        assert!(op.is_running());
        assert_eq!(op.latest(), None);
        assert_eq!(op.error(), None);
    }

    #[tokio::test]
    async fn track_walks_through_running_to_success() {
        let (launcher, poller) = wiring(vec![
            Ok(json!({"task_id": "t1"})),
            Ok(json!({"status": "running", "progress": 50.0, "total": 4})),
            Ok(json!({"status": "completed", "progress": 100.0, "completed": 4, "total": 4})),
        ]);
        let mut seen = Vec::new();

        let result = track(
            &launcher,
            &poller,
            &JobEndpoint::bulk_translation(false),
            None,
            CancellationToken::new(),
            |op| seen.push(op.clone()),
        )
        .await
        .unwrap();

        assert_eq!(result.completed, 4);
        assert_eq!(seen.len(), 4);
        assert_eq!(seen[0], AsyncOperation::Running(None));
        assert_eq!(
            seen[1].latest().map(|s| s.status),
            Some(TaskStatus::Pending)
        );
        assert_eq!(seen[2].latest().map(|s| s.progress_percent), Some(50.0));
        assert!(matches!(seen[3], AsyncOperation::Succeeded(_)));
    }

    #[tokio::test]
    async fn server_reported_failure_is_task_failed() {
        let (launcher, poller) = wiring(vec![
            Ok(json!({"task_id": "t1"})),
            Ok(json!({"status": "failed", "error": "quota"})),
        ]);
        let mut last = AsyncOperation::Idle;

        let err = track(
            &launcher,
            &poller,
            &JobEndpoint::bulk_translation(false),
            None,
            CancellationToken::new(),
            |op| last = op.clone(),
        )
        .await
        .unwrap_err();

        match &err {
            JobError::TaskFailed(snapshot) => assert_eq!(snapshot.error.as_deref(), Some("quota")),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(matches!(last, AsyncOperation::Failed(JobError::TaskFailed(_))));
    }

    #[tokio::test]
    async fn launch_failure_skips_polling() {
        let transport = Arc::new(ScriptedTransport::new(vec![Err(ApiError::from_status(
            403,
            "forbidden".to_string(),
        ))]));
        let launcher = Launcher::new(transport.clone());
        let poller = Poller::new(transport.clone(), fast());

        let err = track(
            &launcher,
            &poller,
            &JobEndpoint::bulk_translation(false),
            None,
            CancellationToken::new(),
            |_| {},
        )
        .await
        .unwrap_err();

        assert!(matches!(err, JobError::Launch(_)));
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn poll_failure_is_distinct_from_task_failure() {
        let (launcher, poller) = wiring(vec![
            Ok(json!({"task_id": "t1"})),
            Err(ApiError::from_status(404, "gone".to_string())),
        ]);
        let err = track(
            &launcher,
            &poller,
            &JobEndpoint::bulk_translation(false),
            None,
            CancellationToken::new(),
            |_| {},
        )
        .await
        .unwrap_err();
        assert!(matches!(err, JobError::Poll(PollError::Gone { .. })));
    }

    #[tokio::test]
    async fn cancellation_resets_to_idle() {
        let (launcher, poller) = wiring(vec![
            Ok(json!({"task_id": "t1"})),
            Ok(json!({"status": "running", "progress": 1.0})),
        ]);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let mut last = AsyncOperation::Idle;

        let err = track(
            &launcher,
            &poller,
            &JobEndpoint::bulk_translation(false),
            None,
            cancel,
            |op| {
                if op.latest().map(|s| s.status) == Some(TaskStatus::Running) {
                    trigger.cancel();
                }
                last = op.clone();
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, JobError::Cancelled { .. }));
        assert_eq!(last, AsyncOperation::Idle);
    }
}
