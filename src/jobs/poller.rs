//! Fixed-interval status polling as a cancellable lazy stream.
//!
//! # Loop
//! ```text
//! request ──ok──> emit ──terminal──> end
//!    │              └──otherwise──> wait interval ──> request
//!    └──err──> transient and retries left? ──yes──> wait interval ──> request
//!                                         └──no───> emit PollError ──> end
//! ```
//!
//! Requests never overlap: the next one is issued only after the previous
//! response or error has been observed, so emission order equals issue order.
//! Cancellation is checked before each request and raced against the wait.
//! A request already in flight is allowed to finish; its result is dropped.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::Stream;
use tokio_util::sync::CancellationToken;

use super::error::PollError;
use super::launcher::TaskHandle;
use super::task::{StatusPayload, TaskId, TaskSnapshot};
use crate::http::{decode, ApiError, ApiRequest, Transport};

/// Interval observed by the admin console.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    /// Fixed delay between a response and the next request. No backoff.
    pub interval: Duration,
    /// How many consecutive transient failures are absorbed before the loop
    /// gives up. Zero stops on the first failure.
    pub max_transient_retries: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_transient_retries: 0,
        }
    }
}

/// Poll `fetch` until `is_terminal` holds, a non-retried error occurs, or
/// `cancel` fires.
pub fn poll_until<T, F, Fut, P>(
    label: String,
    policy: PollPolicy,
    cancel: CancellationToken,
    mut fetch: F,
    is_terminal: P,
) -> impl Stream<Item = Result<T, PollError>> + Send
where
    T: Send + 'static,
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, ApiError>> + Send,
    P: Fn(&T) -> bool + Send + 'static,
{
    async_stream::stream! {
        let mut failures: u32 = 0;
        let mut tick: u64 = 0;

        loop {
            if cancel.is_cancelled() {
                tracing::debug!(%label, tick, "poll cancelled before request");
                break;
            }
            tick += 1;

            let result = fetch().await;
            if cancel.is_cancelled() {
                tracing::debug!(%label, tick, "discarding response that arrived after cancellation");
                break;
            }

            match result {
                Ok(item) => {
                    failures = 0;
                    let done = is_terminal(&item);
                    yield Ok(item);
                    if done {
                        tracing::debug!(%label, tick, "terminal state reached");
                        break;
                    }
                }
                Err(err) => {
                    failures += 1;
                    if err.is_transient() && failures <= policy.max_transient_retries {
                        tracing::warn!(
                            %label,
                            attempt = failures,
                            max_retries = policy.max_transient_retries,
                            "transient poll failure, retrying: {}",
                            err
                        );
                    } else {
                        tracing::warn!(%label, tick, "polling stopped: {}", err);
                        yield Err(PollError::classify(&label, err, failures));
                        break;
                    }
                }
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!(%label, tick, "poll cancelled while waiting");
                    break;
                }
                _ = tokio::time::sleep(policy.interval) => {}
            }
        }
    }
}

/// Polls task status endpoints.
#[derive(Clone)]
pub struct Poller {
    transport: Arc<dyn Transport>,
    policy: PollPolicy,
}

impl Poller {
    pub fn new(transport: Arc<dyn Transport>, policy: PollPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Stream snapshots for a launched task.
    pub fn poll(
        &self,
        handle: &TaskHandle,
        cancel: CancellationToken,
    ) -> impl Stream<Item = Result<TaskSnapshot, PollError>> + Send {
        self.poll_task(handle.task_id.clone(), handle.status_path.clone(), cancel)
    }

    /// Stream snapshots for a task by id. Calling this again with the same id
    /// restarts polling from scratch.
    pub fn poll_task(
        &self,
        task_id: TaskId,
        status_path: String,
        cancel: CancellationToken,
    ) -> impl Stream<Item = Result<TaskSnapshot, PollError>> + Send {
        let transport = self.transport.clone();
        let label = format!("task {}", task_id);
        let fetch = move || {
            let transport = transport.clone();
            let task_id = task_id.clone();
            let path = status_path.clone();
            async move { fetch_snapshot(transport.as_ref(), task_id, path).await }
        };
        poll_until(label, self.policy.clone(), cancel, fetch, TaskSnapshot::is_terminal)
    }
}

async fn fetch_snapshot(
    transport: &dyn Transport,
    task_id: TaskId,
    status_path: String,
) -> Result<TaskSnapshot, ApiError> {
    let body = transport.send(ApiRequest::get(status_path)).await?;
    let payload: StatusPayload = decode("task status", body)?;
    let snapshot = TaskSnapshot::from_payload(task_id, payload);
    if !snapshot.counts_consistent() {
        tracing::warn!(
            task_id = %snapshot.task_id,
            completed = snapshot.completed,
            failed = snapshot.failed,
            skipped = snapshot.skipped,
            total = snapshot.total,
            "status counts exceed total"
        );
    }
    Ok(snapshot)
}
