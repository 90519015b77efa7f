use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::error::LaunchError;
use super::task::{TaskId, TaskSnapshot};
use crate::http::{segment, ApiRequest, Transport};

/// Where a job is started and where its status lives.
#[derive(Debug, Clone, PartialEq)]
pub struct JobEndpoint {
    launch_path: String,
    query: Vec<(String, String)>,
    status_prefix: String,
}

impl JobEndpoint {
    pub fn new(launch_path: impl Into<String>, status_prefix: impl Into<String>) -> Self {
        let mut status_prefix = status_prefix.into();
        while status_prefix.ends_with('/') {
            status_prefix.pop();
        }
        Self {
            launch_path: launch_path.into(),
            query: Vec::new(),
            status_prefix,
        }
    }

    /// Bulk translation of every foundation purpose text.
    /// `force` re-translates entries that already have a translation.
    pub fn bulk_translation(force: bool) -> Self {
        let endpoint = Self::new(
            "/admin/trigger-bulk-purpose-translation",
            "/admin/bulk-translation-status",
        );
        if force {
            endpoint.with_query("force", "true")
        } else {
            endpoint
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn launch_path(&self) -> &str {
        &self.launch_path
    }

    pub fn status_path(&self, task_id: &TaskId) -> String {
        format!("{}/{}", self.status_prefix, segment(task_id.as_str()))
    }
}

/// A launched task, ready to be polled.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskHandle {
    pub task_id: TaskId,
    pub status_path: String,
    pub launched_at: DateTime<Utc>,
}

impl TaskHandle {
    pub fn initial_snapshot(&self) -> TaskSnapshot {
        TaskSnapshot::pending(self.task_id.clone())
    }
}

/// Starts server-side jobs. Launches are never retried; the operator decides
/// whether to try again.
#[derive(Clone)]
pub struct Launcher {
    transport: Arc<dyn Transport>,
}

impl Launcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub async fn launch(
        &self,
        endpoint: &JobEndpoint,
        body: Option<Value>,
    ) -> Result<TaskHandle, LaunchError> {
        let mut request = ApiRequest::post(endpoint.launch_path.clone());
        for (key, value) in &endpoint.query {
            request = request.query(key.clone(), value.clone());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|source| LaunchError::Request {
                endpoint: endpoint.launch_path.clone(),
                source,
            })?;

        let task_id = extract_task_id(&response).ok_or_else(|| LaunchError::MissingTaskId {
            endpoint: endpoint.launch_path.clone(),
        })?;
        tracing::info!(%task_id, endpoint = %endpoint.launch_path, "task launched");

        Ok(TaskHandle {
            status_path: endpoint.status_path(&task_id),
            task_id,
            launched_at: Utc::now(),
        })
    }
}

fn extract_task_id(body: &Value) -> Option<TaskId> {
    match body.get("task_id")? {
        Value::String(s) if !s.trim().is_empty() => Some(TaskId::new(s.trim())),
        Value::Number(n) => Some(TaskId::new(n.to_string())),
        _ => None,
    }
}
