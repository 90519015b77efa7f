//! One-shot admin triggers whose response is shown verbatim.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use super::error::LaunchError;
use crate::http::{segment, ApiRequest, Transport};

/// Sync and reset jobs run synchronously on the server and can take a while.
pub const MAINTENANCE_TIMEOUT: Duration = Duration::from_secs(120);
pub const SINGLE_TRANSLATION_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaintenanceAction {
    FoundationSync,
    GrantSync,
    ResetCategories,
    ClearDatabase,
}

impl MaintenanceAction {
    pub const ALL: [MaintenanceAction; 4] = [
        MaintenanceAction::FoundationSync,
        MaintenanceAction::GrantSync,
        MaintenanceAction::ResetCategories,
        MaintenanceAction::ClearDatabase,
    ];

    pub fn endpoint(&self) -> &'static str {
        match self {
            MaintenanceAction::FoundationSync => "/admin/trigger-foundation-sync",
            MaintenanceAction::GrantSync => "/admin/trigger-grant-sync",
            MaintenanceAction::ResetCategories => "/admin/reset-categories",
            MaintenanceAction::ClearDatabase => "/admin/clear-database",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MaintenanceAction::FoundationSync => "Sync Foundations",
            MaintenanceAction::GrantSync => "Sync Grants",
            MaintenanceAction::ResetCategories => "Reset Categories",
            MaintenanceAction::ClearDatabase => "Clear Database",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            MaintenanceAction::FoundationSync => "Synchronizes foundation data from the registry.",
            MaintenanceAction::GrantSync => "Synchronizes grant data.",
            MaintenanceAction::ResetCategories => "Resets and recategorizes all foundations.",
            MaintenanceAction::ClearDatabase => {
                "Clears foundations, applications and profiles. Cannot be undone."
            }
        }
    }

    /// Destructive actions are refused unless the caller confirmed them.
    pub fn is_destructive(&self) -> bool {
        matches!(self, MaintenanceAction::ClearDatabase)
    }
}

#[derive(Clone)]
pub struct Maintenance {
    transport: Arc<dyn Transport>,
    timeout: Duration,
}

impl Maintenance {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            timeout: MAINTENANCE_TIMEOUT,
        }
    }

    /// Override the timeout used for sync and reset actions.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn run(&self, action: MaintenanceAction, confirmed: bool) -> Result<Value, LaunchError> {
        if action.is_destructive() && !confirmed {
            return Err(LaunchError::NotConfirmed {
                action: action.label().to_string(),
            });
        }
        tracing::info!(action = action.label(), "triggering maintenance job");
        let request = ApiRequest::post(action.endpoint())
            .json(json!({}))
            .timeout(self.timeout);
        self.transport
            .send(request)
            .await
            .map_err(|source| LaunchError::Request {
                endpoint: action.endpoint().to_string(),
                source,
            })
    }

    /// Translate one foundation's purpose text; used to try the model before a bulk run.
    pub async fn translate_foundation(&self, foundation_id: &str) -> Result<Value, LaunchError> {
        if foundation_id.trim().is_empty() {
            return Err(LaunchError::InvalidInput("foundation id is required".to_string()));
        }
        let path = format!("/admin/translate-foundation/{}", segment(foundation_id));
        let request = ApiRequest::post(path.clone())
            .json(json!({}))
            .timeout(SINGLE_TRANSLATION_TIMEOUT);
        self.transport
            .send(request)
            .await
            .map_err(|source| LaunchError::Request {
                endpoint: path,
                source,
            })
    }
}
