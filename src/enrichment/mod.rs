//! Enrichment pipeline client: fleet runs, fleet status, single-item test runs
//! and the per-field consensus they produce.

mod consensus;
mod report;
mod status;

use std::sync::Arc;

use futures::Stream;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::http::{decode, segment, ApiError, ApiRequest, Transport};
use crate::jobs::{poll_until, LaunchError, PollError, PollPolicy};

pub use consensus::{normalize, reduce, Extraction, FieldConsensus, FieldVerdict};
pub use report::{ConsensusSummary, EnrichmentReport, EnrichmentStep};
pub use status::{EnrichmentCounts, EnrichmentState, EnrichmentStatus};

const START_PATH: &str = "/admin/enrich/start";
const STATUS_PATH: &str = "/admin/enrich/status";

/// Knobs for a single-item test run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestRunOptions {
    /// Replaces the extraction prompt for this run only
    pub custom_prompt: Option<String>,
    /// Search again even if sources are cached
    pub force_search: bool,
}

#[derive(Debug, Deserialize)]
struct StartResponse {
    #[serde(default)]
    enqueued: u64,
}

#[derive(Clone)]
pub struct EnrichmentClient {
    transport: Arc<dyn Transport>,
    policy: PollPolicy,
}

impl EnrichmentClient {
    pub fn new(transport: Arc<dyn Transport>, policy: PollPolicy) -> Self {
        Self { transport, policy }
    }

    /// Queue every unprocessed item. Returns how many were enqueued.
    pub async fn start(&self) -> Result<u64, LaunchError> {
        let to_launch_error = |source| LaunchError::Request {
            endpoint: START_PATH.to_string(),
            source,
        };
        let body = self
            .transport
            .send(ApiRequest::post(START_PATH))
            .await
            .map_err(to_launch_error)?;
        let started: StartResponse = decode("enrichment start", body).map_err(to_launch_error)?;
        tracing::info!(enqueued = started.enqueued, "enrichment run started");
        Ok(started.enqueued)
    }

    pub async fn status(&self) -> Result<EnrichmentStatus, ApiError> {
        fetch_status(self.transport.as_ref()).await
    }

    /// Poll fleet status until nothing is pending or processing.
    pub fn watch(
        &self,
        cancel: CancellationToken,
    ) -> impl Stream<Item = Result<EnrichmentStatus, PollError>> + Send {
        let transport = self.transport.clone();
        let fetch = move || {
            let transport = transport.clone();
            async move { fetch_status(transport.as_ref()).await }
        };
        poll_until(
            "enrichment fleet".to_string(),
            self.policy.clone(),
            cancel,
            fetch,
            EnrichmentStatus::is_settled,
        )
    }

    /// Run the whole pipeline for one item and return every step plus the
    /// voted fields.
    pub async fn test_item(
        &self,
        item_id: &str,
        options: &TestRunOptions,
    ) -> Result<EnrichmentReport, ApiError> {
        let mut request = ApiRequest::post(format!("/admin/enrich/foundation/{}", segment(item_id)));
        if let Some(prompt) = options.custom_prompt.as_deref().filter(|p| !p.trim().is_empty()) {
            request = request.query("custom_prompt", prompt);
        }
        if options.force_search {
            request = request.query("force_search", "true");
        }
        let body = self.transport.send(request).await?;
        let report: EnrichmentReport = decode("enrichment test", body)?;
        tracing::debug!(
            item = item_id,
            steps = report.steps.len(),
            fields = report.enriched_data.len(),
            "enrichment test finished"
        );
        Ok(report)
    }
}

async fn fetch_status(transport: &dyn Transport) -> Result<EnrichmentStatus, ApiError> {
    let body = transport.send(ApiRequest::get(STATUS_PATH)).await?;
    let status: EnrichmentStatus = decode("enrichment status", body)?;
    if !status.counts_consistent() {
        tracing::warn!(
            total = status.total,
            counted = status.counts.sum(),
            "enrichment counts exceed total"
        );
    }
    Ok(status)
}
