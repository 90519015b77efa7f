//! Moderation queue on the scraping engine: list, re-scrape, review, approve.

mod types;

use std::sync::Arc;

use crate::http::{decode, segment, ApiError, ApiRequest, Transport};

pub use types::{
    parse_timestamp, ApproveResponse, MessageResponse, Scholarship, ScholarshipQueueItem,
    ScholarshipStatus,
};

const QUEUE_PATH: &str = "/scholarships/queue";

/// Client for the engine API. The transport must point at the engine base
/// (`/api/v1`), not the admin backend.
#[derive(Clone)]
pub struct ScholarshipClient {
    transport: Arc<dyn Transport>,
}

impl ScholarshipClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub async fn queue(&self) -> Result<Vec<ScholarshipQueueItem>, ApiError> {
        let body = self.transport.send(ApiRequest::get(QUEUE_PATH)).await?;
        let items: Vec<ScholarshipQueueItem> = decode("queue", body)?;
        tracing::debug!(items = items.len(), "fetched moderation queue");
        Ok(items)
    }

    /// Ask the engine to scrape the record again.
    pub async fn trigger_scrape(&self, id: &str) -> Result<MessageResponse, ApiError> {
        let path = format!("/scholarships/{}/trigger-scrape", segment(id));
        let body = self.transport.send(ApiRequest::post(path)).await?;
        let response = decode("trigger scrape", body)?;
        tracing::info!(scholarship = id, "scrape triggered");
        Ok(response)
    }

    pub async fn review(&self, id: &str) -> Result<Scholarship, ApiError> {
        let path = format!("/scholarships/{}/review", segment(id));
        let body = self.transport.send(ApiRequest::get(path)).await?;
        decode("review", body)
    }

    /// Publish the record.
    pub async fn approve(&self, id: &str) -> Result<ApproveResponse, ApiError> {
        let path = format!("/scholarships/{}/approve", segment(id));
        let body = self.transport.send(ApiRequest::patch(path)).await?;
        let response: ApproveResponse = decode("approve", body)?;
        tracing::info!(scholarship = %response.id, status = %response.status, "scholarship approved");
        Ok(response)
    }
}

/// Case-insensitive substring match on name or organization. A blank term
/// keeps every item.
pub fn filter_queue<'a>(
    items: &'a [ScholarshipQueueItem],
    term: &str,
) -> Vec<&'a ScholarshipQueueItem> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return items.iter().collect();
    }
    items
        .iter()
        .filter(|item| {
            item.name.to_lowercase().contains(&needle)
                || item.organization_name.to_lowercase().contains(&needle)
        })
        .collect()
}
