use serde::{Deserialize, Serialize};

/// Per-item enrichment state. The set is fixed by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrichmentState {
    Unprocessed,
    Pending,
    Processing,
    Completed,
    Failed,
}

impl EnrichmentState {
    pub const ALL: [EnrichmentState; 5] = [
        EnrichmentState::Unprocessed,
        EnrichmentState::Pending,
        EnrichmentState::Processing,
        EnrichmentState::Completed,
        EnrichmentState::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EnrichmentState::Unprocessed => "UNPROCESSED",
            EnrichmentState::Pending => "PENDING",
            EnrichmentState::Processing => "PROCESSING",
            EnrichmentState::Completed => "COMPLETED",
            EnrichmentState::Failed => "FAILED",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentCounts {
    #[serde(default, rename = "UNPROCESSED")]
    pub unprocessed: u64,
    #[serde(default, rename = "PENDING")]
    pub pending: u64,
    #[serde(default, rename = "PROCESSING")]
    pub processing: u64,
    #[serde(default, rename = "COMPLETED")]
    pub completed: u64,
    #[serde(default, rename = "FAILED")]
    pub failed: u64,
}

impl EnrichmentCounts {
    pub fn get(&self, state: EnrichmentState) -> u64 {
        match state {
            EnrichmentState::Unprocessed => self.unprocessed,
            EnrichmentState::Pending => self.pending,
            EnrichmentState::Processing => self.processing,
            EnrichmentState::Completed => self.completed,
            EnrichmentState::Failed => self.failed,
        }
    }

    pub fn sum(&self) -> u64 {
        EnrichmentState::ALL
            .iter()
            .fold(0u64, |acc, s| acc.saturating_add(self.get(*s)))
    }
}

/// Fleet-wide enrichment progress from `GET /admin/enrich/status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentStatus {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub counts: EnrichmentCounts,
    /// As reported by the server; prefer [`EnrichmentStatus::completed_percentage`]
    #[serde(default, rename = "completed_percentage")]
    pub reported_completed_percentage: Option<f64>,
    #[serde(default)]
    pub failed_count: Option<u64>,
    #[serde(default)]
    pub remaining: Option<u64>,
}

impl EnrichmentStatus {
    /// `100 * completed / total`, or 0 for an empty domain.
    pub fn completed_percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            100.0 * self.counts.completed as f64 / self.total as f64
        }
    }

    /// Nothing is queued or in flight.
    pub fn is_settled(&self) -> bool {
        self.counts.pending == 0 && self.counts.processing == 0
    }

    pub fn counts_consistent(&self) -> bool {
        self.counts.sum() <= self.total
    }
}
