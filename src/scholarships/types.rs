use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScholarshipStatus {
    New,
    NeedsReview,
    Published,
    Failed,
}

impl std::fmt::Display for ScholarshipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ScholarshipStatus::New => "NEW",
            ScholarshipStatus::NeedsReview => "NEEDS_REVIEW",
            ScholarshipStatus::Published => "PUBLISHED",
            ScholarshipStatus::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// Row in the moderation queue (NEW or FAILED records).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScholarshipQueueItem {
    pub id: String,
    pub name: String,
    pub organization_name: String,
    pub status: ScholarshipStatus,
    pub created_at: String,
}

impl ScholarshipQueueItem {
    /// Calendar date the record entered the queue, if the timestamp parses.
    pub fn added_on(&self) -> Option<String> {
        parse_timestamp(&self.created_at).map(|t| t.format("%Y-%m-%d").to_string())
    }
}

/// Full record as returned for review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scholarship {
    pub id: String,
    pub name: String,
    pub organization_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub requirements: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub application_method: Option<String>,
    #[serde(default)]
    pub official_url: Option<String>,
    pub status: ScholarshipStatus,
    #[serde(default)]
    pub raw_scraped_content: Option<String>,
    #[serde(default)]
    pub embedding: Option<String>,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Scholarship {
    /// AI-extracted fields that have a value, labelled, in review order.
    pub fn extracted_fields(&self) -> Vec<(&'static str, &str)> {
        let optional = [
            ("Description", &self.description),
            ("Requirements", &self.requirements),
            ("Amount", &self.amount),
            ("Deadline", &self.deadline),
            ("Application Method", &self.application_method),
            ("Official URL", &self.official_url),
        ];

        let mut fields = vec![
            ("Name", self.name.as_str()),
            ("Organization", self.organization_name.as_str()),
        ];
        fields.retain(|(_, v)| !v.trim().is_empty());
        fields.extend(optional.into_iter().filter_map(|(label, value)| {
            value
                .as_deref()
                .filter(|v| !v.trim().is_empty())
                .map(|v| (label, v))
        }));
        fields
    }

    pub fn awaiting_review(&self) -> bool {
        self.status == ScholarshipStatus::NeedsReview
    }
}

/// Accepts RFC 3339 as well as the naive ISO timestamps the backend emits
/// for columns without a time zone (read as UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|t| t.and_utc())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveResponse {
    #[serde(default)]
    pub message: String,
    pub id: String,
    pub status: ScholarshipStatus,
}
