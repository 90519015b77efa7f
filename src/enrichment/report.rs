use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::consensus::FieldConsensus;

/// One stage of the search → scrape → extract → vote pipeline for a single item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentStep {
    pub step: String,
    pub status: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl EnrichmentStep {
    pub fn is_failure(&self) -> bool {
        matches!(
            self.status.to_ascii_lowercase().as_str(),
            "failed" | "error"
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusSummary {
    #[serde(default)]
    pub sites_used: u32,
}

/// Response of a single-item enrichment run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentReport {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub steps: Vec<EnrichmentStep>,
    /// Field name to voted value; ordered by field name
    #[serde(default)]
    pub enriched_data: BTreeMap<String, FieldConsensus>,
    #[serde(default)]
    pub consensus: ConsensusSummary,
}

impl EnrichmentReport {
    pub fn found_fields(&self) -> impl Iterator<Item = (&str, &FieldConsensus)> {
        self.enriched_data
            .iter()
            .filter(|(_, field)| field.is_found())
            .map(|(name, field)| (name.as_str(), field))
    }

    pub fn missing_fields(&self) -> impl Iterator<Item = &str> {
        self.enriched_data
            .iter()
            .filter(|(_, field)| !field.is_found())
            .map(|(name, _)| name.as_str())
    }

    pub fn failed_steps(&self) -> impl Iterator<Item = &EnrichmentStep> {
        self.steps.iter().filter(|s| s.is_failure())
    }
}
