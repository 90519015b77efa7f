//! Majority vote across per-source field extractions.
//!
//! Values are grouped after trimming and Unicode lowercasing. Blank or absent
//! values never vote, but their source still appears in `sources`. The
//! reported value is the first-seen spelling of the winning group; ties go to
//! the group seen first.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One source's answer for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub source_url: String,
    pub value: Option<String>,
}

impl Extraction {
    pub fn new(source_url: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            value: Some(value.into()),
        }
    }

    pub fn missing(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            value: None,
        }
    }
}

/// The agreed value for one field.
///
/// # Invariants
/// - `votes == 0` means "not found", whatever `value` holds.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FieldConsensus {
    #[serde(default, deserialize_with = "value_as_text")]
    pub value: Option<String>,
    #[serde(default)]
    pub votes: u32,
    /// Every contributing source, in the order they were consulted
    #[serde(default)]
    pub sources: Vec<String>,
}

/// How a field should be presented to a reviewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldVerdict<'a> {
    NotFound,
    Found {
        value: &'a str,
        votes: u32,
        sources: usize,
    },
}

impl std::fmt::Display for FieldVerdict<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldVerdict::NotFound => write!(f, "not found"),
            FieldVerdict::Found {
                value,
                votes,
                sources,
            } => write!(f, "{} ({}/{} sources agree)", value, votes, sources),
        }
    }
}

impl FieldConsensus {
    pub fn verdict(&self) -> FieldVerdict<'_> {
        match self.value.as_deref() {
            Some(value) if self.votes > 0 => FieldVerdict::Found {
                value,
                votes: self.votes,
                sources: self.sources.len(),
            },
            _ => FieldVerdict::NotFound,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self.verdict(), FieldVerdict::Found { .. })
    }
}

/// Grouping key for a raw value, `None` if it should not vote.
pub fn normalize(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

struct Group {
    key: String,
    display: String,
    votes: u32,
}

pub fn reduce<I>(extractions: I) -> FieldConsensus
where
    I: IntoIterator<Item = Extraction>,
{
    let mut sources = Vec::new();
    // Insertion-ordered so the first-seen group wins ties.
    let mut groups: Vec<Group> = Vec::new();

    for extraction in extractions {
        sources.push(extraction.source_url);
        let Some(raw) = extraction.value else {
            continue;
        };
        let Some(key) = normalize(&raw) else {
            continue;
        };
        match groups.iter_mut().find(|g| g.key == key) {
            Some(group) => group.votes += 1,
            None => groups.push(Group {
                key,
                display: raw.trim().to_string(),
                votes: 1,
            }),
        }
    }

    let mut winner: Option<&Group> = None;
    for group in &groups {
        if winner.map_or(true, |w| group.votes > w.votes) {
            winner = Some(group);
        }
    }

    FieldConsensus {
        value: winner.map(|g| g.display.clone()),
        votes: winner.map_or(0, |g| g.votes),
        sources,
    }
}

/// The enrichment backend sends whatever JSON the model produced; render
/// anything that is not a string as compact JSON text.
fn value_as_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn majority_wins_and_all_sources_are_kept() {
        let result = reduce(vec![
            Extraction::new("a.com", "2024-05-01"),
            Extraction::new("b.com", "2024-05-01"),
            Extraction::new("c.com", "2024-06-01"),
        ]);
        assert_eq!(
            result,
            FieldConsensus {
                value: Some("2024-05-01".to_string()),
                votes: 2,
                sources: vec!["a.com".into(), "b.com".into(), "c.com".into()],
            }
        );
    }

    #[test]
    fn empty_input_has_no_value() {
        assert_eq!(reduce(Vec::new()), FieldConsensus::default());
        assert_eq!(reduce(Vec::new()).verdict(), FieldVerdict::NotFound);
    }

    #[test]
    fn tie_goes_to_first_seen() {
        let result = reduce(vec![Extraction::new("1", "X"), Extraction::new("2", "Y")]);
        assert_eq!(result.value.as_deref(), Some("X"));
        assert_eq!(result.votes, 1);
    }

    #[test]
    fn later_majority_beats_earlier_singleton() {
        let result = reduce(vec![
            Extraction::new("1", "X"),
            Extraction::new("2", "Y"),
            Extraction::new("3", "Y"),
        ]);
        assert_eq!(result.value.as_deref(), Some("Y"));
        assert_eq!(result.votes, 2);
    }

    #[test]
    fn grouping_ignores_case_and_surrounding_whitespace() {
        let result = reduce(vec![
            Extraction::new("a", "  Via webbformulär "),
            Extraction::new("b", "via WEBBFORMULÄR"),
            Extraction::new("c", "Per post"),
        ]);
        assert_eq!(result.value.as_deref(), Some("Via webbformulär"));
        assert_eq!(result.votes, 2);
    }

    #[test]
    fn blank_values_do_not_vote_but_are_listed() {
        let result = reduce(vec![
            Extraction::missing("a"),
            Extraction::new("b", "   "),
            Extraction::new("c", "31 mars"),
        ]);
        assert_eq!(result.value.as_deref(), Some("31 mars"));
        assert_eq!(result.votes, 1);
        assert_eq!(result.sources, vec!["a", "b", "c"]);

        let nothing = reduce(vec![Extraction::missing("a"), Extraction::new("b", "")]);
        assert_eq!(nothing.value, None);
        assert_eq!(nothing.votes, 0);
        assert_eq!(nothing.sources.len(), 2);
    }

    #[test]
    fn zero_votes_renders_not_found_even_with_value() {
        let field = FieldConsensus {
            value: Some("2025-01-01".to_string()),
            votes: 0,
            sources: vec!["x".to_string()],
        };
        assert!(!field.is_found());
        assert_eq!(field.verdict().to_string(), "not found");
    }

    #[test]
    fn found_verdict_display() {
        let field = reduce(vec![Extraction::new("a", "50 000 kr"), Extraction::new("b", "50 000 kr")]);
        assert_eq!(field.verdict().to_string(), "50 000 kr (2/2 sources agree)");
    }

    #[test]
    fn wire_values_are_rendered_as_text() {
        let field: FieldConsensus =
            serde_json::from_value(json!({"value": 25000, "votes": 3, "sources": ["a", "b", "c"]}))
                .unwrap();
        assert_eq!(field.value.as_deref(), Some("25000"));

        let field: FieldConsensus = serde_json::from_value(json!({"value": null})).unwrap();
        assert_eq!(field, FieldConsensus::default());
    }
}
