//! Snapshot to render-state projection. Everything here is pure.

use super::task::{TaskSnapshot, TaskStatus};

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressView {
    /// Clamped to [0, 100]
    pub percent: f64,
    /// Summary once terminal, empty while the bar alone conveys state
    pub label: String,
    /// Human-readable time remaining, empty when unknown
    pub eta_label: String,
}

pub fn project(task: &TaskSnapshot) -> ProgressView {
    let percent = if task.progress_percent.is_nan() {
        0.0
    } else {
        task.progress_percent.clamp(0.0, 100.0)
    };

    let label = match task.status {
        TaskStatus::Completed => format!(
            "Done! {} completed, {} failed, {} skipped.",
            task.completed, task.failed, task.skipped
        ),
        TaskStatus::Failed => format!(
            "Error: {}",
            task.error.as_deref().unwrap_or("unknown error")
        ),
        TaskStatus::Pending | TaskStatus::Running => String::new(),
    };

    ProgressView {
        percent,
        label,
        eta_label: format_eta(task.estimated_seconds_remaining),
    }
}

/// Format a remaining-time estimate in seconds.
///
/// Bands: under a minute in seconds, under an hour in minutes, otherwise
/// whole hours plus rounded minutes.
pub fn format_eta(seconds: Option<f64>) -> String {
    let s = match seconds {
        Some(s) if s > 0.0 && s.is_finite() => s,
        _ => return String::new(),
    };

    if s < 60.0 {
        format!("~{}s remaining", s.round() as u64)
    } else if s < 3600.0 {
        format!("~{}min remaining", (s / 60.0).round() as u64)
    } else {
        let hours = (s / 3600.0).floor() as u64;
        let minutes = ((s % 3600.0) / 60.0).round() as u64;
        format!("~{}h {}min remaining", hours, minutes)
    }
}

/// Multi-line operator summary of a snapshot.
pub fn status_text(task: &TaskSnapshot) -> String {
    format!(
        "Status: {}\nProgress: {:.1}%\nCompleted: {}\nFailed: {}\nSkipped: {}",
        task.status, task.progress_percent, task.completed, task.failed, task.skipped
    )
}
