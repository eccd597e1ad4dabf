//! Formatting helpers shared across report outputs.

use chrono::{DateTime, Utc};

use crate::types::HOUR_MS;

/// Format milliseconds as rounded whole hours (e.g., "12 hrs").
pub fn format_hours(ms: i64) -> String {
    let hours = (ms as f64 / HOUR_MS as f64).round() as i64;
    format!("{} hrs", hours)
}

/// Format milliseconds as hours and minutes (e.g., "3h 25m").
pub fn format_duration(ms: i64) -> String {
    // Clamp to 0 in case of negative values from timestamp issues
    let mins = ms.max(0) / 60_000;
    let hours = mins / 60;
    if hours > 0 {
        format!("{}h {}m", hours, mins % 60)
    } else {
        format!("{}m", mins)
    }
}

/// Format a timestamp as a calendar date (e.g., "2024-03-09").
pub fn format_date(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d").to_string()
}

/// Label for a 1-based rank: medals for the podium, "N." otherwise.
pub fn rank_label(rank: usize, medals: bool) -> String {
    match rank {
        1 if medals => "🥇".to_string(),
        2 if medals => "🥈".to_string(),
        3 if medals => "🥉".to_string(),
        _ => format!("{}.", rank),
    }
}
