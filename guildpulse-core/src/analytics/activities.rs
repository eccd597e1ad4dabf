//! Activity time aggregation.
//!
//! Groups activity sessions by name and totals each group. One sentinel
//! name (the platform's transient custom-status pseudo-activity) is
//! dropped before grouping so it never shows up as an entry.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::interval::accumulate;
use crate::types::ActivitySession;

/// Activity name the platform uses for a user's custom status.
pub const CUSTOM_STATUS_ACTIVITY: &str = "Custom Status";

/// Total time spent in one named activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityTotal {
    /// Activity name
    pub name: String,
    /// Total time in milliseconds
    pub total_time_ms: i64,
}

/// Per-activity totals, sorted by time descending.
#[derive(Debug, Clone, Default)]
pub struct ActivityBreakdown {
    /// Every included activity, highest total first
    pub totals: Vec<ActivityTotal>,
    /// Sum over all of `totals`, not just a top-N slice
    pub total_time_ms: i64,
    /// Activity sessions skipped as malformed
    pub malformed: usize,
}

impl ActivityBreakdown {
    /// The `n` activities with the most time.
    pub fn top(&self, n: usize) -> &[ActivityTotal] {
        &self.totals[..n.min(self.totals.len())]
    }

    /// Number of distinct activities included.
    pub fn len(&self) -> usize {
        self.totals.len()
    }

    /// Whether no activity was included.
    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }
}

/// Total time per distinct activity name, excluding `sentinel`.
///
/// Equal totals are ordered by name so output is stable for closed
/// input.
pub fn aggregate_activities(
    sessions: &[ActivitySession],
    sentinel: &str,
    now: DateTime<Utc>,
) -> ActivityBreakdown {
    let mut groups: HashMap<&str, Vec<&ActivitySession>> = HashMap::new();
    for session in sessions.iter().filter(|s| s.name != sentinel) {
        groups.entry(session.name.as_str()).or_default().push(session);
    }

    let mut malformed = 0;
    let mut totals: Vec<ActivityTotal> = groups
        .into_iter()
        .map(|(name, group)| {
            let acc = accumulate(group, now);
            malformed += acc.malformed;
            ActivityTotal {
                name: name.to_string(),
                total_time_ms: acc.total_ms,
            }
        })
        .collect();

    totals.sort_by(|a, b| {
        b.total_time_ms
            .cmp(&a.total_time_ms)
            .then_with(|| a.name.cmp(&b.name))
    });

    let total_time_ms = totals
        .iter()
        .fold(0i64, |sum, a| sum.saturating_add(a.total_time_ms));

    tracing::debug!(
        sessions = sessions.len(),
        activities = totals.len(),
        total_time_ms,
        "Aggregated activity time"
    );

    ActivityBreakdown {
        totals,
        total_time_ms,
        malformed,
    }
}
