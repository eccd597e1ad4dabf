//! Leveling curve.
//!
//! Levels double in width: level 1 ends at 2h, level 2 spans [2h, 4h),
//! level 3 spans [4h, 8h) and so on. All functions here are pure.

use serde::Serialize;

use crate::types::HOUR_MS;

/// Display colors indexed by `level mod 10`.
pub const LEVEL_COLORS: [&str; 10] = [
    "#bdb5b5", "#70b3e0", "#66d194", "#f2f266", "#E67E22", "#db867d", "#b783cc", "#ba5b85",
    "#95A5A6", "#e36691",
];

/// Level reached after `time_spent_ms` of accumulated time.
///
/// Zero (and anything below 1ms) is level 1. Every positive value goes
/// through `floor(log2(hours)) + 1`, so sub-hour totals yield levels of
/// zero or below.
pub fn time_to_level(time_spent_ms: i64) -> i64 {
    if time_spent_ms < 1 {
        return 1;
    }

    if time_spent_ms >= HOUR_MS {
        // floor(log2(x)) == floor(log2(floor(x))) for x >= 1
        let whole_hours = time_spent_ms / HOUR_MS;
        return i64::from(whole_hours.ilog2()) + 1;
    }

    let hours = time_spent_ms as f64 / HOUR_MS as f64;
    hours.log2().floor() as i64 + 1
}

/// Minimum accumulated time needed to reach `level`.
///
/// Levels below 1 need no time. Thresholds past `i64::MAX` saturate.
pub fn level_to_time(level: i64) -> i64 {
    if level < 1 {
        return 0;
    }

    u32::try_from(level - 1)
        .ok()
        .and_then(|exp| 2i64.checked_pow(exp))
        .and_then(|factor| factor.checked_mul(HOUR_MS))
        .unwrap_or(i64::MAX)
}

/// Progress toward the next level as a whole percentage.
///
/// Computed as `(time - level_to_time(level)) / level_to_time(level + 1)`,
/// i.e. relative to the next threshold rather than the band width, then
/// rounded and clamped to 0..=100. A zero threshold yields 0.
pub fn progress_percent(total_time_ms: i64) -> i64 {
    let level = time_to_level(total_time_ms);
    let next = level_to_time(level.saturating_add(1));
    if next == 0 {
        return 0;
    }

    let into_level = total_time_ms as f64 - level_to_time(level) as f64;
    let pct = (into_level / next as f64 * 100.0).round() as i64;
    pct.clamp(0, 100)
}

/// Hex color for a level; cycles every 10 levels, negatives included.
pub fn level_to_color(level: i64) -> &'static str {
    LEVEL_COLORS[level.rem_euclid(10) as usize]
}

/// Level, progress and color for one accumulated time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelInfo {
    /// Current level
    pub level: i64,
    /// Progress toward the next level (0-100)
    pub progress_percent: i64,
    /// Hex display color for the level
    pub color: &'static str,
}

impl LevelInfo {
    /// Derive level info from accumulated milliseconds.
    pub fn for_time(total_time_ms: i64) -> Self {
        let level = time_to_level(total_time_ms);
        Self {
            level,
            progress_percent: progress_percent(total_time_ms),
            color: level_to_color(level),
        }
    }
}
