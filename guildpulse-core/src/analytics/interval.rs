//! Interval duration accumulation.
//!
//! Sums elapsed time over (start, optional end) spans. Open spans are
//! resolved against a caller-supplied `now`, so the result is only
//! repeatable when every span is closed or `now` is held fixed.

use chrono::{DateTime, Utc};

use crate::types::Interval;

/// Result of summing a set of intervals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Accumulated {
    /// Total elapsed milliseconds over all well-formed intervals
    pub total_ms: i64,
    /// Intervals whose resolved end preceded their start (counted as zero)
    pub malformed: usize,
}

/// Duration of a single interval in milliseconds, or `None` if malformed.
pub fn interval_ms<I: Interval>(interval: &I, now: DateTime<Utc>) -> Option<i64> {
    let end = interval.end().unwrap_or(now);
    let ms = end.signed_duration_since(interval.start()).num_milliseconds();
    (ms >= 0).then_some(ms)
}

/// Sum `(end ?? now) - start` over every interval.
///
/// Malformed intervals contribute zero and are counted in
/// [`Accumulated::malformed`] instead of aborting the sum.
pub fn accumulate<I, It>(intervals: It, now: DateTime<Utc>) -> Accumulated
where
    I: Interval,
    It: IntoIterator<Item = I>,
{
    let mut acc = Accumulated::default();
    for interval in intervals {
        match interval_ms(&interval, now) {
            Some(ms) => acc.total_ms = acc.total_ms.saturating_add(ms),
            None => acc.malformed += 1,
        }
    }

    if acc.malformed > 0 {
        tracing::warn!(
            malformed = acc.malformed,
            "Skipped intervals ending before they start"
        );
    }

    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn at(ms: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(ms).unwrap()
    }

    #[test]
    fn test_closed_intervals_sum() {
        let spans = [(at(0), Some(at(1000))), (at(2000), Some(at(3500)))];
        let acc = accumulate(spans.iter(), at(10_000));
        assert_eq!(acc.total_ms, 2500);
        assert_eq!(acc.malformed, 0);
    }

    #[test]
    fn test_open_interval_resolves_against_now() {
        let spans = [(at(1000), None)];
        assert_eq!(accumulate(spans.iter(), at(4000)).total_ms, 3000);
        assert_eq!(accumulate(spans.iter(), at(9000)).total_ms, 8000);
    }

    #[test]
    fn test_open_interval_depends_on_wall_clock() {
        // With a real clock, an open interval keeps growing between calls.
        let spans = [(Utc::now() - Duration::hours(1), None)];
        let first = accumulate(spans.iter(), Utc::now()).total_ms;
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = accumulate(spans.iter(), Utc::now()).total_ms;
        assert!(second > first);
    }

    #[test]
    fn test_malformed_interval_counts_zero() {
        let spans = [
            (at(0), Some(at(1000))),
            (at(5000), Some(at(4000))),
            (at(20_000), None),
        ];
        let acc = accumulate(spans.iter(), at(10_000));
        assert_eq!(acc.total_ms, 1000);
        assert_eq!(acc.malformed, 2);
    }

    #[test]
    fn test_empty_input() {
        let spans: [(DateTime<Utc>, Option<DateTime<Utc>>); 0] = [];
        assert_eq!(accumulate(spans.iter(), at(0)), Accumulated::default());
    }
}
