//! Daily severity trend of findings.
//!
//! [`bucketize`] turns a flat list of timestamped, severity-tagged events into
//! a dense per-day histogram: every day of the trailing span gets a bucket,
//! even when nothing happened on it, and only the most recent `window_days`
//! buckets are returned.
//!
//! Days are UTC calendar days. Timestamps with an offset are converted to
//! UTC first; timestamps without one are taken as UTC.

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::entity::Finding;

/// Number of days before `today` covered by the dense axis.
pub const FULL_SPAN_DAYS: u32 = 30;

/// Number of most recent days returned by default.
pub const DEFAULT_WINDOW_DAYS: u32 = 14;

/// Severity labels counted individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// `critical`
    Critical,
    /// `high`
    High,
    /// `medium`
    Medium,
    /// `low`
    Low,
}

impl Severity {
    /// Match a label exactly. Case matters: `"High"` is not recognized.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "critical" => Some(Self::Critical),
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }

    /// The wire label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One event to be counted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendEvent {
    /// Severity label.
    pub severity: String,
    /// Creation timestamp, as text.
    pub created_at: String,
}

impl TrendEvent {
    /// Create an event.
    #[must_use]
    pub fn new(severity: impl Into<String>, created_at: impl Into<String>) -> Self {
        Self {
            severity: severity.into(),
            created_at: created_at.into(),
        }
    }

    /// Build an event from a finding. Findings without a timestamp yield `None`.
    #[must_use]
    pub fn from_finding(finding: &Finding) -> Option<Self> {
        finding
            .created_at
            .as_ref()
            .map(|created_at| Self::new(finding.severity.clone(), created_at.clone()))
    }
}

/// Counts for one calendar day.
///
/// `total` counts every event of the day. The four severity counters only
/// count events whose severity matched exactly, so `total` can exceed their
/// sum when other labels are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendBucket {
    /// The day.
    pub date: NaiveDate,
    /// Events with severity `critical`.
    pub critical: u32,
    /// Events with severity `high`.
    pub high: u32,
    /// Events with severity `medium`.
    pub medium: u32,
    /// Events with severity `low`.
    pub low: u32,
    /// All events.
    pub total: u32,
}

impl TrendBucket {
    /// An empty bucket for `date`.
    #[must_use]
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            critical: 0,
            high: 0,
            medium: 0,
            low: 0,
            total: 0,
        }
    }

    /// Count one event with the given severity label.
    pub fn record(&mut self, severity: &str) {
        self.total += 1;
        match Severity::from_label(severity) {
            Some(Severity::Critical) => self.critical += 1,
            Some(Severity::High) => self.high += 1,
            Some(Severity::Medium) => self.medium += 1,
            Some(Severity::Low) => self.low += 1,
            None => trace!(severity, "unclassified severity counted in total only"),
        }
    }

    /// Sum of the four severity counters.
    #[must_use]
    pub fn classified(&self) -> u32 {
        self.critical + self.high + self.medium + self.low
    }

    /// Count for one severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> u32 {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }

    /// Short display label, e.g. `Oct 4`.
    #[must_use]
    pub fn short_label(&self) -> String {
        self.date.format("%b %-d").to_string()
    }
}

/// Span and window of a trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendOptions {
    /// Number of most recent days returned.
    pub window_days: u32,
    /// Number of days before `today` covered by the dense axis.
    pub span_days: u32,
}

impl Default for TrendOptions {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_WINDOW_DAYS,
            span_days: FULL_SPAN_DAYS,
        }
    }
}

/// Bucketize events over the default span, keeping the last `window_days`.
#[must_use]
pub fn bucketize(events: &[TrendEvent], today: NaiveDate, window_days: u32) -> Vec<TrendBucket> {
    bucketize_with(
        events,
        today,
        &TrendOptions {
            window_days,
            span_days: FULL_SPAN_DAYS,
        },
    )
}

/// Bucketize events.
///
/// Builds one zeroed bucket per day from `today - span_days` to `today`
/// inclusive, counts every event whose day falls in that range, and returns
/// the last `window_days` buckets in ascending date order. Events outside
/// the range are ignored. Events with an unreadable timestamp are skipped
/// with a warning.
#[must_use]
pub fn bucketize_with(
    events: &[TrendEvent],
    today: NaiveDate,
    options: &TrendOptions,
) -> Vec<TrendBucket> {
    let start = today
        .checked_sub_days(Days::new(u64::from(options.span_days)))
        .unwrap_or(NaiveDate::MIN);
    let mut buckets: Vec<TrendBucket> = start
        .iter_days()
        .take_while(|day| *day <= today)
        .map(TrendBucket::new)
        .collect();

    for event in events {
        let Some(day) = parse_day(&event.created_at) else {
            warn!(created_at = %event.created_at, "skipping event with unreadable timestamp");
            continue;
        };

        let offset = day.signed_duration_since(start).num_days();
        match usize::try_from(offset)
            .ok()
            .and_then(|index| buckets.get_mut(index))
        {
            Some(bucket) => bucket.record(&event.severity),
            None => trace!(%day, "event outside trend span"),
        }
    }

    let window = usize::try_from(options.window_days).unwrap_or(usize::MAX);
    let skip = buckets.len().saturating_sub(window);
    buckets.split_off(skip)
}

/// Reduce a timestamp to its UTC calendar day.
///
/// Accepts RFC 3339 (`2024-05-01T10:00:00Z`, `2024-05-01T10:00:00+03:00`),
/// ISO date-times without offset (`2024-05-01T10:00:00`, optionally with
/// fractional seconds or a space instead of `T`) and plain dates.
#[must_use]
pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 14).unwrap()
    }

    fn days_ago(n: u64) -> NaiveDate {
        today().checked_sub_days(Days::new(n)).unwrap()
    }

    fn at(day: NaiveDate, severity: &str) -> TrendEvent {
        TrendEvent::new(severity, format!("{day}T12:00:00Z"))
    }

    #[test]
    fn test_empty_events_give_dense_zero_window() {
        let buckets = bucketize(&[], today(), 14);

        assert_eq!(buckets.len(), 14);
        assert!(buckets.iter().all(|b| b.total == 0 && b.classified() == 0));
        assert_eq!(buckets[0].date, days_ago(13));
        assert_eq!(buckets[13].date, today());
        for pair in buckets.windows(2) {
            assert_eq!(pair[0].date.succ_opt(), Some(pair[1].date));
        }
    }

    #[test]
    fn test_recognized_severities_sum_to_total() {
        let events = vec![
            at(today(), "critical"),
            at(today(), "high"),
            at(today(), "high"),
            at(days_ago(2), "medium"),
            at(days_ago(2), "low"),
        ];
        let buckets = bucketize(&events, today(), 14);

        for bucket in &buckets {
            assert_eq!(bucket.total, bucket.classified());
        }
        let last = buckets.last().unwrap();
        assert_eq!(last.critical, 1);
        assert_eq!(last.high, 2);
        assert_eq!(last.total, 3);
        assert_eq!(buckets[11].medium, 1);
        assert_eq!(buckets[11].low, 1);
    }

    #[test]
    fn test_unknown_severity_counts_in_total_only() {
        let events = vec![at(days_ago(1), "unknown"), at(days_ago(1), "High")];
        let buckets = bucketize(&events, today(), 14);

        let bucket = buckets[12];
        assert_eq!(bucket.date, days_ago(1));
        assert_eq!(bucket.total, 2);
        assert_eq!(bucket.classified(), 0);
    }

    #[test]
    fn test_event_just_outside_window_is_not_returned() {
        let events = vec![at(days_ago(15), "critical")];
        let buckets = bucketize(&events, today(), 14);

        assert!(buckets.iter().all(|b| b.total == 0));
        assert!(buckets.iter().all(|b| b.date > days_ago(15)));
    }

    #[test]
    fn test_full_span_boundaries() {
        let events = vec![
            at(days_ago(30), "low"),
            at(days_ago(31), "low"),
            at(today().succ_opt().unwrap(), "low"),
        ];
        let buckets = bucketize(&events, today(), 31);

        assert_eq!(buckets.len(), 31);
        assert_eq!(buckets[0].date, days_ago(30));
        assert_eq!(buckets[0].low, 1);
        assert_eq!(buckets.iter().map(|b| b.total).sum::<u32>(), 1);
    }

    #[test]
    fn test_window_larger_than_span() {
        let buckets = bucketize(&[], today(), 90);
        assert_eq!(buckets.len(), 31);
    }

    #[test]
    fn test_zero_window() {
        assert!(bucketize(&[at(today(), "low")], today(), 0).is_empty());
    }

    #[test]
    fn test_custom_span() {
        let options = TrendOptions {
            window_days: 7,
            span_days: 6,
        };
        let buckets = bucketize_with(&[at(days_ago(6), "high")], today(), &options);
        assert_eq!(buckets.len(), 7);
        assert_eq!(buckets[0].high, 1);
    }

    #[test]
    fn test_malformed_timestamps_are_skipped() {
        crate::logging::init_test_logging();
        let events = vec![
            TrendEvent::new("high", "not a date"),
            TrendEvent::new("high", ""),
            at(today(), "high"),
        ];
        let buckets = bucketize(&events, today(), 14);
        assert_eq!(buckets.iter().map(|b| b.total).sum::<u32>(), 1);
    }

    #[test]
    fn test_parse_day_formats() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day);
        assert_eq!(parse_day("2026-10-14T09:15:00Z"), d(2026, 10, 14));
        // converted to UTC before taking the day
        assert_eq!(parse_day("2026-10-14T01:30:00+03:00"), d(2026, 10, 13));
        assert_eq!(parse_day("2026-10-10T08:00:00.123456"), d(2026, 10, 10));
        assert_eq!(parse_day("2026-10-10 23:59:59"), d(2026, 10, 10));
        assert_eq!(parse_day("2026-10-09"), d(2026, 10, 9));
        assert_eq!(parse_day("14/10/2026"), None);
    }

    #[test]
    fn test_offset_timestamp_lands_on_utc_day() {
        let events = vec![TrendEvent::new("critical", "2026-10-14T01:30:00+03:00")];
        let buckets = bucketize(&events, today(), 14);
        assert_eq!(buckets[12].critical, 1);
        assert_eq!(buckets[13].total, 0);
    }

    #[test]
    fn test_short_label() {
        let bucket = TrendBucket::new(NaiveDate::from_ymd_opt(2026, 10, 4).unwrap());
        assert_eq!(bucket.short_label(), "Oct 4");
    }

    #[test]
    fn test_severity_labels() {
        assert_eq!(Severity::from_label("critical"), Some(Severity::Critical));
        assert_eq!(Severity::from_label("Critical"), None);
        assert_eq!(Severity::Medium.to_string(), "medium");
        let mut bucket = TrendBucket::new(today());
        bucket.record("medium");
        assert_eq!(bucket.count(Severity::Medium), 1);
    }

    #[test]
    fn test_event_from_finding() {
        let mut finding = Finding {
            id: 1,
            title: "Open port".to_string(),
            description: None,
            severity: "low".to_string(),
            created_at: None,
        };
        assert!(TrendEvent::from_finding(&finding).is_none());

        finding.created_at = Some("2026-10-01T10:00:00".to_string());
        let event = TrendEvent::from_finding(&finding).unwrap();
        assert_eq!(event.severity, "low");
    }
}
