//! Recency window handling.
//!
//! The catalog's own date filtering is imprecise around window edges, so the
//! window is applied twice: once as a `submittedDate` range inside the query
//! to keep result volume down, and once locally on the parsed `published`
//! timestamps. The local check is fail-open: a paper whose date cannot be
//! parsed is kept.

use crate::types::Paper;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use tracing::debug;

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parses the timestamp spellings found in catalog entries and ledger files.
///
/// Accepts RFC 3339 (including a literal `Z`), naive ISO date-times (read as
/// UTC) and bare dates (midnight UTC). Anything else is `None`.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// `now - days`, or `None` when the subtraction leaves chrono's range.
pub fn days_before(now: DateTime<Utc>, days: i64) -> Option<DateTime<Utc>> {
    Duration::try_days(days).and_then(|delta| now.checked_sub_signed(delta))
}

/// Start of a `days` window, when it can be written as a four-digit year.
fn window_start(days: i64, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    days_before(now, days).filter(|start| start.year() >= 1)
}

fn earliest_start() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

pub struct RecencyFilter;

impl RecencyFilter {
    /// Inclusive day-granularity range from `now - days` at 00:00 to `now` at
    /// 23:59, in the catalog's `submittedDate` syntax. A start before year 1
    /// is clamped to 0001-01-01.
    pub fn window_query(days: i64, now: DateTime<Utc>) -> String {
        let start = window_start(days, now).unwrap_or_else(earliest_start);
        format!(
            "submittedDate:[{}0000 TO {}2359]",
            start.format("%Y%m%d"),
            now.format("%Y%m%d")
        )
    }

    /// Restricts `query` to the window. `days <= 0`, or a window reaching
    /// back before year 1, leaves it unrestricted.
    pub fn scope(query: &str, days: i64, now: DateTime<Utc>) -> String {
        if days <= 0 {
            return query.to_string();
        }
        if window_start(days, now).is_none() {
            debug!("Window of {} days covers the whole catalog; not scoping query", days);
            return query.to_string();
        }
        format!("({}) AND {}", query, Self::window_query(days, now))
    }

    /// Drops papers published strictly before `now - days`. Papers without a
    /// parsable `published` stay. `days <= 0` returns the input untouched.
    pub fn filter(mut papers: Vec<Paper>, days: i64, now: DateTime<Utc>) -> Vec<Paper> {
        if days <= 0 {
            return papers;
        }

        let Some(cutoff) = days_before(now, days) else {
            return papers;
        };

        let before = papers.len();
        papers.retain(|paper| match parse_timestamp(&paper.published) {
            Some(published) => published >= cutoff,
            None => {
                debug!("Keeping {} with unparsable date {:?}", paper.id, paper.published);
                true
            }
        });

        debug!(
            "Recency filter kept {}/{} papers (cutoff {})",
            papers.len(),
            before,
            cutoff
        );
        papers
    }
}
