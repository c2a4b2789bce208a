//! Domain types shared by the planner, executor and CLI.
//!
//! All timestamps are `DateTime<Utc>` truncated to whole seconds, whether
//! they come from a manifest string or a filesystem mtime, so both sides of
//! every comparison use one granularity.

use std::path::PathBuf;
use std::time::SystemTime;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::pathkey::PathKey;

// ---------------------------------------------------------------------------
// Content locator
// ---------------------------------------------------------------------------

/// Where the authoritative content of a manifest entry can be obtained.
///
/// Serialised untagged so a manifest value reads `{"url": ...}` or
/// `{"path": ...}` next to its `modifiedTime`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentLocator {
    /// Remote reference, typically a knowledge-base URL.
    Url { url: String },
    /// A file on a local or mounted filesystem.
    Local { path: PathBuf },
}

impl ContentLocator {
    /// The locator as a single line of text (fetch-list format).
    pub fn as_display_string(&self) -> String {
        match self {
            ContentLocator::Url { url } => url.clone(),
            ContentLocator::Local { path } => path.display().to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// One file of the authoritative state. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub path: PathKey,
    /// `None` when the manifest carried a timestamp that does not parse.
    pub modified_time: Option<DateTime<Utc>>,
    pub locator: ContentLocator,
}

/// One node of the destination tree, produced fresh on every run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationEntry {
    pub path: PathKey,
    pub is_dir: bool,
    pub modified_time: DateTime<Utc>,
    pub location: PathBuf,
}

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

/// Convert a filesystem time to a second-precision UTC timestamp.
pub fn timestamp_from_system_time(time: SystemTime) -> DateTime<Utc> {
    DateTime::<Utc>::from(time).trunc_subsecs(0)
}

/// Parse an ISO-8601 manifest timestamp.
///
/// Accepts RFC 3339 with any offset, or a naive `YYYY-MM-DDTHH:MM:SS`
/// (optionally with fractional seconds and a trailing `Z`) taken as UTC.
/// Fractional seconds are dropped.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc).trunc_subsecs(0));
    }
    let without_zone = raw.trim_end_matches('Z');
    let whole_seconds = without_zone.split('.').next().unwrap_or(without_zone);
    NaiveDateTime::parse_from_str(whole_seconds, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(whole_seconds, "%Y-%m-%d %H:%M:%S"))
        .ok()
        .map(|naive| naive.and_utc())
}

/// Render a timestamp the way manifests store it: `2024-05-01T08:30:00Z`.
pub fn format_timestamp(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_zulu_and_naive_forms_identically() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-05-01T08:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-05-01T08:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-05-01T08:30:00.123Z"), Some(expected));
    }

    #[test]
    fn offsets_are_converted_to_utc() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 0, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-05-01T08:30:00+08:00"), Some(expected));
    }

    #[test]
    fn garbage_does_not_parse() {
        assert_eq!(parse_timestamp("..."), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn format_roundtrips_through_parse() {
        let time = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap();
        let rendered = format_timestamp(&time);
        assert_eq!(rendered, "2023-12-31T23:59:59Z");
        assert_eq!(parse_timestamp(&rendered), Some(time));
    }

    #[test]
    fn system_time_is_truncated_to_seconds() {
        let time = SystemTime::UNIX_EPOCH + std::time::Duration::from_millis(1_500);
        let ts = timestamp_from_system_time(time);
        assert_eq!(ts.timestamp(), 1);
        assert_eq!(ts.timestamp_subsec_nanos(), 0);
    }
}
