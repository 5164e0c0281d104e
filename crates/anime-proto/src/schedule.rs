//! Bucketing of catalog records by broadcast day.

use std::collections::HashMap;

use crate::catalog::AnimeRecord;

/// Bucket key for records without a broadcast day.
pub const UNKNOWN_DAY: &str = "Unknown";

/// Display order of the schedule sections.
pub const DAYS_OF_WEEK: [&str; 8] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
    UNKNOWN_DAY,
];

pub type DayBuckets = HashMap<String, Vec<AnimeRecord>>;

/// Single pass over `records`: each record is appended to the bucket named by
/// its broadcast day (or [`UNKNOWN_DAY`]). Input order is kept inside each
/// bucket; bucket keys are not normalised or sorted.
pub fn group_by_day(records: &[AnimeRecord]) -> DayBuckets {
    let mut grouped: DayBuckets = HashMap::new();
    for record in records {
        let day = record.broadcast_day().unwrap_or(UNKNOWN_DAY);
        grouped
            .entry(day.to_string())
            .or_default()
            .push(record.clone());
    }
    grouped
}

/// Records for a display label. Jikan reports days in the plural ("Mondays"),
/// so both spellings feed the same section: the exact bucket first, then the
/// plural one. Empty when neither bucket exists.
pub fn bucket_for_label<'a>(groups: &'a DayBuckets, label: &str) -> Vec<&'a AnimeRecord> {
    let plural = format!("{}s", label);
    [label, plural.as_str()]
        .into_iter()
        .filter_map(|key| groups.get(key))
        .flatten()
        .collect()
}
