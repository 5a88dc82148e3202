use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{format_acquisition_date, parse_acquisition_date, VolcnetError, VolcnetResult};

/// Closed date interval `[start, stop]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDateSpan")]
pub struct DateSpan {
    #[serde(rename = "def_episode_start", with = "yyyymmdd")]
    pub start: NaiveDate,
    #[serde(rename = "def_episode_stop", with = "yyyymmdd")]
    pub stop: NaiveDate,
}

/// Unchecked window as stored in records
#[derive(Deserialize)]
struct RawDateSpan {
    #[serde(rename = "def_episode_start", with = "yyyymmdd")]
    start: NaiveDate,
    #[serde(rename = "def_episode_stop", with = "yyyymmdd")]
    stop: NaiveDate,
}

impl TryFrom<RawDateSpan> for DateSpan {
    type Error = VolcnetError;

    fn try_from(raw: RawDateSpan) -> VolcnetResult<Self> {
        DateSpan::new(raw.start, raw.stop)
    }
}

impl DateSpan {
    /// Create a span, rejecting `stop < start`
    pub fn new(start: NaiveDate, stop: NaiveDate) -> VolcnetResult<Self> {
        if stop < start {
            return Err(VolcnetError::DataFormat(format!(
                "span stops ({}) before it starts ({})",
                format_acquisition_date(stop),
                format_acquisition_date(start)
            )));
        }
        Ok(Self { start, stop })
    }

    /// Parse a span from two `YYYYMMDD` strings
    pub fn parse(start: &str, stop: &str) -> VolcnetResult<Self> {
        Self::new(parse_acquisition_date(start)?, parse_acquisition_date(stop)?)
    }

    pub(crate) fn from_ordered(start: NaiveDate, stop: NaiveDate) -> Self {
        debug_assert!(start <= stop);
        Self { start, stop }
    }

    /// Length in days (`stop - start`)
    pub fn days(&self) -> i64 {
        (self.stop - self.start).num_days()
    }

    /// Whole days shared with `other`; see [`overlap_days`]
    pub fn overlap_days(&self, other: &DateSpan) -> i64 {
        overlap_days(self, other)
    }

    pub fn overlaps(&self, other: &DateSpan) -> bool {
        self.overlap_days(other) > 0
    }
}

/// Overlap between two closed intervals in whole days, clamped at zero.
///
/// The overlap is a date difference, not an inclusive day count, so spans
/// that only touch at an endpoint share 0 days.
pub fn overlap_days(a: &DateSpan, b: &DateSpan) -> i64 {
    let latest_start = a.start.max(b.start);
    let earliest_end = a.stop.min(b.stop);
    (earliest_end - latest_start).num_days().max(0)
}

/// Dates as `YYYYMMDD` integers, the way annotation files store them
pub(crate) mod yyyymmdd {
    use chrono::{Datelike, NaiveDate};
    use serde::{de, Deserialize, Deserializer, Serializer};

    use crate::types::parse_acquisition_date;

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        let value = date.year().max(0) as u32 * 10_000 + date.month() * 100 + date.day();
        serializer.serialize_u32(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let value = u32::deserialize(deserializer)?;
        parse_acquisition_date(&format!("{:08}", value)).map_err(de::Error::custom)
    }
}
