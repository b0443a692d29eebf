//! Date-range object versions.
//!
//! A catalog object's version identifies the date range it covers: the high
//! 16 bits hold the start as days since 1950-01-01, the low 16 bits the number
//! of days from start to end.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use dx_common::{DxError, DxResult};
use serde::{Deserialize, Serialize};

/// Day zero of the version encoding.
pub fn epoch() -> NaiveDate {
    // 1950-01-01 is always representable.
    NaiveDate::from_ymd_opt(1950, 1, 1).unwrap_or_default()
}

/// A date range in version form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateVersion {
    pub start_days: u16,
    pub span_days: u16,
}

impl DateVersion {
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> DxResult<Self> {
        if end < start {
            return Err(DxError::InvertedDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }

        let start_days = (start - epoch()).num_days();
        let span_days = (end - start).num_days();

        let start_days = u16::try_from(start_days).map_err(|_| {
            DxError::VersionOutOfRange(format!(
                "{} is {} days from {}, outside 0..={}",
                start,
                start_days,
                epoch(),
                u16::MAX
            ))
        })?;
        let span_days = u16::try_from(span_days).map_err(|_| {
            DxError::VersionOutOfRange(format!(
                "range of {} days exceeds {}",
                span_days,
                u16::MAX
            ))
        })?;

        Ok(Self {
            start_days,
            span_days,
        })
    }

    /// Parse two date strings, dropping any time of day.
    pub fn parse(start: &str, end: &str) -> DxResult<Self> {
        Self::from_dates(parse_date(start)?, parse_date(end)?)
    }

    pub fn pack(&self) -> u32 {
        (u32::from(self.start_days) << 16) | u32::from(self.span_days)
    }

    pub fn unpack(version: u32) -> Self {
        Self {
            start_days: (version >> 16) as u16,
            span_days: (version & 0xFFFF) as u16,
        }
    }

    /// Start and end dates, inclusive.
    pub fn dates(&self) -> (NaiveDate, NaiveDate) {
        let start = epoch() + Duration::days(i64::from(self.start_days));
        (start, start + Duration::days(i64::from(self.span_days)))
    }
}

impl From<DateVersion> for u32 {
    fn from(v: DateVersion) -> u32 {
        v.pack()
    }
}

/// Parse an ISO 8601 date or date-time.
///
/// Supports:
/// - Date only: "1982-11-28"
/// - Naive date-time: "1982-11-28T12:00:00" or "1982-11-28 12:00:00"
/// - RFC 3339: "1982-11-28T12:00:00Z"
pub fn parse_date(s: &str) -> DxResult<NaiveDate> {
    let s = s.trim();

    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(ndt.date());
        }
    }

    Err(DxError::InvalidDate(s.to_string()))
}
