//! # Central Africa Time
//!
//! The business operates in Zambia; everything shown to humans is in CAT
//! (UTC+2, no daylight saving). Storage stays UTC and the conversion happens
//! at the display edge and when computing "business day" windows for reports.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};

/// CAT is a fixed +02:00 offset.
pub const CAT_OFFSET_SECS: i32 = 2 * 3600;

/// Timestamp format used on receipts, e.g. "26 Aug 2026 at 14:05".
pub const RECEIPT_TIME_FORMAT: &str = "%d %b %Y at %H:%M";

pub fn cat_offset() -> FixedOffset {
    FixedOffset::east_opt(CAT_OFFSET_SECS).expect("CAT offset is in range")
}

/// Current time in CAT.
pub fn now_cat() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&cat_offset())
}

/// Converts a stored UTC timestamp to CAT.
pub fn to_cat(dt: DateTime<Utc>) -> DateTime<FixedOffset> {
    dt.with_timezone(&cat_offset())
}

/// The current business date (today as seen in CAT).
pub fn today_cat() -> NaiveDate {
    now_cat().date_naive()
}

/// Formats a UTC timestamp in CAT with the given strftime pattern.
pub fn format_cat(dt: DateTime<Utc>, pattern: &str) -> String {
    to_cat(dt).format(pattern).to_string()
}

/// UTC instant at which the given CAT calendar day starts.
///
/// Fixed offsets have no gaps or folds, so this is plain arithmetic:
/// midnight CAT is two hours before midnight UTC of the same date.
pub fn cat_day_start(date: NaiveDate) -> DateTime<Utc> {
    let local_midnight = date.and_time(NaiveTime::MIN);
    Utc.from_utc_datetime(&(local_midnight - Duration::seconds(CAT_OFFSET_SECS as i64)))
}

/// Half-open UTC window `[start, end)` covering one CAT calendar day.
pub fn cat_day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = cat_day_start(date);
    (start, start + Duration::days(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_is_plus_two() {
        assert_eq!(cat_offset().local_minus_utc(), 7200);
        assert_eq!(now_cat().offset().local_minus_utc(), 7200);
    }

    #[test]
    fn test_day_start_crosses_utc_midnight() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let start = cat_day_start(date);
        assert_eq!(start.to_rfc3339(), "2025-02-28T22:00:00+00:00");
    }

    #[test]
    fn test_day_bounds_cover_24h() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let (start, end) = cat_day_bounds(date);
        assert_eq!(end - start, Duration::days(1));
    }

    #[test]
    fn test_receipt_format() {
        let dt = Utc.with_ymd_and_hms(2025, 3, 1, 12, 30, 0).unwrap();
        // 12:30 UTC is 14:30 CAT.
        assert_eq!(format_cat(dt, RECEIPT_TIME_FORMAT), "01 Mar 2025 at 14:30");
    }
}
