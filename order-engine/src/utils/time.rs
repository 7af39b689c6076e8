//! Time helpers
//!
//! Records carry `i64` Unix millis. Conversion to local wall-clock time only
//! happens where a calendar boundary ("today") matters.

use chrono::{DateTime, Local, NaiveTime, TimeZone, Utc};

/// Current time as Unix millis
#[inline]
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Unix millis of local midnight for the day containing `now`.
///
/// DST gap fallback: when midnight does not exist locally, the earliest
/// valid instant of that day is used, then UTC.
pub fn local_midnight_millis<Tz: TimeZone>(now: &DateTime<Tz>) -> i64 {
    let date = now.date_naive();
    let naive = date.and_time(NaiveTime::MIN);
    now.timezone()
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| naive.and_utc().timestamp_millis())
}

/// Unix millis rendered in local time, `YYYY-MM-DD HH:MM`
pub fn format_local(millis: i64) -> String {
    match Local.timestamp_millis_opt(millis).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => millis.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn test_local_midnight_uses_given_offset() {
        let tz = FixedOffset::west_opt(5 * 3600).unwrap();
        let now = tz.with_ymd_and_hms(2024, 5, 10, 14, 30, 0).unwrap();
        let expected = tz.with_ymd_and_hms(2024, 5, 10, 0, 0, 0).unwrap();
        assert_eq!(local_midnight_millis(&now), expected.timestamp_millis());
    }

    #[test]
    fn test_now_is_monotonic_enough() {
        let a = now_millis();
        let b = now_millis();
        assert!(b >= a);
    }
}
