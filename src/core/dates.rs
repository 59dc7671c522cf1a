use crate::models::DayWindow;
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime};

pub const MILLIS_PER_DAY: i64 = 86_400_000;

/// Epoch milliseconds at UTC midnight of `date`
#[inline]
pub fn day_start_millis(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp_millis()
}

/// Convert a calendar window into day-granularity bounds
pub fn calculate_day_window(start_date: NaiveDate, end_date: NaiveDate) -> DayWindow {
    DayWindow {
        start_day: day_start_millis(start_date),
        end_day: day_start_millis(end_date),
    }
}

/// Inclusive overlap between a candidate's day bounds and a search window.
///
/// Touching on a single day counts as overlap; containment is not required.
#[inline]
pub fn overlaps_window(start_day: i64, end_day: i64, window: &DayWindow) -> bool {
    start_day <= window.end_day && end_day >= window.start_day
}

/// Parse either a plain `YYYY-MM-DD` date or an RFC 3339 timestamp
pub fn parse_calendar_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}

/// Whole years between a date of birth and `today`
pub fn age_on(dob: NaiveDate, today: NaiveDate) -> Option<u8> {
    if dob > today {
        return None;
    }

    let mut years = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        years -= 1;
    }

    u8::try_from(years).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_day_start_millis_epoch() {
        assert_eq!(day_start_millis(date("1970-01-01")), 0);
        assert_eq!(day_start_millis(date("1970-01-02")), MILLIS_PER_DAY);
    }

    #[test]
    fn test_window_bounds_are_midnights() {
        let window = calculate_day_window(date("2025-11-11"), date("2025-11-30"));
        assert_eq!(window.end_day - window.start_day, 19 * MILLIS_PER_DAY);
        assert_eq!(window.start_day % MILLIS_PER_DAY, 0);
    }

    #[test]
    fn test_overlap_is_inclusive() {
        let window = calculate_day_window(date("2025-11-11"), date("2025-11-30"));

        // Ends on the first day of the window
        let touching = calculate_day_window(date("2025-11-01"), date("2025-11-11"));
        assert!(overlaps_window(touching.start_day, touching.end_day, &window));

        // Spans the whole window
        let spanning = calculate_day_window(date("2025-10-01"), date("2025-12-31"));
        assert!(overlaps_window(spanning.start_day, spanning.end_day, &window));

        // Ends the day before
        let before = calculate_day_window(date("2025-11-01"), date("2025-11-10"));
        assert!(!overlaps_window(before.start_day, before.end_day, &window));
    }

    #[test]
    fn test_parse_calendar_date_formats() {
        assert_eq!(parse_calendar_date("2025-11-11"), Some(date("2025-11-11")));
        assert_eq!(parse_calendar_date("2025-11-11T00:00:00.000Z"), Some(date("2025-11-11")));
        assert_eq!(parse_calendar_date("11/11/2025"), None);
    }

    #[test]
    fn test_age_on_birthday_boundary() {
        let dob = date("1990-06-15");
        assert_eq!(age_on(dob, date("2025-06-14")), Some(34));
        assert_eq!(age_on(dob, date("2025-06-15")), Some(35));
        assert_eq!(age_on(date("2030-01-01"), date("2025-01-01")), None);
    }
}
