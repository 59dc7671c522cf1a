// Unit tests for TravalPass Match

use travalpass_match::core::{
    dates::{calculate_day_window, day_start_millis, overlaps_window, parse_calendar_date, MILLIS_PER_DAY},
    filters::{matches_date_window, matches_demographics, matches_destination, is_excluded},
};
use travalpass_match::models::{AgeRange, Itinerary, OrientationPreference, SearchCriteria, NO_PREFERENCE};
use chrono::{NaiveDate, Utc};

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn itinerary(start: &str, end: &str) -> Itinerary {
    let mut itinerary = Itinerary::from_dates("it", "Tokyo, Japan", date(start), date(end), Utc::now());
    itinerary.age = Some(29);
    itinerary.gender = Some("Male".to_string());
    itinerary.status = Some("group".to_string());
    itinerary.sexual_orientation = Some("Bisexual".to_string());
    itinerary
}

fn criteria() -> SearchCriteria {
    SearchCriteria::new("Tokyo, Japan", date("2025-04-01"), date("2025-04-10"))
}

#[test]
fn test_from_dates_derives_day_bounds() {
    let itinerary = itinerary("2025-04-03", "2025-04-05");

    assert_eq!(itinerary.start_day, day_start_millis(date("2025-04-03")));
    assert_eq!(itinerary.end_day - itinerary.start_day, 2 * MILLIS_PER_DAY);
}

#[test]
fn test_window_overlap_cases() {
    let window = criteria().window();

    assert!(matches_date_window(&itinerary("2025-04-03", "2025-04-05"), &window)); // inside
    assert!(matches_date_window(&itinerary("2025-03-25", "2025-04-01"), &window)); // ends on first day
    assert!(matches_date_window(&itinerary("2025-04-10", "2025-04-20"), &window)); // starts on last day
    assert!(matches_date_window(&itinerary("2025-03-01", "2025-05-01"), &window)); // spans
    assert!(!matches_date_window(&itinerary("2025-03-01", "2025-03-31"), &window)); // before
    assert!(!matches_date_window(&itinerary("2025-04-11", "2025-04-12"), &window)); // after
}

#[test]
fn test_overlap_on_raw_bounds() {
    let window = calculate_day_window(date("2025-01-01"), date("2025-01-01"));

    assert!(overlaps_window(window.start_day, window.end_day, &window));
    assert!(!overlaps_window(window.end_day + 1, window.end_day + MILLIS_PER_DAY, &window));
}

#[test]
fn test_destination_exact_match_only() {
    let criteria = criteria();
    let mut candidate = itinerary("2025-04-03", "2025-04-05");
    assert!(matches_destination(&candidate, &criteria));

    candidate.destination = "Tokyo, Japan ".to_string();
    assert!(!matches_destination(&candidate, &criteria));

    candidate.destination = "TOKYO, JAPAN".to_string();
    assert!(!matches_destination(&candidate, &criteria));
}

#[test]
fn test_absent_criteria_skip_filters() {
    let criteria = criteria();
    let mut candidate = itinerary("2025-04-03", "2025-04-05");
    candidate.gender = None;
    candidate.status = None;
    candidate.sexual_orientation = None;
    candidate.age = None;

    assert!(matches_demographics(&candidate, &criteria));
}

#[test]
fn test_status_filter() {
    let mut criteria = criteria();
    criteria.status = Some("couple".to_string());

    assert!(!matches_demographics(&itinerary("2025-04-03", "2025-04-05"), &criteria));

    criteria.status = Some("group".to_string());
    assert!(matches_demographics(&itinerary("2025-04-03", "2025-04-05"), &criteria));
}

#[test]
fn test_age_bounds_inclusive() {
    let mut criteria = criteria();
    let mut candidate = itinerary("2025-04-03", "2025-04-05");

    criteria.age_range = Some(AgeRange { lower: 29, upper: 29 });
    assert!(matches_demographics(&candidate, &criteria));

    candidate.age = Some(30);
    assert!(!matches_demographics(&candidate, &criteria));

    candidate.age = None;
    assert!(!matches_demographics(&candidate, &criteria));
}

#[test]
fn test_no_preference_is_wildcard() {
    let mut criteria = criteria();
    criteria.sexual_orientation = Some(OrientationPreference::from(NO_PREFERENCE.to_string()));

    for orientation in ["Straight", "Gay", "Lesbian", "Bisexual", NO_PREFERENCE] {
        let mut candidate = itinerary("2025-04-03", "2025-04-05");
        candidate.sexual_orientation = Some(orientation.to_string());
        assert!(matches_demographics(&candidate, &criteria), "{} should match", orientation);
    }

    let mut candidate = itinerary("2025-04-03", "2025-04-05");
    candidate.sexual_orientation = None;
    assert!(matches_demographics(&candidate, &criteria));
}

#[test]
fn test_specific_orientation_is_literal() {
    let mut criteria = criteria();
    criteria.sexual_orientation = Some(OrientationPreference::from("Straight".to_string()));

    let mut candidate = itinerary("2025-04-03", "2025-04-05");
    candidate.sexual_orientation = Some("Straight".to_string());
    assert!(matches_demographics(&candidate, &criteria));

    candidate.sexual_orientation = None;
    assert!(!matches_demographics(&candidate, &criteria));
}

#[test]
fn test_orientation_serde_round_trips_sentinel() {
    let parsed: OrientationPreference = serde_json::from_str("\"No Preference\"").unwrap();
    assert_eq!(parsed, OrientationPreference::NoPreference);

    let json = serde_json::to_string(&OrientationPreference::Only("Gay".to_string())).unwrap();
    assert_eq!(json, "\"Gay\"");
}

#[test]
fn test_exclusion_lookup() {
    let mut criteria = criteria();
    let candidate = itinerary("2025-04-03", "2025-04-05");
    assert!(!is_excluded(&candidate, &criteria));

    criteria.exclude(["it"]);
    assert!(is_excluded(&candidate, &criteria));
}

#[test]
fn test_itinerary_json_shape() {
    let json = r#"{
        "id": "abc",
        "destination": "Miami, FL, USA",
        "startDay": 1762819200000,
        "endDay": 1764460800000,
        "sexualOrientation": "Gay",
        "createdAt": "2025-09-01T10:00:00Z"
    }"#;

    let itinerary: Itinerary = serde_json::from_str(json).unwrap();

    assert_eq!(itinerary.id, "abc");
    assert!(itinerary.age.is_none());
    assert!(itinerary.user_id.is_none());
    assert_eq!(itinerary.sexual_orientation.as_deref(), Some("Gay"));
    assert_eq!(parse_calendar_date("2025-11-11").map(day_start_millis), Some(1_762_819_200_000));
}
