use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Sentinel used by clients to switch the orientation filter off
pub const NO_PREFERENCE: &str = "No Preference";

/// A published travel itinerary, the candidate record for matching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Itinerary {
    pub id: String,
    #[serde(rename = "userId", default)]
    pub user_id: Option<String>,
    pub destination: String,
    #[serde(rename = "startDate", default)]
    pub start_date: Option<NaiveDate>,
    #[serde(rename = "endDate", default)]
    pub end_date: Option<NaiveDate>,
    /// Epoch milliseconds at UTC midnight of the first travel day
    #[serde(rename = "startDay")]
    pub start_day: i64,
    /// Epoch milliseconds at UTC midnight of the last travel day
    #[serde(rename = "endDay")]
    pub end_day: i64,
    #[serde(default)]
    pub age: Option<u8>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(rename = "sexualOrientation", default)]
    pub sexual_orientation: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Itinerary {
    /// Build an itinerary from calendar dates, deriving the day bounds
    pub fn from_dates(
        id: impl Into<String>,
        destination: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        created_at: DateTime<Utc>,
    ) -> Self {
        let window = crate::core::dates::calculate_day_window(start_date, end_date);

        Self {
            id: id.into(),
            user_id: None,
            destination: destination.into(),
            start_date: Some(start_date),
            end_date: Some(end_date),
            start_day: window.start_day,
            end_day: window.end_day,
            age: None,
            gender: None,
            status: None,
            sexual_orientation: None,
            created_at,
        }
    }
}

/// Inclusive range of epoch-millisecond day bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start_day: i64,
    pub end_day: i64,
}

/// Inclusive age bounds; only exists when both ends were supplied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeRange {
    pub lower: u8,
    pub upper: u8,
}

impl AgeRange {
    /// A missing age never satisfies an active range
    pub fn contains(&self, age: Option<u8>) -> bool {
        match age {
            Some(age) => age >= self.lower && age <= self.upper,
            None => false,
        }
    }
}

/// Orientation filter as chosen by the searcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrientationPreference {
    NoPreference,
    Only(String),
}

impl OrientationPreference {
    pub fn accepts(&self, orientation: Option<&str>) -> bool {
        match self {
            OrientationPreference::NoPreference => true,
            OrientationPreference::Only(wanted) => orientation == Some(wanted.as_str()),
        }
    }
}

impl From<String> for OrientationPreference {
    fn from(value: String) -> Self {
        if value == NO_PREFERENCE {
            OrientationPreference::NoPreference
        } else {
            OrientationPreference::Only(value)
        }
    }
}

impl From<OrientationPreference> for String {
    fn from(value: OrientationPreference) -> Self {
        match value {
            OrientationPreference::NoPreference => NO_PREFERENCE.to_string(),
            OrientationPreference::Only(orientation) => orientation,
        }
    }
}

/// Per-request search criteria
///
/// Built from a validated request and dropped once the search completes.
/// Every optional filter is `None` when the searcher did not ask for it.
#[derive(Debug, Clone)]
pub struct SearchCriteria {
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub gender: Option<String>,
    pub status: Option<String>,
    pub sexual_orientation: Option<OrientationPreference>,
    pub age_range: Option<AgeRange>,
    pub excluded_ids: HashSet<String>,
    /// Itineraries owned by the searcher are never offered back to them
    pub searcher_id: Option<String>,
}

impl SearchCriteria {
    /// Criteria with only the required fields set
    pub fn new(destination: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            destination: destination.into(),
            start_date,
            end_date,
            gender: None,
            status: None,
            sexual_orientation: None,
            age_range: None,
            excluded_ids: HashSet::new(),
            searcher_id: None,
        }
    }

    pub fn window(&self) -> DayWindow {
        crate::core::dates::calculate_day_window(self.start_date, self.end_date)
    }

    pub fn exclude<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_ids.extend(ids.into_iter().map(Into::into));
    }
}
