use crate::core::dates::parse_calendar_date;
use crate::models::domain::{AgeRange, OrientationPreference, SearchCriteria};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

/// Reasons a search request cannot become [`SearchCriteria`]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CriteriaError {
    #[error("destination is required")]
    MissingDestination,

    #[error("invalid {field}: {value:?} is not a calendar date")]
    InvalidDate { field: &'static str, value: String },

    #[error("endDate {end} is before startDate {start}")]
    InvertedWindow { start: String, end: String },

    #[error("lowerRange and upperRange must be supplied together")]
    IncompleteAgeRange,

    #[error("{field} {value} is not a valid age")]
    AgeOutOfRange { field: &'static str, value: i32 },

    #[error("lowerRange {lower} is above upperRange {upper}")]
    InvertedAgeRange { lower: u8, upper: u8 },

    #[error("invalid cursor: {0}")]
    InvalidCursor(String),
}

/// Request to search matching itineraries
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SearchItinerariesRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
    #[validate(length(min = 1))]
    pub destination: String,
    #[validate(length(min = 1))]
    #[serde(alias = "start_date", rename = "startDate")]
    pub start_date: String,
    #[validate(length(min = 1))]
    #[serde(alias = "end_date", rename = "endDate")]
    pub end_date: String,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, rename = "sexualOrientation")]
    pub sexual_orientation: Option<String>,
    #[serde(default, rename = "lowerRange")]
    pub lower_range: Option<i32>,
    #[serde(default, rename = "upperRange")]
    pub upper_range: Option<i32>,
    #[serde(default, rename = "excludedIds")]
    pub excluded_ids: Vec<String>,
    /// Page size; the service default applies when absent
    #[serde(default)]
    pub limit: Option<u16>,
    #[serde(default)]
    pub cursor: Option<String>,
}

fn age_bound(field: &'static str, value: i32) -> Result<u8, CriteriaError> {
    u8::try_from(value).map_err(|_| CriteriaError::AgeOutOfRange { field, value })
}

/// Blank optional strings from form inputs count as "not specified"
fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl TryFrom<&SearchItinerariesRequest> for SearchCriteria {
    type Error = CriteriaError;

    fn try_from(req: &SearchItinerariesRequest) -> Result<Self, Self::Error> {
        if req.destination.trim().is_empty() {
            return Err(CriteriaError::MissingDestination);
        }

        let start_date = parse_calendar_date(&req.start_date).ok_or_else(|| CriteriaError::InvalidDate {
            field: "startDate",
            value: req.start_date.clone(),
        })?;
        let end_date = parse_calendar_date(&req.end_date).ok_or_else(|| CriteriaError::InvalidDate {
            field: "endDate",
            value: req.end_date.clone(),
        })?;

        if end_date < start_date {
            return Err(CriteriaError::InvertedWindow {
                start: start_date.to_string(),
                end: end_date.to_string(),
            });
        }

        let age_range = match (req.lower_range, req.upper_range) {
            (Some(lower), Some(upper)) => {
                let lower = age_bound("lowerRange", lower)?;
                let upper = age_bound("upperRange", upper)?;
                if lower > upper {
                    return Err(CriteriaError::InvertedAgeRange { lower, upper });
                }
                Some(AgeRange { lower, upper })
            }
            (None, None) => None,
            _ => return Err(CriteriaError::IncompleteAgeRange),
        };

        let mut criteria = SearchCriteria::new(req.destination.clone(), start_date, end_date);
        criteria.gender = non_blank(&req.gender);
        criteria.status = non_blank(&req.status);
        criteria.sexual_orientation = non_blank(&req.sexual_orientation).map(OrientationPreference::from);
        criteria.age_range = age_range;
        criteria.searcher_id = Some(req.user_id.clone());
        criteria.exclude(req.excluded_ids.iter().cloned());

        Ok(criteria)
    }
}

/// Request to record that a user has viewed an itinerary
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RecordViewRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
    #[validate(length(min = 1))]
    #[serde(alias = "itinerary_id", rename = "itineraryId")]
    pub itinerary_id: String,
}
