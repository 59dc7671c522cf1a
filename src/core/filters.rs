use crate::models::{DayWindow, Itinerary, SearchCriteria};
use super::dates::overlaps_window;

/// Destinations compare byte-for-byte; no case folding or geocoding
#[inline]
pub fn matches_destination(itinerary: &Itinerary, criteria: &SearchCriteria) -> bool {
    itinerary.destination == criteria.destination
}

#[inline]
pub fn matches_date_window(itinerary: &Itinerary, window: &DayWindow) -> bool {
    overlaps_window(itinerary.start_day, itinerary.end_day, window)
}

/// Check the optional demographic filters
///
/// An absent criterion removes the filter; it never requires the
/// candidate field to be absent.
#[inline]
pub fn matches_demographics(itinerary: &Itinerary, criteria: &SearchCriteria) -> bool {
    if let Some(gender) = &criteria.gender {
        if itinerary.gender.as_ref() != Some(gender) {
            return false;
        }
    }

    if let Some(status) = &criteria.status {
        if itinerary.status.as_ref() != Some(status) {
            return false;
        }
    }

    if let Some(orientation) = &criteria.sexual_orientation {
        if !orientation.accepts(itinerary.sexual_orientation.as_deref()) {
            return false;
        }
    }

    if let Some(range) = &criteria.age_range {
        if !range.contains(itinerary.age) {
            return false;
        }
    }

    true
}

#[inline]
pub fn is_own_itinerary(itinerary: &Itinerary, criteria: &SearchCriteria) -> bool {
    match (&criteria.searcher_id, &itinerary.user_id) {
        (Some(searcher), Some(owner)) => searcher == owner,
        _ => false,
    }
}

#[inline]
pub fn is_excluded(itinerary: &Itinerary, criteria: &SearchCriteria) -> bool {
    criteria.excluded_ids.contains(&itinerary.id)
}

/// Every positive filter; exclusion is applied separately as the final pass
#[inline]
pub fn matches_criteria(
    itinerary: &Itinerary,
    criteria: &SearchCriteria,
    window: &DayWindow,
) -> bool {
    matches_destination(itinerary, criteria)
        && matches_date_window(itinerary, window)
        && matches_demographics(itinerary, criteria)
        && !is_own_itinerary(itinerary, criteria)
}
