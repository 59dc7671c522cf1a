use crate::models::{CriteriaError, Itinerary};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Keyset cursor pointing at the last itinerary of the previous page
///
/// Serialized as `<created_at epoch ms>:<itinerary id>`. Itinerary ids may
/// themselves contain colons, so only the first separator is significant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    pub created_at_ms: i64,
    pub id: String,
}

impl PageCursor {
    pub fn from_itinerary(itinerary: &Itinerary) -> Self {
        Self {
            created_at_ms: itinerary.created_at.timestamp_millis(),
            id: itinerary.id.clone(),
        }
    }

    /// True when `itinerary` sorts strictly after this cursor
    pub fn precedes(&self, itinerary: &Itinerary) -> bool {
        compare_keys(
            self.created_at_ms,
            &self.id,
            itinerary.created_at.timestamp_millis(),
            &itinerary.id,
        ) == Ordering::Less
    }
}

/// Result order: newest first, then ascending id
#[inline]
pub fn compare_keys(a_created_ms: i64, a_id: &str, b_created_ms: i64, b_id: &str) -> Ordering {
    b_created_ms.cmp(&a_created_ms).then_with(|| a_id.cmp(b_id))
}

/// Ordering used for every result list
#[inline]
pub fn newest_first(a: &Itinerary, b: &Itinerary) -> Ordering {
    compare_keys(
        a.created_at.timestamp_millis(),
        &a.id,
        b.created_at.timestamp_millis(),
        &b.id,
    )
}

impl fmt::Display for PageCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.created_at_ms, self.id)
    }
}

impl FromStr for PageCursor {
    type Err = CriteriaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (millis, id) = s
            .split_once(':')
            .ok_or_else(|| CriteriaError::InvalidCursor(s.to_string()))?;

        let created_at_ms = millis
            .parse::<i64>()
            .map_err(|_| CriteriaError::InvalidCursor(s.to_string()))?;

        if id.is_empty() {
            return Err(CriteriaError::InvalidCursor(s.to_string()));
        }

        Ok(Self {
            created_at_ms,
            id: id.to_string(),
        })
    }
}
