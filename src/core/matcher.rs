use crate::models::{Itinerary, SearchCriteria};
use crate::core::{
    filters::{is_excluded, matches_criteria},
    pagination::{newest_first, PageCursor},
};

/// Filter candidate itineraries against one set of search criteria
///
/// Pure and total for well-formed criteria. Exclusions are applied after
/// every other filter, then the survivors are ordered newest first.
pub fn filter_itineraries(criteria: &SearchCriteria, candidates: Vec<Itinerary>) -> Vec<Itinerary> {
    let window = criteria.window();

    let mut matches: Vec<Itinerary> = candidates
        .into_iter()
        .filter(|itinerary| matches_criteria(itinerary, criteria, &window))
        .filter(|itinerary| !is_excluded(itinerary, criteria))
        .collect();

    matches.sort_by(newest_first);
    matches
}

/// Candidates fetched from a source for one page request
///
/// `complete` is false when the source stopped at its fetch limit, so
/// candidates ordered after the last one returned may still exist.
#[derive(Debug, Clone)]
pub struct CandidateBatch {
    pub itineraries: Vec<Itinerary>,
    pub complete: bool,
}

impl CandidateBatch {
    pub fn complete(itineraries: Vec<Itinerary>) -> Self {
        Self {
            itineraries,
            complete: true,
        }
    }

    /// Batch from a fetch of at most `fetch_size` candidates
    pub fn from_fetch(itineraries: Vec<Itinerary>, fetch_size: usize) -> Self {
        let complete = itineraries.len() < fetch_size;
        Self {
            itineraries,
            complete,
        }
    }
}

/// Result of the matching process
#[derive(Debug)]
pub struct MatchResult {
    pub itineraries: Vec<Itinerary>,
    pub next_cursor: Option<PageCursor>,
    pub total_candidates: usize,
    pub total_matches: usize,
}

/// Paging wrapper around [`filter_itineraries`]
#[derive(Debug, Clone)]
pub struct Matcher {
    max_limit: usize,
}

impl Matcher {
    pub fn new(max_limit: usize) -> Self {
        Self {
            max_limit: max_limit.max(1),
        }
    }

    pub fn with_default_limit() -> Self {
        Self::new(100)
    }

    pub fn max_limit(&self) -> usize {
        self.max_limit
    }

    /// Page size actually served for a requested `limit`
    pub fn clamp_limit(&self, limit: usize) -> usize {
        limit.clamp(1, self.max_limit)
    }

    /// Find one page of matching itineraries in a complete candidate set
    ///
    /// # Arguments
    /// * `criteria` - The searcher's criteria, including the exclusion set
    /// * `candidates` - Every candidate that could match
    /// * `limit` - Requested page size, clamped to `1..=max_limit`
    /// * `cursor` - Last item of the previous page, if any
    pub fn find_matches(
        &self,
        criteria: &SearchCriteria,
        candidates: Vec<Itinerary>,
        limit: usize,
        cursor: Option<&PageCursor>,
    ) -> MatchResult {
        self.find_page(criteria, CandidateBatch::complete(candidates), limit, cursor)
    }

    /// Find one page of matching itineraries in a batch fetched from a source
    ///
    /// When the batch is truncated and every match in it fits on the page,
    /// the next cursor points at the last candidate scanned so the following
    /// fetch resumes after it instead of ending the listing early.
    pub fn find_page(
        &self,
        criteria: &SearchCriteria,
        batch: CandidateBatch,
        limit: usize,
        cursor: Option<&PageCursor>,
    ) -> MatchResult {
        let total_candidates = batch.itineraries.len();
        let limit = self.clamp_limit(limit);

        let last_scanned = if batch.complete {
            None
        } else {
            batch
                .itineraries
                .iter()
                .max_by(|a, b| newest_first(a, b))
                .map(PageCursor::from_itinerary)
        };

        let mut matches = filter_itineraries(criteria, batch.itineraries);
        let total_matches = matches.len();

        if let Some(cursor) = cursor {
            matches.retain(|itinerary| cursor.precedes(itinerary));
        }

        let has_more = matches.len() > limit;
        matches.truncate(limit);

        let next_cursor = if has_more {
            matches.last().map(PageCursor::from_itinerary)
        } else {
            last_scanned
        };

        MatchResult {
            itineraries: matches,
            next_cursor,
            total_candidates,
            total_matches,
        }
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_default_limit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn create_candidate(id: &str, destination: &str, minutes_old: i64) -> Itinerary {
        let created_at = Utc.with_ymd_and_hms(2025, 9, 1, 12, 0, 0).unwrap() - Duration::minutes(minutes_old);
        let mut itinerary = Itinerary::from_dates(
            id,
            destination,
            date("2025-11-12"),
            date("2025-11-20"),
            created_at,
        );
        itinerary.age = Some(30);
        itinerary.gender = Some("Female".to_string());
        itinerary
    }

    fn create_criteria() -> SearchCriteria {
        SearchCriteria::new("Miami, FL, USA", date("2025-11-11"), date("2025-11-30"))
    }

    #[test]
    fn test_filter_basic() {
        let criteria = create_criteria();

        let candidates = vec![
            create_candidate("1", "Miami, FL, USA", 0),
            create_candidate("2", "Orlando, FL, USA", 0), // Wrong destination
        ];

        let result = filter_itineraries(&criteria, candidates);

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "1");
    }

    #[test]
    fn test_filter_sorted_newest_first() {
        let criteria = create_criteria();

        let candidates = vec![
            create_candidate("old", "Miami, FL, USA", 60),
            create_candidate("new", "Miami, FL, USA", 5),
            create_candidate("mid", "Miami, FL, USA", 30),
        ];

        let ids: Vec<String> = filter_itineraries(&criteria, candidates)
            .into_iter()
            .map(|i| i.id)
            .collect();

        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[test]
    fn test_exclusion_wins() {
        let mut criteria = create_criteria();
        criteria.exclude(["1"]);

        let result = filter_itineraries(&criteria, vec![create_candidate("1", "Miami, FL, USA", 0)]);

        assert!(result.is_empty());
    }

    #[test]
    fn test_respects_limit() {
        let matcher = Matcher::with_default_limit();
        let criteria = create_criteria();

        let candidates: Vec<Itinerary> = (0..20)
            .map(|i| create_candidate(&i.to_string(), "Miami, FL, USA", i))
            .collect();

        let result = matcher.find_matches(&criteria, candidates, 5, None);

        assert_eq!(result.itineraries.len(), 5);
        assert_eq!(result.total_candidates, 20);
        assert_eq!(result.total_matches, 20);
        assert!(result.next_cursor.is_some());
    }

    #[test]
    fn test_limit_clamped_to_max() {
        let matcher = Matcher::new(3);
        let criteria = create_criteria();

        let candidates: Vec<Itinerary> = (0..10)
            .map(|i| create_candidate(&i.to_string(), "Miami, FL, USA", i))
            .collect();

        let result = matcher.find_matches(&criteria, candidates, 50, None);

        assert_eq!(result.itineraries.len(), 3);
    }

    #[test]
    fn test_cursor_pages_through_results() {
        let matcher = Matcher::with_default_limit();
        let criteria = create_criteria();

        let candidates: Vec<Itinerary> = (0..7)
            .map(|i| create_candidate(&format!("t{}", i), "Miami, FL, USA", i))
            .collect();

        let first = matcher.find_matches(&criteria, candidates.clone(), 4, None);
        let cursor = first.next_cursor.expect("first page should have a cursor");

        let second = matcher.find_matches(&criteria, candidates, 4, Some(&cursor));

        assert_eq!(second.itineraries.len(), 3);
        assert!(second.next_cursor.is_none());

        let mut seen: Vec<String> = first.itineraries.into_iter().map(|i| i.id).collect();
        seen.extend(second.itineraries.into_iter().map(|i| i.id));
        assert_eq!(seen, vec!["t0", "t1", "t2", "t3", "t4", "t5", "t6"]);
    }

    #[test]
    fn test_truncated_batch_keeps_paging() {
        let matcher = Matcher::with_default_limit();
        let criteria = create_criteria();

        // Newest candidate matches, the older two do not
        let batch = CandidateBatch::from_fetch(
            vec![
                create_candidate("a", "Miami, FL, USA", 0),
                create_candidate("b", "Orlando, FL, USA", 5),
                create_candidate("c", "Orlando, FL, USA", 10),
            ],
            3,
        );
        assert!(!batch.complete);

        let result = matcher.find_page(&criteria, batch, 5, None);

        assert_eq!(result.itineraries.len(), 1);
        let cursor = result.next_cursor.expect("truncated batch should keep paging");
        assert_eq!(cursor.id, "c");
    }

    #[test]
    fn test_short_batch_is_complete() {
        let batch = CandidateBatch::from_fetch(vec![create_candidate("a", "Miami, FL, USA", 0)], 3);
        assert!(batch.complete);

        let result = Matcher::with_default_limit().find_page(&create_criteria(), batch, 5, None);
        assert!(result.next_cursor.is_none());
    }
}
