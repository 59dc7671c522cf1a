// Core algorithm exports
pub mod dates;
pub mod filters;
pub mod matcher;
pub mod pagination;

pub use dates::{calculate_day_window, day_start_millis, overlaps_window, parse_calendar_date, age_on};
pub use filters::{matches_criteria, matches_demographics, matches_destination, matches_date_window, is_excluded};
pub use matcher::{filter_itineraries, CandidateBatch, Matcher, MatchResult};
pub use pagination::{PageCursor, newest_first};
