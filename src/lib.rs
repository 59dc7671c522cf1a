//! TravalPass Match - itinerary matching service for the TravalPass travel-companion app
//!
//! This library provides the itinerary match filter: destination, date-window
//! overlap, demographic and exclusion filters over candidate itineraries,
//! ordered newest first, plus the services that feed it candidates.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{filter_itineraries, CandidateBatch, Matcher, MatchResult, PageCursor};
pub use crate::models::{Itinerary, SearchCriteria, OrientationPreference, AgeRange, SearchItinerariesRequest, SearchItinerariesResponse};
