use serde::{Deserialize, Serialize};
use crate::models::domain::Itinerary;

/// Response for the itinerary search endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchItinerariesResponse {
    pub itineraries: Vec<Itinerary>,
    #[serde(rename = "nextCursor")]
    pub next_cursor: Option<String>,
    #[serde(rename = "totalCandidates")]
    pub total_candidates: usize,
    #[serde(rename = "totalMatches")]
    pub total_matches: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
}

/// Record view response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordViewResponse {
    pub success: bool,
    #[serde(rename = "eventId")]
    pub event_id: String,
}
