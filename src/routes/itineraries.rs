use actix_web::{web, HttpResponse, Responder};
use validator::Validate;
use crate::core::{Matcher, PageCursor};
use crate::models::{
    SearchItinerariesRequest, RecordViewRequest, SearchItinerariesResponse, HealthResponse,
    RecordViewResponse, ErrorResponse, SearchCriteria,
};
use crate::services::{fetch_size, CacheManager, CacheKey, CandidateSource, PostgresClient, PostgresError};
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub postgres: Arc<PostgresClient>,
    pub cache: Arc<CacheManager>,
    pub source: CandidateSource,
    pub matcher: Matcher,
    pub default_limit: usize,
    pub fetch_limit: usize,
}

/// Configure all itinerary routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/itineraries/search", web::post().to(search_itineraries))
        .route("/itineraries/view", web::post().to(record_view))
        .route("/itineraries/viewed", web::get().to(get_viewed_itineraries))
        .route("/itineraries/viewed", web::delete().to(clear_viewed_itineraries))
        .route("/itineraries/viewed/recent", web::get().to(get_recent_views));
}

fn bad_request(error: &str, message: String) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: error.to_string(),
        message,
        status_code: 400,
    })
}

fn internal_error(error: &str, message: String) -> HttpResponse {
    HttpResponse::InternalServerError().json(ErrorResponse {
        error: error.to_string(),
        message,
        status_code: 500,
    })
}

fn required_user_id(query: &HashMap<String, String>) -> Result<&String, HttpResponse> {
    query.get("userId").ok_or_else(|| {
        bad_request("Missing userId parameter", "userId query parameter is required".to_string())
    })
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let pg_healthy = state.postgres.health_check().await.unwrap_or(false);

    let status = if pg_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Viewed ids for a user, cache first
///
/// A cache miss is filled from Postgres. The write-back is skipped when a
/// view or reset bumped the user's generation while the list was loading.
async fn load_viewed_ids(state: &AppState, user_id: &str) -> Result<Vec<String>, PostgresError> {
    let key = CacheKey::viewed(user_id);
    let generation_key = CacheKey::viewed_generation(user_id);

    if let Ok(ids) = state.cache.get::<Vec<String>>(&key).await {
        return Ok(ids);
    }

    let generation = match state.cache.generation(&generation_key).await {
        Ok(generation) => Some(generation),
        Err(e) => {
            tracing::warn!("Failed to read viewed generation for {}: {}", user_id, e);
            None
        }
    };

    let ids = state.postgres.get_viewed_itineraries(user_id).await?;

    if let Some(generation) = generation {
        if let Err(e) = state.cache.set_if_generation(&key, &ids, &generation_key, generation).await {
            tracing::warn!("Failed to cache viewed itineraries for {}: {}", user_id, e);
        }
    }

    Ok(ids)
}

/// Add the user's persisted viewed ids to the request's own exclusions
///
/// A failed lookup degrades to the request exclusions alone so a search
/// never fails just because the viewed history is unavailable. Returns the
/// number of persisted ids merged.
fn apply_viewed_exclusions<E: Display>(
    criteria: &mut SearchCriteria,
    user_id: &str,
    viewed: Result<Vec<String>, E>,
) -> usize {
    match viewed {
        Ok(ids) => {
            let count = ids.len();
            criteria.exclude(ids);
            count
        }
        Err(e) => {
            tracing::warn!("Failed to fetch viewed itineraries for {}, proceeding without filtering: {}", user_id, e);
            0
        }
    }
}

async fn invalidate_viewed(state: &AppState, user_id: &str) {
    if let Err(e) = state.cache.bump_generation(&CacheKey::viewed_generation(user_id)).await {
        tracing::warn!("Failed to bump viewed generation: {}", e);
    }
    if let Err(e) = state.cache.delete(&CacheKey::viewed(user_id)).await {
        tracing::warn!("Failed to invalidate cache: {}", e);
    }
}

/// Search itineraries endpoint
///
/// POST /api/v1/itineraries/search
///
/// Request body:
/// ```json
/// {
///   "userId": "string",
///   "destination": "Miami, FL, USA",
///   "startDate": "2025-11-11",
///   "endDate": "2025-11-30",
///   "gender": "Female",
///   "status": "couple",
///   "sexualOrientation": "No Preference",
///   "lowerRange": 18,
///   "upperRange": 100,
///   "excludedIds": ["string"],
///   "limit": 20,
///   "cursor": "string"
/// }
/// ```
async fn search_itineraries(
    state: web::Data<AppState>,
    req: web::Json<SearchItinerariesRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for search request: field_errors={:?}", errors);
        return bad_request("Validation failed", errors.to_string());
    }

    let mut criteria = match SearchCriteria::try_from(&*req) {
        Ok(criteria) => criteria,
        Err(e) => return bad_request("Invalid search criteria", e.to_string()),
    };

    let cursor = match req.cursor.as_deref().map(str::parse::<PageCursor>).transpose() {
        Ok(cursor) => cursor,
        Err(e) => return bad_request("Invalid search criteria", e.to_string()),
    };

    let user_id = &req.user_id;
    let limit = state
        .matcher
        .clamp_limit(req.limit.map_or(state.default_limit, usize::from));

    tracing::info!(
        "Searching itineraries for user: {}, destination: {}, limit: {}",
        user_id,
        criteria.destination,
        limit
    );

    let viewed = load_viewed_ids(&state, user_id).await;
    let merged = apply_viewed_exclusions(&mut criteria, user_id, viewed);
    tracing::debug!("Excluding {} viewed itineraries for user {}", merged, user_id);

    let fetch_count = fetch_size(state.fetch_limit, limit);
    let batch = match state
        .source
        .fetch_candidates(&criteria, cursor.as_ref(), fetch_count)
        .await
    {
        Ok(batch) => batch,
        Err(e) => {
            tracing::error!("Failed to fetch candidates from {} for {}: {}", state.source.name(), user_id, e);
            return internal_error("Failed to fetch candidates", e.to_string());
        }
    };

    let result = state
        .matcher
        .find_page(&criteria, batch, limit, cursor.as_ref());

    let response = SearchItinerariesResponse {
        itineraries: result.itineraries,
        next_cursor: result.next_cursor.map(|c| c.to_string()),
        total_candidates: result.total_candidates,
        total_matches: result.total_matches,
    };

    tracing::info!(
        "Returning {} itineraries for user {} ({} matches from {} candidates)",
        response.itineraries.len(),
        user_id,
        response.total_matches,
        response.total_candidates
    );

    HttpResponse::Ok().json(response)
}

/// Record view endpoint
///
/// POST /api/v1/itineraries/view
///
/// Request body:
/// ```json
/// {
///   "userId": "string",
///   "itineraryId": "string"
/// }
/// ```
async fn record_view(
    state: web::Data<AppState>,
    req: web::Json<RecordViewRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return bad_request("Validation failed", errors.to_string());
    }

    match state.postgres.record_view(&req.user_id, &req.itinerary_id).await {
        Ok(()) => {
            invalidate_viewed(&state, &req.user_id).await;

            HttpResponse::Ok().json(RecordViewResponse {
                success: true,
                event_id: uuid::Uuid::new_v4().to_string(),
            })
        }
        Err(e) => {
            tracing::error!("Failed to record view in PostgreSQL: {}", e);
            internal_error("Failed to record view", e.to_string())
        }
    }
}

/// Get viewed itineraries for a user
///
/// GET /api/v1/itineraries/viewed?userId={userId}
async fn get_viewed_itineraries(
    state: web::Data<AppState>,
    query: web::Query<HashMap<String, String>>,
) -> impl Responder {
    let user_id = match required_user_id(&query) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.postgres.get_viewed_itineraries(user_id).await {
        Ok(viewed_ids) => HttpResponse::Ok().json(serde_json::json!({
            "userId": user_id,
            "viewedItineraries": viewed_ids,
            "count": viewed_ids.len(),
        })),
        Err(e) => {
            tracing::error!("Failed to fetch viewed itineraries for {}: {}", user_id, e);
            internal_error("Failed to fetch viewed itineraries", e.to_string())
        }
    }
}

/// Most recent views with timestamps
///
/// GET /api/v1/itineraries/viewed/recent?userId={userId}&limit={limit}
async fn get_recent_views(
    state: web::Data<AppState>,
    query: web::Query<HashMap<String, String>>,
) -> impl Responder {
    let user_id = match required_user_id(&query) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let limit = match query.get("limit").map(|l| l.parse::<usize>()).transpose() {
        Ok(limit) => limit.unwrap_or(state.default_limit).min(state.matcher.max_limit()),
        Err(e) => return bad_request("Invalid limit parameter", e.to_string()),
    };

    match state.postgres.get_recent_views(user_id, limit).await {
        Ok(views) => HttpResponse::Ok().json(serde_json::json!({
            "userId": user_id,
            "views": views,
        })),
        Err(e) => {
            tracing::error!("Failed to fetch recent views for {}: {}", user_id, e);
            internal_error("Failed to fetch recent views", e.to_string())
        }
    }
}

/// Reset a user's viewed history
///
/// DELETE /api/v1/itineraries/viewed?userId={userId}
async fn clear_viewed_itineraries(
    state: web::Data<AppState>,
    query: web::Query<HashMap<String, String>>,
) -> impl Responder {
    let user_id = match required_user_id(&query) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.postgres.clear_viewed_itineraries(user_id).await {
        Ok(cleared) => {
            invalidate_viewed(&state, user_id).await;

            HttpResponse::Ok().json(serde_json::json!({
                "userId": user_id,
                "cleared": cleared,
            }))
        }
        Err(e) => {
            tracing::error!("Failed to clear viewed itineraries for {}: {}", user_id, e);
            internal_error("Failed to clear viewed itineraries", e.to_string())
        }
    }
}
