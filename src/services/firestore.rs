use crate::core::dates::{age_on, calculate_day_window, parse_calendar_date};
use crate::core::PageCursor;
use crate::models::{Itinerary, SearchCriteria};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use reqwest::{Client, StatusCode};
use serde_json::{json, Map, Value};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when interacting with Firestore
#[derive(Debug, Error)]
pub enum FirestoreError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Unauthorized: missing or expired access token")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Firestore REST client for the itinerary collection
///
/// Only the destination is pushed into the query; ordering on `createdAt`
/// rules out a range filter on the day bounds. The result is a broad,
/// newest-first candidate set that still needs the in-memory filter.
pub struct FirestoreClient {
    base_url: String,
    project_id: String,
    database_id: String,
    collection: String,
    access_token: Option<String>,
    client: Client,
}

impl FirestoreClient {
    /// Create a new Firestore client
    pub fn new(
        base_url: String,
        project_id: String,
        database_id: String,
        collection: String,
        access_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, FirestoreError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            project_id,
            database_id,
            collection,
            access_token,
            client,
        })
    }

    /// `projects/{p}/databases/{d}/documents`
    fn documents_path(&self) -> String {
        format!("projects/{}/databases/{}/documents", self.project_id, self.database_id)
    }

    fn run_query_url(&self) -> String {
        format!(
            "{}/{}:runQuery",
            self.base_url.trim_end_matches('/'),
            self.documents_path()
        )
    }

    /// Fetch itineraries for the criteria's destination, newest first,
    /// starting after `cursor`
    pub async fn query_itineraries(
        &self,
        criteria: &SearchCriteria,
        cursor: Option<&PageCursor>,
        fetch_limit: usize,
    ) -> Result<Vec<Itinerary>, FirestoreError> {
        let url = self.run_query_url();
        let collection_path = format!("{}/{}", self.documents_path(), self.collection);
        let body = build_structured_query(&self.collection, &collection_path, criteria, cursor, fetch_limit);

        tracing::debug!("Querying Firestore itineraries for {}", criteria.destination);

        let mut request = self.client.post(&url).json(&body);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(FirestoreError::Unauthorized);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Firestore runQuery failed: {} - {}", status, body);
            return Err(FirestoreError::ApiError(format!("Failed to query itineraries: {}", status)));
        }

        let json: Value = response.json().await?;

        let results = json
            .as_array()
            .ok_or_else(|| FirestoreError::InvalidResponse("Expected an array of query results".into()))?;

        let today = Utc::now().date_naive();

        // Entries without a document only carry a read time
        let itineraries: Vec<Itinerary> = results
            .iter()
            .filter_map(|entry| entry.get("document"))
            .filter_map(|doc| match itinerary_from_document(doc, today) {
                Ok(itinerary) => Some(itinerary),
                Err(e) => {
                    tracing::warn!("Skipping malformed itinerary document: {}", e);
                    None
                }
            })
            .collect();

        tracing::debug!("Firestore returned {} itineraries", itineraries.len());

        Ok(itineraries)
    }
}

/// Firestore `runQuery` body
///
/// Destination equality, ordered `createdAt DESC, __name__ ASC` to agree with
/// the result ordering, resuming strictly after `cursor`. `collection_path`
/// is the full resource name of the collection, used to build the document
/// reference in the cursor.
pub fn build_structured_query(
    collection: &str,
    collection_path: &str,
    criteria: &SearchCriteria,
    cursor: Option<&PageCursor>,
    fetch_limit: usize,
) -> Value {
    let mut query = json!({
        "from": [{ "collectionId": collection }],
        "where": {
            "fieldFilter": {
                "field": { "fieldPath": "destination" },
                "op": "EQUAL",
                "value": { "stringValue": criteria.destination }
            }
        },
        "orderBy": [
            { "field": { "fieldPath": "createdAt" }, "direction": "DESCENDING" },
            { "field": { "fieldPath": "__name__" }, "direction": "ASCENDING" }
        ],
        "limit": fetch_limit
    });

    if let Some(cursor) = cursor {
        let created_at = DateTime::<Utc>::from_timestamp_millis(cursor.created_at_ms).unwrap_or_default();

        query["startAt"] = json!({
            "values": [
                { "timestampValue": created_at.to_rfc3339_opts(SecondsFormat::Millis, true) },
                { "referenceValue": format!("{}/{}", collection_path, cursor.id) }
            ],
            "before": false
        });
    }

    json!({ "structuredQuery": query })
}

/// Decode a Firestore document into an [`Itinerary`]
///
/// Owner id and date of birth may be nested under `userInfo`. Day bounds
/// fall back to the calendar dates when the numeric fields are missing, and
/// age falls back to the date of birth as of `today`.
pub fn itinerary_from_document(doc: &Value, today: NaiveDate) -> Result<Itinerary, FirestoreError> {
    let name = doc
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| FirestoreError::InvalidResponse("document without name".into()))?;

    let id = name.rsplit('/').next().unwrap_or(name).to_string();

    let fields = doc
        .get("fields")
        .and_then(Value::as_object)
        .ok_or_else(|| FirestoreError::InvalidResponse(format!("document {} has no fields", id)))?;

    let user_info = fields.get("userInfo").and_then(map_fields);

    let destination = fields
        .get("destination")
        .and_then(string_value)
        .ok_or_else(|| FirestoreError::InvalidResponse(format!("document {} has no destination", id)))?;

    let start_date = fields.get("startDate").and_then(date_value);
    let end_date = fields.get("endDate").and_then(date_value);

    let derived = match (start_date, end_date) {
        (Some(start), Some(end)) => Some(calculate_day_window(start, end)),
        _ => None,
    };

    let start_day = fields
        .get("startDay")
        .and_then(integer_value)
        .or(derived.map(|w| w.start_day))
        .ok_or_else(|| FirestoreError::InvalidResponse(format!("document {} has no start day", id)))?;
    let end_day = fields
        .get("endDay")
        .and_then(integer_value)
        .or(derived.map(|w| w.end_day))
        .ok_or_else(|| FirestoreError::InvalidResponse(format!("document {} has no end day", id)))?;

    let age = fields
        .get("age")
        .and_then(integer_value)
        .and_then(|a| u8::try_from(a).ok())
        .or_else(|| {
            user_info
                .and_then(|info| info.get("dob"))
                .and_then(date_value)
                .and_then(|dob| age_on(dob, today))
        });

    let user_id = fields
        .get("userId")
        .and_then(string_value)
        .or_else(|| user_info.and_then(|info| info.get("uid")).and_then(string_value));

    let demographic = |key: &str| {
        fields
            .get(key)
            .or_else(|| user_info.and_then(|info| info.get(key)))
            .and_then(string_value)
    };

    Ok(Itinerary {
        id,
        user_id,
        destination,
        start_date,
        end_date,
        start_day,
        end_day,
        age,
        gender: demographic("gender"),
        status: demographic("status"),
        sexual_orientation: demographic("sexualOrientation"),
        created_at: fields
            .get("createdAt")
            .and_then(timestamp_value)
            .unwrap_or_default(),
    })
}

fn string_value(value: &Value) -> Option<String> {
    value.get("stringValue").and_then(Value::as_str).map(str::to_string)
}

/// `integerValue` arrives as a decimal string; `doubleValue` as a number
fn integer_value(value: &Value) -> Option<i64> {
    if let Some(int) = value.get("integerValue") {
        return match int {
            Value::String(s) => s.parse().ok(),
            other => other.as_i64(),
        };
    }

    value
        .get("doubleValue")
        .and_then(Value::as_f64)
        .map(|f| f as i64)
}

fn timestamp_value(value: &Value) -> Option<DateTime<Utc>> {
    value
        .get("timestampValue")
        .or_else(|| value.get("stringValue"))
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn date_value(value: &Value) -> Option<NaiveDate> {
    if let Some(ts) = timestamp_value(value) {
        return Some(ts.date_naive());
    }

    value
        .get("stringValue")
        .and_then(Value::as_str)
        .and_then(parse_calendar_date)
}

fn map_fields(value: &Value) -> Option<&Map<String, Value>> {
    value
        .get("mapValue")
        .and_then(|m| m.get("fields"))
        .and_then(Value::as_object)
}
