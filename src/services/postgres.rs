use crate::core::PageCursor;
use crate::models::{Itinerary, OrientationPreference, SearchCriteria};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),
}

const ITINERARY_COLUMNS: &str = "id, user_id, destination, start_date, end_date, start_day, end_day, \
     age, gender, status, sexual_orientation, created_at";

/// Record of a viewed itinerary
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewedItinerary {
    pub user_id: String,
    pub itinerary_id: String,
    pub viewed_at: DateTime<Utc>,
}

/// PostgreSQL client
///
/// Serves two purposes: the relational itinerary source, where the match
/// predicate is pushed down as a `WHERE` clause, and the per-user record of
/// itineraries already viewed, which feeds the exclusion set.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, PostgresError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    /// Fetch itineraries satisfying `criteria` that sort after `cursor`, newest first
    pub async fn search_itineraries(
        &self,
        criteria: &SearchCriteria,
        cursor: Option<&PageCursor>,
        fetch_limit: usize,
    ) -> Result<Vec<Itinerary>, PostgresError> {
        let mut builder = build_search_query(criteria, cursor, fetch_limit);

        let rows = builder.build().fetch_all(&self.pool).await?;

        let itineraries = rows
            .iter()
            .map(itinerary_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            "Postgres returned {} itineraries for {}",
            itineraries.len(),
            criteria.destination
        );

        Ok(itineraries)
    }

    /// Record that a user has viewed an itinerary
    ///
    /// Repeated views refresh `viewed_at` instead of inserting duplicates.
    pub async fn record_view(
        &self,
        user_id: &str,
        itinerary_id: &str,
    ) -> Result<(), PostgresError> {
        let query = r#"
            INSERT INTO viewed_itineraries (user_id, itinerary_id, viewed_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (user_id, itinerary_id)
            DO UPDATE SET viewed_at = EXCLUDED.viewed_at
        "#;

        sqlx::query(query)
            .bind(user_id)
            .bind(itinerary_id)
            .execute(&self.pool)
            .await?;

        tracing::debug!("Recorded view: {} -> {}", user_id, itinerary_id);

        Ok(())
    }

    /// Get all itinerary IDs the given user has already viewed
    pub async fn get_viewed_itineraries(&self, user_id: &str) -> Result<Vec<String>, PostgresError> {
        let query = r#"
            SELECT itinerary_id
            FROM viewed_itineraries
            WHERE user_id = $1
        "#;

        let rows = sqlx::query(query).bind(user_id).fetch_all(&self.pool).await?;

        let viewed_ids = rows
            .iter()
            .map(|row| row.try_get::<String, _>("itinerary_id"))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!("User {} has viewed {} itineraries", user_id, viewed_ids.len());

        Ok(viewed_ids)
    }

    /// Most recent views first
    pub async fn get_recent_views(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<ViewedItinerary>, PostgresError> {
        let query = r#"
            SELECT user_id, itinerary_id, viewed_at
            FROM viewed_itineraries
            WHERE user_id = $1
            ORDER BY viewed_at DESC
            LIMIT $2
        "#;

        let rows = sqlx::query(query)
            .bind(user_id)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| -> Result<ViewedItinerary, PostgresError> {
                Ok(ViewedItinerary {
                    user_id: row.try_get("user_id")?,
                    itinerary_id: row.try_get("itinerary_id")?,
                    viewed_at: row.try_get("viewed_at")?,
                })
            })
            .collect()
    }

    /// Clear all viewed itineraries for a user
    pub async fn clear_viewed_itineraries(&self, user_id: &str) -> Result<u64, PostgresError> {
        let query = r#"
            DELETE FROM viewed_itineraries
            WHERE user_id = $1
        "#;

        let result = sqlx::query(query).bind(user_id).execute(&self.pool).await?;

        tracing::info!(
            "Cleared {} viewed itineraries for user {}",
            result.rows_affected(),
            user_id
        );

        Ok(result.rows_affected())
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, PostgresError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

/// Build the full itinerary search statement for `criteria`
pub fn build_search_query(
    criteria: &SearchCriteria,
    cursor: Option<&PageCursor>,
    fetch_limit: usize,
) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {} FROM itineraries WHERE ", ITINERARY_COLUMNS));

    push_search_predicate(&mut builder, criteria);

    if let Some(cursor) = cursor {
        push_cursor_predicate(&mut builder, cursor);
    }

    builder.push(" ORDER BY created_at DESC, id ASC LIMIT ");
    builder.push_bind(fetch_limit as i64);

    builder
}

/// Append the match predicate as a conjunction of bound conditions
///
/// Mirrors `filter_itineraries` so both candidate sources agree.
pub fn push_search_predicate<'a>(builder: &mut QueryBuilder<'a, Postgres>, criteria: &SearchCriteria) {
    let window = criteria.window();

    builder.push("destination = ");
    builder.push_bind(criteria.destination.clone());

    builder.push(" AND start_day <= ");
    builder.push_bind(window.end_day);
    builder.push(" AND end_day >= ");
    builder.push_bind(window.start_day);

    if let Some(gender) = &criteria.gender {
        builder.push(" AND gender = ");
        builder.push_bind(gender.clone());
    }

    if let Some(status) = &criteria.status {
        builder.push(" AND status = ");
        builder.push_bind(status.clone());
    }

    if let Some(OrientationPreference::Only(orientation)) = &criteria.sexual_orientation {
        builder.push(" AND sexual_orientation = ");
        builder.push_bind(orientation.clone());
    }

    if let Some(range) = &criteria.age_range {
        builder.push(" AND age IS NOT NULL AND age BETWEEN ");
        builder.push_bind(i16::from(range.lower));
        builder.push(" AND ");
        builder.push_bind(i16::from(range.upper));
    }

    if let Some(searcher_id) = &criteria.searcher_id {
        builder.push(" AND (user_id IS NULL OR user_id <> ");
        builder.push_bind(searcher_id.clone());
        builder.push(")");
    }

    if !criteria.excluded_ids.is_empty() {
        let mut excluded: Vec<String> = criteria.excluded_ids.iter().cloned().collect();
        excluded.sort();

        builder.push(" AND NOT (id = ANY(");
        builder.push_bind(excluded);
        builder.push("))");
    }
}

/// Keyset condition for rows ordered after `cursor`
///
/// Matches `ORDER BY created_at DESC, id ASC`; an unrepresentable cursor
/// timestamp leaves nothing to page through.
pub fn push_cursor_predicate<'a>(builder: &mut QueryBuilder<'a, Postgres>, cursor: &PageCursor) {
    let Some(created_at) = DateTime::<Utc>::from_timestamp_millis(cursor.created_at_ms) else {
        builder.push(" AND FALSE");
        return;
    };

    builder.push(" AND (created_at < ");
    builder.push_bind(created_at);
    builder.push(" OR (created_at = ");
    builder.push_bind(created_at);
    builder.push(" AND id > ");
    builder.push_bind(cursor.id.clone());
    builder.push("))");
}

fn itinerary_from_row(row: &PgRow) -> Result<Itinerary, sqlx::Error> {
    let age: Option<i16> = row.try_get("age")?;

    Ok(Itinerary {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        destination: row.try_get("destination")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        start_day: row.try_get("start_day")?,
        end_day: row.try_get("end_day")?,
        age: age.and_then(|a| u8::try_from(a).ok()),
        gender: row.try_get("gender")?,
        status: row.try_get("status")?,
        sexual_orientation: row.try_get("sexual_orientation")?,
        created_at: row.try_get("created_at")?,
    })
}
