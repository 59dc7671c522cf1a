use crate::core::{CandidateBatch, PageCursor};
use crate::models::SearchCriteria;
use crate::services::{FirestoreClient, FirestoreError, PostgresClient, PostgresError};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    Postgres(#[from] PostgresError),

    #[error(transparent)]
    Firestore(#[from] FirestoreError),
}

/// Where candidate itineraries are fetched from
#[derive(Clone)]
pub enum CandidateSource {
    /// Predicate pushed down into SQL
    Postgres(Arc<PostgresClient>),
    /// Broad destination query, narrowed in memory by the matcher
    Firestore(Arc<FirestoreClient>),
}

impl CandidateSource {
    pub fn name(&self) -> &'static str {
        match self {
            CandidateSource::Postgres(_) => "postgres",
            CandidateSource::Firestore(_) => "firestore",
        }
    }

    /// Fetch up to `fetch_size` candidates ordered after `cursor`
    pub async fn fetch_candidates(
        &self,
        criteria: &SearchCriteria,
        cursor: Option<&PageCursor>,
        fetch_size: usize,
    ) -> Result<CandidateBatch, SourceError> {
        let candidates = match self {
            CandidateSource::Postgres(client) => {
                client.search_itineraries(criteria, cursor, fetch_size).await?
            }
            CandidateSource::Firestore(client) => {
                client.query_itineraries(criteria, cursor, fetch_size).await?
            }
        };

        Ok(CandidateBatch::from_fetch(candidates, fetch_size))
    }
}

/// Candidates to request so a full page can still report a following one
pub fn fetch_size(fetch_limit: usize, page_limit: usize) -> usize {
    fetch_limit.max(page_limit + 1)
}
