// Service exports
pub mod cache;
pub mod firestore;
pub mod postgres;
pub mod source;

pub use cache::{CacheManager, CacheKey, CacheError};
pub use firestore::{FirestoreClient, FirestoreError};
pub use postgres::{PostgresClient, PostgresError, ViewedItinerary};
pub use source::{fetch_size, CandidateSource, SourceError};
