//! Storage module
//!
//! Every storage operation the bootstrapper and the stats rebuilder need,
//! behind one trait with a PostgreSQL and an in-memory implementation.

mod memory;
mod postgres;

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::domain::{CategoryBreakdown, Event, ValidationError, Video, VideoStats};
use crate::schema::{Credential, IndexSpec};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Storage operations over the analytics collections
pub trait AnalyticsStore: Send + Sync {
    /// Create the four collections if they are absent
    fn create_collections(&self) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Create the given indexes if they are absent
    fn create_indexes(&self, indexes: &[IndexSpec]) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Remove every record from the four collections
    fn truncate_collections(&self) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn collection_exists(&self, name: &str) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Insert all videos or none
    fn insert_videos(&self, videos: &[Video]) -> impl Future<Output = Result<u64, StoreError>> + Send;

    /// Insert videos whose id is not in the catalog yet, returns the number inserted
    fn insert_missing_videos(&self, videos: &[Video]) -> impl Future<Output = Result<u64, StoreError>> + Send;

    /// Insert all stats rows or none
    fn insert_video_stats(&self, stats: &[VideoStats]) -> impl Future<Output = Result<u64, StoreError>> + Send;

    fn insert_events(&self, events: &[Event]) -> impl Future<Output = Result<u64, StoreError>> + Send;

    /// Create the application login with read-write scope
    fn provision_credential(&self, credential: &Credential) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Replace `video_stats` with a fresh aggregate of WATCH events.
    ///
    /// `now` stands in for `last_updated` when a group has no timestamp.
    /// Returns the number of rows written.
    fn rebuild_video_stats(&self, now: DateTime<Utc>) -> impl Future<Output = Result<u64, StoreError>> + Send;

    fn count_video_stats(&self) -> impl Future<Output = Result<u64, StoreError>> + Send;

    /// Highest `total_views` first, ties by `video_id`
    fn top_video_stats(&self, limit: usize) -> impl Future<Output = Result<Vec<VideoStats>, StoreError>> + Send;

    /// All stats rows ordered by `video_id`
    fn list_video_stats(&self) -> impl Future<Output = Result<Vec<VideoStats>, StoreError>> + Send;

    /// Catalog totals per category, highest summed views first, ties by name
    fn category_breakdown(&self) -> impl Future<Output = Result<Vec<CategoryBreakdown>, StoreError>> + Send;
}

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage unreachable: {0}")]
    ConnectionFailure(#[source] sqlx::Error),

    #[error("Constraint violation on {collection}: {detail}")]
    ConstraintViolation { collection: String, detail: String },

    #[error("Stats pipeline failed: {0}")]
    PipelineFailure(String),

    #[error("Invalid record in {collection}: {source}")]
    InvalidRecord {
        collection: &'static str,
        #[source]
        source: ValidationError,
    },

    #[error("Collection does not exist: {0}")]
    MissingCollection(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl StoreError {
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, StoreError::ConnectionFailure(_))
    }

    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, StoreError::ConstraintViolation { .. })
    }

    /// Reclassify an error raised inside the stats pipeline.
    /// Connection failures keep their kind.
    pub fn into_pipeline(self) -> Self {
        match self {
            StoreError::ConnectionFailure(_) | StoreError::PipelineFailure(_) => self,
            other => StoreError::PipelineFailure(other.to_string()),
        }
    }
}

/// SQLSTATE codes reported as constraint violations
const UNIQUE_VIOLATION: &str = "23505";
const DUPLICATE_OBJECT: &str = "42710";

fn is_connection_error(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
    )
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if is_connection_error(&err) {
            return StoreError::ConnectionFailure(err);
        }

        if let sqlx::Error::Database(db_err) = &err {
            let code = db_err.code();
            if matches!(code.as_deref(), Some(UNIQUE_VIOLATION) | Some(DUPLICATE_OBJECT)) {
                return StoreError::ConstraintViolation {
                    collection: db_err.table().unwrap_or("database").to_string(),
                    detail: db_err.message().to_string(),
                };
            }
        }

        StoreError::Database(err)
    }
}

/// Validate a batch before it reaches storage
fn validate_all<T>(
    collection: &'static str,
    records: &[T],
    validate: impl Fn(&T) -> Result<(), ValidationError>,
) -> Result<(), StoreError> {
    for record in records {
        validate(record).map_err(|source| StoreError::InvalidRecord { collection, source })?;
    }
    Ok(())
}
