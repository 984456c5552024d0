//! PostgreSQL store
//!
//! Collections are tables, index declarations are `CREATE INDEX` statements.
//! The stats rebuild fills a staging table and swaps it in within one
//! transaction, so readers never observe an empty or partial `video_stats`.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};

use crate::domain::{CategoryBreakdown, Event, Video, VideoStats};
use crate::schema::{self, Credential, IndexSpec};
use crate::stats::pipeline::{AGGREGATE_INTO_STAGING_SQL, CATEGORY_BREAKDOWN_SQL, TOP_STATS_SQL};

use super::{validate_all, AnalyticsStore, StoreError};

/// Rows per multi-row INSERT, well under the bind parameter limit
const INSERT_BATCH_SIZE: usize = 1000;

/// [`AnalyticsStore`] backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new PgStore
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn read_stats(row: &PgRow) -> Result<VideoStats, StoreError> {
        let stats = VideoStats {
            video_id: row.try_get("video_id")?,
            total_views: row.try_get("total_views")?,
            avg_duration: row.try_get("avg_duration")?,
            unique_viewers: row.try_get("unique_viewers")?,
            last_updated: row.try_get("last_updated")?,
        };
        stats.validate().map_err(|source| StoreError::InvalidRecord {
            collection: schema::VIDEO_STATS,
            source,
        })?;
        Ok(stats)
    }

    fn push_videos(builder: &mut QueryBuilder<'_, Postgres>, videos: &[Video]) {
        builder.push(
            "INSERT INTO videos (video_id, title, category, duration, upload_date, views, likes) ",
        );
        builder.push_values(videos, |mut row, video| {
            row.push_bind(video.video_id.clone())
                .push_bind(video.title.clone())
                .push_bind(video.category.clone())
                .push_bind(video.duration)
                .push_bind(video.upload_date)
                .push_bind(video.views)
                .push_bind(video.likes);
        });
    }
}

impl AnalyticsStore for PgStore {
    #[tracing::instrument(skip(self))]
    async fn create_collections(&self) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        for spec in schema::COLLECTIONS.iter() {
            sqlx::query(&spec.create_sql()).execute(&mut *tx).await?;
            tracing::debug!(collection = spec.name, "Collection ensured");
        }
        tx.commit().await?;
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(count = indexes.len()))]
    async fn create_indexes(&self, indexes: &[IndexSpec]) -> Result<(), StoreError> {
        for index in indexes {
            sqlx::query(&index.create_sql()).execute(&self.pool).await?;
            tracing::debug!(index = index.name, collection = index.collection, "Index ensured");
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn truncate_collections(&self) -> Result<(), StoreError> {
        let tables = schema::COLLECTIONS
            .iter()
            .map(|spec| spec.name)
            .collect::<Vec<_>>()
            .join(", ");
        sqlx::query(&format!("TRUNCATE TABLE {} RESTART IDENTITY", tables))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn collection_exists(&self, name: &str) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = 'public' AND table_name = $1
            )
            "#,
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    #[tracing::instrument(skip_all, fields(count = videos.len()))]
    async fn insert_videos(&self, videos: &[Video]) -> Result<u64, StoreError> {
        validate_all(schema::VIDEOS, videos, Video::validate)?;
        if videos.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;
        for chunk in videos.chunks(INSERT_BATCH_SIZE) {
            let mut builder = QueryBuilder::new("");
            Self::push_videos(&mut builder, chunk);
            inserted += builder.build().execute(&mut *tx).await?.rows_affected();
        }
        tx.commit().await?;

        Ok(inserted)
    }

    #[tracing::instrument(skip_all, fields(count = videos.len()))]
    async fn insert_missing_videos(&self, videos: &[Video]) -> Result<u64, StoreError> {
        validate_all(schema::VIDEOS, videos, Video::validate)?;
        if videos.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;
        for chunk in videos.chunks(INSERT_BATCH_SIZE) {
            let mut builder = QueryBuilder::new("");
            Self::push_videos(&mut builder, chunk);
            builder.push(" ON CONFLICT (video_id) DO NOTHING");
            inserted += builder.build().execute(&mut *tx).await?.rows_affected();
        }
        tx.commit().await?;

        Ok(inserted)
    }

    #[tracing::instrument(skip_all, fields(count = stats.len()))]
    async fn insert_video_stats(&self, stats: &[VideoStats]) -> Result<u64, StoreError> {
        validate_all(schema::VIDEO_STATS, stats, VideoStats::validate)?;
        if stats.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;
        for chunk in stats.chunks(INSERT_BATCH_SIZE) {
            let mut builder = QueryBuilder::new(
                "INSERT INTO video_stats (video_id, total_views, avg_duration, unique_viewers, last_updated) ",
            );
            builder.push_values(chunk, |mut row, s| {
                row.push_bind(s.video_id.clone())
                    .push_bind(s.total_views)
                    .push_bind(s.avg_duration)
                    .push_bind(s.unique_viewers)
                    .push_bind(s.last_updated);
            });
            inserted += builder.build().execute(&mut *tx).await?.rows_affected();
        }
        tx.commit().await?;

        Ok(inserted)
    }

    #[tracing::instrument(skip_all, fields(count = events.len()))]
    async fn insert_events(&self, events: &[Event]) -> Result<u64, StoreError> {
        validate_all(schema::EVENTS, events, Event::validate)?;
        if events.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;
        for chunk in events.chunks(INSERT_BATCH_SIZE) {
            let mut builder = QueryBuilder::new(
                "INSERT INTO events (event_id, user_id, video_id, action, duration, occurred_at, quality, device_type) ",
            );
            builder.push_values(chunk, |mut row, e| {
                row.push_bind(e.event_id.clone())
                    .push_bind(e.user_id.clone())
                    .push_bind(e.video_id.clone())
                    .push_bind(e.action.as_str().to_string())
                    .push_bind(e.duration)
                    .push_bind(e.occurred_at)
                    .push_bind(e.quality.clone())
                    .push_bind(e.device_type.clone());
            });
            inserted += builder.build().execute(&mut *tx).await?.rows_affected();
        }
        tx.commit().await?;

        Ok(inserted)
    }

    #[tracing::instrument(skip_all, fields(role = %credential.username))]
    async fn provision_credential(&self, credential: &Credential) -> Result<(), StoreError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM pg_roles WHERE rolname = $1)")
                .bind(&credential.username)
                .fetch_one(&self.pool)
                .await?;

        if exists {
            return Err(StoreError::ConstraintViolation {
                collection: "pg_roles".to_string(),
                detail: format!("role \"{}\" already exists", credential.username),
            });
        }

        let database: String = sqlx::query_scalar("SELECT current_database()")
            .fetch_one(&self.pool)
            .await?;

        let mut tx = self.pool.begin().await?;
        for statement in credential.provision_statements(&database) {
            sqlx::query(&statement).execute(&mut *tx).await?;
        }
        tx.commit().await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn rebuild_video_stats(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;

        let staging = async {
            sqlx::query(&format!("DROP TABLE IF EXISTS {}", schema::VIDEO_STATS_STAGING))
                .execute(&mut *tx)
                .await?;
            sqlx::query(&schema::VIDEO_STATS_STAGING_SPEC.create_sql())
                .execute(&mut *tx)
                .await?;

            let written = sqlx::query(AGGREGATE_INTO_STAGING_SQL)
                .bind(now)
                .execute(&mut *tx)
                .await?
                .rows_affected();

            sqlx::query(&format!("DROP TABLE IF EXISTS {}", schema::VIDEO_STATS))
                .execute(&mut *tx)
                .await?;
            sqlx::query(&format!(
                "ALTER TABLE {} RENAME TO {}",
                schema::VIDEO_STATS_STAGING,
                schema::VIDEO_STATS
            ))
            .execute(&mut *tx)
            .await?;

            Ok::<u64, sqlx::Error>(written)
        }
        .await;

        // An error drops the transaction, which rolls back and keeps the old snapshot
        let written = staging.map_err(|e| StoreError::from(e).into_pipeline())?;
        tx.commit().await?;

        tracing::debug!(written, "video_stats swapped in");
        Ok(written)
    }

    async fn count_video_stats(&self) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM video_stats")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    async fn top_video_stats(&self, limit: usize) -> Result<Vec<VideoStats>, StoreError> {
        let rows = sqlx::query(TOP_STATS_SQL)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::read_stats).collect()
    }

    async fn list_video_stats(&self) -> Result<Vec<VideoStats>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT video_id, total_views, avg_duration, unique_viewers, last_updated
            FROM video_stats
            ORDER BY video_id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::read_stats).collect()
    }

    async fn category_breakdown(&self) -> Result<Vec<CategoryBreakdown>, StoreError> {
        let rows = sqlx::query(CATEGORY_BREAKDOWN_SQL)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| -> Result<CategoryBreakdown, StoreError> {
                Ok(CategoryBreakdown {
                    category: row.try_get("category")?,
                    video_count: row.try_get("video_count")?,
                    total_views: row.try_get("total_views")?,
                })
            })
            .collect()
    }
}
