//! Stats Rebuilder
//!
//! Recomputes `video_stats` from scratch, restores its lookup indexes and
//! collects the two report sections.

use chrono::{DateTime, Utc};

use crate::schema::STATS_REBUILD_INDEXES;
use crate::store::{AnalyticsStore, StoreError};

use super::{RebuildReport, DEFAULT_TOP_LIMIT};

/// Runs the stats pipeline against a store
#[derive(Debug, Clone)]
pub struct StatsRebuilder<S> {
    store: S,
    top_limit: usize,
}

impl<S: AnalyticsStore> StatsRebuilder<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            top_limit: DEFAULT_TOP_LIMIT,
        }
    }

    /// Number of rows in the top videos section
    pub fn with_top_limit(mut self, top_limit: usize) -> Self {
        self.top_limit = top_limit;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Rebuild using the current time as the missing-timestamp fallback
    pub async fn run(&self) -> Result<RebuildReport, StoreError> {
        self.run_at(Utc::now()).await
    }

    /// Rebuild with an explicit fallback timestamp
    #[tracing::instrument(skip(self), fields(top_limit = self.top_limit))]
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<RebuildReport, StoreError> {
        tracing::info!("Building video_stats from events");
        let written = self.store.rebuild_video_stats(now).await?;
        let stats_count = self.store.count_video_stats().await?;
        tracing::info!(written, stats_count, "video_stats rebuilt");

        self.store.create_indexes(&STATS_REBUILD_INDEXES).await?;
        let indexes = STATS_REBUILD_INDEXES.iter().map(|i| i.name).collect();
        tracing::info!("video_stats indexes recreated");

        let top_videos = self.store.top_video_stats(self.top_limit).await?;

        // Catalog-level view counters, not the event-derived ones above
        let categories = self.store.category_breakdown().await?;

        Ok(RebuildReport {
            stats_count,
            indexes,
            top_limit: self.top_limit,
            top_videos,
            categories,
        })
    }
}
