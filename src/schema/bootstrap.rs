//! Bootstrapper
//!
//! One-time environment setup: collections, indexes, sample rows and the
//! application credential. Collections and indexes are created only when
//! absent; sample rows and the credential collide on a second run, which is
//! reported and skipped rather than treated as fatal.

use chrono::{DateTime, Utc};

use crate::domain::{Video, VideoStats};
use crate::store::{AnalyticsStore, StoreError};

use super::{Credential, BOOTSTRAP_INDEXES, COLLECTIONS};

/// Fixed demo catalog
pub fn sample_videos(now: DateTime<Utc>) -> Vec<Video> {
    [
        ("video_1", "Introduction to Big Data", "Documentary", 1800, 15000, 1200),
        ("video_2", "Jakarta EE in Action", "Educational", 2400, 8500, 750),
        ("video_3", "MongoDB for Beginners", "Educational", 1500, 12000, 950),
    ]
    .into_iter()
    .map(|(video_id, title, category, duration, views, likes)| Video {
        video_id: video_id.to_string(),
        title: title.to_string(),
        category: category.to_string(),
        duration,
        upload_date: now,
        views,
        likes,
    })
    .collect()
}

/// Fixed demo stats, not derived from any events
pub fn sample_video_stats(now: DateTime<Utc>) -> Vec<VideoStats> {
    [
        ("video_1", 15000, 1350.5, 12500),
        ("video_2", 8500, 1800.2, 7200),
        ("video_3", 12000, 980.7, 9800),
    ]
    .into_iter()
    .map(|(video_id, total_views, avg_duration, unique_viewers)| VideoStats {
        video_id: video_id.to_string(),
        total_views,
        avg_duration,
        unique_viewers,
        last_updated: now,
    })
    .collect()
}

/// What a bootstrap run should do besides the schema
#[derive(Debug, Clone, Default)]
pub struct BootstrapOptions {
    /// Empty the four collections before seeding
    pub reset: bool,
    /// Skipped with a warning when absent
    pub credential: Option<Credential>,
}

/// Outcome of a bootstrap run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BootstrapReport {
    pub collections: Vec<&'static str>,
    pub indexes: Vec<&'static str>,
    pub reset: bool,
    pub videos_inserted: u64,
    pub stats_inserted: u64,
    pub credential: Option<String>,
    /// Non-fatal problems, one line each
    pub skipped: Vec<String>,
}

impl BootstrapReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Applies the schema and seed data to a store
#[derive(Debug, Clone)]
pub struct Bootstrapper<S> {
    store: S,
}

impl<S: AnalyticsStore> Bootstrapper<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn run(&self, options: &BootstrapOptions) -> Result<BootstrapReport, StoreError> {
        self.run_at(options, Utc::now()).await
    }

    /// Bootstrap with `now` as the date of every sample row
    #[tracing::instrument(skip_all, fields(reset = options.reset))]
    pub async fn run_at(
        &self,
        options: &BootstrapOptions,
        now: DateTime<Utc>,
    ) -> Result<BootstrapReport, StoreError> {
        let mut report = BootstrapReport {
            reset: options.reset,
            ..Default::default()
        };

        self.store.create_collections().await?;
        report.collections = COLLECTIONS.iter().map(|c| c.name).collect();
        tracing::info!(count = report.collections.len(), "Collections ready");

        if options.reset {
            self.store.truncate_collections().await?;
            tracing::warn!("Existing records removed");
        }

        self.store.create_indexes(&BOOTSTRAP_INDEXES).await?;
        report.indexes = BOOTSTRAP_INDEXES.iter().map(|i| i.name).collect();
        tracing::info!(count = report.indexes.len(), "Indexes created");

        match tolerate_conflict(self.store.insert_videos(&sample_videos(now)).await, &mut report)? {
            Some(inserted) => report.videos_inserted = inserted,
            None => tracing::warn!("Sample videos already present"),
        }

        match tolerate_conflict(
            self.store.insert_video_stats(&sample_video_stats(now)).await,
            &mut report,
        )? {
            Some(inserted) => report.stats_inserted = inserted,
            None => tracing::warn!("Sample video stats already present"),
        }
        tracing::info!(
            videos = report.videos_inserted,
            stats = report.stats_inserted,
            "Test data inserted"
        );

        match &options.credential {
            Some(credential) => {
                let provisioned =
                    tolerate_conflict(self.store.provision_credential(credential).await, &mut report)?;
                if provisioned.is_some() {
                    tracing::info!(role = %credential.username, "Application user created");
                    report.credential = Some(credential.username.clone());
                }
            }
            None => {
                tracing::warn!("No application password configured, credential not provisioned");
                report
                    .skipped
                    .push("credential: no application password configured".to_string());
            }
        }

        Ok(report)
    }
}

/// Turn a constraint violation into a skipped step, pass everything else through
fn tolerate_conflict<T>(
    result: Result<T, StoreError>,
    report: &mut BootstrapReport,
) -> Result<Option<T>, StoreError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_constraint_violation() => {
            tracing::warn!(error = %err, "Skipping bootstrap step");
            report.skipped.push(err.to_string());
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Secret, VIDEO_STATS};
    use crate::store::MemoryStore;

    fn options() -> BootstrapOptions {
        BootstrapOptions {
            reset: false,
            credential: Some(Credential::new("streaming_app", Secret::new("from-env"))),
        }
    }

    #[test]
    fn test_sample_rows_are_valid() {
        let now = Utc::now();
        assert!(sample_videos(now).iter().all(|v| v.validate().is_ok()));
        assert!(sample_video_stats(now).iter().all(|s| s.validate().is_ok()));
        assert_eq!(sample_videos(now)[2].title, "MongoDB for Beginners");
        assert_eq!(sample_video_stats(now)[1].avg_duration, 1800.2);
    }

    #[tokio::test]
    async fn test_first_run_is_clean() {
        let bootstrapper = Bootstrapper::new(MemoryStore::new());
        let report = bootstrapper.run(&options()).await.unwrap();

        assert!(report.is_clean(), "{:?}", report.skipped);
        assert_eq!(report.collections.len(), 4);
        assert_eq!(report.indexes.len(), 12);
        assert_eq!(report.videos_inserted, 3);
        assert_eq!(report.stats_inserted, 3);
        assert_eq!(report.credential.as_deref(), Some("streaming_app"));
        assert_eq!(bootstrapper.store().index_names(VIDEO_STATS).await.len(), 3);
    }

    #[tokio::test]
    async fn test_missing_password_skips_credential() {
        let bootstrapper = Bootstrapper::new(MemoryStore::new());
        let report = bootstrapper.run(&BootstrapOptions::default()).await.unwrap();

        assert!(report.credential.is_none());
        assert_eq!(report.skipped.len(), 1);
        assert!(bootstrapper.store().roles().await.is_empty());
    }
}
