//! In-memory store
//!
//! Same observable behavior as the PostgreSQL store: declared unique indexes
//! are enforced, batch inserts are all-or-nothing and the stats rebuild swaps
//! in a complete snapshot. Clones share state.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::domain::{CategoryBreakdown, Event, Video, VideoStats};
use crate::schema::{self, Credential, IndexSpec};
use crate::stats::{aggregate_watch_events, rank_by_views};

use super::{validate_all, AnalyticsStore, StoreError};

#[derive(Debug, Default)]
struct State {
    collections: HashSet<&'static str>,
    indexes: HashMap<&'static str, Vec<IndexSpec>>,
    events: Vec<Event>,
    videos: Vec<Video>,
    video_stats: Vec<VideoStats>,
    roles: Vec<String>,
}

impl State {
    fn require_collection(&self, name: &'static str) -> Result<(), StoreError> {
        if self.collections.contains(name) {
            Ok(())
        } else {
            Err(StoreError::MissingCollection(name.to_string()))
        }
    }

    fn unique_indexes(&self, collection: &str) -> Vec<IndexSpec> {
        self.indexes
            .get(collection)
            .map(|specs| specs.iter().filter(|i| i.unique).copied().collect())
            .unwrap_or_default()
    }
}

/// Key of `record` under `index`, read through its serialized field names
fn index_key<T: Serialize>(index: &IndexSpec, record: &T) -> Result<String, StoreError> {
    let value = serde_json::to_value(record)?;
    Ok(index
        .fields()
        .map(|field| value.get(field).map(|v| v.to_string()).unwrap_or_default())
        .collect::<Vec<_>>()
        .join("|"))
}

/// Reject `incoming` if it collides with `existing` or with itself on any unique index
fn check_unique<T: Serialize>(
    collection: &'static str,
    indexes: &[IndexSpec],
    existing: &[T],
    incoming: &[T],
) -> Result<(), StoreError> {
    for index in indexes {
        let mut seen = HashSet::new();
        for record in existing {
            seen.insert(index_key(index, record)?);
        }
        for record in incoming {
            let key = index_key(index, record)?;
            if !seen.insert(key.clone()) {
                return Err(StoreError::ConstraintViolation {
                    collection: collection.to_string(),
                    detail: format!(
                        "duplicate key value violates unique constraint \"{}\": ({})",
                        index.name, key
                    ),
                });
            }
        }
    }
    Ok(())
}

/// In-process [`AnalyticsStore`]
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index names currently declared on `collection`
    pub async fn index_names(&self, collection: &str) -> Vec<&'static str> {
        let state = self.state.read().await;
        state
            .indexes
            .get(collection)
            .map(|specs| specs.iter().map(|i| i.name).collect())
            .unwrap_or_default()
    }

    /// Roles provisioned so far
    pub async fn roles(&self) -> Vec<String> {
        self.state.read().await.roles.clone()
    }

    pub async fn event_count(&self) -> usize {
        self.state.read().await.events.len()
    }

    pub async fn video_count(&self) -> usize {
        self.state.read().await.videos.len()
    }
}

impl AnalyticsStore for MemoryStore {
    async fn create_collections(&self) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        for spec in schema::COLLECTIONS.iter() {
            state.collections.insert(spec.name);
        }
        Ok(())
    }

    async fn create_indexes(&self, indexes: &[IndexSpec]) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        for index in indexes {
            state.require_collection(index.collection)?;

            // A unique index cannot be built over rows that already collide
            if index.unique {
                let unique = [*index];
                match index.collection {
                    schema::VIDEOS => check_unique(schema::VIDEOS, &unique, &[], &state.videos)?,
                    schema::VIDEO_STATS => {
                        check_unique(schema::VIDEO_STATS, &unique, &[], &state.video_stats)?
                    }
                    _ => {}
                }
            }

            let declared = state.indexes.entry(index.collection).or_default();
            if !declared.iter().any(|i| i.name == index.name) {
                declared.push(*index);
            }
        }
        Ok(())
    }

    async fn truncate_collections(&self) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.events.clear();
        state.videos.clear();
        state.video_stats.clear();
        Ok(())
    }

    async fn collection_exists(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.state.read().await.collections.contains(name))
    }

    async fn insert_videos(&self, videos: &[Video]) -> Result<u64, StoreError> {
        validate_all(schema::VIDEOS, videos, Video::validate)?;
        let mut state = self.state.write().await;
        state.require_collection(schema::VIDEOS)?;
        check_unique(schema::VIDEOS, &state.unique_indexes(schema::VIDEOS), &state.videos, videos)?;
        state.videos.extend_from_slice(videos);
        Ok(videos.len() as u64)
    }

    async fn insert_missing_videos(&self, videos: &[Video]) -> Result<u64, StoreError> {
        validate_all(schema::VIDEOS, videos, Video::validate)?;
        let mut state = self.state.write().await;
        state.require_collection(schema::VIDEOS)?;

        let mut known: HashSet<String> = state.videos.iter().map(|v| v.video_id.clone()).collect();
        let missing: Vec<Video> = videos
            .iter()
            .filter(|v| known.insert(v.video_id.clone()))
            .cloned()
            .collect();

        let inserted = missing.len() as u64;
        state.videos.extend(missing);
        Ok(inserted)
    }

    async fn insert_video_stats(&self, stats: &[VideoStats]) -> Result<u64, StoreError> {
        validate_all(schema::VIDEO_STATS, stats, VideoStats::validate)?;
        let mut state = self.state.write().await;
        state.require_collection(schema::VIDEO_STATS)?;
        check_unique(
            schema::VIDEO_STATS,
            &state.unique_indexes(schema::VIDEO_STATS),
            &state.video_stats,
            stats,
        )?;
        state.video_stats.extend_from_slice(stats);
        Ok(stats.len() as u64)
    }

    async fn insert_events(&self, events: &[Event]) -> Result<u64, StoreError> {
        validate_all(schema::EVENTS, events, Event::validate)?;
        let mut state = self.state.write().await;
        state.require_collection(schema::EVENTS)?;
        state.events.extend_from_slice(events);
        Ok(events.len() as u64)
    }

    async fn provision_credential(&self, credential: &Credential) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if state.roles.iter().any(|r| r == &credential.username) {
            return Err(StoreError::ConstraintViolation {
                collection: "roles".to_string(),
                detail: format!("role \"{}\" already exists", credential.username),
            });
        }
        state.roles.push(credential.username.clone());
        Ok(())
    }

    async fn rebuild_video_stats(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut state = self.state.write().await;
        state.require_collection(schema::EVENTS).map_err(StoreError::into_pipeline)?;

        // Build the full snapshot before touching the current one
        let snapshot = aggregate_watch_events(&state.events, now).map_err(|source| {
            StoreError::InvalidRecord {
                collection: schema::EVENTS,
                source,
            }
            .into_pipeline()
        })?;

        let written = snapshot.len() as u64;
        state.video_stats = snapshot;
        // Dropping the old collection drops its indexes too
        state.indexes.remove(schema::VIDEO_STATS);
        state.collections.insert(schema::VIDEO_STATS);
        Ok(written)
    }

    async fn count_video_stats(&self) -> Result<u64, StoreError> {
        Ok(self.state.read().await.video_stats.len() as u64)
    }

    async fn top_video_stats(&self, limit: usize) -> Result<Vec<VideoStats>, StoreError> {
        let mut stats = self.state.read().await.video_stats.clone();
        rank_by_views(&mut stats);
        stats.truncate(limit);
        Ok(stats)
    }

    async fn list_video_stats(&self) -> Result<Vec<VideoStats>, StoreError> {
        let mut stats = self.state.read().await.video_stats.clone();
        stats.sort_by(|a, b| a.video_id.cmp(&b.video_id));
        Ok(stats)
    }

    async fn category_breakdown(&self) -> Result<Vec<CategoryBreakdown>, StoreError> {
        let state = self.state.read().await;

        let mut totals: BTreeMap<&str, (i64, i64)> = BTreeMap::new();
        for video in &state.videos {
            let entry = totals.entry(video.category.as_str()).or_default();
            entry.0 += 1;
            entry.1 += video.views;
        }

        let mut rows: Vec<CategoryBreakdown> = totals
            .into_iter()
            .map(|(category, (video_count, total_views))| CategoryBreakdown {
                category: category.to_string(),
                video_count,
                total_views,
            })
            .collect();
        rows.sort_by(|a, b| {
            b.total_views
                .cmp(&a.total_views)
                .then_with(|| a.category.cmp(&b.category))
        });
        Ok(rows)
    }
}
