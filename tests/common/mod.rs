//! Common test utilities

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use sqlx::postgres::PgPoolOptions;

use streaming_analytics::schema::{BOOTSTRAP_INDEXES, COLLECTIONS, VIDEO_STATS_STAGING};
use streaming_analytics::{AnalyticsStore, Event, MemoryStore, PgStore, Video};

/// Fixed clock so repeated rebuilds are comparable
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 4, 12, 0, 0).unwrap()
}

/// Empty in-memory store with the collections and indexes a bootstrap creates
pub async fn setup_memory_store() -> MemoryStore {
    let store = MemoryStore::new();
    store.create_collections().await.unwrap();
    store.create_indexes(&BOOTSTRAP_INDEXES).await.unwrap();
    store
}

/// Setup test database - drop the analytics tables for a fresh state
pub async fn setup_test_db() -> PgStore {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    for spec in COLLECTIONS.iter() {
        sqlx::query(&format!("DROP TABLE IF EXISTS {} CASCADE", spec.name))
            .execute(&pool)
            .await
            .expect("Failed to clean up DB");
    }
    sqlx::query(&format!("DROP TABLE IF EXISTS {}", VIDEO_STATS_STAGING))
        .execute(&pool)
        .await
        .expect("Failed to clean up DB");

    PgStore::new(pool)
}

pub fn watch(user: &str, video: &str, duration: i32) -> Event {
    Event::watch(user, video, duration, fixed_now())
}

pub fn video(id: &str, category: &str, views: i64) -> Video {
    Video {
        video_id: id.to_string(),
        title: format!("Title of {}", id),
        category: category.to_string(),
        duration: 1200,
        upload_date: fixed_now(),
        views,
        likes: views / 10,
    }
}
