//! PostgreSQL Integration Tests
//!
//! Run with: DATABASE_URL=postgres://... cargo test --test integration_postgres -- --ignored --test-threads=1

mod common;

use streaming_analytics::schema::{STATS_REBUILD_INDEXES, VIDEO_STATS};
use streaming_analytics::{
    db, Action, AnalyticsStore, BootstrapOptions, Bootstrapper, Event, StatsRebuilder,
};

use common::{fixed_now, setup_test_db, watch};

async fn index_names(store: &streaming_analytics::PgStore, table: &str) -> Vec<String> {
    sqlx::query_scalar("SELECT indexname::TEXT FROM pg_indexes WHERE tablename = $1 ORDER BY indexname")
        .bind(table)
        .fetch_all(store.pool())
        .await
        .unwrap()
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
async fn test_bootstrap_twice() {
    let store = setup_test_db().await;
    let bootstrapper = Bootstrapper::new(store);

    let first = bootstrapper.run_at(&BootstrapOptions::default(), fixed_now()).await.unwrap();
    assert_eq!(first.videos_inserted, 3);
    assert!(db::check_schema(bootstrapper.store()).await.unwrap());

    let second = bootstrapper.run_at(&BootstrapOptions::default(), fixed_now()).await.unwrap();
    assert_eq!(second.videos_inserted, 0);
    // Videos and stats collide, the credential was never configured
    assert_eq!(second.skipped.len(), 3, "{:?}", second.skipped);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
async fn test_rebuild_swaps_video_stats() {
    let store = setup_test_db().await;
    let options = BootstrapOptions {
        reset: true,
        credential: None,
    };
    Bootstrapper::new(store.clone()).run_at(&options, fixed_now()).await.unwrap();

    store
        .insert_events(&[
            watch("userA", "video_1", 100),
            watch("userA", "video_1", 200),
            watch("userB", "video_1", 150),
            Event::new("userC", "video_2", Action::Watch, 60, None),
            Event::new("userC", "video_3", Action::Stop, 5, Some(fixed_now())),
        ])
        .await
        .unwrap();

    let report = StatsRebuilder::new(store.clone()).run_at(fixed_now()).await.unwrap();
    assert_eq!(report.stats_count, 2);

    let stats = store.list_video_stats().await.unwrap();
    assert_eq!(stats[0].video_id, "video_1");
    assert_eq!(stats[0].total_views, 3);
    assert_eq!(stats[0].avg_duration, 150.0);
    assert_eq!(stats[0].unique_viewers, 2);
    assert_eq!(stats[1].last_updated, fixed_now());

    let mut expected: Vec<String> = STATS_REBUILD_INDEXES.iter().map(|i| i.name.to_string()).collect();
    expected.sort();
    assert_eq!(index_names(&store, VIDEO_STATS).await, expected);

    let categories = store.category_breakdown().await.unwrap();
    assert_eq!(categories[0].category, "Educational");
    assert_eq!(categories[0].video_count, 2);
}
