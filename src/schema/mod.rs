//! Schema module
//!
//! Declarative description of the four collections and their indexes,
//! plus the bootstrap procedure that applies them.

mod bootstrap;
mod credential;

pub use bootstrap::{sample_video_stats, sample_videos, BootstrapOptions, BootstrapReport, Bootstrapper};
pub use credential::{Credential, Secret};

pub const EVENTS: &str = "events";
pub const VIDEO_STATS: &str = "video_stats";
pub const USER_PROFILES: &str = "user_profiles";
pub const VIDEOS: &str = "videos";

/// Staging table the stats rebuild writes before swapping it in
pub const VIDEO_STATS_STAGING: &str = "video_stats_rebuild";

/// Sort direction of an index key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// One index declaration on a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: &'static str,
    pub collection: &'static str,
    pub keys: &'static [(&'static str, SortOrder)],
    pub unique: bool,
}

impl IndexSpec {
    /// Field names in key order
    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.keys.iter().map(|(field, _)| *field)
    }

    /// `CREATE INDEX` statement for this declaration
    pub fn create_sql(&self) -> String {
        let keys = self
            .keys
            .iter()
            .map(|(field, order)| match order {
                SortOrder::Asc => field.to_string(),
                SortOrder::Desc => format!("{} DESC", field),
            })
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "CREATE {}INDEX IF NOT EXISTS {} ON {} ({})",
            if self.unique { "UNIQUE " } else { "" },
            self.name,
            self.collection,
            keys
        )
    }
}

/// A collection and its column layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionSpec {
    pub name: &'static str,
    pub columns: &'static str,
}

impl CollectionSpec {
    pub fn create_sql(&self) -> String {
        format!("CREATE TABLE IF NOT EXISTS {} ({})", self.name, self.columns)
    }
}

const VIDEO_STATS_COLUMNS: &str = r#"
    video_id TEXT NOT NULL,
    total_views BIGINT NOT NULL,
    avg_duration DOUBLE PRECISION NOT NULL,
    unique_viewers BIGINT NOT NULL,
    last_updated TIMESTAMPTZ NOT NULL
"#;

pub const COLLECTIONS: [CollectionSpec; 4] = [
    CollectionSpec {
        name: EVENTS,
        columns: r#"
            id BIGSERIAL PRIMARY KEY,
            event_id TEXT,
            user_id TEXT NOT NULL,
            video_id TEXT NOT NULL,
            action TEXT NOT NULL,
            duration INTEGER NOT NULL,
            occurred_at TIMESTAMPTZ,
            quality TEXT,
            device_type TEXT
        "#,
    },
    CollectionSpec {
        name: VIDEO_STATS,
        columns: VIDEO_STATS_COLUMNS,
    },
    CollectionSpec {
        name: USER_PROFILES,
        columns: r#"
            user_id TEXT NOT NULL,
            watch_history JSONB NOT NULL DEFAULT '[]',
            preferences JSONB NOT NULL DEFAULT '{}',
            recommended_videos JSONB NOT NULL DEFAULT '[]',
            last_active TIMESTAMPTZ,
            total_watch_time BIGINT NOT NULL DEFAULT 0
        "#,
    },
    CollectionSpec {
        name: VIDEOS,
        columns: r#"
            video_id TEXT NOT NULL,
            title TEXT NOT NULL,
            category TEXT NOT NULL,
            duration INTEGER NOT NULL,
            upload_date TIMESTAMPTZ NOT NULL,
            views BIGINT NOT NULL DEFAULT 0,
            likes BIGINT NOT NULL DEFAULT 0
        "#,
    },
];

/// Staging layout for the stats rebuild, identical to `video_stats`
pub const VIDEO_STATS_STAGING_SPEC: CollectionSpec = CollectionSpec {
    name: VIDEO_STATS_STAGING,
    columns: VIDEO_STATS_COLUMNS,
};

use SortOrder::{Asc, Desc};

/// Index set declared by the bootstrapper
pub const BOOTSTRAP_INDEXES: [IndexSpec; 12] = [
    // events
    IndexSpec { name: "events_user_id_idx", collection: EVENTS, keys: &[("user_id", Asc)], unique: false },
    IndexSpec { name: "events_video_id_idx", collection: EVENTS, keys: &[("video_id", Asc)], unique: false },
    IndexSpec { name: "events_occurred_at_idx", collection: EVENTS, keys: &[("occurred_at", Desc)], unique: false },
    IndexSpec {
        name: "events_user_id_occurred_at_idx",
        collection: EVENTS,
        keys: &[("user_id", Asc), ("occurred_at", Desc)],
        unique: false,
    },
    IndexSpec {
        name: "events_video_id_occurred_at_idx",
        collection: EVENTS,
        keys: &[("video_id", Asc), ("occurred_at", Desc)],
        unique: false,
    },
    // video_stats
    IndexSpec { name: "video_stats_video_id_key", collection: VIDEO_STATS, keys: &[("video_id", Asc)], unique: true },
    IndexSpec { name: "video_stats_total_views_idx", collection: VIDEO_STATS, keys: &[("total_views", Desc)], unique: false },
    IndexSpec { name: "video_stats_last_updated_idx", collection: VIDEO_STATS, keys: &[("last_updated", Desc)], unique: false },
    // user_profiles
    IndexSpec { name: "user_profiles_user_id_key", collection: USER_PROFILES, keys: &[("user_id", Asc)], unique: true },
    // videos
    IndexSpec { name: "videos_video_id_key", collection: VIDEOS, keys: &[("video_id", Asc)], unique: true },
    IndexSpec { name: "videos_category_idx", collection: VIDEOS, keys: &[("category", Asc)], unique: false },
    IndexSpec { name: "videos_views_idx", collection: VIDEOS, keys: &[("views", Desc)], unique: false },
];

/// Indexes recreated on `video_stats` after every rebuild.
/// The rebuilt lookup index on `video_id` is not unique.
pub const STATS_REBUILD_INDEXES: [IndexSpec; 2] = [
    IndexSpec { name: "video_stats_video_id_idx", collection: VIDEO_STATS, keys: &[("video_id", Asc)], unique: false },
    IndexSpec { name: "video_stats_total_views_idx", collection: VIDEO_STATS, keys: &[("total_views", Desc)], unique: false },
];

/// Look up a collection declaration by name
pub fn collection(name: &str) -> Option<&'static CollectionSpec> {
    COLLECTIONS.iter().find(|spec| spec.name == name)
}
