//! streaming_analytics Library
//!
//! Bootstrap and stats maintenance for a video streaming analytics store.
//! Re-exports modules for the binaries and integration tests.

pub mod config;
pub mod db;
pub mod domain;
pub mod generator;
pub mod schema;
pub mod stats;
pub mod store;

mod error;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use domain::{Action, CategoryBreakdown, Event, ValidationError, Video, VideoStats};
pub use schema::{BootstrapOptions, BootstrapReport, Bootstrapper, Credential, Secret};
pub use stats::{RebuildReport, StatsRebuilder};
pub use store::{AnalyticsStore, MemoryStore, PgStore, StoreError};
