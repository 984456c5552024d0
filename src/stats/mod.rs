//! Stats module
//!
//! Rebuilds the denormalized `video_stats` collection from the event log
//! and renders the highlights report.

pub mod pipeline;
mod rebuilder;
mod report;

pub use pipeline::{aggregate_watch_events, rank_by_views};
pub use rebuilder::StatsRebuilder;
pub use report::RebuildReport;

/// Rows shown in the top videos section unless configured otherwise
pub const DEFAULT_TOP_LIMIT: usize = 5;
