//! Console report of a stats rebuild

use std::fmt;

use crate::domain::{CategoryBreakdown, VideoStats};

/// Outcome of one rebuild, rendered line by line for the console
#[derive(Debug, Clone, PartialEq)]
pub struct RebuildReport {
    /// Rows in `video_stats` after the swap
    pub stats_count: u64,
    pub indexes: Vec<&'static str>,
    pub top_limit: usize,
    pub top_videos: Vec<VideoStats>,
    pub categories: Vec<CategoryBreakdown>,
}

impl fmt::Display for RebuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== AGGREGATING VIDEO STATISTICS ===")?;
        writeln!(f)?;

        writeln!(f, "Step 1: Building video_stats from events...")?;
        writeln!(f, "  Created {} video stats entries", self.stats_count)?;
        writeln!(f)?;

        writeln!(f, "Step 2: Creating indexes...")?;
        writeln!(f, "  Indexes created")?;
        writeln!(f)?;

        writeln!(f, "Step 3: Top {} videos by views:", self.top_limit)?;
        for stats in &self.top_videos {
            writeln!(
                f,
                "  - {}: {} views, avg {}s",
                stats.video_id,
                stats.total_views,
                stats.rounded_avg_duration()
            )?;
        }
        writeln!(f)?;

        writeln!(f, "Step 4: Category breakdown:")?;
        for row in &self.categories {
            writeln!(
                f,
                "  - {}: {} videos, {} views",
                row.category, row.video_count, row.total_views
            )?;
        }
        writeln!(f)?;

        write!(f, "=== AGGREGATION COMPLETE ===")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_report_format() {
        let report = RebuildReport {
            stats_count: 2,
            indexes: vec!["video_stats_video_id_idx", "video_stats_total_views_idx"],
            top_limit: 5,
            top_videos: vec![VideoStats {
                video_id: "video_1".to_string(),
                total_views: 3,
                avg_duration: 149.5,
                unique_viewers: 2,
                last_updated: Utc::now(),
            }],
            categories: vec![CategoryBreakdown {
                category: "Educational".to_string(),
                video_count: 2,
                total_views: 20500,
            }],
        };

        let expected = "\
=== AGGREGATING VIDEO STATISTICS ===

Step 1: Building video_stats from events...
  Created 2 video stats entries

Step 2: Creating indexes...
  Indexes created

Step 3: Top 5 videos by views:
  - video_1: 3 views, avg 150s

Step 4: Category breakdown:
  - Educational: 2 videos, 20500 views

=== AGGREGATION COMPLETE ===";

        assert_eq!(report.to_string(), expected);
    }
}
