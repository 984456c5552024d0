//! Video catalog and derived statistics records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{require_non_negative, require_text, ValidationError};

/// Catalog entry, owned by catalog management
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub video_id: String,
    pub title: String,
    pub category: String,
    /// Seconds
    pub duration: i32,
    pub upload_date: DateTime<Utc>,
    /// Catalog-level view counter, independent of the event log
    pub views: i64,
    pub likes: i64,
}

impl Video {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("video_id", &self.video_id)?;
        require_text("title", &self.title)?;
        require_text("category", &self.category)?;
        require_non_negative("duration", f64::from(self.duration))?;
        require_non_negative("views", self.views as f64)?;
        require_non_negative("likes", self.likes as f64)?;
        Ok(())
    }
}

/// Denormalized per-video aggregate of WATCH events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoStats {
    pub video_id: String,
    pub total_views: i64,
    /// Mean watch duration in seconds
    pub avg_duration: f64,
    pub unique_viewers: i64,
    pub last_updated: DateTime<Utc>,
}

impl VideoStats {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("video_id", &self.video_id)?;
        require_non_negative("total_views", self.total_views as f64)?;
        require_non_negative("avg_duration", self.avg_duration)?;
        require_non_negative("unique_viewers", self.unique_viewers as f64)?;
        Ok(())
    }

    /// Average duration rounded half-up to whole seconds, as shown in reports
    pub fn rounded_avg_duration(&self) -> i64 {
        (self.avg_duration + 0.5).floor() as i64
    }
}

/// Catalog totals for one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub category: String,
    pub video_count: i64,
    /// Sum of the catalog `views` field
    pub total_views: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(avg_duration: f64) -> VideoStats {
        VideoStats {
            video_id: "video_1".to_string(),
            total_views: 3,
            avg_duration,
            unique_viewers: 2,
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn test_rounded_avg_duration() {
        assert_eq!(stats(150.0).rounded_avg_duration(), 150);
        assert_eq!(stats(1350.5).rounded_avg_duration(), 1351);
        assert_eq!(stats(980.49).rounded_avg_duration(), 980);
    }

    #[test]
    fn test_video_stats_validation() {
        assert!(stats(12.0).validate().is_ok());
        assert_eq!(
            stats(f64::INFINITY).validate(),
            Err(ValidationError::NotFinite("avg_duration"))
        );
    }

    #[test]
    fn test_video_validation() {
        let video = Video {
            video_id: "video_9".to_string(),
            title: "Dune".to_string(),
            category: String::new(),
            duration: 9000,
            upload_date: Utc::now(),
            views: 10,
            likes: 1,
        };
        assert_eq!(video.validate(), Err(ValidationError::EmptyField("category")));
    }
}
