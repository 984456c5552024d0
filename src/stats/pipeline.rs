//! Stats aggregation pipeline
//!
//! Filter WATCH events, group them by video and reduce each group to a
//! [`VideoStats`] row. `aggregate_watch_events` is the in-process form; the
//! SQL constants express the same stages for PostgreSQL.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};

use crate::domain::{Event, ValidationError, VideoStats};

/// Running totals for one video
#[derive(Debug, Default)]
struct Group<'a> {
    count: i64,
    duration_sum: i64,
    viewers: HashSet<&'a str>,
    latest: Option<DateTime<Utc>>,
}

impl Group<'_> {
    fn finish(self, video_id: &str, now: DateTime<Utc>) -> VideoStats {
        VideoStats {
            video_id: video_id.to_string(),
            total_views: self.count,
            avg_duration: self.duration_sum as f64 / self.count as f64,
            unique_viewers: self.viewers.len() as i64,
            last_updated: self.latest.unwrap_or(now),
        }
    }
}

/// Aggregate WATCH events into one stats row per video, ordered by `video_id`.
///
/// Non-WATCH events are dropped unread. Every WATCH event is validated and
/// one malformed WATCH event fails the whole run.
pub fn aggregate_watch_events(
    events: &[Event],
    now: DateTime<Utc>,
) -> Result<Vec<VideoStats>, ValidationError> {
    let mut groups: BTreeMap<&str, Group<'_>> = BTreeMap::new();

    for event in events {
        if !event.action.is_watch() {
            continue;
        }
        event.validate()?;

        let group = groups.entry(event.video_id.as_str()).or_default();
        group.count += 1;
        group.duration_sum += i64::from(event.duration);
        group.viewers.insert(event.user_id.as_str());
        group.latest = group.latest.max(event.occurred_at);
    }

    Ok(groups
        .into_iter()
        .map(|(video_id, group)| group.finish(video_id, now))
        .collect())
}

/// Order stats for the top-N report: most views first, ties by id
pub fn rank_by_views(stats: &mut [VideoStats]) {
    stats.sort_by(|a, b| {
        b.total_views
            .cmp(&a.total_views)
            .then_with(|| a.video_id.cmp(&b.video_id))
    });
}

/// Fill the staging table from the event log. `$1` is the fallback timestamp.
pub(crate) const AGGREGATE_INTO_STAGING_SQL: &str = r#"
    INSERT INTO video_stats_rebuild (video_id, total_views, avg_duration, unique_viewers, last_updated)
    SELECT
        video_id,
        COUNT(*),
        AVG(duration)::DOUBLE PRECISION,
        COUNT(DISTINCT user_id),
        COALESCE(MAX(occurred_at), $1)
    FROM events
    WHERE action = 'WATCH'
    GROUP BY video_id
"#;

pub(crate) const TOP_STATS_SQL: &str = r#"
    SELECT video_id, total_views, avg_duration, unique_viewers, last_updated
    FROM video_stats
    ORDER BY total_views DESC, video_id ASC
    LIMIT $1
"#;

pub(crate) const CATEGORY_BREAKDOWN_SQL: &str = r#"
    SELECT
        category,
        COUNT(*)::BIGINT AS video_count,
        COALESCE(SUM(views), 0)::BIGINT AS total_views
    FROM videos
    GROUP BY category
    ORDER BY total_views DESC, category ASC
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Action;
    use chrono::{Duration, TimeZone};

    fn t(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap() + Duration::minutes(minute)
    }

    #[test]
    fn test_scenario_single_video() {
        let events = vec![
            Event::watch("userA", "video_1", 100, t(1)),
            Event::watch("userA", "video_1", 200, t(2)),
            Event::watch("userB", "video_1", 150, t(3)),
        ];

        let stats = aggregate_watch_events(&events, t(99)).unwrap();
        assert_eq!(
            stats,
            vec![VideoStats {
                video_id: "video_1".to_string(),
                total_views: 3,
                avg_duration: 150.0,
                unique_viewers: 2,
                last_updated: t(3),
            }]
        );
    }

    #[test]
    fn test_average_of_durations() {
        let events = vec![
            Event::watch("u1", "video_1", 10, t(0)),
            Event::watch("u2", "video_1", 20, t(0)),
            Event::watch("u3", "video_1", 30, t(0)),
        ];

        let stats = aggregate_watch_events(&events, t(0)).unwrap();
        assert_eq!(stats[0].avg_duration, 20.0);
    }

    #[test]
    fn test_non_watch_events_are_ignored() {
        let events = vec![
            Event::new("u1", "video_1", Action::Pause, 5, Some(t(0))),
            Event::new("u1", "video_2", Action::Seek, 5, Some(t(0))),
            Event::new("u1", "video_2", Action::Other("LIKE".into()), 0, Some(t(0))),
            Event::watch("u2", "video_2", 60, t(5)),
        ];

        let stats = aggregate_watch_events(&events, t(0)).unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].video_id, "video_2");
        assert_eq!(stats[0].total_views, 1);
        assert_eq!(stats[0].unique_viewers, 1);
    }

    #[test]
    fn test_missing_timestamps_fall_back_to_now() {
        let events = vec![
            Event::new("u1", "video_1", Action::Watch, 10, None),
            Event::new("u2", "video_1", Action::Watch, 20, None),
            Event::new("u3", "video_2", Action::Watch, 20, None),
            Event::watch("u3", "video_2", 20, t(4)),
        ];

        let stats = aggregate_watch_events(&events, t(42)).unwrap();
        assert_eq!(stats[0].last_updated, t(42));
        // a single timestamp in the group wins over the fallback
        assert_eq!(stats[1].last_updated, t(4));
    }

    #[test]
    fn test_malformed_event_fails_the_run() {
        let events = vec![
            Event::watch("u1", "video_1", 10, t(0)),
            Event::watch("u1", "", 10, t(0)),
        ];

        assert_eq!(
            aggregate_watch_events(&events, t(0)),
            Err(ValidationError::EmptyField("video_id"))
        );
    }

    #[test]
    fn test_malformed_non_watch_event_is_filtered_out() {
        let events = vec![
            Event::watch("u1", "video_1", 10, t(0)),
            Event::new("", "video_2", Action::Pause, 5, Some(t(0))),
        ];

        let stats = aggregate_watch_events(&events, t(0)).unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].video_id, "video_1");
    }

    #[test]
    fn test_empty_log_produces_no_rows() {
        assert!(aggregate_watch_events(&[], t(0)).unwrap().is_empty());
    }

    #[test]
    fn test_rank_by_views_breaks_ties_by_id() {
        let mut stats: Vec<VideoStats> = [("b", 5), ("a", 5), ("c", 9)]
            .into_iter()
            .map(|(id, views)| VideoStats {
                video_id: id.to_string(),
                total_views: views,
                avg_duration: 1.0,
                unique_viewers: 1,
                last_updated: t(0),
            })
            .collect();

        rank_by_views(&mut stats);
        let order: Vec<_> = stats.iter().map(|s| s.video_id.as_str()).collect();
        assert_eq!(order, vec!["c", "a", "b"]);
    }
}
