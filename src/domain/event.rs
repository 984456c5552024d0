//! Viewing events
//!
//! Events are immutable facts appended by the platform's ingestion path.
//! This crate only reads them (and writes synthetic ones for demo data).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{require_non_negative, require_text, ValidationError};

/// Kind of user action recorded by an event
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Action {
    Watch,
    Pause,
    Stop,
    Resume,
    Seek,
    /// Any action label this crate does not know about
    Other(String),
}

impl Action {
    /// Actions the demo generator draws from
    pub const KNOWN: [Action; 5] = [
        Action::Watch,
        Action::Pause,
        Action::Stop,
        Action::Resume,
        Action::Seek,
    ];

    /// Stored label of the action
    pub fn as_str(&self) -> &str {
        match self {
            Action::Watch => "WATCH",
            Action::Pause => "PAUSE",
            Action::Stop => "STOP",
            Action::Resume => "RESUME",
            Action::Seek => "SEEK",
            Action::Other(label) => label,
        }
    }

    /// Only WATCH events feed the stats pipeline
    pub fn is_watch(&self) -> bool {
        matches!(self, Action::Watch)
    }
}

impl From<&str> for Action {
    fn from(label: &str) -> Self {
        match label {
            "WATCH" => Action::Watch,
            "PAUSE" => Action::Pause,
            "STOP" => Action::Stop,
            "RESUME" => Action::Resume,
            "SEEK" => Action::Seek,
            other => Action::Other(other.to_string()),
        }
    }
}

impl From<String> for Action {
    fn from(label: String) -> Self {
        Action::from(label.as_str())
    }
}

impl From<Action> for String {
    fn from(action: Action) -> Self {
        action.as_str().to_string()
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One user action against one video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_id: Option<String>,
    pub user_id: String,
    pub video_id: String,
    pub action: Action,
    /// Seconds
    pub duration: i32,
    /// Missing on some legacy rows
    pub occurred_at: Option<DateTime<Utc>>,
    pub quality: Option<String>,
    pub device_type: Option<String>,
}

impl Event {
    /// Create an event with only the attributes the stats pipeline reads
    pub fn new(
        user_id: impl Into<String>,
        video_id: impl Into<String>,
        action: Action,
        duration: i32,
        occurred_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            event_id: None,
            user_id: user_id.into(),
            video_id: video_id.into(),
            action,
            duration,
            occurred_at,
            quality: None,
            device_type: None,
        }
    }

    /// Shorthand for a WATCH event
    pub fn watch(
        user_id: impl Into<String>,
        video_id: impl Into<String>,
        duration: i32,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self::new(user_id, video_id, Action::Watch, duration, Some(occurred_at))
    }

    pub fn with_event_id(mut self, event_id: impl Into<String>) -> Self {
        self.event_id = Some(event_id.into());
        self
    }

    pub fn with_playback(mut self, quality: impl Into<String>, device_type: impl Into<String>) -> Self {
        self.quality = Some(quality.into());
        self.device_type = Some(device_type.into());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("user_id", &self.user_id)?;
        require_text("video_id", &self.video_id)?;
        require_text("action", self.action.as_str())?;
        require_non_negative("duration", f64::from(self.duration))?;
        Ok(())
    }
}
