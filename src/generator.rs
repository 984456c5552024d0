//! Demo data generator
//!
//! Synthetic catalog and viewing events so a freshly bootstrapped database
//! has something for the stats rebuild to aggregate.

use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use uuid::Uuid;

use crate::domain::{Action, Event, Video};

pub const CATEGORIES: [&str; 10] = [
    "Action",
    "Comedy",
    "Drama",
    "Documentary",
    "Sci-Fi",
    "Horror",
    "Romance",
    "Thriller",
    "Animation",
    "Adventure",
];

/// Six titles per entry of [`CATEGORIES`], same order
const TITLES: [[&str; 6]; 10] = [
    ["The Dark Knight", "Mad Max: Fury Road", "John Wick", "Die Hard", "Gladiator", "Mission: Impossible"],
    ["The Hangover", "Superbad", "Bridesmaids", "Step Brothers", "Anchorman", "The Office"],
    ["The Shawshank Redemption", "Forrest Gump", "The Godfather", "Schindler's List", "Breaking Bad", "The Crown"],
    ["Planet Earth", "Our Planet", "Making a Murderer", "The Social Dilemma", "Free Solo", "Tiger King"],
    ["Interstellar", "Inception", "The Matrix", "Blade Runner 2049", "Stranger Things", "Black Mirror"],
    ["The Conjuring", "Get Out", "A Quiet Place", "Hereditary", "The Shining", "IT"],
    ["The Notebook", "Titanic", "Pride and Prejudice", "La La Land", "When Harry Met Sally", "Bridgerton"],
    ["Gone Girl", "Se7en", "Silence of the Lambs", "Shutter Island", "Zodiac", "Mindhunter"],
    ["Toy Story", "Finding Nemo", "The Lion King", "Spirited Away", "Frozen", "Spider-Man: Into the Spider-Verse"],
    ["Indiana Jones", "Jurassic Park", "Avatar", "Pirates of the Caribbean", "The Lord of the Rings", "Dune"],
];

const QUALITIES: [&str; 5] = ["360p", "480p", "720p", "1080p", "4K"];
const DEVICE_TYPES: [&str; 5] = ["mobile", "desktop", "tablet", "tv", "console"];

/// One catalog entry per title
pub const MAX_VIDEOS: u32 = 60;
pub const DEFAULT_USERS: u32 = 50_000;

/// Draws catalog entries and events from an injected RNG
#[derive(Debug)]
pub struct DataGenerator<R> {
    rng: R,
    users: u32,
    videos: u32,
    now: DateTime<Utc>,
}

impl<R: Rng> DataGenerator<R> {
    pub fn new(rng: R, now: DateTime<Utc>) -> Self {
        Self {
            rng,
            users: DEFAULT_USERS,
            videos: MAX_VIDEOS,
            now,
        }
    }

    /// Size of the user population events are drawn from
    pub fn with_users(mut self, users: u32) -> Self {
        self.users = users.max(1);
        self
    }

    /// Size of the catalog, capped at [`MAX_VIDEOS`]
    pub fn with_videos(mut self, videos: u32) -> Self {
        self.videos = videos.clamp(1, MAX_VIDEOS);
        self
    }

    /// Catalog entry `video_<number>`, `number` starting at 1
    pub fn video(&mut self, number: u32) -> Video {
        let index = (number.max(1) - 1) as usize;
        let category = index % CATEGORIES.len();
        let title = (index / CATEGORIES.len()) % TITLES[category].len();

        Video {
            video_id: format!("video_{}", number),
            title: TITLES[category][title].to_string(),
            category: CATEGORIES[category].to_string(),
            duration: self.rng.gen_range(5400..10800),
            upload_date: self.now - Duration::days(self.rng.gen_range(0..365)),
            views: self.rng.gen_range(100..1_000_000),
            likes: self.rng.gen_range(10..50_000),
        }
    }

    pub fn catalog(&mut self) -> Vec<Video> {
        (1..=self.videos).map(|number| self.video(number)).collect()
    }

    /// A random event from the last 24 hours
    pub fn event(&mut self) -> Event {
        let action = Action::KNOWN
            .choose(&mut self.rng)
            .cloned()
            .unwrap_or(Action::Watch);
        let duration = if action.is_watch() {
            self.rng.gen_range(30..3600)
        } else {
            self.rng.gen_range(0..300)
        };
        let occurred_at = self.now - Duration::minutes(self.rng.gen_range(0..24 * 60));

        let event_id = Uuid::new_v4().simple().to_string();
        let quality = QUALITIES.choose(&mut self.rng).copied().unwrap_or("720p");
        let device_type = DEVICE_TYPES.choose(&mut self.rng).copied().unwrap_or("desktop");

        Event::new(
            format!("user_{}", self.rng.gen_range(1..=self.users)),
            format!("video_{}", self.rng.gen_range(1..=self.videos)),
            action,
            duration,
            Some(occurred_at),
        )
        .with_event_id(format!("evt_{}", &event_id[..8]))
        .with_playback(quality, device_type)
    }

    pub fn events(&mut self, count: usize) -> Vec<Event> {
        (0..count).map(|_| self.event()).collect()
    }
}
