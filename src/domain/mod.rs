//! Domain module
//!
//! Typed records stored in the analytics database.

pub mod error;
pub mod event;
pub mod video;

pub use error::ValidationError;
pub use event::{Action, Event};
pub use video::{CategoryBreakdown, Video, VideoStats};
