//! Tubemark Core Library
//!
//! Timestamp segments on YouTube videos: the record store, bounded playback
//! of a single segment, and the JSON interchange document.

pub mod controller;
pub mod document;
pub mod error;
pub mod format;
pub mod player;
pub mod session;
pub mod settings;
pub mod source;
pub mod store;
pub mod types;

// Re-export commonly used items at crate root
pub use controller::{ControllerConfig, PlaybackEvent, SegmentController};
pub use document::{EXPORT_FILE_NAME, LoadedDocument, load_document, save_document};
pub use error::{Result, TubemarkError};
pub use format::{format_playback_status, format_record_line, format_records_readable, format_timestamp};
pub use player::{PlayerCommand, PlayerReady, PlayerReadySender, SimulatedPlayer, VideoPlayer, player_ready};
pub use session::Session;
pub use settings::Settings;
pub use source::{VideoId, resolve};
pub use store::TimestampStore;
pub use types::{
    ActiveSegment, Emotion, Gender, PlaybackState, RecordId, SEGMENT_LENGTH_SECS, TimestampField,
    TimestampRecord, VideoSession,
};
