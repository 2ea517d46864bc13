use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{error::TubemarkError, source::VideoId};

/// Length of a freshly added segment, in seconds.
pub const SEGMENT_LENGTH_SECS: f64 = 10.0;

/// Identifier of a timestamp record.
///
/// Ids issued here are epoch milliseconds, but an imported file may carry any
/// JSON number. The value is kept as written, so integers never pass through
/// `f64` and a fractional or negative id survives a save/load cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecordId {
    Int(u64),
    NegInt(i64),
    Float(f64),
}

impl RecordId {
    fn from_number(number: &serde_json::Number) -> Self {
        if let Some(n) = number.as_u64() {
            return RecordId::Int(n);
        }
        if let Some(n) = number.as_i64() {
            return RecordId::NegInt(n);
        }
        // whole floats compare equal to the integer they spell, as in JS
        match number.as_f64() {
            Some(f) if f.fract() == 0.0 && f >= 0.0 && f < u64::MAX as f64 => {
                RecordId::Int(f as u64)
            }
            Some(f) if f.fract() == 0.0 && f < 0.0 && f >= i64::MIN as f64 => {
                RecordId::NegInt(f as i64)
            }
            Some(f) => RecordId::Float(f),
            None => RecordId::Int(0),
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            RecordId::Int(n) => Some(n),
            RecordId::NegInt(_) | RecordId::Float(_) => None,
        }
    }

    /// Largest integer id not above this one, floored at 0. A fresh id must
    /// exceed it to sort after this record.
    pub(crate) fn floor(&self) -> u64 {
        match *self {
            RecordId::Int(n) => n,
            RecordId::NegInt(_) => 0,
            RecordId::Float(f) if f <= 0.0 => 0,
            RecordId::Float(f) if f >= u64::MAX as f64 => u64::MAX,
            RecordId::Float(f) => f.floor() as u64,
        }
    }
}

// JSON numbers are never NaN
impl Eq for RecordId {}

impl From<u64> for RecordId {
    fn from(n: u64) -> Self {
        RecordId::Int(n)
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            RecordId::Int(n) => serializer.serialize_u64(n),
            RecordId::NegInt(n) => serializer.serialize_i64(n),
            RecordId::Float(f) => serializer.serialize_f64(f),
        }
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let number = serde_json::Number::deserialize(deserializer)?;
        Ok(RecordId::from_number(&number))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(n) => write!(f, "{n}"),
            RecordId::NegInt(n) => write!(f, "{n}"),
            RecordId::Float(n) => write!(f, "{n}"),
        }
    }
}

impl FromStr for RecordId {
    type Err = serde_json::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let number: serde_json::Number = s.trim().parse()?;
        Ok(RecordId::from_number(&number))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Emotion {
    #[default]
    Neutral,
    Happy,
    Sad,
    Angry,
    Excited,
}

impl Emotion {
    pub const ALL: [Emotion; 5] = [
        Emotion::Neutral,
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Angry,
        Emotion::Excited,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Neutral => "Neutral",
            Emotion::Happy => "Happy",
            Emotion::Sad => "Sad",
            Emotion::Angry => "Angry",
            Emotion::Excited => "Excited",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Gender {
    #[default]
    Unspecified,
    Male,
    Female,
    Other,
}

impl Gender {
    pub const ALL: [Gender; 4] = [Gender::Unspecified, Gender::Male, Gender::Female, Gender::Other];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Unspecified => "Unspecified",
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }
}

fn default_emotion() -> String {
    Emotion::default().as_str().to_string()
}

fn default_gender() -> String {
    Gender::default().as_str().to_string()
}

/// A tagged interval on the loaded video.
///
/// `emotion` and `gender` are kept as raw strings: the [`Emotion`] and
/// [`Gender`] sets are what the front-end offers, but neither edits nor
/// imports are checked against them. `end > start` is likewise not enforced
/// after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimestampRecord {
    pub id: RecordId,
    pub start: f64,
    pub end: f64,
    #[serde(default = "default_emotion")]
    pub emotion: String,
    #[serde(default = "default_gender")]
    pub gender: String,
}

impl TimestampRecord {
    pub fn new(id: RecordId, start: f64) -> Self {
        Self {
            id,
            start,
            end: start + SEGMENT_LENGTH_SECS,
            emotion: default_emotion(),
            gender: default_gender(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimestampField {
    Start,
    End,
    Emotion,
    Gender,
}

impl FromStr for TimestampField {
    type Err = TubemarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" => Ok(TimestampField::Start),
            "end" => Ok(TimestampField::End),
            "emotion" => Ok(TimestampField::Emotion),
            "gender" => Ok(TimestampField::Gender),
            _ => Err(TubemarkError::UnknownField {
                field: s.to_string(),
            }),
        }
    }
}

/// The loaded video: what the user typed plus the id it resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoSession {
    pub reference: String,
    pub video_id: VideoId,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackState {
    Stopped,
    Playing(ActiveSegment),
}

impl Default for PlaybackState {
    fn default() -> Self {
        PlaybackState::Stopped
    }
}

impl PlaybackState {
    pub fn active_id(&self) -> Option<RecordId> {
        match self {
            PlaybackState::Stopped => None,
            PlaybackState::Playing(segment) => Some(segment.id),
        }
    }
}

/// Snapshot of the record being played, taken when playback started.
/// Later edits to the record do not move the stop point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveSegment {
    pub id: RecordId,
    pub start: f64,
    pub end: f64,
}

impl From<&TimestampRecord> for ActiveSegment {
    fn from(record: &TimestampRecord) -> Self {
        Self {
            id: record.id,
            start: record.start,
            end: record.end,
        }
    }
}
