use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, warn};

use crate::types::{RecordId, TimestampField, TimestampRecord, VideoSession};

/// Ordered timestamp records plus the video they belong to.
#[derive(Debug, Default)]
pub struct TimestampStore {
    session: Option<VideoSession>,
    records: Vec<TimestampRecord>,
    last_id: u64,
}

impl TimestampStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> Option<&VideoSession> {
        self.session.as_ref()
    }

    pub fn records(&self) -> &[TimestampRecord] {
        &self.records
    }

    pub fn get(&self, id: RecordId) -> Option<&TimestampRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    /// Append a record starting at the playhead (rounded to hundredths).
    pub fn add(&mut self, playhead_secs: f64) -> TimestampRecord {
        let record = TimestampRecord::new(self.next_id(), round_to_hundredths(playhead_secs));
        self.records.push(record.clone());
        record
    }

    /// Update one field of the record with `id`. Returns `false` if no such
    /// record exists.
    ///
    /// Numeric fields take the leading number of `raw`, with anything
    /// unparseable becoming 0 and negatives clamped to 0. Tag fields store
    /// `raw` as given.
    pub fn edit(&mut self, id: RecordId, field: TimestampField, raw: &str) -> bool {
        let Some(record) = self.records.iter_mut().find(|record| record.id == id) else {
            debug!("edit ignored, no record {id}");
            return false;
        };

        match field {
            TimestampField::Start => record.start = coerce_seconds(raw),
            TimestampField::End => record.end = coerce_seconds(raw),
            TimestampField::Emotion => record.emotion = raw.to_string(),
            TimestampField::Gender => record.gender = raw.to_string(),
        }
        true
    }

    /// Swap in a new video and record list together.
    pub fn replace_all(&mut self, session: Option<VideoSession>, records: Vec<TimestampRecord>) {
        self.last_id = records
            .iter()
            .map(|record| record.id.floor())
            .max()
            .unwrap_or(0)
            .max(self.last_id);
        self.session = session;
        self.records = records;
    }

    /// Replace the records while keeping the current video.
    pub fn replace_records(&mut self, records: Vec<TimestampRecord>) {
        let session = self.session.take();
        self.replace_all(session, records);
    }

    // Wall-clock millis, bumped past the last issued or imported id. Once an
    // import has pushed that past u64::MAX, the first free id from now on is
    // taken instead.
    fn next_id(&mut self) -> RecordId {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        let id = match self.last_id.checked_add(1) {
            Some(next) => now_ms.max(next),
            None => {
                warn!("record ids exhausted above {}, reusing a free slot", self.last_id);
                (now_ms..=u64::MAX)
                    .chain(0..now_ms)
                    .find(|candidate| self.get(RecordId::Int(*candidate)).is_none())
                    .unwrap_or(now_ms)
            }
        };
        self.last_id = self.last_id.max(id);
        RecordId::Int(id)
    }
}

pub fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Seconds from free text: leading number or 0, never below 0.
pub fn coerce_seconds(raw: &str) -> f64 {
    let value = leading_number(raw).unwrap_or(0.0);
    if value.is_nan() || value <= 0.0 { 0.0 } else { value }
}

/// Longest prefix of `raw` (after leading whitespace) that reads as a decimal
/// number, e.g. `"12.5s"` -> 12.5, `"-3e2x"` -> -300.
fn leading_number(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut i = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    if s[i..].starts_with("Infinity") {
        return s[..i + "Infinity".len()].parse().ok().or(Some(f64::INFINITY));
    }

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;
    if i < bytes.len() && bytes[i] == b'.' {
        let frac_start = i + 1;
        let mut j = frac_start;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        digits += j - frac_start;
        if digits > 0 {
            i = j;
        }
    }
    if digits == 0 {
        return None;
    }

    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }

    let number = s[..i].strip_suffix('.').unwrap_or(&s[..i]);
    number.parse().ok()
}
