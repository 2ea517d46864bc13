use crate::types::{PlaybackState, TimestampRecord, VideoSession};

/// Format seconds as MM:SS timestamp
pub fn format_timestamp(seconds: f64) -> String {
    let mins = (seconds / 60.0) as u32;
    let secs = (seconds % 60.0) as u32;
    format!("{:02}:{:02}", mins, secs)
}

/// Status line shown under the timestamp list
pub fn format_playback_status(state: &PlaybackState) -> String {
    match state {
        PlaybackState::Playing(segment) => format!(
            "Playing timestamp: {:.2}s - {:.2}s",
            segment.start, segment.end
        ),
        PlaybackState::Stopped => "Video stopped".to_string(),
    }
}

pub fn format_record_line(record: &TimestampRecord) -> String {
    format!(
        "[{}–{}] {:>8.2}s {:>8.2}s  {} / {}  (id {})",
        format_timestamp(record.start),
        format_timestamp(record.end),
        record.start,
        record.end,
        record.emotion,
        record.gender,
        record.id
    )
}

pub fn format_records_readable(session: Option<&VideoSession>, records: &[TimestampRecord]) -> String {
    let mut output = String::new();
    match session {
        Some(session) => output.push_str(&format!(
            "Current video URL: {} ({})\n\n",
            session.reference, session.video_id
        )),
        None => output.push_str("Current video URL: None\n\n"),
    }

    if records.is_empty() {
        output.push_str("No timestamps added yet.\n");
        return output;
    }

    for record in records {
        output.push_str(&format_record_line(record));
        output.push('\n');
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ActiveSegment, RecordId};

    #[test]
    fn timestamps_render_as_minutes_and_seconds() {
        assert_eq!(format_timestamp(0.0), "00:00");
        assert_eq!(format_timestamp(75.9), "01:15");
        assert_eq!(format_timestamp(3600.0), "60:00");
    }

    #[test]
    fn status_line_reflects_playback_state() {
        let playing = PlaybackState::Playing(ActiveSegment {
            id: RecordId::Int(1),
            start: 12.5,
            end: 22.5,
        });
        assert_eq!(
            format_playback_status(&playing),
            "Playing timestamp: 12.50s - 22.50s"
        );
        assert_eq!(format_playback_status(&PlaybackState::Stopped), "Video stopped");
    }

    #[test]
    fn empty_list_is_called_out() {
        let text = format_records_readable(None, &[]);
        assert!(text.contains("Current video URL: None"));
        assert!(text.contains("No timestamps added yet."));
    }
}
