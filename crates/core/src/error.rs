use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TubemarkError {
    #[error("Invalid YouTube URL: {reference}")]
    UnresolvableVideoReference { reference: String },

    #[error("Invalid video URL in the file: {reference}")]
    InvalidVideoReferenceInFile { reference: String },

    #[error("Invalid JSON file: {0}")]
    MalformedDocument(#[from] serde_json::Error),

    #[error("Unknown timestamp field '{field}' (expected start, end, emotion or gender)")]
    UnknownField { field: String },

    #[error("Video player is not ready")]
    PlayerUnavailable,

    #[error("Settings error for {path}: {reason}")]
    Settings { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TubemarkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_convert_into_io() {
        let err: TubemarkError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, TubemarkError::Io(_)));
        assert_eq!(err.to_string(), "IO error: gone");
    }
}
