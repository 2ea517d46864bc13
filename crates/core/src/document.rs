use std::path::Path;

use log::warn;
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::{
    error::{Result, TubemarkError},
    source::resolve,
    types::{TimestampRecord, VideoSession},
};

/// Default name for exported timestamp documents.
pub const EXPORT_FILE_NAME: &str = "timestamps.json";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DocumentOut<'a> {
    video_url: &'a str,
    timestamps: &'a [TimestampRecord],
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentIn {
    #[serde(default)]
    video_url: Option<String>,
    #[serde(default)]
    timestamps: Option<Vec<TimestampRecord>>,
}

/// A parsed document, ready to be applied to a store.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDocument {
    /// `None` when the file carries no video reference; the current video
    /// should then be kept.
    pub session: Option<VideoSession>,
    pub timestamps: Vec<TimestampRecord>,
}

/// Render the session and records as a pretty-printed JSON document.
pub fn serialize(session: Option<&VideoSession>, records: &[TimestampRecord]) -> Result<String> {
    let document = DocumentOut {
        video_url: session.map(|s| s.reference.as_str()).unwrap_or(""),
        timestamps: records,
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

/// Parse a document. An embedded video reference must resolve, otherwise
/// nothing from the file is usable.
pub fn deserialize(text: &str) -> Result<LoadedDocument> {
    let document: DocumentIn = serde_json::from_str(text)?;

    let session = match document.video_url.filter(|url| !url.is_empty()) {
        Some(reference) => {
            let Some(video_id) = resolve(&reference) else {
                warn!("document references an unknown video: {reference}");
                return Err(TubemarkError::InvalidVideoReferenceInFile { reference });
            };
            Some(VideoSession {
                reference,
                video_id,
            })
        }
        None => None,
    };

    Ok(LoadedDocument {
        session,
        timestamps: document.timestamps.unwrap_or_default(),
    })
}

/// Write a document to `path`
pub async fn save_document(
    path: &Path,
    session: Option<&VideoSession>,
    records: &[TimestampRecord],
) -> Result<()> {
    let pretty_json = serialize(session, records)?;
    fs::write(path, &pretty_json).await?;
    Ok(())
}

/// Read and parse a document from `path`
pub async fn load_document(path: &Path) -> Result<LoadedDocument> {
    let json_content = fs::read_to_string(path).await?;
    deserialize(&json_content)
}
