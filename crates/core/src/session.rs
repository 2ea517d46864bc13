use std::path::Path;

use log::{debug, info, warn};

use crate::{
    controller::{ControllerConfig, PlaybackEvent, SegmentController},
    document::{self, LoadedDocument},
    error::{Result, TubemarkError},
    player::PlayerReady,
    source::{VideoId, resolve},
    store::TimestampStore,
    types::{PlaybackState, RecordId, TimestampField, TimestampRecord, VideoSession},
};

/// One user session: the timestamp store plus, once the player has reported
/// ready, the segment controller driving it.
pub struct Session {
    store: TimestampStore,
    controller: Option<SegmentController>,
    config: ControllerConfig,
}

impl Session {
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            store: TimestampStore::new(),
            controller: None,
            config,
        }
    }

    pub fn store(&self) -> &TimestampStore {
        &self.store
    }

    pub fn video(&self) -> Option<&VideoSession> {
        self.store.session()
    }

    pub fn timestamps(&self) -> &[TimestampRecord] {
        self.store.records()
    }

    /// Wait for the player's ready notification and hand it to a fresh
    /// controller. A previously attached controller is shut down first.
    pub async fn attach_player(&mut self, ready: PlayerReady) -> Result<()> {
        let player = ready.wait().await?;
        if let Some(previous) = self.controller.take() {
            previous.shutdown().await;
        }
        self.controller = Some(SegmentController::new(player, self.config));
        debug!("player attached");
        Ok(())
    }

    pub fn subscribe(&self) -> Option<tokio::sync::broadcast::Receiver<PlaybackEvent>> {
        self.controller.as_ref().map(|c| c.subscribe())
    }

    pub async fn playback_state(&self) -> PlaybackState {
        match &self.controller {
            Some(controller) => controller.state().await,
            None => PlaybackState::Stopped,
        }
    }

    /// Resolve `reference` and switch to that video with an empty list.
    /// An unresolvable reference leaves the session untouched.
    pub fn load_video(&mut self, reference: &str) -> Result<VideoId> {
        let Some(video_id) = resolve(reference) else {
            warn!("rejected video reference: {reference}");
            return Err(TubemarkError::UnresolvableVideoReference {
                reference: reference.to_string(),
            });
        };

        info!("Loaded video {video_id}");
        self.store.replace_all(
            Some(VideoSession {
                reference: reference.to_string(),
                video_id: video_id.clone(),
            }),
            Vec::new(),
        );
        Ok(video_id)
    }

    /// Add a record at the current playhead. `None` until a player is attached.
    pub async fn add_timestamp(&mut self) -> Option<TimestampRecord> {
        let Some(controller) = &self.controller else {
            debug!("add ignored, no player attached");
            return None;
        };
        let playhead = controller.player().current_time().await;
        let record = self.store.add(playhead);
        info!("Added timestamp {} at {:.2}s", record.id, record.start);
        Some(record)
    }

    pub fn edit_timestamp(&mut self, id: RecordId, field: TimestampField, raw: &str) -> bool {
        self.store.edit(id, field, raw)
    }

    /// Play one record. Returns `false` if the id is unknown or no player is
    /// attached.
    pub async fn play(&self, id: RecordId) -> bool {
        let Some(record) = self.store.get(id) else {
            debug!("play ignored, no record {id}");
            return false;
        };
        let Some(controller) = &self.controller else {
            debug!("play ignored, no player attached");
            return false;
        };
        controller.play(record).await;
        true
    }

    pub fn export(&self) -> Result<String> {
        document::serialize(self.store.session(), self.store.records())
    }

    /// Parse `text` and apply it. On any error the session is unchanged.
    pub fn import(&mut self, text: &str) -> Result<()> {
        let loaded = document::deserialize(text)?;
        self.apply(loaded);
        Ok(())
    }

    pub async fn save_to(&self, path: &Path) -> Result<()> {
        document::save_document(path, self.store.session(), self.store.records()).await?;
        info!("Saved {} timestamps to {}", self.store.records().len(), path.display());
        Ok(())
    }

    pub async fn load_from(&mut self, path: &Path) -> Result<()> {
        let loaded = document::load_document(path).await?;
        self.apply(loaded);
        info!("Loaded {} timestamps from {}", self.store.records().len(), path.display());
        Ok(())
    }

    pub async fn shutdown(&mut self) {
        if let Some(controller) = self.controller.take() {
            controller.shutdown().await;
        }
    }

    fn apply(&mut self, loaded: LoadedDocument) {
        match loaded.session {
            Some(session) => self.store.replace_all(Some(session), loaded.timestamps),
            None => self.store.replace_records(loaded.timestamps),
        }
    }
}
