pub mod simulated;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::error::{Result, TubemarkError};

pub use simulated::{PlayerCommand, SimulatedPlayer};

/// The embedded video widget, as seen by the core.
#[async_trait]
pub trait VideoPlayer: Send + Sync + 'static {
    /// Playhead position in seconds.
    async fn current_time(&self) -> f64;
    async fn seek_to(&self, seconds: f64, allow_seek_ahead: bool);
    async fn play_video(&self);
    async fn pause_video(&self);
}

pub type PlayerHandle = Arc<dyn VideoPlayer>;

/// Sending half of the one-shot "player ready" notification.
pub struct PlayerReadySender {
    tx: oneshot::Sender<PlayerHandle>,
}

impl PlayerReadySender {
    /// Deliver the handle. Returns it back if nobody is waiting anymore.
    pub fn ready(self, player: PlayerHandle) -> std::result::Result<(), PlayerHandle> {
        self.tx.send(player)
    }
}

/// Resolves once the widget reports ready.
pub struct PlayerReady {
    rx: oneshot::Receiver<PlayerHandle>,
}

impl PlayerReady {
    pub async fn wait(self) -> Result<PlayerHandle> {
        self.rx.await.map_err(|_| TubemarkError::PlayerUnavailable)
    }
}

pub fn player_ready() -> (PlayerReadySender, PlayerReady) {
    let (tx, rx) = oneshot::channel();
    (PlayerReadySender { tx }, PlayerReady { rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ready_delivers_the_handle() {
        let (sender, ready) = player_ready();
        let player = Arc::new(SimulatedPlayer::new());
        assert!(sender.ready(player.clone()).is_ok());

        let handle = ready.wait().await.unwrap();
        handle.seek_to(4.0, true).await;
        assert_eq!(player.current_time().await, 4.0);
    }

    #[tokio::test]
    async fn dropped_sender_means_player_unavailable() {
        let (sender, ready) = player_ready();
        drop(sender);
        assert!(matches!(ready.wait().await, Err(TubemarkError::PlayerUnavailable)));
    }
}
