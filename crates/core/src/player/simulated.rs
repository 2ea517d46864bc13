use std::sync::Mutex;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::player::VideoPlayer;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerCommand {
    Seek { seconds: f64, allow_seek_ahead: bool },
    Play,
    Pause,
}

/// In-process player whose playhead follows the tokio clock.
///
/// Under a paused test runtime the position only moves when time is
/// advanced, which makes check-loop timing deterministic.
pub struct SimulatedPlayer {
    inner: Mutex<SimulatedInner>,
    rate: f64,
}

struct SimulatedInner {
    position: f64,
    playing_since: Option<Instant>,
    duration: Option<f64>,
    commands: Vec<PlayerCommand>,
}

impl SimulatedPlayer {
    pub fn new() -> Self {
        Self::with_rate(1.0)
    }

    /// Playback advancing `rate` video seconds per wall-clock second.
    pub fn with_rate(rate: f64) -> Self {
        Self {
            inner: Mutex::new(SimulatedInner {
                position: 0.0,
                playing_since: None,
                duration: None,
                commands: Vec::new(),
            }),
            rate,
        }
    }

    /// Clamp the playhead to a video length.
    pub fn with_duration(self, seconds: f64) -> Self {
        self.lock().duration = Some(seconds);
        self
    }

    pub fn is_playing(&self) -> bool {
        self.lock().playing_since.is_some()
    }

    pub fn commands(&self) -> Vec<PlayerCommand> {
        self.lock().commands.clone()
    }

    pub fn pause_count(&self) -> usize {
        self.lock()
            .commands
            .iter()
            .filter(|c| matches!(c, PlayerCommand::Pause))
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SimulatedInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn position_at(&self, inner: &SimulatedInner, now: Instant) -> f64 {
        let mut position = inner.position;
        if let Some(since) = inner.playing_since {
            position += now.duration_since(since).as_secs_f64() * self.rate;
        }
        match inner.duration {
            Some(duration) => position.min(duration),
            None => position,
        }
    }
}

impl Default for SimulatedPlayer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VideoPlayer for SimulatedPlayer {
    async fn current_time(&self) -> f64 {
        let inner = self.lock();
        self.position_at(&inner, Instant::now())
    }

    async fn seek_to(&self, seconds: f64, allow_seek_ahead: bool) {
        let mut inner = self.lock();
        inner.position = seconds.max(0.0);
        if inner.playing_since.is_some() {
            inner.playing_since = Some(Instant::now());
        }
        inner.commands.push(PlayerCommand::Seek {
            seconds,
            allow_seek_ahead,
        });
    }

    async fn play_video(&self) {
        let mut inner = self.lock();
        if inner.playing_since.is_none() {
            inner.playing_since = Some(Instant::now());
        }
        inner.commands.push(PlayerCommand::Play);
    }

    async fn pause_video(&self) {
        let now = Instant::now();
        let mut inner = self.lock();
        inner.position = self.position_at(&inner, now);
        inner.playing_since = None;
        inner.commands.push(PlayerCommand::Pause);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn position_follows_the_clock_while_playing() {
        let player = SimulatedPlayer::new();
        player.seek_to(5.0, true).await;
        player.play_video().await;
        tokio::time::advance(Duration::from_millis(2_500)).await;
        assert_eq!(player.current_time().await, 7.5);

        player.pause_video().await;
        tokio::time::advance(Duration::from_secs(3)).await;
        assert_eq!(player.current_time().await, 7.5);
        assert!(!player.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn rate_and_duration_shape_the_playhead() {
        let player = SimulatedPlayer::with_rate(4.0).with_duration(10.0);
        player.play_video().await;
        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(player.current_time().await, 8.0);
        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(player.current_time().await, 10.0);
    }

    #[tokio::test]
    async fn commands_are_recorded_in_order() {
        let player = SimulatedPlayer::new();
        player.seek_to(1.0, true).await;
        player.play_video().await;
        player.pause_video().await;
        assert_eq!(
            player.commands(),
            vec![
                PlayerCommand::Seek {
                    seconds: 1.0,
                    allow_seek_ahead: true
                },
                PlayerCommand::Play,
                PlayerCommand::Pause,
            ]
        );
        assert_eq!(player.pause_count(), 1);
    }
}
