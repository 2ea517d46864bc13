use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use log::{debug, info};
use tokio::{
    sync::{Mutex, broadcast},
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};

use crate::{
    player::PlayerHandle,
    types::{ActiveSegment, PlaybackState, TimestampRecord},
};

pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy)]
pub struct ControllerConfig {
    /// How often the playhead is polled for the segment end. Playback can
    /// overshoot `end` by up to one period.
    pub check_interval: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            check_interval: DEFAULT_CHECK_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    Started(ActiveSegment),
    Finished { segment: ActiveSegment, position: f64 },
}

// Kept outside the async state lock so `Drop` can always reach the handle.
type CheckerSlot = Arc<std::sync::Mutex<Option<JoinHandle<()>>>>;

fn replace_checker(slot: &CheckerSlot, handle: Option<JoinHandle<()>>) {
    let previous = match slot.lock() {
        Ok(mut guard) => std::mem::replace(&mut *guard, handle),
        Err(poisoned) => std::mem::replace(&mut *poisoned.into_inner(), handle),
    };
    if let Some(previous) = previous {
        previous.abort();
    }
}

/// Plays one segment at a time and pauses the player once the playhead
/// reaches the segment end.
///
/// Every `play` bumps a generation counter while holding the state lock; a
/// check loop only acts if the counter still carries its own generation, so
/// at most one loop can ever pause the player.
///
/// Prefer [`SegmentController::shutdown`] for disposal. Dropping the controller
/// aborts the check loop too, but cannot wait for a check that is already
/// running, so that check may still pause the player once.
pub struct SegmentController {
    player: PlayerHandle,
    inner: Arc<Mutex<PlaybackState>>,
    checker: CheckerSlot,
    generation: Arc<AtomicU64>,
    config: ControllerConfig,
    events: broadcast::Sender<PlaybackEvent>,
}

impl SegmentController {
    pub fn new(player: PlayerHandle, config: ControllerConfig) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            player,
            inner: Arc::new(Mutex::new(PlaybackState::Stopped)),
            checker: Arc::new(std::sync::Mutex::new(None)),
            generation: Arc::new(AtomicU64::new(0)),
            config,
            events,
        }
    }

    pub fn player(&self) -> &PlayerHandle {
        &self.player
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }

    pub async fn state(&self) -> PlaybackState {
        *self.inner.lock().await
    }

    /// Seek to the record's start, play, and watch for its end. Any segment
    /// already playing is superseded.
    pub async fn play(&self, record: &TimestampRecord) {
        let segment = ActiveSegment::from(record);
        let mut state = self.inner.lock().await;

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        replace_checker(&self.checker, None);

        self.player.seek_to(segment.start, true).await;
        self.player.play_video().await;
        *state = PlaybackState::Playing(segment);

        info!(
            "Playing segment {} [{:.2}s - {:.2}s]",
            segment.id, segment.start, segment.end
        );
        let _ = self.events.send(PlaybackEvent::Started(segment));

        replace_checker(&self.checker, Some(self.spawn_check_loop(segment, generation)));
    }

    /// Stop watching for segment ends. No check fires after this returns.
    pub async fn shutdown(&self) {
        let mut state = self.inner.lock().await;
        self.generation.fetch_add(1, Ordering::SeqCst);
        replace_checker(&self.checker, None);
        *state = PlaybackState::Stopped;
    }

    fn spawn_check_loop(&self, segment: ActiveSegment, generation: u64) -> JoinHandle<()> {
        let player = self.player.clone();
        let inner = self.inner.clone();
        let checker = self.checker.clone();
        let current = self.generation.clone();
        let events = self.events.clone();
        let period = self.config.check_interval;

        tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;

                let mut guard = inner.lock().await;
                if current.load(Ordering::SeqCst) != generation {
                    debug!("check loop for segment {} superseded", segment.id);
                    return;
                }

                let position = player.current_time().await;
                if position >= segment.end {
                    player.pause_video().await;
                    *guard = PlaybackState::Stopped;
                    // drop our own handle without aborting ourselves
                    if let Ok(mut slot) = checker.lock() {
                        slot.take();
                    }

                    info!("Segment {} finished at {:.2}s", segment.id, position);
                    let _ = events.send(PlaybackEvent::Finished { segment, position });
                    return;
                }
            }
        })
    }
}

impl Drop for SegmentController {
    fn drop(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        replace_checker(&self.checker, None);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        player::{PlayerCommand, SimulatedPlayer, VideoPlayer},
        types::RecordId,
    };

    fn controller() -> (SegmentController, Arc<SimulatedPlayer>) {
        let player = Arc::new(SimulatedPlayer::new());
        let controller = SegmentController::new(player.clone(), ControllerConfig::default());
        (controller, player)
    }

    fn record(id: u64, start: f64) -> TimestampRecord {
        TimestampRecord::new(RecordId::Int(id), start)
    }

    #[tokio::test(start_paused = true)]
    async fn play_seeks_then_plays() {
        let (controller, player) = controller();
        controller.play(&record(1, 42.0)).await;

        assert_eq!(
            player.commands(),
            vec![
                PlayerCommand::Seek {
                    seconds: 42.0,
                    allow_seek_ahead: true
                },
                PlayerCommand::Play,
            ]
        );
        assert_eq!(controller.state().await.active_id(), Some(RecordId::Int(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn pauses_within_one_period_of_segment_end() {
        let (controller, player) = controller();
        let mut events = controller.subscribe();
        controller.play(&record(1, 5.0)).await;

        time::sleep(Duration::from_millis(9_950)).await;
        assert!(player.is_playing());
        assert_eq!(player.pause_count(), 0);

        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(player.pause_count(), 1);
        assert!(!player.is_playing());
        assert_eq!(controller.state().await, PlaybackState::Stopped);

        let stop_position = player.current_time().await;
        assert!(stop_position >= 15.0 && stop_position <= 15.1);

        assert!(matches!(events.recv().await, Ok(PlaybackEvent::Started(_))));
        match events.recv().await {
            Ok(PlaybackEvent::Finished { segment, position }) => {
                assert_eq!(segment.id, RecordId::Int(1));
                assert!(position >= segment.end);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn replaying_supersedes_the_previous_check_loop() {
        let (controller, player) = controller();
        let first = record(1, 0.0);
        let second = record(2, 5.0);

        controller.play(&first).await;
        controller.play(&second).await;

        // first.end (10.0) is reached after 5s, second.end (15.0) after 10s
        time::sleep(Duration::from_millis(7_000)).await;
        assert_eq!(player.pause_count(), 0);
        assert!(player.is_playing());

        time::sleep(Duration::from_millis(3_100)).await;
        assert_eq!(player.pause_count(), 1);
        assert_eq!(controller.state().await, PlaybackState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_replays_leave_a_single_pause() {
        let (controller, player) = controller();
        for id in 1..=5 {
            controller.play(&record(id, 0.0)).await;
        }

        time::sleep(Duration::from_secs(12)).await;
        assert_eq!(player.pause_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn segment_snapshot_ignores_later_edits() {
        let (controller, player) = controller();
        let mut playing = record(1, 0.0);
        controller.play(&playing).await;
        playing.end = 2.0;

        time::sleep(Duration::from_secs(3)).await;
        assert_eq!(player.pause_count(), 0);
        time::sleep(Duration::from_millis(7_100)).await;
        assert_eq!(player.pause_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn end_before_start_pauses_on_first_check() {
        let (controller, player) = controller();
        let mut inverted = record(1, 20.0);
        inverted.end = 5.0;
        controller.play(&inverted).await;

        time::sleep(Duration::from_millis(150)).await;
        assert_eq!(player.pause_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_the_check_loop() {
        let (controller, player) = controller();
        controller.play(&record(1, 0.0)).await;
        controller.shutdown().await;

        time::sleep(Duration::from_secs(20)).await;
        assert_eq!(player.pause_count(), 0);
        assert_eq!(controller.state().await, PlaybackState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_controller_cancels_the_check_loop() {
        let (controller, player) = controller();
        controller.play(&record(1, 0.0)).await;
        drop(controller);

        time::sleep(Duration::from_secs(20)).await;
        assert_eq!(player.pause_count(), 0);
    }

    #[tokio::test]
    async fn dropping_mid_check_still_aborts_the_loop() {
        let (controller, player) = controller();
        controller.play(&record(1, 0.0)).await;
        assert_eq!(Arc::strong_count(&player), 3);

        // a check holding the state lock must not keep the loop alive
        let state = controller.inner.clone();
        let held = state.lock().await;
        drop(controller);
        drop(held);

        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(Arc::strong_count(&player), 1);
        assert_eq!(player.pause_count(), 0);
    }
}
