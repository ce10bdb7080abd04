use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::Result;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::playback::Poller;
use crate::range::Range;
use crate::timeline::TrimWindow;
use crate::video::player::PlaybackState;
use crate::video::Player;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackMode {
    Edit,
    Preview,
}

#[derive(Debug)]
struct SyncState {
    mode: PlaybackMode,
    // false once the user pauses; the stuck check never overrides that
    wants_playing: bool,
    last_position_ms: Option<u64>,
}

#[derive(Debug)]
struct Shared {
    player: Arc<dyn Player>,
    window: watch::Receiver<TrimWindow>,
    source_duration_ms: u64,
    // players stop up to a frame short of the end; one poll interval covers it
    end_tolerance_ms: u64,
    state: Mutex<SyncState>,
}

/// Keeps the host's player consistent with the trim window.
///
/// Seeks happen on settle and on mode changes, never on intermediate scroll
/// samples. A poll tick loops the window in edit mode, loops the source in
/// preview mode, and resumes playback that stalled without the user pausing.
/// Player calls that fail (the host tore it down under us) are dropped.
#[derive(Debug)]
pub struct PlaybackSynchronizer {
    shared: Arc<Shared>,
    poller: Poller,
}

impl PlaybackSynchronizer {
    pub fn start(
        player: Arc<dyn Player>,
        window: watch::Receiver<TrimWindow>,
        source_duration_ms: u64,
        poll_interval: Duration,
        parent: &CancellationToken,
    ) -> Self {
        let wants_playing = player.is_playing().unwrap_or(false);
        let shared = Arc::new(Shared {
            player,
            window,
            source_duration_ms,
            end_tolerance_ms: poll_interval.as_millis() as u64,
            state: Mutex::new(SyncState {
                mode: PlaybackMode::Edit,
                wants_playing,
                last_position_ms: None,
            }),
        });

        let tick_shared = shared.clone();
        let poller = Poller::spawn(poll_interval, parent, move || tick_shared.tick());
        info!(
            source_duration_ms,
            poll_interval_ms = poll_interval.as_millis() as u64,
            "playback sync started"
        );

        Self { shared, poller }
    }

    pub fn mode(&self) -> PlaybackMode {
        self.shared.state().mode
    }

    /// Switches mode and moves the playhead so the first frame shown already
    /// belongs to the new mode: 0 for preview, the window start for edit.
    pub fn set_mode(&self, mode: PlaybackMode) {
        {
            let mut state = self.shared.state();
            if state.mode == mode {
                return;
            }
            state.mode = mode;
        }

        let target_ms = match mode {
            PlaybackMode::Preview => 0,
            PlaybackMode::Edit => self.shared.window().start_ms,
        };
        debug!(?mode, target_ms, "playback mode changed");
        self.shared.seek(target_ms);
    }

    pub fn toggle_preview(&self) -> PlaybackMode {
        let next = match self.mode() {
            PlaybackMode::Edit => PlaybackMode::Preview,
            PlaybackMode::Preview => PlaybackMode::Edit,
        };
        self.set_mode(next);
        next
    }

    pub fn on_settle(&self, window: TrimWindow) {
        if self.mode() != PlaybackMode::Edit {
            trace!(start_ms = window.start_ms, "settle ignored in preview");
            return;
        }
        self.shared.seek(window.start_ms);
    }

    pub fn play(&self) {
        self.shared.state().wants_playing = true;
        absorb("play", self.shared.player.play());
    }

    pub fn pause(&self) {
        self.shared.state().wants_playing = false;
        absorb("pause", self.shared.player.pause());
    }

    pub fn toggle_play_pause(&self) {
        if self.shared.state().wants_playing {
            self.pause();
        } else {
            self.play();
        }
    }

    pub fn wants_playing(&self) -> bool {
        self.shared.state().wants_playing
    }

    pub fn progress(&self) -> Option<f64> {
        let (mode, position_ms) = {
            let state = self.shared.state();
            (state.mode, state.last_position_ms?)
        };

        let range = match mode {
            PlaybackMode::Edit => {
                let window = self.shared.window();
                Range::new(window.start_ms as f64, window.end_ms as f64)
            }
            PlaybackMode::Preview => Range::new(0.0, self.shared.source_duration_ms as f64),
        };
        Some(range.percent_from_value(position_ms as f64))
    }

    pub fn stop(&self) {
        if self.poller.is_stopped() {
            return;
        }
        self.poller.stop();
        absorb("pause", self.shared.player.pause());
        info!("playback sync stopped");
    }

    pub fn is_running(&self) -> bool {
        !self.poller.is_stopped()
    }
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, SyncState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn window(&self) -> TrimWindow {
        *self.window.borrow()
    }

    fn seek(&self, position_ms: u64) {
        absorb("seek", self.player.seek_ms(position_ms));
    }

    fn tick(&self) {
        let playback = match PlaybackState::sample(self.player.as_ref()) {
            Ok(playback) => playback,
            Err(err) => {
                debug!("position sample dropped: {err:#}");
                return;
            }
        };

        let (mode, wants_playing) = {
            let mut state = self.state();
            state.last_position_ms = Some(playback.current_time_ms);
            (state.mode, state.wants_playing)
        };

        match mode {
            PlaybackMode::Edit => self.reconcile_edit(playback, wants_playing),
            PlaybackMode::Preview => self.reconcile_preview(playback, wants_playing),
        }
    }

    fn reconcile_edit(&self, playback: PlaybackState, wants_playing: bool) {
        let window = self.window();
        if window.width_ms() == 0 {
            return;
        }

        if self.reached_end(playback, wants_playing, window.end_ms) {
            trace!(
                position_ms = playback.current_time_ms,
                start_ms = window.start_ms,
                "looping window"
            );
            self.seek(window.start_ms);
            if wants_playing && !playback.is_playing {
                absorb("play", self.player.play());
            }
            return;
        }

        if wants_playing && !playback.is_playing && window.contains(playback.current_time_ms) {
            debug!(position_ms = playback.current_time_ms, "resuming stalled playback");
            absorb("play", self.player.play());
        }
    }

    fn reconcile_preview(&self, playback: PlaybackState, wants_playing: bool) {
        if self.reached_end(playback, wants_playing, self.source_duration_ms) {
            trace!(position_ms = playback.current_time_ms, "looping source");
            self.seek(0);
            if wants_playing {
                absorb("play", self.player.play());
            }
            return;
        }

        if wants_playing && !playback.is_playing {
            debug!(position_ms = playback.current_time_ms, "resuming stalled preview");
            absorb("play", self.player.play());
        }
    }

    fn reached_end(&self, playback: PlaybackState, wants_playing: bool, end_ms: u64) -> bool {
        if playback.current_time_ms >= end_ms {
            return true;
        }
        wants_playing
            && !playback.is_playing
            && playback.current_time_ms + self.end_tolerance_ms >= end_ms
    }
}

fn absorb(operation: &'static str, result: Result<()>) {
    if let Err(err) = result {
        debug!(operation, "player call dropped: {err:#}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScrubberConfig;
    use crate::testing::RecordingPlayer;
    use crate::timeline::TrimWindowMachine;

    const POLL: Duration = Duration::from_millis(100);

    struct Rig {
        player: Arc<RecordingPlayer>,
        machine: TrimWindowMachine,
        sync: PlaybackSynchronizer,
        _parent: CancellationToken,
    }

    fn rig(duration_ms: u64, position_ms: u64) -> Rig {
        let player = Arc::new(RecordingPlayer::playing_at(position_ms));
        let mut machine = TrimWindowMachine::new(&ScrubberConfig::default());
        machine.load(duration_ms);

        let parent = CancellationToken::new();
        let sync = PlaybackSynchronizer::start(
            player.clone(),
            machine.subscribe(),
            duration_ms,
            POLL,
            &parent,
        );
        Rig {
            player,
            machine,
            sync,
            _parent: parent,
        }
    }

    async fn ticks(count: u32) {
        tokio::time::sleep(POLL * count + POLL / 2).await;
    }

    #[tokio::test(start_paused = true)]
    async fn loops_back_to_window_start() {
        let mut rig = rig(60_000, 0);
        rig.machine.on_scroll_end(600.0);
        rig.sync.on_settle(rig.machine.window());
        assert_eq!(rig.player.seeks(), vec![10_000]);

        rig.player.set_position(12_000);
        ticks(1).await;
        assert_eq!(rig.player.seeks(), vec![10_000]);

        rig.player.set_position(15_000);
        ticks(1).await;
        assert_eq!(rig.player.seeks(), vec![10_000, 10_000]);
    }

    #[tokio::test(start_paused = true)]
    async fn player_stopped_short_of_source_end_loops_window() {
        let mut rig = rig(30_000, 0);
        rig.machine.on_scroll_end(99_999.0);
        rig.sync.on_settle(rig.machine.window());
        assert_eq!(rig.player.seeks(), vec![25_000]);

        rig.player.set_position(29_967);
        rig.player.stall();
        ticks(1).await;

        assert_eq!(rig.player.seeks(), vec![25_000, 25_000]);
        assert_eq!(rig.player.log().plays, 1);
        assert!(rig.player.log().playing);

        ticks(3).await;
        assert_eq!(rig.player.seeks(), vec![25_000, 25_000]);
    }

    #[tokio::test(start_paused = true)]
    async fn preview_loops_when_player_stops_at_end_of_media() {
        let rig = rig(30_000, 0);
        rig.sync.set_mode(PlaybackMode::Preview);

        rig.player.set_position(29_967);
        rig.player.stall();
        ticks(1).await;

        assert_eq!(rig.player.seeks(), vec![0, 0]);
        assert_eq!(rig.player.log().plays, 1);
        assert_eq!(rig.player.log().position_ms, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn user_pause_near_the_end_is_left_alone() {
        let mut rig = rig(30_000, 0);
        rig.machine.on_scroll_end(99_999.0);
        rig.sync.on_settle(rig.machine.window());

        rig.sync.pause();
        rig.player.set_position(29_967);
        ticks(3).await;

        assert_eq!(rig.player.seeks(), vec![25_000]);
        assert_eq!(rig.player.log().plays, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn twenty_scrolls_and_a_settle_seek_once() {
        let mut rig = rig(60_000, 0);

        for step in 1..=20 {
            let event = rig.machine.on_scroll(step as f64 * 12.0).unwrap();
            if event.is_settle() {
                rig.sync.on_settle(event.window());
            }
        }
        let settle = rig.machine.on_scroll_end(246.0).unwrap();
        assert!(settle.is_settle());
        rig.sync.on_settle(settle.window());

        assert_eq!(rig.player.seeks(), vec![4_100]);
    }

    #[tokio::test(start_paused = true)]
    async fn preview_ignores_window_and_loops_source() {
        let rig = rig(30_000, 0);
        rig.sync.set_mode(PlaybackMode::Preview);
        assert_eq!(rig.player.seeks(), vec![0]);

        rig.player.set_position(20_000);
        ticks(2).await;
        assert_eq!(rig.player.seeks(), vec![0]);

        rig.player.set_position(30_000);
        ticks(1).await;
        assert_eq!(rig.player.seeks(), vec![0, 0]);
    }

    #[tokio::test(start_paused = true)]
    async fn mode_toggle_resets_position() {
        let mut rig = rig(30_000, 0);
        rig.machine.on_scroll_end(300.0);

        assert_eq!(rig.sync.toggle_preview(), PlaybackMode::Preview);
        assert_eq!(rig.sync.toggle_preview(), PlaybackMode::Edit);
        rig.sync.set_mode(PlaybackMode::Edit);

        assert_eq!(rig.player.seeks(), vec![0, 5_000]);
    }

    #[tokio::test(start_paused = true)]
    async fn settle_during_preview_does_not_seek() {
        let mut rig = rig(30_000, 0);
        rig.sync.set_mode(PlaybackMode::Preview);

        let settle = rig.machine.on_scroll_end(300.0).unwrap();
        rig.sync.on_settle(settle.window());

        assert_eq!(rig.player.seeks(), vec![0]);
    }

    #[tokio::test(start_paused = true)]
    async fn resumes_stalled_playback_but_respects_user_pause() {
        let rig = rig(30_000, 1_000);

        rig.player.stall();
        ticks(1).await;
        assert_eq!(rig.player.log().plays, 1);
        assert!(rig.player.log().playing);

        rig.sync.pause();
        ticks(3).await;
        assert_eq!(rig.player.log().plays, 1);
        assert!(!rig.player.log().playing);

        rig.sync.toggle_play_pause();
        assert!(rig.sync.wants_playing());
        assert_eq!(rig.player.log().plays, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn torn_down_player_never_breaks_the_loop() {
        let mut rig = rig(30_000, 0);
        rig.player.release();

        let settle = rig.machine.on_scroll_end(300.0).unwrap();
        rig.sync.on_settle(settle.window());
        rig.sync.set_mode(PlaybackMode::Preview);
        rig.sync.play();
        ticks(5).await;

        assert!(rig.sync.is_running());
        assert!(rig.player.seeks().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_polling_and_pauses() {
        let rig = rig(30_000, 0);
        rig.sync.stop();
        rig.sync.stop();

        rig.player.set_position(9_000);
        ticks(5).await;

        assert!(!rig.sync.is_running());
        assert!(rig.player.seeks().is_empty());
        assert_eq!(rig.player.log().pauses, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn parent_cancellation_stops_polling() {
        let player = Arc::new(RecordingPlayer::playing_at(0));
        let mut machine = TrimWindowMachine::new(&ScrubberConfig::default());
        machine.load(30_000);
        let parent = CancellationToken::new();
        let sync =
            PlaybackSynchronizer::start(player.clone(), machine.subscribe(), 30_000, POLL, &parent);

        parent.cancel();
        player.set_position(6_000);
        ticks(3).await;

        assert!(!sync.is_running());
        assert!(player.seeks().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn progress_tracks_active_range() {
        let mut rig = rig(20_000, 0);
        assert_eq!(rig.sync.progress(), None);

        rig.machine.on_scroll_end(600.0);
        rig.player.set_position(12_500);
        ticks(1).await;
        assert_eq!(rig.sync.progress(), Some(0.5));

        rig.sync.set_mode(PlaybackMode::Preview);
        rig.player.set_position(5_000);
        ticks(1).await;
        assert_eq!(rig.sync.progress(), Some(0.25));
    }
}
