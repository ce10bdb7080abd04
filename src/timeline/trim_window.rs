use tokio::sync::watch;
use tracing::{debug, trace, warn};

use crate::config::ScrubberConfig;
use crate::timeline::CoordinateMapper;
use crate::video::format_timestamp;

/// The selected crop: `[start_ms, end_ms)` of the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimWindow {
    pub start_ms: u64,
    pub end_ms: u64,
    pub fixed_duration_ms: u64,
}

impl TrimWindow {
    /// Window starting at `start_ms`, clamped into the mapper's bounds. Only a
    /// source shorter than the crop produces a narrower (degenerate) window.
    pub fn starting_at(mapper: &CoordinateMapper, start_ms: u64) -> Self {
        let start_ms = start_ms.min(mapper.max_start_ms());
        let end_ms = (start_ms + mapper.fixed_duration_ms()).min(mapper.duration_ms());

        Self {
            start_ms,
            end_ms,
            fixed_duration_ms: mapper.fixed_duration_ms(),
        }
    }

    pub fn empty(fixed_duration_ms: u64) -> Self {
        Self {
            start_ms: 0,
            end_ms: 0,
            fixed_duration_ms,
        }
    }

    pub fn width_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }

    pub fn is_degenerate(&self) -> bool {
        self.width_ms() != self.fixed_duration_ms
    }

    pub fn center_ms(&self) -> u64 {
        self.start_ms + self.width_ms() / 2
    }

    pub fn contains(&self, position_ms: u64) -> bool {
        position_ms >= self.start_ms && position_ms < self.end_ms
    }

    pub fn labels(&self) -> WindowLabels {
        WindowLabels {
            start: format_timestamp(self.start_ms),
            center: format_timestamp(self.center_ms()),
            end: format_timestamp(self.end_ms),
        }
    }
}

/// Time labels drawn above the window frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowLabels {
    pub start: String,
    pub center: String,
    pub end: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionPhase {
    Idle,
    Settled,
    Interactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimEvent {
    Changed(TrimWindow),
    Settled(TrimWindow),
}

impl TrimEvent {
    pub fn window(&self) -> TrimWindow {
        match self {
            TrimEvent::Changed(window) | TrimEvent::Settled(window) => *window,
        }
    }

    pub fn is_settle(&self) -> bool {
        matches!(self, TrimEvent::Settled(_))
    }
}

/// Owns the trim window and turns scroll samples into window updates.
///
/// Every update is published on a watch channel, so readers always see the
/// newest window and never a backlog of stale ones.
#[derive(Debug)]
pub struct TrimWindowMachine {
    fixed_duration_ms: u64,
    px_per_second: f64,
    mapper: Option<CoordinateMapper>,
    phase: InteractionPhase,
    window_tx: watch::Sender<TrimWindow>,
}

impl TrimWindowMachine {
    pub fn new(config: &ScrubberConfig) -> Self {
        let (window_tx, _) = watch::channel(TrimWindow::empty(config.fixed_duration_ms));

        Self {
            fixed_duration_ms: config.fixed_duration_ms,
            px_per_second: config.px_per_second,
            mapper: None,
            phase: InteractionPhase::Idle,
            window_tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<TrimWindow> {
        self.window_tx.subscribe()
    }

    pub fn window(&self) -> TrimWindow {
        *self.window_tx.borrow()
    }

    pub fn phase(&self) -> InteractionPhase {
        self.phase
    }

    pub fn mapper(&self) -> Option<&CoordinateMapper> {
        self.mapper.as_ref()
    }

    pub fn load(&mut self, duration_ms: u64) -> TrimWindow {
        let mapper = CoordinateMapper::new(duration_ms, self.fixed_duration_ms, self.px_per_second);
        let window = TrimWindow::starting_at(&mapper, 0);

        if window.is_degenerate() {
            warn!(
                duration_ms,
                fixed_duration_ms = self.fixed_duration_ms,
                "source shorter than crop, window is a single point"
            );
        }
        debug!(?window, "trim window loaded");

        self.mapper = Some(mapper);
        self.phase = InteractionPhase::Settled;
        self.window_tx.send_replace(window);
        window
    }

    pub fn unload(&mut self) {
        self.mapper = None;
        self.phase = InteractionPhase::Idle;
        self.window_tx
            .send_replace(TrimWindow::empty(self.fixed_duration_ms));
    }

    pub fn on_scroll(&mut self, offset_px: f64) -> Option<TrimEvent> {
        let window = self.window_at(offset_px)?;
        self.phase = InteractionPhase::Interactive;
        trace!(offset_px, start_ms = window.start_ms, "window changed");

        self.window_tx.send_replace(window);
        Some(TrimEvent::Changed(window))
    }

    pub fn on_scroll_end(&mut self, offset_px: f64) -> Option<TrimEvent> {
        let window = self.window_at(offset_px)?;
        self.phase = InteractionPhase::Settled;
        debug!(offset_px, start_ms = window.start_ms, "window settled");

        self.window_tx.send_replace(window);
        Some(TrimEvent::Settled(window))
    }

    /// Programmatic move, e.g. back to the start after a save. Returns the
    /// scroll offset the host should apply to its scroll view.
    pub fn jump_to(&mut self, start_ms: u64) -> Option<(TrimWindow, f64)> {
        let mapper = self.mapper?;
        let window = TrimWindow::starting_at(&mapper, start_ms);
        self.phase = InteractionPhase::Settled;

        self.window_tx.send_replace(window);
        Some((window, mapper.start_ms_to_pixels(window.start_ms)))
    }

    fn window_at(&self, offset_px: f64) -> Option<TrimWindow> {
        let Some(mapper) = self.mapper else {
            trace!(offset_px, "scroll ignored, no source loaded");
            return None;
        };

        let start_ms = mapper.pixels_to_start_ms(offset_px);
        Some(TrimWindow::starting_at(&mapper, start_ms))
    }
}
