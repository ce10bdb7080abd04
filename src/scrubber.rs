use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::ScrubberConfig;
use crate::error::ScrubberError;
use crate::playback::{PlaybackMode, PlaybackSynchronizer};
use crate::timeline::{
    Cleanup, ImageCache, InteractionPhase, Thumbnail, ThumbnailEvent, ThumbnailManager,
    ThumbnailSettings, TrimEvent, TrimWindow, TrimWindowMachine, WindowLabels,
};
use crate::video::{ClipMetadata, CroppedClip, Exporter, Player, SourceVideo, ThumbnailService};

/// The trim-window scrubber bound to one source at a time.
///
/// Mounting a source starts thumbnail generation, initialises the window and
/// starts playback sync. Mounting another source or unmounting tears all of
/// that down first. The player is borrowed from the host and only ever paused.
pub struct Scrubber {
    config: ScrubberConfig,
    player: Arc<dyn Player>,
    source: Option<SourceVideo>,
    window: TrimWindowMachine,
    thumbnails: ThumbnailManager,
    sync: Option<PlaybackSynchronizer>,
    token: CancellationToken,
}

impl Scrubber {
    pub fn new(
        config: ScrubberConfig,
        player: Arc<dyn Player>,
        thumbnail_service: Arc<dyn ThumbnailService>,
        cache: Arc<dyn ImageCache>,
    ) -> Self {
        let thumbnails = ThumbnailManager::new(
            thumbnail_service,
            cache,
            ThumbnailSettings::from_config(&config),
        );

        Self {
            window: TrimWindowMachine::new(&config),
            config,
            player,
            source: None,
            thumbnails,
            sync: None,
            token: CancellationToken::new(),
        }
    }

    pub fn mount(&mut self, source: SourceVideo) -> mpsc::UnboundedReceiver<ThumbnailEvent> {
        if let Some(sync) = self.sync.take() {
            sync.stop();
        }

        info!(uri = %source.uri, duration_ms = source.duration_ms, "mounting source");
        self.window.load(source.duration_ms);
        let events = self.thumbnails.start(&source);
        self.sync = Some(PlaybackSynchronizer::start(
            self.player.clone(),
            self.window.subscribe(),
            source.duration_ms,
            self.config.poll_interval(),
            &self.token,
        ));
        self.source = Some(source);

        events
    }

    /// Tears down everything tied to the current source. Thumbnail files are
    /// deleted in the background; await the returned handle to observe it.
    pub fn unmount(&mut self) -> Cleanup {
        let cleanup = self.thumbnails.cancel();
        if let Some(sync) = self.sync.take() {
            sync.stop();
        }
        self.window.unload();

        if let Some(source) = self.source.take() {
            info!(uri = %source.uri, "source unmounted");
        }
        cleanup
    }

    pub fn source(&self) -> Option<&SourceVideo> {
        self.source.as_ref()
    }

    pub fn on_scroll(&mut self, offset_px: f64) -> Option<TrimWindow> {
        self.window.on_scroll(offset_px).map(|event| event.window())
    }

    /// Final scroll sample of a drag. The only scroll path that seeks.
    pub fn on_scroll_end(&mut self, offset_px: f64) -> Option<TrimWindow> {
        let event = self.window.on_scroll_end(offset_px)?;
        self.forward(event);
        Some(event.window())
    }

    /// Moves the window back to 0, e.g. after a save. Returns the scroll
    /// offset the host should apply to its scroll view.
    pub fn jump_to_start(&mut self) -> Option<f64> {
        let (window, offset_px) = self.window.jump_to(0)?;
        self.forward(TrimEvent::Settled(window));
        Some(offset_px)
    }

    fn forward(&self, event: TrimEvent) {
        let TrimEvent::Settled(window) = event else {
            return;
        };
        match &self.sync {
            Some(sync) => sync.on_settle(window),
            None => debug!("settle without playback sync"),
        }
    }

    pub fn set_preview_mode(&self, preview: bool) {
        let mode = if preview {
            PlaybackMode::Preview
        } else {
            PlaybackMode::Edit
        };
        if let Some(sync) = &self.sync {
            sync.set_mode(mode);
        }
    }

    pub fn toggle_preview(&self) -> Option<PlaybackMode> {
        self.sync.as_ref().map(PlaybackSynchronizer::toggle_preview)
    }

    pub fn mode(&self) -> Option<PlaybackMode> {
        self.sync.as_ref().map(PlaybackSynchronizer::mode)
    }

    pub fn set_is_playing(&self, play: bool) {
        match (&self.sync, play) {
            (Some(sync), true) => sync.play(),
            (Some(sync), false) => sync.pause(),
            (None, _) => {}
        }
    }

    pub fn progress(&self) -> Option<f64> {
        self.sync.as_ref()?.progress()
    }

    pub fn window(&self) -> TrimWindow {
        self.window.window()
    }

    pub fn subscribe_window(&self) -> watch::Receiver<TrimWindow> {
        self.window.subscribe()
    }

    pub fn labels(&self) -> Option<WindowLabels> {
        self.source.as_ref()?;
        Some(self.window.window().labels())
    }

    pub fn phase(&self) -> InteractionPhase {
        self.window.phase()
    }

    pub fn max_scroll_px(&self) -> f64 {
        self.window
            .mapper()
            .map(|mapper| mapper.max_scroll_px())
            .unwrap_or_default()
    }

    pub fn thumbnails(&self) -> Vec<Thumbnail> {
        self.thumbnails.thumbnails()
    }

    pub fn is_generating(&self) -> bool {
        self.thumbnails.is_generating()
    }

    pub async fn thumbnails_done(&mut self) {
        self.thumbnails.wait().await;
    }

    pub fn validate_export(&self, exporter: &Exporter) -> Result<(), ScrubberError> {
        let source = self.source.as_ref().ok_or(ScrubberError::NoSource)?;
        exporter.validate_window(source, &self.window.window())
    }

    pub async fn export(
        &self,
        exporter: &Exporter,
        metadata: &ClipMetadata,
    ) -> Result<CroppedClip, ScrubberError> {
        let source = self.source.clone().ok_or(ScrubberError::NoSource)?;
        let window = self.window.window();
        exporter.export(&source, &window, metadata).await
    }
}

impl Drop for Scrubber {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
