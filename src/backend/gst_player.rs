use anyhow::{bail, Context, Result};
use gst::prelude::{ElementExt, ElementExtManual};
use gst::{Bus, ClockTime, SeekFlags, State};
use tracing::{debug, warn};

use crate::video::{MediaUri, Player};

const PREROLL_TIMEOUT: ClockTime = ClockTime::from_seconds(10);

/// `playbin` with a fakesink, driven headlessly.
#[derive(Debug)]
pub struct GstPlayer {
    playbin: gst::Element,
}

impl GstPlayer {
    pub fn new(uri: &MediaUri) -> Result<Self> {
        gst::init()?;

        let sink = gst::ElementFactory::make("fakesink")
            .property("sync", true)
            .build()
            .context("fakesink unavailable")?;
        let playbin = gst::ElementFactory::make("playbin")
            .property("uri", uri.as_str())
            .property("video-sink", &sink)
            .build()
            .context("playbin unavailable")?;

        playbin.set_state(State::Paused)?;
        wait_for_pipeline_init(&playbin.bus().context("playbin without bus")?, PREROLL_TIMEOUT)?;
        debug!(%uri, "player prerolled");

        Ok(Self { playbin })
    }
}

impl Player for GstPlayer {
    fn position_ms(&self) -> Result<u64> {
        let position = self
            .playbin
            .query_position::<ClockTime>()
            .context("position query failed")?;
        Ok(position.mseconds())
    }

    fn is_playing(&self) -> Result<bool> {
        let (result, current, pending) = self.playbin.state(ClockTime::ZERO);
        result?;
        Ok(current == State::Playing || pending == State::Playing)
    }

    fn seek_ms(&self, position_ms: u64) -> Result<()> {
        self.playbin.seek_simple(
            SeekFlags::FLUSH | SeekFlags::ACCURATE,
            ClockTime::from_mseconds(position_ms),
        )?;
        Ok(())
    }

    fn play(&self) -> Result<()> {
        self.playbin.set_state(State::Playing)?;
        Ok(())
    }

    fn pause(&self) -> Result<()> {
        self.playbin.set_state(State::Paused)?;
        Ok(())
    }
}

impl Drop for GstPlayer {
    fn drop(&mut self) {
        if let Err(err) = self.playbin.set_state(State::Null) {
            warn!("player teardown failed: {err}");
        }
    }
}

/// Blocks until the pipeline has prerolled (or failed to).
pub(crate) fn wait_for_pipeline_init(bus: &Bus, timeout: ClockTime) -> Result<()> {
    for msg in bus.iter_timed(timeout) {
        use gst::MessageView;

        match msg.view() {
            MessageView::AsyncDone(..) => return Ok(()),
            MessageView::Error(err) => bail!("{} ({:?})", err.error(), err.debug()),
            _ => (),
        }
    }

    bail!("pipeline did not preroll within {timeout}")
}
