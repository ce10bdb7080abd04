use std::fmt::Debug;

use anyhow::Result;

/// The host's video player. The host creates and destroys it; the scrubber
/// only drives it. Every call may fail once the host has torn the player down.
pub trait Player: Debug + Send + Sync {
    fn position_ms(&self) -> Result<u64>;

    fn is_playing(&self) -> Result<bool>;

    fn seek_ms(&self, position_ms: u64) -> Result<()>;

    fn play(&self) -> Result<()>;

    fn pause(&self) -> Result<()>;

    fn set_is_playing(&self, play: bool) -> Result<()> {
        if play {
            self.play()
        } else {
            self.pause()
        }
    }
}

/// Snapshot of the player taken on each poll tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackState {
    pub current_time_ms: u64,
    pub is_playing: bool,
}

impl PlaybackState {
    pub fn sample(player: &dyn Player) -> Result<Self> {
        Ok(Self {
            current_time_ms: player.position_ms()?,
            is_playing: player.is_playing()?,
        })
    }
}
