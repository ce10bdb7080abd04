use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use tempfile::TempDir;

use crate::timeline::ImageCache;
use crate::video::{
    MediaLibrary, MediaUri, Player, ThumbnailImage, ThumbnailService, TrimService, TrimmedMedia,
};

/// Writes a small file per request into its own temp dir.
pub(crate) struct ScriptedThumbnails {
    dir: TempDir,
    fail_at: HashSet<u64>,
    reverse: bool,
    delay: Duration,
    requested: Mutex<Vec<u64>>,
    generated: AtomicUsize,
}

impl ScriptedThumbnails {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("temp dir"),
            fail_at: HashSet::new(),
            reverse: false,
            delay: Duration::ZERO,
            requested: Mutex::new(Vec::new()),
            generated: AtomicUsize::new(0),
        }
    }

    /// Later seconds in a batch finish first.
    pub fn reverse_completion(mut self) -> Self {
        self.reverse = true;
        self
    }

    pub fn failing_at(mut self, seconds: impl IntoIterator<Item = u64>) -> Self {
        self.fail_at.extend(seconds);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn requested_times(&self) -> Vec<u64> {
        self.requested.lock().unwrap().clone()
    }

    pub fn generated_count(&self) -> usize {
        self.generated.load(Ordering::SeqCst)
    }

    pub fn existing_files(&self) -> usize {
        std::fs::read_dir(self.dir.path()).unwrap().count()
    }
}

#[async_trait]
impl ThumbnailService for ScriptedThumbnails {
    async fn generate(&self, _uri: &MediaUri, time_ms: u64, _quality: f32) -> Result<ThumbnailImage> {
        self.requested.lock().unwrap().push(time_ms);
        let second = time_ms / 1000;

        let mut delay = self.delay;
        if self.reverse {
            delay += Duration::from_millis((10 - second % 10) * 5);
        }
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.fail_at.contains(&second) {
            bail!("no frame at {time_ms}ms");
        }

        let id = self.generated.fetch_add(1, Ordering::SeqCst);
        let path = self.dir.path().join(format!("thumb_{id:04}.jpg"));
        std::fs::write(&path, b"jpeg")?;
        Ok(ThumbnailImage::new(path))
    }
}

#[derive(Debug, Default)]
pub(crate) struct CountingCache {
    clears: AtomicUsize,
}

impl CountingCache {
    pub fn clears(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

impl ImageCache for CountingCache {
    fn clear(&self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct PlayerLog {
    pub position_ms: u64,
    pub playing: bool,
    pub released: bool,
    pub seeks: Vec<u64>,
    pub plays: usize,
    pub pauses: usize,
}

/// In-memory player that records every call and can be "torn down".
#[derive(Debug, Default)]
pub(crate) struct RecordingPlayer {
    log: Mutex<PlayerLog>,
}

impl RecordingPlayer {
    pub fn playing_at(position_ms: u64) -> Self {
        let player = Self::default();
        {
            let mut log = player.log.lock().unwrap();
            log.position_ms = position_ms;
            log.playing = true;
        }
        player
    }

    pub fn log(&self) -> PlayerLog {
        self.log.lock().unwrap().clone()
    }

    pub fn seeks(&self) -> Vec<u64> {
        self.log().seeks
    }

    pub fn set_position(&self, position_ms: u64) {
        self.log.lock().unwrap().position_ms = position_ms;
    }

    /// Simulates the backend stalling without anyone asking it to pause.
    pub fn stall(&self) {
        self.log.lock().unwrap().playing = false;
    }

    pub fn release(&self) {
        self.log.lock().unwrap().released = true;
    }
}

impl Player for RecordingPlayer {
    fn position_ms(&self) -> Result<u64> {
        let log = self.log.lock().unwrap();
        if log.released {
            bail!("player released");
        }
        Ok(log.position_ms)
    }

    fn is_playing(&self) -> Result<bool> {
        let log = self.log.lock().unwrap();
        if log.released {
            bail!("player released");
        }
        Ok(log.playing)
    }

    fn seek_ms(&self, position_ms: u64) -> Result<()> {
        let mut log = self.log.lock().unwrap();
        if log.released {
            bail!("player released");
        }
        log.seeks.push(position_ms);
        log.position_ms = position_ms;
        Ok(())
    }

    fn play(&self) -> Result<()> {
        let mut log = self.log.lock().unwrap();
        if log.released {
            bail!("player released");
        }
        log.playing = true;
        log.plays += 1;
        Ok(())
    }

    fn pause(&self) -> Result<()> {
        let mut log = self.log.lock().unwrap();
        if log.released {
            bail!("player released");
        }
        log.playing = false;
        log.pauses += 1;
        Ok(())
    }
}

/// Trim service that records every call instead of encoding.
#[derive(Debug, Default)]
pub(crate) struct RecordingTrim {
    calls: Mutex<Vec<(u64, u64)>>,
    fail: bool,
}

impl RecordingTrim {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<(u64, u64)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TrimService for RecordingTrim {
    async fn trim(&self, uri: &MediaUri, start_ms: u64, end_ms: u64) -> Result<TrimmedMedia> {
        self.calls.lock().unwrap().push((start_ms, end_ms));
        if self.fail {
            bail!("encoder unavailable");
        }
        Ok(TrimmedMedia {
            uri: MediaUri::new(format!("{uri}.trimmed.mp4")),
            duration_ms: end_ms - start_ms + 12,
        })
    }
}

#[derive(Debug, Default)]
pub(crate) struct RecordingLibrary {
    albums: Mutex<Vec<String>>,
    share_fails: bool,
}

impl RecordingLibrary {
    pub fn without_share_targets() -> Self {
        Self {
            share_fails: true,
            ..Default::default()
        }
    }

    pub fn albums(&self) -> Vec<String> {
        self.albums.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaLibrary for RecordingLibrary {
    async fn save_to_album(&self, _uri: &MediaUri, album: &str) -> Result<()> {
        self.albums.lock().unwrap().push(album.to_string());
        Ok(())
    }

    async fn share(&self, _uri: &MediaUri) -> Result<()> {
        if self.share_fails {
            bail!("no share targets");
        }
        Ok(())
    }
}
