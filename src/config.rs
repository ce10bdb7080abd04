use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_FIXED_DURATION_MS: u64 = 5_000;
pub const DEFAULT_MAX_SOURCE_DURATION_MS: u64 = 120_000;
pub const DEFAULT_DURATION_TOLERANCE_MS: u64 = 100;
// one thumbnail cell per second
pub const DEFAULT_PX_PER_SECOND: f64 = 60.0;
pub const DEFAULT_THUMBNAIL_BATCH_SIZE: usize = 10;
pub const DEFAULT_THUMBNAIL_QUALITY: f32 = 0.3;
pub const DEFAULT_BATCH_PAUSE_MS: u64 = 16;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;
pub const DEFAULT_ALBUM_NAME: &str = "5econds";

/// Host supplied tuning for the scrubber. Keys are camelCase so a host can
/// hand over the same JSON it already uses for its own settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScrubberConfig {
    pub fixed_duration_ms: u64,
    pub max_source_duration_ms: u64,
    pub duration_tolerance_ms: u64,
    pub px_per_second: f64,
    pub thumbnail_batch_size: usize,
    pub thumbnail_quality: f32,
    pub batch_pause_ms: u64,
    pub poll_interval_ms: u64,
    pub album_name: String,
}

impl Default for ScrubberConfig {
    fn default() -> Self {
        Self {
            fixed_duration_ms: DEFAULT_FIXED_DURATION_MS,
            max_source_duration_ms: DEFAULT_MAX_SOURCE_DURATION_MS,
            duration_tolerance_ms: DEFAULT_DURATION_TOLERANCE_MS,
            px_per_second: DEFAULT_PX_PER_SECOND,
            thumbnail_batch_size: DEFAULT_THUMBNAIL_BATCH_SIZE,
            thumbnail_quality: DEFAULT_THUMBNAIL_QUALITY,
            batch_pause_ms: DEFAULT_BATCH_PAUSE_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            album_name: DEFAULT_ALBUM_NAME.to_string(),
        }
    }
}

impl ScrubberConfig {
    /// Reads a JSON config. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        Self::from_json(&content)
            .with_context(|| format!("Failed to load config from {}", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content).context("Config is not valid JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.fixed_duration_ms == 0 {
            bail!("fixedDurationMs must be greater than zero");
        }
        if !self.px_per_second.is_finite() || self.px_per_second <= 0.0 {
            bail!("pxPerSecond must be a positive number, got {}", self.px_per_second);
        }
        if self.thumbnail_batch_size == 0 {
            bail!("thumbnailBatchSize must be at least 1");
        }
        if !(self.thumbnail_quality > 0.0 && self.thumbnail_quality <= 1.0) {
            bail!(
                "thumbnailQuality must be within (0, 1], got {}",
                self.thumbnail_quality
            );
        }
        if self.poll_interval_ms == 0 {
            bail!("pollIntervalMs must be greater than zero");
        }
        if self.max_source_duration_ms < self.fixed_duration_ms {
            bail!(
                "maxSourceDurationMs ({}) is shorter than fixedDurationMs ({})",
                self.max_source_duration_ms,
                self.fixed_duration_ms
            );
        }
        Ok(())
    }

    pub fn batch_pause(&self) -> Duration {
        Duration::from_millis(self.batch_pause_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
