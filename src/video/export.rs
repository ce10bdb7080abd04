use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::ScrubberConfig;
use crate::error::ScrubberError;
use crate::timeline::TrimWindow;
use crate::video::clip::now_ms;
use crate::video::{ClipMetadata, CroppedClip, MediaUri, SourceVideo};

/// Result of a trim: a new media handle holding only the cropped segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrimmedMedia {
    pub uri: MediaUri,
    pub duration_ms: u64,
}

#[async_trait]
pub trait TrimService: Send + Sync {
    async fn trim(&self, uri: &MediaUri, start_ms: u64, end_ms: u64) -> Result<TrimmedMedia>;
}

#[async_trait]
pub trait MediaLibrary: Send + Sync {
    async fn save_to_album(&self, uri: &MediaUri, album: &str) -> Result<()>;

    async fn share(&self, uri: &MediaUri) -> Result<()>;
}

/// Turns a settled window into a saved clip. Preconditions are checked before
/// the trim service is ever called.
pub struct Exporter {
    trim: Arc<dyn TrimService>,
    library: Arc<dyn MediaLibrary>,
    fixed_duration_ms: u64,
    duration_tolerance_ms: u64,
    album_name: String,
}

impl Exporter {
    pub fn new(
        trim: Arc<dyn TrimService>,
        library: Arc<dyn MediaLibrary>,
        config: &ScrubberConfig,
    ) -> Self {
        Self {
            trim,
            library,
            fixed_duration_ms: config.fixed_duration_ms,
            duration_tolerance_ms: config.duration_tolerance_ms,
            album_name: config.album_name.clone(),
        }
    }

    pub fn validate_window(
        &self,
        source: &SourceVideo,
        window: &TrimWindow,
    ) -> Result<(), ScrubberError> {
        if source.is_shorter_than(self.fixed_duration_ms) {
            return Err(ScrubberError::SourceTooShort {
                duration_ms: source.duration_ms,
                required_ms: self.fixed_duration_ms,
            });
        }

        let width_ms = window.width_ms();
        if width_ms.abs_diff(self.fixed_duration_ms) > self.duration_tolerance_ms {
            return Err(ScrubberError::TrimDurationMismatch {
                width_ms,
                expected_ms: self.fixed_duration_ms,
                tolerance_ms: self.duration_tolerance_ms,
            });
        }

        if window.end_ms > source.duration_ms || window.start_ms > window.end_ms {
            return Err(ScrubberError::WindowOutOfBounds {
                start_ms: window.start_ms,
                end_ms: window.end_ms,
                duration_ms: source.duration_ms,
            });
        }

        Ok(())
    }

    pub async fn export(
        &self,
        source: &SourceVideo,
        window: &TrimWindow,
        metadata: &ClipMetadata,
    ) -> Result<CroppedClip, ScrubberError> {
        if let Err(err) = self.validate_window(source, window) {
            warn!(uri = %source.uri, ?window, "export refused: {err}");
            return Err(err);
        }
        let metadata = metadata.validated()?;

        let trimmed = self
            .trim
            .trim(&source.uri, window.start_ms, window.end_ms)
            .await
            .map_err(ScrubberError::Trim)?;

        let now = now_ms();
        let clip = CroppedClip {
            id: Uuid::new_v4(),
            name: metadata.name,
            description: metadata.description,
            uri: trimmed.uri,
            original_video_uri: source.uri.clone(),
            start_time_ms: window.start_ms,
            end_time_ms: window.end_ms,
            duration_ms: trimmed.duration_ms,
            width: source.width,
            height: source.height,
            is_favorite: false,
            created_at: now,
            updated_at: now,
        };
        info!(
            id = %clip.id,
            start_ms = clip.start_time_ms,
            end_ms = clip.end_time_ms,
            "clip exported"
        );

        Ok(clip)
    }

    pub async fn save_to_album(&self, clip: &CroppedClip) -> Result<(), ScrubberError> {
        self.library
            .save_to_album(&clip.uri, &self.album_name)
            .await
            .map_err(ScrubberError::Gallery)?;
        info!(id = %clip.id, album = %self.album_name, "clip saved to gallery");
        Ok(())
    }

    pub async fn share(&self, clip: &CroppedClip) -> Result<(), ScrubberError> {
        self.library
            .share(&clip.uri)
            .await
            .map_err(ScrubberError::Share)
    }
}
