use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;

use crate::video::MediaUri;

/// A generated thumbnail living in temporary storage until released.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThumbnailImage {
    path: PathBuf,
}

impl ThumbnailImage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
pub trait ThumbnailService: Send + Sync {
    async fn generate(&self, uri: &MediaUri, time_ms: u64, quality: f32)
        -> Result<ThumbnailImage>;
}
