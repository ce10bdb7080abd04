use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Opaque media handle handed out by the platform (file uri, content uri...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaUri(Arc<str>);

impl MediaUri {
    pub fn new(uri: impl AsRef<str>) -> Self {
        Self(Arc::from(uri.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for MediaUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MediaUri {
    fn from(uri: &str) -> Self {
        Self::new(uri)
    }
}

impl From<String> for MediaUri {
    fn from(uri: String) -> Self {
        Self::new(uri)
    }
}

/// The untrimmed video being edited. Never mutated; a new pick replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceVideo {
    pub uri: MediaUri,
    pub duration_ms: u64,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl SourceVideo {
    pub fn new(uri: impl Into<MediaUri>, duration_ms: u64) -> Self {
        Self {
            uri: uri.into(),
            duration_ms,
            width: None,
            height: None,
        }
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = (width > 0).then_some(width);
        self.height = (height > 0).then_some(height);
        self
    }

    pub fn aspect_ratio(&self) -> Option<f64> {
        match (self.width, self.height) {
            (Some(width), Some(height)) => Some(width as f64 / height as f64),
            _ => None,
        }
    }

    pub fn whole_seconds(&self) -> u64 {
        self.duration_ms / 1000
    }

    pub fn is_shorter_than(&self, fixed_duration_ms: u64) -> bool {
        self.duration_ms < fixed_duration_ms
    }
}
