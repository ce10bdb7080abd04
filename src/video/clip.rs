use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ScrubberError;
use crate::video::MediaUri;

const NAME_CHARS: (usize, usize) = (3, 100);
const DESCRIPTION_CHARS: (usize, usize) = (10, 500);

/// Title and description the user attaches to a diary clip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipMetadata {
    pub name: String,
    pub description: String,
}

impl ClipMetadata {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    /// Trims both fields and checks their lengths, reporting the first bad field.
    pub fn validated(&self) -> Result<Self, ScrubberError> {
        let name = check_length("name", &self.name, NAME_CHARS)?;
        let description = check_length("description", &self.description, DESCRIPTION_CHARS)?;

        Ok(Self { name, description })
    }
}

fn check_length(
    field: &'static str,
    value: &str,
    (min, max): (usize, usize),
) -> Result<String, ScrubberError> {
    let trimmed = value.trim();
    let len = trimmed.chars().count();

    let reason = if len == 0 {
        "is required".to_string()
    } else if len < min {
        format!("must be at least {min} characters")
    } else if len > max {
        format!("must be less than {max} characters")
    } else {
        return Ok(trimmed.to_string());
    };

    Err(ScrubberError::InvalidMetadata { field, reason })
}

/// A saved diary entry. The host persists it; nothing here writes it anywhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CroppedClip {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub uri: MediaUri,
    pub original_video_uri: MediaUri,
    pub start_time_ms: u64,
    pub end_time_ms: u64,
    pub duration_ms: u64,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub is_favorite: bool,
    pub created_at: u64,
    pub updated_at: u64,
}

impl CroppedClip {
    pub fn toggle_favorite(&mut self) {
        self.is_favorite = !self.is_favorite;
        self.updated_at = now_ms();
    }

    pub fn rename(&mut self, metadata: &ClipMetadata) -> Result<(), ScrubberError> {
        let metadata = metadata.validated()?;
        self.name = metadata.name;
        self.description = metadata.description;
        self.updated_at = now_ms();
        Ok(())
    }
}

pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invalid_field(result: Result<ClipMetadata, ScrubberError>) -> &'static str {
        match result {
            Err(ScrubberError::InvalidMetadata { field, .. }) => field,
            other => panic!("expected invalid metadata, got {other:?}"),
        }
    }

    #[test]
    fn trims_valid_metadata() {
        let metadata = ClipMetadata::new("  Beach day ", " Waves at sunset, very windy  ");
        let valid = metadata.validated().unwrap();

        assert_eq!(valid.name, "Beach day");
        assert_eq!(valid.description, "Waves at sunset, very windy");
    }

    #[test]
    fn reports_first_invalid_field() {
        assert_eq!(
            invalid_field(ClipMetadata::new("   ", "").validated()),
            "name"
        );
        assert_eq!(
            invalid_field(ClipMetadata::new("ab", "long enough description").validated()),
            "name"
        );
        assert_eq!(
            invalid_field(ClipMetadata::new("Title", "too short").validated()),
            "description"
        );
        assert_eq!(
            invalid_field(ClipMetadata::new("x".repeat(101), "long enough description").validated()),
            "name"
        );
    }

    #[test]
    fn favorite_toggle_touches_updated_at() {
        let mut clip = CroppedClip {
            id: Uuid::new_v4(),
            name: "Title".into(),
            description: "A description".into(),
            uri: MediaUri::new("file:///out.mp4"),
            original_video_uri: MediaUri::new("file:///in.mp4"),
            start_time_ms: 0,
            end_time_ms: 5_000,
            duration_ms: 5_000,
            width: None,
            height: None,
            is_favorite: false,
            created_at: 0,
            updated_at: 0,
        };

        clip.toggle_favorite();
        assert!(clip.is_favorite);
        assert!(clip.updated_at > 0);
    }
}
