use thiserror::Error;

/// Failures the host has to act on. Everything else (player races, missing
/// thumbnails, cleanup failures) is absorbed where it happens.
#[derive(Error, Debug)]
pub enum ScrubberError {
    #[error("Video must be at least {} seconds long", .required_ms / 1000)]
    SourceTooShort { duration_ms: u64, required_ms: u64 },

    #[error("Video must be {} seconds or shorter", .max_ms / 1000)]
    SourceTooLong { duration_ms: u64, max_ms: u64 },

    #[error("Crop must be exactly {expected_ms}ms (selected {width_ms}ms, tolerance {tolerance_ms}ms)")]
    TrimDurationMismatch {
        width_ms: u64,
        expected_ms: u64,
        tolerance_ms: u64,
    },

    #[error("Crop [{start_ms}, {end_ms}] is outside the video duration {duration_ms}ms")]
    WindowOutOfBounds {
        start_ms: u64,
        end_ms: u64,
        duration_ms: u64,
    },

    #[error("Invalid {field}: {reason}")]
    InvalidMetadata {
        field: &'static str,
        reason: String,
    },

    #[error("No video selected")]
    NoSource,

    #[error("Failed to crop video: {0:#}")]
    Trim(#[source] anyhow::Error),

    #[error("Failed to save video to gallery: {0:#}")]
    Gallery(#[source] anyhow::Error),

    #[error("Failed to share video: {0:#}")]
    Share(#[source] anyhow::Error),
}

impl ScrubberError {
    /// Validation failures that block an action with a message, as opposed to
    /// a collaborator failing underneath us.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ScrubberError::SourceTooShort { .. }
                | ScrubberError::SourceTooLong { .. }
                | ScrubberError::TrimDurationMismatch { .. }
                | ScrubberError::WindowOutOfBounds { .. }
                | ScrubberError::InvalidMetadata { .. }
                | ScrubberError::NoSource
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_user_readable() {
        let err = ScrubberError::SourceTooShort {
            duration_ms: 3_000,
            required_ms: 5_000,
        };
        assert_eq!(err.to_string(), "Video must be at least 5 seconds long");

        let err = ScrubberError::SourceTooLong {
            duration_ms: 130_000,
            max_ms: 120_000,
        };
        assert_eq!(err.to_string(), "Video must be 120 seconds or shorter");
    }

    #[test]
    fn collaborator_failures_are_not_validation() {
        assert!(ScrubberError::NoSource.is_validation());
        assert!(!ScrubberError::Trim(anyhow::anyhow!("codec")).is_validation());
    }
}
