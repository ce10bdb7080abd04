pub mod clip;
pub mod export;
pub mod metadata;
pub mod picker;
pub mod player;
pub mod thumbnail;

pub use clip::{ClipMetadata, CroppedClip};
pub use export::{Exporter, MediaLibrary, TrimService, TrimmedMedia};
pub use metadata::{MediaUri, SourceVideo};
pub use picker::{accept_pick, PickOutcome};
pub use player::Player;
pub use thumbnail::{ThumbnailImage, ThumbnailService};

/// `mm:ss`, or `hh:mm:ss` once the time passes an hour.
pub fn format_timestamp(ms: u64) -> String {
    let total_seconds = ms / 1000;
    let seconds = total_seconds % 60;
    let minutes = (total_seconds / 60) % 60;
    let hours = total_seconds / 3600;

    if hours > 0 {
        format!("{:0>2}:{:0>2}:{:0>2}", hours, minutes, seconds)
    } else {
        format!("{:0>2}:{:0>2}", minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minutes_and_hours() {
        assert_eq!(format_timestamp(0), "00:00");
        assert_eq!(format_timestamp(5_999), "00:05");
        assert_eq!(format_timestamp(125_000), "02:05");
        assert_eq!(format_timestamp(3_725_000), "01:02:05");
    }
}
