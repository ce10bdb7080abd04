use tracing::{info, warn};

use crate::config::ScrubberConfig;
use crate::error::ScrubberError;
use crate::video::SourceVideo;

/// What the gallery picker or camera hands back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickOutcome {
    Picked(SourceVideo),
    Cancelled,
}

/// Checks a picked video against the configured maximum.
///
/// A cancelled pick is not an error. Sources shorter than the crop are
/// accepted here; the scrubber degrades and export refuses them later.
pub fn accept_pick(
    outcome: PickOutcome,
    config: &ScrubberConfig,
) -> Result<Option<SourceVideo>, ScrubberError> {
    let source = match outcome {
        PickOutcome::Picked(source) => source,
        PickOutcome::Cancelled => return Ok(None),
    };

    if source.duration_ms > config.max_source_duration_ms {
        warn!(
            uri = %source.uri,
            duration_ms = source.duration_ms,
            "rejecting source longer than {}ms",
            config.max_source_duration_ms
        );
        return Err(ScrubberError::SourceTooLong {
            duration_ms: source.duration_ms,
            max_ms: config.max_source_duration_ms,
        });
    }

    info!(uri = %source.uri, duration_ms = source.duration_ms, "source picked");
    Ok(Some(source))
}
