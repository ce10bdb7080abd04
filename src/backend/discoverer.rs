use std::path::Path;

use anyhow::{Context, Result};
use gst::ClockTime;
use gst_pbutils::Discoverer;
use tracing::debug;

use crate::video::{MediaUri, SourceVideo};

const DISCOVER_TIMEOUT: ClockTime = ClockTime::from_seconds(5);

/// Probes `uri` for duration and frame size, the same fields a platform
/// picker reports.
pub fn discover_source(uri: &MediaUri) -> Result<SourceVideo> {
    gst::init()?;
    let discoverer = Discoverer::new(DISCOVER_TIMEOUT)?;
    let info = discoverer
        .discover_uri(uri.as_str())
        .with_context(|| format!("could not discover {uri}"))?;

    let duration = info.duration().context("source has no duration")?;
    let mut source = SourceVideo::new(uri.clone(), duration.mseconds());

    if let Some(stream) = info.video_streams().first() {
        source = source.with_dimensions(stream.width(), stream.height());
    }
    debug!(?source, "source discovered");

    Ok(source)
}

/// Accepts either a uri or a local path.
pub fn media_uri_from_arg(arg: &str) -> Result<MediaUri> {
    if arg.contains("://") {
        return Ok(MediaUri::new(arg));
    }

    let path = Path::new(arg)
        .canonicalize()
        .with_context(|| format!("no such file {arg}"))?;
    Ok(MediaUri::new(format!("file://{}", path.display())))
}
