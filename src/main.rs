use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use argh::FromArgs;
use tracing::{info, warn};

use trim_scrubber::backend::{discover_source, media_uri_from_arg, GstPlayer, GstThumbnailer};
use trim_scrubber::timeline::{NoImageCache, ThumbnailEvent};
use trim_scrubber::video::{accept_pick, format_timestamp, PickOutcome};
use trim_scrubber::{logging, Scrubber, ScrubberConfig};

#[derive(FromArgs)]
/// Scrub a fixed-length trim window across a video without a UI.
struct Args {
    /// video uri or local path
    #[argh(positional)]
    uri: String,

    /// JSON config file
    #[argh(option)]
    config: Option<PathBuf>,

    /// scroll offset in pixels; repeat to replay a drag, the last one settles
    #[argh(option)]
    scroll: Vec<f64>,

    /// play the whole source instead of looping the window
    #[argh(switch)]
    preview: bool,

    /// seconds to keep playback running before unmounting
    #[argh(option, default = "3")]
    watch_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Args = argh::from_env();
    logging::init("trim_scrubber=info");

    let config = match &args.config {
        Some(path) => ScrubberConfig::load(path)?,
        None => ScrubberConfig::default(),
    };

    let uri = media_uri_from_arg(&args.uri)?;
    let discovered = tokio::task::spawn_blocking(move || discover_source(&uri)).await??;
    let Some(source) = accept_pick(PickOutcome::Picked(discovered), &config)? else {
        return Ok(());
    };
    if source.is_shorter_than(config.fixed_duration_ms) {
        warn!(
            duration_ms = source.duration_ms,
            "source shorter than the crop, export will be refused"
        );
    }

    let player = Arc::new(GstPlayer::new(&source.uri)?);
    let thumbnailer = Arc::new(GstThumbnailer::in_temp_dir()?);
    let thumbnail_dir = thumbnailer.dir().to_path_buf();

    let mut scrubber = Scrubber::new(config, player, thumbnailer, Arc::new(NoImageCache));
    let mut events = scrubber.mount(source);
    scrubber.set_is_playing(true);
    if args.preview {
        scrubber.set_preview_mode(true);
    }

    for offset_px in &args.scroll {
        scrubber.on_scroll(*offset_px);
    }
    if let Some(&last) = args.scroll.last() {
        scrubber.on_scroll_end(last);
    }

    let window = scrubber.window();
    if let Some(labels) = scrubber.labels() {
        println!(
            "window {} - {} (centre {}), scrollable {:.0}px",
            labels.start,
            labels.end,
            labels.center,
            scrubber.max_scroll_px()
        );
    }

    let watch = tokio::time::sleep(Duration::from_secs(args.watch_secs));
    tokio::pin!(watch);
    let mut cells = 0;
    loop {
        tokio::select! {
            _ = &mut watch => break,
            Some(event) = events.recv() => match event {
                ThumbnailEvent::Batch(batch) => cells += batch.len(),
                ThumbnailEvent::Complete => info!(cells, "timeline complete"),
            },
        }
    }

    let progress = scrubber.progress().unwrap_or_default();
    println!(
        "{} thumbnails, playhead at {:.0}% of {}",
        cells,
        progress * 100.0,
        format_timestamp(window.width_ms())
    );

    let deleted = scrubber.unmount().finished().await;
    info!(deleted, "thumbnails released");
    if let Err(err) = std::fs::remove_dir(&thumbnail_dir) {
        warn!(dir = %thumbnail_dir.display(), "could not remove thumbnail dir: {err}");
    }

    Ok(())
}
