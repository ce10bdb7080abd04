use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use gst::prelude::{Cast, ElementExt, ElementExtManual, GstBinExt, ObjectExt};
use gst::{ClockTime, SeekFlags, State};
use gst_app::AppSink;
use gst_video::VideoFrameExt;
use image::codecs::jpeg::JpegEncoder;
use tracing::trace;
use uuid::Uuid;

use crate::backend::gst_player::wait_for_pipeline_init;
use crate::video::{MediaUri, ThumbnailImage, ThumbnailService};

const THUMBNAIL_WIDTH: u32 = 120;
const SNAPSHOT_TIMEOUT: ClockTime = ClockTime::from_seconds(5);

/// Grabs one frame per request through a short-lived decode pipeline and
/// writes it as a JPEG into `dir`.
#[derive(Debug, Clone)]
pub struct GstThumbnailer {
    dir: PathBuf,
    width: u32,
}

impl GstThumbnailer {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        gst::init()?;
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("could not create {}", dir.display()))?;

        Ok(Self {
            dir,
            width: THUMBNAIL_WIDTH,
        })
    }

    /// Fresh directory under the system temp dir.
    pub fn in_temp_dir() -> Result<Self> {
        Self::new(std::env::temp_dir().join(format!("trim-scrubber-{}", Uuid::new_v4())))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ThumbnailService for GstThumbnailer {
    async fn generate(&self, uri: &MediaUri, time_ms: u64, quality: f32) -> Result<ThumbnailImage> {
        let uri = uri.clone();
        let width = self.width;
        let path = self.dir.join(format!("thumb-{}.jpg", Uuid::new_v4()));

        tokio::task::spawn_blocking(move || {
            snapshot(&uri, time_ms, quality, width, &path)?;
            Ok(ThumbnailImage::new(path))
        })
        .await
        .context("thumbnail task panicked")?
    }
}

fn snapshot(uri: &MediaUri, time_ms: u64, quality: f32, width: u32, path: &Path) -> Result<()> {
    let pipeline = gst::parse::launch(&format!(
        "uridecodebin uri={uri} ! videoconvert ! videoscale ! appsink name=sink"
    ))?
    .downcast::<gst::Pipeline>()
    .map_err(|_| anyhow::anyhow!("launch did not produce a pipeline"))?;

    let result = pull_frame(&pipeline, time_ms).and_then(|frame| {
        let scaled = image::imageops::thumbnail(
            &frame,
            width,
            scaled_height(frame.width(), frame.height(), width),
        );
        write_jpeg(&scaled, quality, path)
    });

    pipeline.set_state(State::Null)?;
    trace!(time_ms, path = %path.display(), ok = result.is_ok(), "snapshot");
    result
}

/// Encodes `image` into `path`. A failed encode leaves no file behind.
fn write_jpeg(image: &image::RgbImage, quality: f32, path: &Path) -> Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    let quality = (quality * 100.0).round().clamp(1.0, 100.0) as u8;

    let encoded = JpegEncoder::new_with_quality(writer, quality).encode_image(image);
    if let Err(err) = encoded {
        let _ = std::fs::remove_file(path);
        return Err(err).with_context(|| format!("could not encode {}", path.display()));
    }
    Ok(())
}

fn pull_frame(pipeline: &gst::Pipeline, time_ms: u64) -> Result<image::RgbImage> {
    let appsink = pipeline
        .by_name("sink")
        .context("sink element not found")?
        .downcast::<AppSink>()
        .map_err(|_| anyhow::anyhow!("sink element is not an appsink"))?;
    appsink.set_property("sync", false);
    appsink.set_caps(Some(
        &gst_video::VideoCapsBuilder::new()
            .format(gst_video::VideoFormat::Rgb)
            .build(),
    ));

    let bus = pipeline.bus().context("pipeline without bus")?;
    pipeline.set_state(State::Paused)?;
    wait_for_pipeline_init(&bus, SNAPSHOT_TIMEOUT)?;

    pipeline.seek_simple(
        SeekFlags::FLUSH | SeekFlags::ACCURATE,
        ClockTime::from_mseconds(time_ms),
    )?;
    wait_for_pipeline_init(&bus, SNAPSHOT_TIMEOUT)?;

    let sample = appsink.pull_preroll()?;
    let buffer = sample.buffer().context("sample without buffer")?;
    let caps = sample.caps().context("sample without caps")?;
    let info = gst_video::VideoInfo::from_caps(caps)?;
    let frame = gst_video::VideoFrameRef::from_buffer_ref_readable(buffer, &info)?;

    let (frame_width, frame_height) = (frame.width(), frame.height());
    let row_bytes = frame_width as usize * 3;
    let stride = frame.plane_stride()[0] as usize;
    let data = frame.plane_data(0)?;

    let mut pixels = Vec::with_capacity(row_bytes * frame_height as usize);
    for row in data.chunks(stride).take(frame_height as usize) {
        pixels.extend_from_slice(&row[..row_bytes]);
    }

    image::RgbImage::from_raw(frame_width, frame_height, pixels)
        .context("frame smaller than its caps")
}

fn scaled_height(width: u32, height: u32, target_width: u32) -> u32 {
    if width == 0 {
        return target_width;
    }
    let aspect_ratio = width as f64 / height as f64;
    ((target_width as f64 / aspect_ratio).floor() as u32).max(1)
}
