use crate::config::ScrubberConfig;
use crate::range::Range;

/// Converts between horizontal scroll offset and window start time.
///
/// One thumbnail cell is one second wide, so the scale is fixed by
/// `px_per_second`. The valid start range is `[0, duration - fixed]`,
/// collapsing to `[0, 0]` when the source is shorter than the crop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    duration_ms: u64,
    fixed_duration_ms: u64,
    px_per_second: f64,
}

impl CoordinateMapper {
    pub fn new(duration_ms: u64, fixed_duration_ms: u64, px_per_second: f64) -> Self {
        Self {
            duration_ms,
            fixed_duration_ms,
            px_per_second,
        }
    }

    pub fn from_config(duration_ms: u64, config: &ScrubberConfig) -> Self {
        Self::new(duration_ms, config.fixed_duration_ms, config.px_per_second)
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn fixed_duration_ms(&self) -> u64 {
        self.fixed_duration_ms
    }

    pub fn px_per_second(&self) -> f64 {
        self.px_per_second
    }

    pub fn max_start_ms(&self) -> u64 {
        self.duration_ms.saturating_sub(self.fixed_duration_ms)
    }

    pub fn start_range(&self) -> Range {
        Range::new(0.0, self.max_start_ms() as f64)
    }

    pub fn max_scroll_px(&self) -> f64 {
        self.start_ms_to_pixels(self.max_start_ms())
    }

    /// Time covered by one pixel; the round-trip resolution.
    pub fn ms_per_pixel(&self) -> f64 {
        1000.0 / self.px_per_second
    }

    pub fn pixels_to_start_ms(&self, scroll_offset_px: f64) -> u64 {
        let start_ms = scroll_offset_px / self.px_per_second * 1000.0;
        self.start_range().clamp(start_ms).round() as u64
    }

    pub fn start_ms_to_pixels(&self, start_ms: u64) -> f64 {
        let start_ms = start_ms.min(self.max_start_ms());
        start_ms as f64 / 1000.0 * self.px_per_second
    }

    pub fn content_width_px(&self) -> f64 {
        (self.duration_ms / 1000) as f64 * self.px_per_second
    }
}
