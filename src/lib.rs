pub mod config;
pub mod error;
pub mod logging;
pub mod playback;
pub mod range;
pub mod scrubber;
pub mod timeline;
pub mod video;

#[cfg(feature = "gstreamer")]
pub mod backend;

#[cfg(test)]
mod testing;

pub use config::ScrubberConfig;
pub use error::ScrubberError;
pub use scrubber::Scrubber;
