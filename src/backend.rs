mod discoverer;
mod gst_player;
mod gst_thumbnail;

pub use discoverer::{discover_source, media_uri_from_arg};
pub use gst_player::GstPlayer;
pub use gst_thumbnail::GstThumbnailer;
