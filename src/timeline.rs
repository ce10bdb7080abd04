mod image_cache;
mod mapper;
mod thumbnail_manager;
mod trim_window;

pub use image_cache::{ImageCache, NoImageCache};
pub use mapper::CoordinateMapper;
pub use thumbnail_manager::{
    Cleanup, Thumbnail, ThumbnailEvent, ThumbnailManager, ThumbnailSettings,
};
pub use trim_window::{InteractionPhase, TrimEvent, TrimWindow, TrimWindowMachine, WindowLabels};
