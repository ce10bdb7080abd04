use std::fmt::Debug;

/// The host's decoded-image cache. Cleared when thumbnails are swapped or
/// released so nothing keeps drawing a deleted file.
pub trait ImageCache: Debug + Send + Sync {
    fn clear(&self);
}

/// For hosts that do not cache decoded images.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoImageCache;

impl ImageCache for NoImageCache {
    fn clear(&self) {}
}
