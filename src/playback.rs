mod poller;
mod synchronizer;

pub use poller::Poller;
pub use synchronizer::{PlaybackMode, PlaybackSynchronizer};
