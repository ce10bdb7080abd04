use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::config::ScrubberConfig;
use crate::timeline::ImageCache;
use crate::video::{MediaUri, SourceVideo, ThumbnailImage, ThumbnailService};

/// One timeline cell. `image` is `None` when generation failed for that
/// second; the cell is drawn empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub second: u64,
    pub image: Option<ThumbnailImage>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThumbnailEvent {
    Batch(Vec<Thumbnail>),
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThumbnailSettings {
    pub batch_size: usize,
    pub quality: f32,
    pub batch_pause: Duration,
}

impl ThumbnailSettings {
    pub fn from_config(config: &ScrubberConfig) -> Self {
        Self {
            batch_size: config.thumbnail_batch_size.max(1),
            quality: config.thumbnail_quality,
            batch_pause: config.batch_pause(),
        }
    }
}

#[derive(Debug, Default)]
struct ThumbnailSet {
    thumbnails: Vec<Thumbnail>,
    generating: bool,
}

#[derive(Debug)]
struct GenerationRun {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

/// Handle on the background deletion started by [`ThumbnailManager::cancel`].
/// Dropping it leaves the deletion running.
#[derive(Debug, Default)]
pub struct Cleanup {
    task: Option<JoinHandle<usize>>,
}

impl Cleanup {
    pub async fn finished(self) -> usize {
        match self.task {
            Some(task) => task.await.unwrap_or_default(),
            None => 0,
        }
    }
}

/// Generates one thumbnail per whole second of the source, in ordered
/// batches, and owns the temporary files until they are released.
pub struct ThumbnailManager {
    service: Arc<dyn ThumbnailService>,
    cache: Arc<dyn ImageCache>,
    settings: ThumbnailSettings,
    set: Arc<Mutex<ThumbnailSet>>,
    run: Option<GenerationRun>,
}

impl ThumbnailManager {
    pub fn new(
        service: Arc<dyn ThumbnailService>,
        cache: Arc<dyn ImageCache>,
        settings: ThumbnailSettings,
    ) -> Self {
        Self {
            service,
            cache,
            settings,
            set: Arc::new(Mutex::new(ThumbnailSet::default())),
            run: None,
        }
    }

    pub fn start(&mut self, source: &SourceVideo) -> mpsc::UnboundedReceiver<ThumbnailEvent> {
        drop(self.cancel());
        self.cache.clear();

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let token = CancellationToken::new();
        lock(&self.set).generating = true;

        info!(
            uri = %source.uri,
            seconds = source.whole_seconds(),
            batch_size = self.settings.batch_size,
            "generating thumbnails"
        );

        let job = GenerationJob {
            service: self.service.clone(),
            cache: self.cache.clone(),
            settings: self.settings,
            set: self.set.clone(),
            uri: source.uri.clone(),
            seconds: source.whole_seconds(),
            token: token.clone(),
            events: events_tx,
        };
        let task = tokio::spawn(job.run());

        self.run = Some(GenerationRun {
            token,
            task: Some(task),
        });
        events_rx
    }

    /// Stops generation and releases every thumbnail produced so far.
    ///
    /// The in-memory list is emptied before this returns; file deletion
    /// continues in the background. Calling it again is a no-op.
    pub fn cancel(&mut self) -> Cleanup {
        if let Some(run) = &self.run {
            run.token.cancel();
        }

        let released = {
            let mut set = lock(&self.set);
            set.generating = false;
            std::mem::take(&mut set.thumbnails)
        };
        self.cache.clear();

        let images: Vec<ThumbnailImage> = released
            .into_iter()
            .filter_map(|thumbnail| thumbnail.image)
            .collect();
        if images.is_empty() {
            return Cleanup::default();
        }

        debug!(count = images.len(), "releasing thumbnails");
        let cache = self.cache.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => Cleanup {
                task: Some(handle.spawn(release_images(images, cache))),
            },
            Err(_) => {
                release_images_blocking(images, cache.as_ref());
                Cleanup::default()
            }
        }
    }

    pub fn thumbnails(&self) -> Vec<Thumbnail> {
        lock(&self.set).thumbnails.clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.set).thumbnails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_generating(&self) -> bool {
        lock(&self.set).generating
    }

    /// Waits for the last started run to finish. After a cancel this returns
    /// once the run has noticed it and released any batch it was holding.
    pub async fn wait(&mut self) {
        let task = self.run.as_mut().and_then(|run| run.task.take());
        if let Some(task) = task {
            let _ = task.await;
        }
    }
}

impl Drop for ThumbnailManager {
    fn drop(&mut self) {
        drop(self.cancel());
    }
}

fn lock(set: &Mutex<ThumbnailSet>) -> MutexGuard<'_, ThumbnailSet> {
    set.lock().unwrap_or_else(PoisonError::into_inner)
}

struct GenerationJob {
    service: Arc<dyn ThumbnailService>,
    cache: Arc<dyn ImageCache>,
    settings: ThumbnailSettings,
    set: Arc<Mutex<ThumbnailSet>>,
    uri: MediaUri,
    seconds: u64,
    token: CancellationToken,
    events: mpsc::UnboundedSender<ThumbnailEvent>,
}

impl GenerationJob {
    async fn run(self) {
        let batch_size = self.settings.batch_size as u64;
        let mut batch_start = 0;

        while batch_start < self.seconds {
            let batch_end = (batch_start + batch_size).min(self.seconds);
            let batch = self.generate_batch(batch_start..batch_end).await;

            // append and notify under the lock so a concurrent cancel sees
            // either both or neither
            let discarded = {
                let mut set = lock(&self.set);
                if self.token.is_cancelled() {
                    Some(batch)
                } else {
                    set.thumbnails.extend(batch.iter().cloned());
                    let _ = self.events.send(ThumbnailEvent::Batch(batch));
                    None
                }
            };
            if let Some(batch) = discarded {
                trace!(batch_start, "run cancelled mid-batch, discarding");
                let images = batch.into_iter().filter_map(|t| t.image).collect();
                release_images(images, self.cache.clone()).await;
                return;
            }

            self.cache.clear();
            batch_start = batch_end;

            if self.token.is_cancelled() {
                return;
            }
            if batch_start < self.seconds {
                tokio::select! {
                    _ = self.token.cancelled() => return,
                    _ = tokio::time::sleep(self.settings.batch_pause) => {}
                }
            }
        }

        {
            let mut set = lock(&self.set);
            if self.token.is_cancelled() {
                return;
            }
            set.generating = false;
        }
        debug!(uri = %self.uri, seconds = self.seconds, "thumbnails complete");
        let _ = self.events.send(ThumbnailEvent::Complete);
    }

    async fn generate_batch(&self, seconds: std::ops::Range<u64>) -> Vec<Thumbnail> {
        let requests = seconds.map(|second| async move {
            let result = self
                .service
                .generate(&self.uri, second * 1000, self.settings.quality)
                .await;

            match result {
                Ok(image) => Thumbnail {
                    second,
                    image: Some(image),
                },
                Err(err) => {
                    debug!(second, "thumbnail generation failed: {err:#}");
                    Thumbnail {
                        second,
                        image: None,
                    }
                }
            }
        });

        join_all(requests).await
    }
}

async fn release_images(images: Vec<ThumbnailImage>, cache: Arc<dyn ImageCache>) -> usize {
    let deletions = images.into_iter().map(|image| async move {
        match tokio::fs::remove_file(image.path()).await {
            Ok(()) => true,
            Err(err) => {
                trace!(path = %image.path().display(), "thumbnail not deleted: {err}");
                false
            }
        }
    });

    let deleted = join_all(deletions).await.into_iter().filter(|ok| *ok).count();
    cache.clear();
    debug!(deleted, "thumbnail cleanup complete");
    deleted
}

fn release_images_blocking(images: Vec<ThumbnailImage>, cache: &dyn ImageCache) {
    for image in images {
        if let Err(err) = std::fs::remove_file(image.path()) {
            trace!(path = %image.path().display(), "thumbnail not deleted: {err}");
        }
    }
    cache.clear();
}
