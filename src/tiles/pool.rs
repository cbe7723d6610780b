//! Pool of preview references handed out one per new tile.
//!
//! The pool keeps a FIFO of not-yet-used previews. Assigning a batch tops
//! the queue up from the [`PreviewSource`] when it runs short; concurrent
//! batches share a single in-flight refill. Each assigned tile then gets
//! its own background fetch.

use crate::core::config::MosaicConfig;
use crate::prelude::{Arc, Duration, Mutex, VecDeque};
use crate::runtime;
use crate::tiles::cache::ImageCache;
use crate::tiles::source::{ImageFetcher, PreviewRef, PreviewSource};
use crate::tiles::tile::{AssignPreview, TileHandle, TileState};
use crate::{MosaicError, Result};
use futures::future::{BoxFuture, FutureExt, Shared};

type RefillOutcome = std::result::Result<usize, Arc<MosaicError>>;
type SharedRefill = Shared<BoxFuture<'static, RefillOutcome>>;

/// Tunables for an [`AssetPool`]
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub batch_size: usize,
    pub fetch_timeout: Option<Duration>,
    pub mark_fetch_failures_errored: bool,
    pub cache_capacity: usize,
}

impl From<&MosaicConfig> for PoolConfig {
    fn from(config: &MosaicConfig) -> Self {
        Self {
            batch_size: config.preview_batch_size,
            fetch_timeout: config.fetch_timeout(),
            mark_fetch_failures_errored: config.mark_fetch_failures_errored,
            cache_capacity: config.image_cache_capacity,
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::from(&MosaicConfig::default())
    }
}

struct PoolState {
    queue: Mutex<VecDeque<PreviewRef>>,
    /// Target id of the last preview received, sent as `resumeAfterId`
    cursor: Mutex<Option<String>>,
    inflight: Mutex<Option<SharedRefill>>,
}

pub struct AssetPool {
    source: Arc<dyn PreviewSource>,
    fetcher: Arc<dyn ImageFetcher>,
    cache: ImageCache,
    config: PoolConfig,
    state: Arc<PoolState>,
}

impl AssetPool {
    pub fn new(
        source: Arc<dyn PreviewSource>,
        fetcher: Arc<dyn ImageFetcher>,
        config: PoolConfig,
    ) -> Self {
        Self {
            source,
            fetcher,
            cache: ImageCache::new(config.cache_capacity),
            config,
            state: Arc::new(PoolState {
                queue: Mutex::new(VecDeque::new()),
                cursor: Mutex::new(None),
                inflight: Mutex::new(None),
            }),
        }
    }

    /// Previews waiting to be assigned
    pub fn queued(&self) -> usize {
        self.state.queue.lock().map(|queue| queue.len()).unwrap_or(0)
    }

    pub fn cache(&self) -> &ImageCache {
        &self.cache
    }

    /// Gives every tile in `tiles` a preview and starts its fetch.
    ///
    /// On a batch-level failure (the listing errors, or returns nothing while
    /// the queue is still short) every tile is marked `Errored`, nothing is
    /// assigned and the error is returned. Returns the number of fetches
    /// started otherwise.
    pub async fn assign_blocks<M>(&self, tiles: &[TileHandle<M>]) -> Result<usize>
    where
        M: AssignPreview + Send + 'static,
    {
        if tiles.is_empty() {
            return Ok(0);
        }

        let previews = match self.take_previews(tiles.len()).await {
            Ok(previews) => previews,
            Err(err) => {
                log::warn!("preview batch of {} failed: {}", tiles.len(), err);
                for tile in tiles {
                    tile.set_state(TileState::Errored);
                }
                return Err(err);
            }
        };

        for (tile, preview) in tiles.iter().zip(previews) {
            tile.update_metadata(|metadata| metadata.assign_preview(&preview));
            self.spawn_fetch(Arc::clone(tile), preview.image_url);
        }
        Ok(tiles.len())
    }

    /// Pops `count` previews, refilling until the queue holds enough
    async fn take_previews(&self, count: usize) -> Result<Vec<PreviewRef>> {
        loop {
            let available = {
                let mut queue = self.lock_queue();
                if queue.len() >= count {
                    return Ok(queue.drain(..count).collect());
                }
                queue.len()
            };

            let received = self
                .refill()
                .await
                .map_err(|err| MosaicError::Refill(err.to_string()))?;

            if received == 0 && self.queued() < count {
                return Err(MosaicError::Starvation {
                    requested: count,
                    available: available.max(self.queued()),
                });
            }
        }
    }

    /// Joins the in-flight refill or starts a new one
    fn refill(&self) -> SharedRefill {
        let mut inflight = self
            .state
            .inflight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(refill) = inflight.as_ref() {
            log::trace!("joining in-flight preview refill");
            return refill.clone();
        }

        let source = Arc::clone(&self.source);
        let state = Arc::clone(&self.state);
        let batch_size = self.config.batch_size;
        let refill = async move {
            let cursor = state.cursor.lock().ok().and_then(|cursor| cursor.clone());
            let result = source.list_previews(batch_size, cursor.as_deref()).await;

            let outcome = match result {
                Ok(previews) => {
                    let received = previews.len();
                    if let Some(last) = previews.last() {
                        if let Ok(mut cursor) = state.cursor.lock() {
                            *cursor = Some(last.target_id.clone());
                        }
                    }
                    if let Ok(mut queue) = state.queue.lock() {
                        queue.extend(previews);
                    }
                    log::debug!("preview refill: received {} of {}", received, batch_size);
                    Ok(received)
                }
                Err(err) => Err(Arc::new(err)),
            };

            if let Ok(mut inflight) = state.inflight.lock() {
                *inflight = None;
            }
            outcome
        }
        .boxed()
        .shared();

        *inflight = Some(refill.clone());
        refill
    }

    fn lock_queue(&self) -> std::sync::MutexGuard<'_, VecDeque<PreviewRef>> {
        self.state
            .queue
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn spawn_fetch<M>(&self, tile: TileHandle<M>, url: String)
    where
        M: Send + 'static,
    {
        let fetcher = Arc::clone(&self.fetcher);
        let cache = self.cache.clone();
        let timeout = self.config.fetch_timeout;
        let errored_on_failure = self.config.mark_fetch_failures_errored;

        runtime::spawn(async move {
            if !tile.set_state(TileState::Downloading) {
                log::trace!("tile {} gone before fetch, skipping {}", tile.id(), url);
                return;
            }

            match fetch_image(fetcher.as_ref(), &cache, &url, timeout).await {
                Ok(image) => {
                    if tile.set_image(image) {
                        log::trace!("tile {} ready", tile.id());
                    }
                }
                Err(err) => {
                    log::warn!("tile {} fetch of {} failed: {}", tile.id(), url, err);
                    if errored_on_failure {
                        tile.set_state(TileState::Errored);
                    }
                }
            }
        });
    }
}

async fn fetch_image(
    fetcher: &dyn ImageFetcher,
    cache: &ImageCache,
    url: &str,
    timeout: Option<Duration>,
) -> Result<image::RgbaImage> {
    let bytes = match cache.get(url) {
        Some(bytes) => bytes,
        None => {
            let data = runtime::with_timeout(timeout, fetcher.fetch(url))
                .await
                .ok_or_else(|| MosaicError::Timeout(url.to_string()))??;
            cache.insert(url, data)
        }
    };
    Ok(image::load_from_memory(&bytes)?.to_rgba8())
}
