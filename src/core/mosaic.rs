//! The mosaic shell: one grid, its viewport controller and the asset pool
//! that feeds new tiles, driven by a single tick per frame.

use crate::{
    animation::fade::FadeIn,
    core::{
        config::MosaicConfig,
        geo::Point,
        lifecycle::LifecycleEvent,
        viewport::ViewportController,
    },
    input::events::InputEvent,
    prelude::{Arc, Duration, HashSet, Instant},
    runtime,
    tiles::{
        pool::{AssetPool, PoolConfig},
        source::{ImageFetcher, PreviewSource},
        tile::{PresentationTile, TileMetadata, TileState},
    },
    Result,
};
use crossbeam_channel::Receiver;

pub struct Mosaic {
    config: MosaicConfig,
    controller: ViewportController<TileMetadata>,
    pool: Arc<AssetPool>,
    lifecycle: Receiver<LifecycleEvent<TileMetadata>>,
    fade: FadeIn,
}

impl Mosaic {
    /// Builds an uninitialised mosaic; call [`Mosaic::init`] with the
    /// viewport size before the first tick.
    pub fn new(
        config: MosaicConfig,
        source: Arc<dyn PreviewSource>,
        fetcher: Arc<dyn ImageFetcher>,
    ) -> Result<Self> {
        config.validate()?;

        let mut controller = ViewportController::new(&config, TileMetadata::default());
        let lifecycle = controller.grid_mut().subscribe_lifecycle();
        let pool = Arc::new(AssetPool::new(source, fetcher, PoolConfig::from(&config)));

        Ok(Self {
            fade: FadeIn::new(config.fade_in()),
            config,
            controller,
            pool,
            lifecycle,
        })
    }

    pub fn init(&mut self, viewport_size: Point) {
        self.controller.init(viewport_size);
        self.dispatch_lifecycle();
    }

    /// Registers the host callback for tapped tiles; it receives the
    /// tile's target id
    pub fn on_select(&mut self, mut callback: impl FnMut(&str) + Send + 'static) {
        self.controller.set_on_select(move |metadata: &TileMetadata| {
            if let Some(target_id) = metadata.target_id.as_deref() {
                callback(target_id);
            }
        });
    }

    pub fn handle_input(&mut self, event: InputEvent, now: Instant) {
        self.controller.handle_input(event, now);
        self.dispatch_lifecycle();
    }

    pub fn pan(&mut self, delta: Point) {
        self.controller.pan(delta);
        self.dispatch_lifecycle();
    }

    pub fn zoom_to(&mut self, level: f64, focus: Option<Point>) -> Result<()> {
        let result = self.controller.zoom_to(level, focus);
        self.dispatch_lifecycle();
        result
    }

    /// Starts a drift at `velocity` (origin pixels per second)
    pub fn flick(&mut self, velocity: Point) {
        self.controller.flick(velocity);
    }

    /// One frame: advances drift, hands new tiles to the pool, updates
    /// fade-in opacity and returns the presentable set
    pub fn tick(&mut self, elapsed: Duration) -> Vec<PresentationTile<TileMetadata>> {
        self.controller.tick(elapsed);
        self.dispatch_lifecycle();
        self.update_fade(elapsed);
        self.controller.grid().present()
    }

    /// Drains pending lifecycle batches; every `New` batch becomes one
    /// background assignment
    fn dispatch_lifecycle(&mut self) {
        while let Ok(event) = self.lifecycle.try_recv() {
            match event.new_state {
                TileState::New => {
                    let pool = Arc::clone(&self.pool);
                    let tiles = event.tiles;
                    runtime::spawn(async move {
                        if let Err(err) = pool.assign_blocks(&tiles).await {
                            log::error!("assigning {} tile(s) failed: {}", tiles.len(), err);
                        }
                    });
                }
                TileState::Removed => {
                    log::trace!("{} tile(s) removed", event.len());
                }
                other => log::debug!("unexpected lifecycle batch state {:?}", other),
            }
        }
    }

    fn update_fade(&mut self, elapsed: Duration) {
        let mut live = HashSet::default();
        for tile in self.controller.grid().tiles() {
            live.insert(tile.id());
            if tile.state() == TileState::Ready {
                let opacity = self.fade.advance(tile.id(), elapsed);
                tile.update_metadata(|metadata| metadata.opacity = opacity);
            }
        }
        self.fade.retain(&live);
    }

    pub fn config(&self) -> &MosaicConfig {
        &self.config
    }

    pub fn controller(&self) -> &ViewportController<TileMetadata> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut ViewportController<TileMetadata> {
        &mut self.controller
    }

    pub fn pool(&self) -> &Arc<AssetPool> {
        &self.pool
    }

    pub fn zoom_level(&self) -> f64 {
        self.controller.zoom_level()
    }

    pub fn tile_count(&self) -> usize {
        self.controller.grid().len()
    }
}
