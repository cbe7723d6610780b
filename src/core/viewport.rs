//! Viewport transform controller.
//!
//! Translates gestures and autonomous drift into grid mutations: pans shift
//! the grid origin, zooms rescale the tile size around a focal point, and a
//! released drag keeps the surface moving until the drift decays.

use crate::animation::drift::Drift;
use crate::core::config::MosaicConfig;
use crate::core::geo::Point;
use crate::core::grid::{BoundsCheck, TileGrid};
use crate::input::events::InputEvent;
use crate::input::gestures::{Gesture, GestureTracker, PointerRelease};
use crate::{MosaicError, Result};
use std::time::{Duration, Instant};

/// Called with the metadata of a tapped tile
pub type SelectCallback<M> = Box<dyn FnMut(&M) + Send>;

pub struct ViewportController<M> {
    grid: TileGrid<M>,
    base_tile_size: f64,
    zoom_level: f64,
    min_zoom_level: f64,
    max_zoom_level: f64,
    drift: Drift,
    drift_velocity_scale: f64,
    gestures: GestureTracker,
    on_select: Option<SelectCallback<M>>,
}

impl<M: Clone> ViewportController<M> {
    pub fn new(config: &MosaicConfig, default_metadata: M) -> Self {
        Self {
            grid: TileGrid::new(config.grid(), default_metadata),
            base_tile_size: config.tile_size,
            zoom_level: 1.0,
            min_zoom_level: config.min_zoom_level,
            max_zoom_level: config.max_zoom_level,
            drift: Drift::from_config(config),
            drift_velocity_scale: config.drift_velocity_scale,
            gestures: GestureTracker::new(config.wheel_zoom_sensitivity),
            on_select: None,
        }
    }

    /// Fills the grid for `viewport_size` at the current zoom level
    pub fn init(&mut self, viewport_size: Point) {
        self.grid
            .init(self.base_tile_size * self.zoom_level, viewport_size);
    }

    pub fn set_on_select(&mut self, callback: impl FnMut(&M) + Send + 'static) {
        self.on_select = Some(Box::new(callback));
    }

    /// Shifts the origin by `-delta`. Gesture deltas are scroll offsets
    /// (previous pointer minus current), so a positive `delta` moves the
    /// origin left and dragged content follows the pointer, matching the
    /// direction of release drift.
    pub fn pan(&mut self, delta: Point) {
        self.grid.shift_origin(delta.invert(), BoundsCheck::Run);
    }

    /// Zooms to `level` keeping the grid point under `focus` fixed on
    /// screen. `focus` defaults to the viewport center. Levels outside the
    /// configured range are rejected without touching the grid.
    pub fn zoom_to(&mut self, level: f64, focus: Option<Point>) -> Result<()> {
        if !(level >= self.min_zoom_level && level <= self.max_zoom_level) {
            log::warn!(
                "rejecting zoom level {} outside [{}, {}]",
                level,
                self.min_zoom_level,
                self.max_zoom_level
            );
            return Err(MosaicError::ZoomOutOfRange {
                requested: level,
                min: self.min_zoom_level,
                max: self.max_zoom_level,
            });
        }

        let focus = focus.unwrap_or_else(|| self.grid.viewport_size().divide(2.0));
        let old_size = self.grid.tile_size();
        self.grid
            .set_tile_size(self.base_tile_size * level, BoundsCheck::Defer);
        let ratio = self.grid.tile_size() / old_size;

        // Where the focused grid point sits relative to the origin, before
        // and after the rescale
        let grid_point = focus.subtract(&self.grid.origin());
        let shift = grid_point.subtract(&grid_point.multiply(ratio));
        self.grid.shift_origin(shift, BoundsCheck::Defer);
        self.grid.check_bounds();

        log::debug!("zoom {} -> {} around {:?}", self.zoom_level, level, focus);
        self.zoom_level = level;
        Ok(())
    }

    /// Relative zoom used by wheel and pinch gestures; the resulting level
    /// is clamped to the configured range
    pub fn zoom_by(&mut self, factor: f64, focus: Point) -> Result<()> {
        if !(factor.is_finite() && factor > 0.0) {
            return Err(MosaicError::ZoomOutOfRange {
                requested: self.zoom_level * factor,
                min: self.min_zoom_level,
                max: self.max_zoom_level,
            });
        }
        let level = (self.zoom_level * factor).clamp(self.min_zoom_level, self.max_zoom_level);
        if level == self.zoom_level {
            return Ok(());
        }
        self.zoom_to(level, Some(focus))
    }

    /// Injects a drift velocity in origin pixels per second
    pub fn flick(&mut self, velocity: Point) {
        self.drift.set_velocity(velocity);
    }

    /// Advances drift by one tick; returns the origin shift applied
    pub fn tick(&mut self, elapsed: Duration) -> Option<Point> {
        let delta = self.drift.tick(elapsed)?;
        self.grid.shift_origin(delta, BoundsCheck::Run);
        Some(delta)
    }

    pub fn handle_input(&mut self, event: InputEvent, now: Instant) {
        for gesture in self.gestures.process(event, now) {
            match gesture {
                Gesture::Press { .. } => self.drift.suspend(),
                Gesture::Pan { delta } => self.pan(delta),
                Gesture::Zoom { factor, focus } => {
                    if let Err(err) = self.zoom_by(factor, focus) {
                        log::debug!("ignoring zoom gesture: {}", err);
                    }
                }
                Gesture::Release(release) => self.release(release),
                Gesture::Resize { size } => self.grid.set_viewport_size(size),
            }
        }
    }

    fn release(&mut self, release: PointerRelease) {
        self.drift.resume();
        if release.is_tap() {
            self.select_at(release.position);
        } else if !release.velocity.is_zero() {
            // Pointer velocity runs the same way as the origin
            self.drift
                .set_velocity(release.velocity.multiply(self.drift_velocity_scale));
        }
    }

    /// Reports the tile under `position` to the select callback and
    /// returns its metadata
    pub fn select_at(&mut self, position: Point) -> Option<M> {
        let tile = self.grid.tile_at(position)?;
        let metadata = tile.metadata();
        log::debug!("tile {} selected at {:?}", tile.id(), position);
        if let Some(callback) = self.on_select.as_mut() {
            callback(&metadata);
        }
        Some(metadata)
    }
}

impl<M> ViewportController<M> {
    pub fn grid(&self) -> &TileGrid<M> {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut TileGrid<M> {
        &mut self.grid
    }

    pub fn zoom_level(&self) -> f64 {
        self.zoom_level
    }

    pub fn base_tile_size(&self) -> f64 {
        self.base_tile_size
    }

    pub fn zoom_limits(&self) -> (f64, f64) {
        (self.min_zoom_level, self.max_zoom_level)
    }

    pub fn drift(&self) -> &Drift {
        &self.drift
    }

    /// Whether a pointer or finger is down
    pub fn is_dragging(&self) -> bool {
        self.gestures.is_pressed()
    }
}
