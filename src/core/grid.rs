//! Virtual tile grid kept in sync with a moving, scaling viewport.
//!
//! Tiles are addressed by [`GridCoord`]; a tile's pixel position is
//! `origin + coord * tile_size`. The live tiles always form one rectangle of
//! `extent` cells starting at `grid_offset`. After every origin or size
//! change the bounds check grows the rectangle until it covers the viewport
//! plus the preload margin, then drops rows/columns lying wholly beyond the
//! removal margin. Both passes are incremental: the rectangle is never
//! rebuilt from scratch, so tiles that are mid-download survive zooms.

use crate::core::bounds::Bounds;
use crate::core::config::GridConfig;
use crate::core::geo::{GridCoord, Point};
use crate::core::lifecycle::{LifecycleBus, LifecycleEvent};
use crate::prelude::{HashMap, HashSet};
use crate::tiles::tile::{PresentationTile, Tile, TileHandle, TileState};
use crossbeam_channel::Receiver;
use std::sync::Arc;

/// Whether a mutation runs the bounds check immediately
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundsCheck {
    Run,
    /// Leave it to a later mutation or an explicit [`TileGrid::check_bounds`]
    Defer,
}

/// Number of live columns and rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Extent {
    pub cols: i64,
    pub rows: i64,
}

/// Tiles announced by one bounds check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoundsReport {
    pub added: usize,
    pub removed: usize,
}

impl BoundsReport {
    pub fn is_empty(&self) -> bool {
        self.added == 0 && self.removed == 0
    }
}

#[derive(Debug, Clone, Copy)]
enum Axis {
    Cols,
    Rows,
}

#[derive(Debug, Clone, Copy)]
enum Edge {
    Start,
    End,
}

pub struct TileGrid<M> {
    config: GridConfig,
    default_metadata: M,
    tiles: HashMap<GridCoord, TileHandle<M>>,
    tile_size: f64,
    origin: Point,
    grid_offset: GridCoord,
    extent: Extent,
    viewport_size: Point,
    next_id: u64,
    bus: LifecycleBus<M>,
}

impl<M: Clone> TileGrid<M> {
    /// Creates an empty grid; call [`TileGrid::init`] to populate it.
    /// Every tile starts with a clone of `default_metadata`.
    pub fn new(config: GridConfig, default_metadata: M) -> Self {
        Self {
            tile_size: config.min_tile_size,
            config,
            default_metadata,
            tiles: HashMap::default(),
            origin: Point::zero(),
            grid_offset: GridCoord::new(0, 0),
            extent: Extent::default(),
            viewport_size: Point::zero(),
            next_id: 0,
            bus: LifecycleBus::new(),
        }
    }

    /// Resets the grid and fills the viewport.
    ///
    /// The initial rectangle is `ceil(viewport / tile_size)` cells created in
    /// row-major order, followed by one extend pass for the preload margin.
    /// Everything is announced as a single `New` batch. A non-finite
    /// `tile_size` is ignored and the current size is kept.
    pub fn init(&mut self, tile_size: f64, viewport_size: Point) {
        for tile in self.tiles.values() {
            tile.mark_removed();
        }
        self.tiles.clear();
        self.origin = Point::zero();
        self.grid_offset = GridCoord::new(0, 0);
        if tile_size.is_finite() {
            self.tile_size = self.config.clamp_tile_size(tile_size);
        } else {
            log::warn!(
                "ignoring non-finite tile size {}, keeping {}",
                tile_size,
                self.tile_size
            );
        }
        self.viewport_size = viewport_size;

        let cells = viewport_size.divide(self.tile_size).ceil();
        self.extent = Extent {
            cols: (cells.x as i64).max(1),
            rows: (cells.y as i64).max(1),
        };

        let mut added = Vec::with_capacity((self.extent.cols * self.extent.rows) as usize);
        for row in 0..self.extent.rows {
            for col in 0..self.extent.cols {
                added.push(self.create_tile(GridCoord::new(col, row)));
            }
        }
        while self.extend_pass(&mut added) {}

        log::info!(
            "grid init: {} tiles ({}x{}) at tile size {}",
            added.len(),
            self.extent.cols,
            self.extent.rows,
            self.tile_size
        );
        self.bus.publish(LifecycleEvent::new(added, TileState::New));
    }

    pub fn set_origin(&mut self, origin: Point, check: BoundsCheck) {
        self.origin = origin;
        if check == BoundsCheck::Run {
            self.check_bounds();
        }
    }

    pub fn shift_origin(&mut self, delta: Point, check: BoundsCheck) {
        self.set_origin(self.origin.add(&delta), check);
    }

    /// Rescales the pixel mapping; tiles keep their grid coordinates.
    /// The size is clamped to the configured bounds; non-finite sizes
    /// are ignored.
    pub fn set_tile_size(&mut self, size: f64, check: BoundsCheck) {
        if !size.is_finite() {
            log::warn!(
                "ignoring non-finite tile size {}, keeping {}",
                size,
                self.tile_size
            );
            return;
        }
        self.tile_size = self.config.clamp_tile_size(size);
        if check == BoundsCheck::Run {
            self.check_bounds();
        }
    }

    pub fn set_viewport_size(&mut self, size: Point) {
        self.viewport_size = size;
        self.check_bounds();
    }

    /// Extends then shrinks the grid to the margins and announces the net
    /// change. Tiles created and dropped within this call are not announced.
    pub fn check_bounds(&mut self) -> BoundsReport {
        let mut added = Vec::new();
        let mut removed = Vec::new();

        while self.extend_pass(&mut added) {}
        while self.shrink_pass(&mut removed) {}

        let transient: HashSet<u64> = added
            .iter()
            .filter(|tile| !tile.is_alive())
            .map(|tile| tile.id())
            .collect();
        added.retain(|tile| tile.is_alive());
        removed.retain(|tile| !transient.contains(&tile.id()));

        if !transient.is_empty() {
            log::debug!(
                "bounds check: {} tile(s) created and dropped in one step",
                transient.len()
            );
        }

        let report = BoundsReport {
            added: added.len(),
            removed: removed.len(),
        };
        self.bus.publish(LifecycleEvent::new(added, TileState::New));
        self.bus
            .publish(LifecycleEvent::new(removed, TileState::Removed));
        debug_assert_eq!(
            self.tiles.len() as i64,
            self.extent.cols * self.extent.rows
        );
        report
    }

    /// Every live tile with its pixel placement for the current frame,
    /// ordered row by row
    pub fn present(&self) -> Vec<PresentationTile<M>> {
        let screen = self.viewport_bounds();
        let mut presented: Vec<PresentationTile<M>> = self
            .tiles
            .values()
            .map(|tile| {
                let position = tile.position().to_pixel(self.origin, self.tile_size);
                let bounds =
                    Bounds::from_origin_and_size(position, Point::splat(self.tile_size));
                PresentationTile {
                    tile: Arc::clone(tile),
                    position,
                    size: self.tile_size,
                    on_screen: bounds.overlaps(&screen),
                }
            })
            .collect();
        presented.sort_by_key(|p| (p.tile.position().row, p.tile.position().col));
        presented
    }

    /// The live tile under a viewport pixel, if any
    pub fn tile_at(&self, point: Point) -> Option<TileHandle<M>> {
        let coord = GridCoord::from_pixel(point, self.origin, self.tile_size);
        self.tiles.get(&coord).cloned()
    }

    pub fn get(&self, coord: GridCoord) -> Option<&TileHandle<M>> {
        self.tiles.get(&coord)
    }

    pub fn tiles(&self) -> impl Iterator<Item = &TileHandle<M>> {
        self.tiles.values()
    }

    /// New subscriber to lifecycle batches; history is not replayed
    pub fn subscribe_lifecycle(&mut self) -> Receiver<LifecycleEvent<M>> {
        self.bus.subscribe()
    }

    fn create_tile(&mut self, coord: GridCoord) -> TileHandle<M> {
        let tile = Arc::new(Tile::new(
            self.next_id,
            coord,
            self.default_metadata.clone(),
        ));
        self.next_id += 1;
        let previous = self.tiles.insert(coord, Arc::clone(&tile));
        debug_assert!(previous.is_none(), "duplicate tile at {:?}", coord);
        tile
    }
}

impl<M> TileGrid<M> {
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn tile_size(&self) -> f64 {
        self.tile_size
    }

    pub fn grid_offset(&self) -> GridCoord {
        self.grid_offset
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    pub fn viewport_size(&self) -> Point {
        self.viewport_size
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn viewport_bounds(&self) -> Bounds {
        Bounds::from_origin_and_size(Point::zero(), self.viewport_size)
    }

    /// Pixel rectangle covered by the live tiles
    pub fn grid_bounds(&self) -> Bounds {
        let min = self.grid_offset.to_pixel(self.origin, self.tile_size);
        let span = Point::new(self.extent.cols as f64, self.extent.rows as f64)
            .multiply(self.tile_size);
        Bounds::from_origin_and_size(min, span)
    }
}

impl<M: Clone> TileGrid<M> {
    /// One look at each edge; true if any row/column was added
    fn extend_pass(&mut self, added: &mut Vec<TileHandle<M>>) -> bool {
        let margin = self.config.preload_margin;
        let mut changed = false;

        if self.grid_bounds().max.x < self.viewport_size.x + margin {
            self.add_line(Axis::Cols, Edge::End, added);
            changed = true;
        }
        if self.grid_bounds().min.x > -margin {
            self.add_line(Axis::Cols, Edge::Start, added);
            changed = true;
        }
        if self.grid_bounds().max.y < self.viewport_size.y + margin {
            self.add_line(Axis::Rows, Edge::End, added);
            changed = true;
        }
        if self.grid_bounds().min.y > -margin {
            self.add_line(Axis::Rows, Edge::Start, added);
            changed = true;
        }
        changed
    }

    /// One look at each edge; true if any row/column was dropped
    fn shrink_pass(&mut self, removed: &mut Vec<TileHandle<M>>) -> bool {
        let margin = self.config.removal_margin;
        let size = self.tile_size;
        let mut changed = false;

        if self.extent.cols > 0 && self.grid_bounds().min.x + size < -margin {
            self.remove_line(Axis::Cols, Edge::Start, removed);
            changed = true;
        }
        if self.extent.cols > 0
            && self.grid_bounds().max.x - size > self.viewport_size.x + margin
        {
            self.remove_line(Axis::Cols, Edge::End, removed);
            changed = true;
        }
        if self.extent.rows > 0 && self.grid_bounds().min.y + size < -margin {
            self.remove_line(Axis::Rows, Edge::Start, removed);
            changed = true;
        }
        if self.extent.rows > 0
            && self.grid_bounds().max.y - size > self.viewport_size.y + margin
        {
            self.remove_line(Axis::Rows, Edge::End, removed);
            changed = true;
        }
        changed
    }

    /// Cells of the column/row that sits at `index` on `axis`
    fn line_coords(&self, axis: Axis, index: i64) -> Vec<GridCoord> {
        match axis {
            Axis::Cols => (self.grid_offset.row..self.grid_offset.row + self.extent.rows)
                .map(|row| GridCoord::new(index, row))
                .collect(),
            Axis::Rows => (self.grid_offset.col..self.grid_offset.col + self.extent.cols)
                .map(|col| GridCoord::new(col, index))
                .collect(),
        }
    }

    fn add_line(&mut self, axis: Axis, edge: Edge, added: &mut Vec<TileHandle<M>>) {
        let index = match (axis, edge) {
            (Axis::Cols, Edge::Start) => self.grid_offset.col - 1,
            (Axis::Cols, Edge::End) => self.grid_offset.col + self.extent.cols,
            (Axis::Rows, Edge::Start) => self.grid_offset.row - 1,
            (Axis::Rows, Edge::End) => self.grid_offset.row + self.extent.rows,
        };
        for coord in self.line_coords(axis, index) {
            added.push(self.create_tile(coord));
        }
        match (axis, edge) {
            (Axis::Cols, Edge::Start) => {
                self.grid_offset.col -= 1;
                self.extent.cols += 1;
            }
            (Axis::Cols, Edge::End) => self.extent.cols += 1,
            (Axis::Rows, Edge::Start) => {
                self.grid_offset.row -= 1;
                self.extent.rows += 1;
            }
            (Axis::Rows, Edge::End) => self.extent.rows += 1,
        }
    }

    fn remove_line(&mut self, axis: Axis, edge: Edge, removed: &mut Vec<TileHandle<M>>) {
        let index = match (axis, edge) {
            (Axis::Cols, Edge::Start) => self.grid_offset.col,
            (Axis::Cols, Edge::End) => self.grid_offset.col + self.extent.cols - 1,
            (Axis::Rows, Edge::Start) => self.grid_offset.row,
            (Axis::Rows, Edge::End) => self.grid_offset.row + self.extent.rows - 1,
        };
        for coord in self.line_coords(axis, index) {
            if let Some(tile) = self.tiles.remove(&coord) {
                tile.mark_removed();
                removed.push(tile);
            }
        }
        match (axis, edge) {
            (Axis::Cols, Edge::Start) => {
                self.grid_offset.col += 1;
                self.extent.cols -= 1;
            }
            (Axis::Cols, Edge::End) => self.extent.cols -= 1,
            (Axis::Rows, Edge::Start) => {
                self.grid_offset.row += 1;
                self.extent.rows -= 1;
            }
            (Axis::Rows, Edge::End) => self.extent.rows -= 1,
        }
    }
}
