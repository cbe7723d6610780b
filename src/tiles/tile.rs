use crate::core::bounds::Bounds;
use crate::core::geo::{GridCoord, Point};
use crate::tiles::source::PreviewRef;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Loading state of a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileState {
    /// Created by the grid, no image assigned yet
    New,
    /// Image request in flight
    Downloading,
    /// Image decoded and owned by the tile
    Ready,
    /// Could not be given an image
    Errored,
    /// Dropped from the grid; terminal
    Removed,
}

impl TileState {
    /// Whether `self -> next` is an edge of the lifecycle state machine.
    /// `Removed` is only entered through the grid and never left.
    pub fn can_transition_to(self, next: TileState) -> bool {
        use TileState::*;
        matches!(
            (self, next),
            (New, Downloading) | (New, Errored) | (Downloading, Ready) | (Downloading, Errored)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == TileState::Removed
    }
}

struct TileData<M> {
    state: TileState,
    image: Option<RgbaImage>,
    metadata: M,
}

/// One cell of the virtual grid.
///
/// The grid owns a tile's existence. Other subsystems hold [`TileHandle`]
/// clones and must expect writes to be refused once the tile is removed.
pub struct Tile<M> {
    id: u64,
    position: GridCoord,
    alive: AtomicBool,
    data: Mutex<TileData<M>>,
}

pub type TileHandle<M> = Arc<Tile<M>>;

impl<M> Tile<M> {
    pub(crate) fn new(id: u64, position: GridCoord, metadata: M) -> Self {
        Self {
            id,
            position,
            alive: AtomicBool::new(true),
            data: Mutex::new(TileData {
                state: TileState::New,
                image: None,
                metadata,
            }),
        }
    }

    fn data(&self) -> MutexGuard<'_, TileData<M>> {
        self.data.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn position(&self) -> GridCoord {
        self.position
    }

    /// False once the grid has dropped this tile
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    pub fn state(&self) -> TileState {
        self.data().state
    }

    /// Moves the tile to `next` if the lifecycle allows it.
    /// Returns false (and changes nothing) for removed tiles and illegal edges.
    pub fn set_state(&self, next: TileState) -> bool {
        if !self.is_alive() {
            log::trace!("ignoring {:?} for removed tile {}", next, self.id);
            return false;
        }
        let mut data = self.data();
        if !data.state.can_transition_to(next) {
            log::trace!(
                "tile {} refused transition {:?} -> {:?}",
                self.id,
                data.state,
                next
            );
            return false;
        }
        data.state = next;
        true
    }

    /// Stores a decoded image and marks the tile `Ready`.
    /// Only valid while `Downloading`; a removed tile drops the image.
    pub fn set_image(&self, image: RgbaImage) -> bool {
        if !self.is_alive() {
            log::trace!("dropping late image for removed tile {}", self.id);
            return false;
        }
        let mut data = self.data();
        if !data.state.can_transition_to(TileState::Ready) {
            return false;
        }
        data.image = Some(image);
        data.state = TileState::Ready;
        true
    }

    pub fn has_image(&self) -> bool {
        self.data().image.is_some()
    }

    pub fn with_image<R>(&self, f: impl FnOnce(Option<&RgbaImage>) -> R) -> R {
        f(self.data().image.as_ref())
    }

    pub fn with_metadata<R>(&self, f: impl FnOnce(&M) -> R) -> R {
        f(&self.data().metadata)
    }

    /// Mutates the caller-owned payload. Refused once removed.
    pub fn update_metadata(&self, f: impl FnOnce(&mut M)) -> bool {
        if !self.is_alive() {
            return false;
        }
        f(&mut self.data().metadata);
        true
    }

    /// Terminal transition, reserved for the grid's shrink step
    pub(crate) fn mark_removed(&self) {
        self.alive.store(false, Ordering::Release);
        let mut data = self.data();
        data.state = TileState::Removed;
        data.image = None;
    }
}

impl<M: Clone> Tile<M> {
    pub fn metadata(&self) -> M {
        self.data().metadata.clone()
    }
}

impl<M> std::fmt::Debug for Tile<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tile")
            .field("id", &self.id)
            .field("position", &self.position)
            .field("state", &self.state())
            .field("alive", &self.is_alive())
            .finish()
    }
}

impl<M> PartialEq for Tile<M> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<M> Eq for Tile<M> {}

/// A tile paired with its pixel placement for the current frame.
/// Recomputed on every query, never stored by the engine.
#[derive(Debug, Clone)]
pub struct PresentationTile<M> {
    pub tile: TileHandle<M>,
    /// Top-left corner in viewport pixels
    pub position: Point,
    pub size: f64,
    pub on_screen: bool,
}

impl<M> PresentationTile<M> {
    pub fn bounds(&self) -> Bounds {
        Bounds::from_origin_and_size(self.position, Point::splat(self.size))
    }
}

/// Metadata payloads that can receive a pooled preview reference
pub trait AssignPreview {
    fn assign_preview(&mut self, preview: &PreviewRef);

    fn image_url(&self) -> Option<&str>;
}

/// Default tile payload: assigned preview plus presentation opacity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileMetadata {
    pub image_url: Option<String>,
    pub target_id: Option<String>,
    pub opacity: f32,
}

impl Default for TileMetadata {
    fn default() -> Self {
        Self {
            image_url: None,
            target_id: None,
            opacity: 0.0,
        }
    }
}

impl AssignPreview for TileMetadata {
    fn assign_preview(&mut self, preview: &PreviewRef) {
        self.image_url = Some(preview.image_url.clone());
        self.target_id = Some(preview.target_id.clone());
    }

    fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }
}
