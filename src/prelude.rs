//! Prelude module for common mosaic types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use mosaic::prelude::*;`

pub use crate::core::{
    bounds::Bounds,
    config::{GridConfig, MosaicConfig, MosaicProfile},
    geo::{GridCoord, Point},
    grid::{BoundsCheck, TileGrid},
    lifecycle::{LifecycleBus, LifecycleEvent},
    mosaic::Mosaic,
    viewport::ViewportController,
};

pub use crate::tiles::{
    cache::ImageCache,
    pool::{AssetPool, PoolConfig},
    source::{HttpImageFetcher, HttpPreviewSource, ImageFetcher, PreviewRef, PreviewSource},
    tile::{PresentationTile, Tile, TileHandle, TileMetadata, TileState},
};

pub use crate::input::{
    events::{InputEvent, TouchEventType, TouchPoint},
    gestures::{Gesture, GestureTracker, PointerRelease},
};

pub use crate::animation::{drift::Drift, easing::EasingFunction, fade::FadeIn};

pub use crate::runtime::{init_runtime, runtime, spawn, AsyncHandle, AsyncSpawner};

pub use crate::{MosaicError, Result};

pub use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};

pub use futures::Future;
pub use std::pin::Pin;
