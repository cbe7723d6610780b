//! # Mosaic
//!
//! A virtual, effectively infinite grid of square image tiles that stays in
//! sync with a moving and scaling viewport.
//!
//! The engine tracks tiles by grid coordinate, creates them just before they
//! scroll into view, hands each new tile a preview image reference from a
//! pooled listing, and destroys tiles once they are safely off-screen. Pan,
//! focal-point zoom and inertial drift are translated into grid mutations by
//! the viewport controller.

pub mod animation;
pub mod core;
pub mod input;
pub mod prelude;
pub mod runtime;
pub mod tiles;
pub use crate::core::constants;

// Re-export public API
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
    pool::{AssetPool, PoolConfig},
    source::{HttpImageFetcher, HttpPreviewSource, ImageFetcher, PreviewRef, PreviewSource},
    tile::{PresentationTile, Tile, TileHandle, TileMetadata, TileState},
};

pub use input::{events::InputEvent, gestures::GestureTracker};

pub use animation::{drift::Drift, fade::FadeIn};

/// Installs an `env_logger` showing this crate's debug output unless
/// `RUST_LOG` says otherwise
#[cfg(feature = "debug")]
pub fn init_debug_logging() {
    let env = env_logger::Env::default().default_filter_or("mosaic=debug");
    if env_logger::Builder::from_env(env).try_init().is_err() {
        log::debug!("logger already installed, keeping it");
    }
}

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MosaicError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MosaicError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Image decode error: {0}")]
    Decode(#[from] image::ImageError),

    #[error("HTTP {status} for {url}")]
    Http { status: u16, url: String },

    #[error("Preview pool starved: needed {requested}, had {available}")]
    Starvation { requested: usize, available: usize },

    #[error("Preview refill failed: {0}")]
    Refill(String),

    #[error("Zoom level {requested} outside [{min}, {max}]")]
    ZoomOutOfRange { requested: f64, min: f64, max: f64 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Timed out: {0}")]
    Timeout(String),
}

/// Error type alias for convenience
pub type Error = MosaicError;
