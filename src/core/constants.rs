//! Engine-wide defaults. Keeping them in a single place makes it easier to
//! tweak the magic numbers that shape how the mosaic feels.

/// Base tile edge in pixels at zoom level 1.0.
pub const TILE_SIZE: f64 = 150.0;

/// Smallest allowed zoom level (ratio against the base tile size).
pub const MIN_ZOOM_LEVEL: f64 = 0.5;

/// Largest allowed zoom level.
pub const MAX_ZOOM_LEVEL: f64 = 3.0;

/// Pixels beyond the viewport in which tiles must already exist.
pub const PRELOAD_MARGIN: f64 = 100.0;

/// Pixels beyond the viewport past which tiles are destroyed.
pub const REMOVAL_MARGIN: f64 = 300.0;

/// Drift velocity multiplier applied once per tick.
pub const DRIFT_DECAY_FACTOR: f64 = 0.95;

/// Scale from release gesture velocity to drift velocity.
pub const DRIFT_VELOCITY_SCALE: f64 = 1.0;

/// Drift speed (px/s) under which motion snaps to a stop.
pub const DRIFT_STOP_THRESHOLD: f64 = 1.0;

/// Zoom factor exponent per wheel pixel.
pub const WHEEL_ZOOM_SENSITIVITY: f64 = 0.0015;

/// Preview references requested per listing call.
pub const PREVIEW_BATCH_SIZE: usize = 50;

/// Fetched image payloads kept in memory by URL.
pub const IMAGE_CACHE_CAPACITY: usize = 256;

/// Fade-in duration for freshly loaded tiles.
pub const FADE_IN_MS: u64 = 400;

/// Window of pointer samples used to estimate release velocity.
pub const VELOCITY_SAMPLE_WINDOW_MS: u64 = 100;
