pub mod cache;
pub mod pool;
pub mod source;
pub mod tile;

// Re-exports for convenience
pub use cache::ImageCache;
pub use pool::{AssetPool, PoolConfig};
pub use source::{HttpImageFetcher, HttpPreviewSource, ImageFetcher, PreviewRef, PreviewSource};
pub use tile::{AssignPreview, PresentationTile, Tile, TileHandle, TileMetadata, TileState};
