pub mod bounds;
pub mod config;
pub mod constants;
pub mod geo;
pub mod grid;
pub mod lifecycle;
pub mod mosaic;
pub mod viewport;
