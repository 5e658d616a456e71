//! Configuration errors
//!
//! Everything that can go wrong in this crate goes wrong at load time: a bad
//! catalog, a depth rule naming a missing layer, an unreadable settings file.
//! Mining and movement never fail; they clip or do nothing instead.

use thiserror::Error;

/// Errors raised while building a catalog, generating terrain or loading settings
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("layer catalog is empty")]
    EmptyCatalog,

    #[error("layer name '{0}' is defined more than once")]
    DuplicateLayer(String),

    #[error("depth rule {rule} references unknown layer '{name}'")]
    UnknownLayer { rule: usize, name: String },

    #[error("layer '{name}' has invalid hardness {hardness} (must be finite and > 0)")]
    InvalidHardness { name: String, hardness: f32 },

    #[error("invalid weight {weight} for '{name}' (must be finite and >= 0)")]
    InvalidWeight { name: String, weight: f32 },

    #[error("depth rule {rule} has start row {start} after end row {end}")]
    InvalidRowRange { rule: usize, start: i32, end: i32 },

    #[error("depth rules {first} and {second} have overlapping row ranges")]
    OverlappingRules { first: usize, second: usize },

    #[error("layer '{name}' tile image is {width}x{height}, expected {tile_size}x{tile_size}")]
    TileSizeMismatch {
        name: String,
        width: usize,
        height: usize,
        tile_size: usize,
    },

    #[error("tile image has {actual} pixels, expected {expected}")]
    InvalidTileImage { expected: usize, actual: usize },

    #[error("grid dimensions {width}x{height} are invalid (both must be > 0 and at most i32::MAX)")]
    InvalidDimensions { width: usize, height: usize },

    #[error("tile size must be > 0")]
    InvalidTileSize,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
