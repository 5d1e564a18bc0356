use crate::model::Rect;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Metadata error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid atlas dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Invalid tile '{id}': {reason}")]
    InvalidTile { id: String, reason: String },
    #[error("Duplicate tile id '{0}'")]
    DuplicateTile(String),
    /// The tile does not fit the canvas bounds. Packing is deterministic, so
    /// the same input always fails the same way; callers must shrink the input.
    #[error(
        "Tile '{id}' cannot be placed at {rect:?} within a {max_width}x{max_height} canvas"
    )]
    PlacementOverflow {
        id: String,
        rect: Rect,
        max_width: u32,
        max_height: u32,
    },
    #[error("Nothing to pack")]
    Empty,
    #[error("Legacy atlas error: {0}")]
    Legacy(String),
    #[error("Encoding error: {0}")]
    Encode(String),
}

pub type Result<T> = std::result::Result<T, AtlasError>;
