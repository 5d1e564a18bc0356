//! Layout engine for icon texture atlases.
//!
//! - Sorter: stable base-10 radix ordering by the larger tile dimension
//! - Packer: next-fit shelf packing into a fixed-width canvas, merging adjacent spans
//! - Pipeline: `pack_atlas` runs one job (fresh or legacy-augmented) and returns the
//!   composited RGBA canvas plus placement records; `write_atlas` stores both.
//!
//! Quick example:
//! ```ignore
//! use image::RgbaImage;
//! use icon_atlas_core::{AtlasConfig, AtlasJob, Tile, pack_atlas};
//! # fn main() -> anyhow::Result<()> {
//! let tiles = vec![
//!     Tile::new("open", RgbaImage::new(32, 32)),
//!     Tile::new("save", RgbaImage::new(32, 32)),
//! ];
//! let cfg = AtlasConfig { max_width: 1024, ..Default::default() };
//! let out = pack_atlas(tiles, &AtlasJob::fresh("toolbar"), &cfg)?;
//! println!("{}x{}, {} records", out.width, out.height, out.records.len());
//! # Ok(()) }
//! ```

pub mod compositing;
pub mod config;
pub mod error;
pub mod export;
pub mod export_xml;
pub mod legacy;
pub mod model;
pub mod output;
pub mod packer;
pub mod pipeline;
pub mod sort;

pub use config::*;
pub use error::*;
pub use export::*;
pub use export_xml::*;
pub use legacy::*;
pub use model::*;
pub use output::*;
pub use packer::*;
pub use pipeline::*;
pub use sort::*;

/// Convenience prelude for common types and functions.
/// Importing `icon_atlas_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::config::{AtlasConfig, AtlasConfigBuilder, MetadataFormat};
    pub use crate::error::{AtlasError, Result};
    pub use crate::legacy::{LegacySource, SidecarLegacySource};
    pub use crate::model::{AtlasRecord, AtlasStats, Rect, Tile};
    pub use crate::output::{CanvasEncoder, PngEncoder, write_atlas};
    pub use crate::packer::{HEIGHT_ALIGNMENT, PLACEMENT_PAD, ShelfPacker};
    pub use crate::pipeline::{AtlasJob, AtlasOutput, Layout, pack_atlas, pack_layout};
    pub use crate::sort::{radix_sort_by_key, sort_tiles};
}
