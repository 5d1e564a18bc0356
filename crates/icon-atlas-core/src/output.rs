//! Writing the canvas and sidecar artifacts of a packed atlas.

use crate::config::MetadataFormat;
use crate::error::{AtlasError, Result};
use crate::export::to_json;
use crate::export_xml::to_xml;
use crate::pipeline::AtlasOutput;
use image::{ImageFormat, RgbaImage};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Turns the finished canvas into a texture file.
///
/// The shipped editor plugs a block-compressing GPU encoder in here;
/// [`PngEncoder`] is the lossless default.
pub trait CanvasEncoder {
    /// File extension of the produced texture, without the dot.
    fn extension(&self) -> &str;
    fn encode(&self, canvas: &RgbaImage, path: &Path) -> Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PngEncoder;

impl CanvasEncoder for PngEncoder {
    fn extension(&self) -> &str {
        "png"
    }
    fn encode(&self, canvas: &RgbaImage, path: &Path) -> Result<()> {
        canvas
            .save_with_format(path, ImageFormat::Png)
            .map_err(|e| AtlasError::Encode(format!("{}: {}", path.display(), e)))
    }
}

/// Paths written by [`write_atlas`].
#[derive(Debug, Clone)]
pub struct WrittenAtlas {
    pub texture: PathBuf,
    pub metadata: PathBuf,
}

/// Writes `<dir>/<output.name>.<ext>` and `<dir>/<output.name>.json|xml`,
/// creating `dir` if needed.
pub fn write_atlas(
    output: &AtlasOutput,
    dir: &Path,
    encoder: &dyn CanvasEncoder,
    format: MetadataFormat,
) -> Result<WrittenAtlas> {
    fs::create_dir_all(dir)?;

    let texture = dir.join(format!("{}.{}", output.name, encoder.extension()));
    encoder.encode(&output.canvas, &texture)?;

    let metadata = dir.join(format!("{}.{}", output.name, format.extension()));
    let text = match format {
        MetadataFormat::Json => serde_json::to_string_pretty(&to_json(&output.records, &output.meta))?,
        MetadataFormat::Xml => to_xml(&output.records, &output.meta),
    };
    fs::write(&metadata, text)?;

    info!(?texture, ?metadata, records = output.records.len(), "atlas written");
    Ok(WrittenAtlas { texture, metadata })
}
