//! Recovery of tiles from a previously shipped atlas.

use crate::error::{AtlasError, Result};
use crate::export::{AtlasSidecar, sidecar_from_json};
use crate::export_xml::sidecar_from_xml;
use crate::model::{AtlasRecord, Rect, Tile};
use image::{RgbaImage, imageops};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Supplies the tiles of an earlier atlas so they can be packed again
/// together with new tiles.
pub trait LegacySource {
    /// Short label for logs and errors.
    fn describe(&self) -> String;
    fn load(&self) -> Result<Vec<Tile>>;
}

impl LegacySource for Vec<Tile> {
    fn describe(&self) -> String {
        format!("{} in-memory tiles", self.len())
    }
    fn load(&self) -> Result<Vec<Tile>> {
        Ok(self.clone())
    }
}

/// An atlas image plus the JSON or XML sidecar written with it.
#[derive(Debug, Clone)]
pub struct SidecarLegacySource {
    pub image_path: PathBuf,
    pub sidecar_path: PathBuf,
}

impl SidecarLegacySource {
    pub fn new(image_path: impl Into<PathBuf>, sidecar_path: impl Into<PathBuf>) -> Self {
        Self {
            image_path: image_path.into(),
            sidecar_path: sidecar_path.into(),
        }
    }
}

impl LegacySource for SidecarLegacySource {
    fn describe(&self) -> String {
        self.image_path.display().to_string()
    }

    #[instrument(skip_all, fields(atlas = %self.image_path.display()))]
    fn load(&self) -> Result<Vec<Tile>> {
        let text = fs::read_to_string(&self.sidecar_path)?;
        let sidecar = if is_xml_sidecar(&self.sidecar_path, &text) {
            sidecar_from_xml(&text)?
        } else {
            sidecar_from_json(&text)?
        };
        // Decoded once at full resolution; every record is cropped from it.
        let atlas = image::open(&self.image_path)?.to_rgba8();
        let tiles = extract_tiles(&atlas, &sidecar)?;
        debug!(tiles = tiles.len(), "recovered legacy tiles");
        Ok(tiles)
    }
}

/// `.xml` extension, or a document that opens with a tag.
fn is_xml_sidecar(path: &Path, text: &str) -> bool {
    let by_ext = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("xml"));
    by_ext || text.trim_start().starts_with('<')
}

/// Crops every record of `sidecar` out of `atlas`.
///
/// Stored widths include the placement pad for every tile except the seed,
/// so the pad is removed here to recover the original tile size.
pub fn extract_tiles(atlas: &RgbaImage, sidecar: &AtlasSidecar) -> Result<Vec<Tile>> {
    let pad = sidecar.meta.placement_pad;
    let seed = sidecar.meta.seed_id.as_deref();
    let bounds = Rect::new(0, 0, atlas.width(), atlas.height());
    let crop = |r: &AtlasRecord| -> Result<Tile> {
        let w = if seed == Some(r.id.as_str()) {
            r.width
        } else {
            r.width.saturating_sub(pad)
        };
        if w == 0 || r.height == 0 {
            return Err(AtlasError::Legacy(format!(
                "record '{}' is empty once its pad is removed",
                r.id
            )));
        }
        if !bounds.contains(&Rect::new(r.x, r.y, w, r.height)) {
            return Err(AtlasError::Legacy(format!(
                "record '{}' ({},{} {}x{}) lies outside the {}x{} atlas",
                r.id,
                r.x,
                r.y,
                w,
                r.height,
                atlas.width(),
                atlas.height()
            )));
        }
        let pixels = imageops::crop_imm(atlas, r.x, r.y, w, r.height).to_image();
        Ok(Tile::new(r.id.clone(), pixels))
    };

    #[cfg(feature = "parallel")]
    {
        sidecar.records.par_iter().map(crop).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        sidecar.records.iter().map(crop).collect()
    }
}
