use crate::error::{AtlasError, Result};
use crate::model::{AtlasRecord, Tile};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Schema version written to every sidecar and accepted when reading one back.
pub const SIDECAR_SCHEMA_VERSION: &str = "1";

/// Atlas-level metadata written next to the records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AtlasMeta {
    /// Sidecar schema version; string so "1.1" style bumps stay possible.
    pub schema_version: String,
    pub app: String,
    pub version: String,
    pub format: String,
    pub width: u32,
    pub height: u32,
    /// Columns of padding included in every record width except the seed's.
    pub placement_pad: u32,
    /// Id of the tile packed first, whose record carries no padding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_id: Option<String>,
}

impl AtlasMeta {
    pub fn new(width: u32, height: u32, seed_id: Option<String>) -> Self {
        Self {
            schema_version: SIDECAR_SCHEMA_VERSION.into(),
            app: "icon-atlas".into(),
            version: env!("CARGO_PKG_VERSION").into(),
            format: "RGBA8888".into(),
            width,
            height,
            placement_pad: crate::packer::PLACEMENT_PAD,
            seed_id,
        }
    }
}

/// Sidecar document as read back from disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtlasSidecar {
    pub records: Vec<AtlasRecord>,
    pub meta: AtlasMeta,
}

/// One record per tile, in the order the tiles are given (not packing order).
///
/// Tiles that were never placed are skipped.
pub fn emit_records(tiles: &[Tile]) -> Vec<AtlasRecord> {
    tiles
        .iter()
        .filter_map(|t| {
            t.placement().map(|p| AtlasRecord {
                id: t.id().to_string(),
                x: p.x,
                y: p.y,
                width: p.w,
                height: p.h,
            })
        })
        .collect()
}

/// Serialize records as `{ records: [{id, x, y, width, height}], meta }`.
pub fn to_json(records: &[AtlasRecord], meta: &AtlasMeta) -> Value {
    let records_val: Vec<Value> = records
        .iter()
        .map(|r| {
            json!({
                "id": r.id,
                "x": r.x,
                "y": r.y,
                "width": r.width,
                "height": r.height,
            })
        })
        .collect();
    json!({ "records": records_val, "meta": meta })
}

/// Parse a sidecar produced by [`to_json`].
pub fn sidecar_from_json(text: &str) -> Result<AtlasSidecar> {
    let sidecar: AtlasSidecar = serde_json::from_str(text)?;
    if sidecar.meta.schema_version != SIDECAR_SCHEMA_VERSION {
        return Err(AtlasError::Legacy(format!(
            "unsupported sidecar schema version {}",
            sidecar.meta.schema_version
        )));
    }
    Ok(sidecar)
}
