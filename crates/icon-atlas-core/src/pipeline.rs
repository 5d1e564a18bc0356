use crate::compositing::compose_canvas;
use crate::config::AtlasConfig;
use crate::error::{AtlasError, Result};
use crate::export::{AtlasMeta, emit_records};
use crate::legacy::LegacySource;
use crate::model::{AtlasRecord, AtlasStats, Rect, Tile};
use crate::packer::ShelfPacker;
use crate::sort::radix_sort_by_key;
use image::RgbaImage;
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::{debug, info, instrument};

/// One atlas to build: where extra tiles come from and whether to sort.
pub struct AtlasJob {
    pub name: String,
    /// Earlier atlas whose tiles are packed again alongside the supplied ones.
    pub legacy: Option<Box<dyn LegacySource>>,
    /// Order tiles by size before packing; otherwise input order is kept.
    pub sort_before_packing: bool,
}

impl AtlasJob {
    /// Standard atlas: legacy tiles plus supplied tiles, sorted before packing.
    pub fn legacy_augmented(name: impl Into<String>, source: impl LegacySource + 'static) -> Self {
        Self {
            name: name.into(),
            legacy: Some(Box::new(source)),
            sort_before_packing: true,
        }
    }

    /// Free atlas: supplied tiles only, packed in the given order.
    pub fn fresh(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            legacy: None,
            sort_before_packing: false,
        }
    }

    pub fn with_sort(mut self, v: bool) -> Self {
        self.sort_before_packing = v;
        self
    }
}

impl fmt::Debug for AtlasJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AtlasJob")
            .field("name", &self.name)
            .field("legacy", &self.legacy.as_ref().map(|l| l.describe()))
            .field("sort_before_packing", &self.sort_before_packing)
            .finish()
    }
}

/// Output of a packing run: the composited canvas and its records.
pub struct AtlasOutput {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub canvas: RgbaImage,
    /// One record per tile, in input order (legacy tiles first).
    pub records: Vec<AtlasRecord>,
    pub meta: AtlasMeta,
}

impl AtlasOutput {
    pub fn stats(&self) -> AtlasStats {
        AtlasStats::from_records(&self.records, self.width, self.height)
    }
}

/// Placements without pixel data.
#[derive(Debug, Clone)]
pub struct Layout {
    pub width: u32,
    pub height: u32,
    /// In input order.
    pub records: Vec<AtlasRecord>,
    /// Index (input order) of the tile packed first.
    pub seed: Option<usize>,
}

/// Runs one atlas job: gathers legacy and supplied tiles, orders and packs
/// them, composites the canvas and emits the records.
///
/// Fails without producing anything if a tile is invalid or does not fit.
#[instrument(skip_all, fields(job = %job.name))]
pub fn pack_atlas(tiles: Vec<Tile>, job: &AtlasJob, cfg: &AtlasConfig) -> Result<AtlasOutput> {
    cfg.validate()?;

    let mut tiles = gather_tiles(tiles, job)?;
    if tiles.is_empty() {
        return Err(AtlasError::Empty);
    }
    for t in &tiles {
        t.validate()?;
    }

    let packed = {
        let items: Vec<SizeItem<'_>> = tiles
            .iter()
            .map(|t| SizeItem {
                id: t.id(),
                anchor: t.anchor(),
                w: t.width(),
                h: t.height(),
            })
            .collect();
        pack_sizes(&items, job.sort_before_packing, cfg)?
    };

    for (tile, rect) in tiles.iter_mut().zip(packed.rects) {
        tile.assign(rect);
    }

    let canvas = compose_canvas(packed.width, packed.height, &tiles);
    let records = emit_records(&tiles);
    let seed_id = packed.seed.map(|i| tiles[i].id().to_string());
    let meta = AtlasMeta::new(packed.width, packed.height, seed_id);
    info!(
        tiles = records.len(),
        width = packed.width,
        height = packed.height,
        spans = packed.spans,
        "atlas packed"
    );
    Ok(AtlasOutput {
        name: job.name.clone(),
        width: packed.width,
        height: packed.height,
        canvas,
        records,
        meta,
    })
}

/// Packs sizes into one canvas without compositing pixel data.
/// Inputs are (id, width, height), all anchored at the origin.
pub fn pack_layout<K: Into<String>>(
    inputs: Vec<(K, u32, u32)>,
    sort_before_packing: bool,
    cfg: &AtlasConfig,
) -> Result<Layout> {
    cfg.validate()?;

    if inputs.is_empty() {
        return Err(AtlasError::Empty);
    }
    let inputs: Vec<(String, u32, u32)> = inputs
        .into_iter()
        .map(|(k, w, h)| (k.into(), w, h))
        .collect();
    let mut seen = HashSet::new();
    for (id, w, h) in &inputs {
        if *w == 0 || *h == 0 {
            return Err(AtlasError::InvalidTile {
                id: id.clone(),
                reason: format!("zero-area tile ({}x{})", w, h),
            });
        }
        if !seen.insert(id.as_str()) {
            return Err(AtlasError::DuplicateTile(id.clone()));
        }
    }

    let items: Vec<SizeItem<'_>> = inputs
        .iter()
        .map(|(id, w, h)| SizeItem {
            id: id.as_str(),
            anchor: (0, 0),
            w: *w,
            h: *h,
        })
        .collect();
    let packed = pack_sizes(&items, sort_before_packing, cfg)?;
    let records = inputs
        .iter()
        .zip(&packed.rects)
        .map(|((id, _, _), r)| AtlasRecord {
            id: id.clone(),
            x: r.x,
            y: r.y,
            width: r.w,
            height: r.h,
        })
        .collect();
    Ok(Layout {
        width: packed.width,
        height: packed.height,
        records,
        seed: packed.seed,
    })
}

/// Legacy tiles first (in sidecar order), then supplied tiles. A supplied
/// tile with the id of a legacy tile takes that tile's slot.
fn gather_tiles(supplied: Vec<Tile>, job: &AtlasJob) -> Result<Vec<Tile>> {
    let mut combined = match &job.legacy {
        Some(source) => {
            let tiles = source.load()?;
            debug!(source = %source.describe(), count = tiles.len(), "loaded legacy tiles");
            tiles
        }
        None => Vec::new(),
    };

    let mut slots: HashMap<String, usize> = HashMap::with_capacity(combined.len() + supplied.len());
    for (i, t) in combined.iter().enumerate() {
        if slots.insert(t.id().to_string(), i).is_some() {
            return Err(AtlasError::DuplicateTile(t.id().to_string()));
        }
    }

    let mut supplied_ids: HashSet<String> = HashSet::with_capacity(supplied.len());
    for tile in supplied {
        if !supplied_ids.insert(tile.id().to_string()) {
            return Err(AtlasError::DuplicateTile(tile.id().to_string()));
        }
        match slots.get(tile.id()) {
            Some(&i) => {
                debug!(id = tile.id(), "supplied tile replaces legacy tile");
                combined[i] = tile;
            }
            None => {
                slots.insert(tile.id().to_string(), combined.len());
                combined.push(tile);
            }
        }
    }
    Ok(combined)
}

struct SizeItem<'a> {
    id: &'a str,
    anchor: (u32, u32),
    w: u32,
    h: u32,
}

struct Packed {
    /// Placements in input order.
    rects: Vec<Rect>,
    width: u32,
    height: u32,
    seed: Option<usize>,
    spans: usize,
}

fn pack_sizes(items: &[SizeItem<'_>], sort: bool, cfg: &AtlasConfig) -> Result<Packed> {
    let indices: Vec<usize> = (0..items.len()).collect();
    let order = if sort {
        let order = radix_sort_by_key(indices, |&i| items[i].w.max(items[i].h));
        debug!(count = order.len(), "sorted by max side");
        order
    } else {
        indices
    };

    let mut packer = ShelfPacker::new(cfg);
    let mut rects = vec![Rect::new(0, 0, 0, 0); items.len()];
    for &i in &order {
        let it = &items[i];
        rects[i] = packer.place(it.id, it.anchor, it.w, it.h)?;
    }
    Ok(Packed {
        rects,
        width: packer.canvas_width(),
        height: packer.canvas_height(),
        seed: order.first().copied(),
        spans: packer.span_count(),
    })
}
