use crate::error::{AtlasError, Result};
use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle (pixels). `x,y` is top-left; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    /// Inclusive right edge coordinate (`x + w - 1`).
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.w.saturating_sub(1))
    }
    /// Inclusive bottom edge coordinate (`y + h - 1`).
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.h.saturating_sub(1))
    }
    /// Exclusive right edge (`x + w`).
    pub fn right_edge(&self) -> u32 {
        self.x + self.w
    }
    /// Exclusive bottom edge (`y + h`).
    pub fn bottom_edge(&self) -> u32 {
        self.y + self.h
    }
    /// Returns true if `r` is fully inside `self` (inclusive edges).
    pub fn contains(&self, r: &Rect) -> bool {
        r.x >= self.x && r.y >= self.y && r.right() <= self.right() && r.bottom() <= self.bottom()
    }
    /// Returns true if the two rectangles share at least one pixel.
    pub fn intersects(&self, r: &Rect) -> bool {
        self.x < r.right_edge()
            && r.x < self.right_edge()
            && self.y < r.bottom_edge()
            && r.y < self.bottom_edge()
    }
    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }
}

/// One rectangular RGBA image to be placed into the atlas.
///
/// The placement is assigned once by the packer and never changes afterwards.
#[derive(Debug, Clone)]
pub struct Tile {
    id: String,
    pixels: RgbaImage,
    anchor: (u32, u32),
    placement: Option<Rect>,
}

impl Tile {
    pub fn new(id: impl Into<String>, pixels: RgbaImage) -> Self {
        Self {
            id: id.into(),
            pixels,
            anchor: (0, 0),
            placement: None,
        }
    }

    /// Builds a tile from a raw RGBA8 buffer of `width * height * 4` bytes.
    pub fn from_raw(id: impl Into<String>, width: u32, height: u32, bytes: Vec<u8>) -> Result<Self> {
        let id = id.into();
        let len = bytes.len();
        match RgbaImage::from_raw(width, height, bytes) {
            Some(pixels) => Ok(Self::new(id, pixels)),
            None => Err(AtlasError::InvalidTile {
                id,
                reason: format!(
                    "pixel buffer holds {} bytes, {}x{} RGBA needs {}",
                    len,
                    width,
                    height,
                    width as u64 * height as u64 * 4
                ),
            }),
        }
    }

    /// Sets the position the placement search starts from (origin by default).
    pub fn with_anchor(mut self, x: u32, y: u32) -> Self {
        self.anchor = (x, y);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
    pub fn anchor(&self) -> (u32, u32) {
        self.anchor
    }
    pub fn placement(&self) -> Option<Rect> {
        self.placement
    }

    /// Ordering key used by the sorter: the larger of the two dimensions.
    pub fn sort_key(&self) -> u32 {
        self.width().max(self.height())
    }

    pub(crate) fn assign(&mut self, rect: Rect) {
        debug_assert!(self.placement.is_none(), "tile '{}' placed twice", self.id);
        self.placement = Some(rect);
    }

    /// Rejects zero-area tiles before they reach the sorter or packer.
    pub fn validate(&self) -> Result<()> {
        if self.width() == 0 || self.height() == 0 {
            return Err(AtlasError::InvalidTile {
                id: self.id.clone(),
                reason: format!("zero-area tile ({}x{})", self.width(), self.height()),
            });
        }
        Ok(())
    }
}

/// One row of the placement sidecar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AtlasRecord {
    pub id: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl AtlasRecord {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

/// Statistics about atlas packing efficiency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AtlasStats {
    /// Number of tiles placed.
    pub num_tiles: usize,
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// `canvas_width * canvas_height`.
    pub canvas_area: u64,
    /// Sum of the stored placement areas (padding included).
    pub used_area: u64,
    /// used_area / canvas_area (0.0 to 1.0). Higher is better.
    pub occupancy: f64,
}

impl AtlasStats {
    pub fn from_records(records: &[AtlasRecord], canvas_width: u32, canvas_height: u32) -> Self {
        let canvas_area = canvas_width as u64 * canvas_height as u64;
        let used_area: u64 = records.iter().map(|r| r.rect().area()).sum();
        let occupancy = if canvas_area > 0 {
            used_area as f64 / canvas_area as f64
        } else {
            0.0
        };
        Self {
            num_tiles: records.len(),
            canvas_width,
            canvas_height,
            canvas_area,
            used_area,
            occupancy,
        }
    }

    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Tiles: {}, Canvas: {}x{}, Occupancy: {:.2}%, Used Area: {} px², Wasted: {} px² ({:.2}%)",
            self.num_tiles,
            self.canvas_width,
            self.canvas_height,
            self.occupancy * 100.0,
            self.used_area,
            self.wasted_area(),
            self.waste_percentage(),
        )
    }

    /// Returns wasted space in pixels.
    pub fn wasted_area(&self) -> u64 {
        self.canvas_area.saturating_sub(self.used_area)
    }

    /// Returns wasted space as a percentage (0.0 to 100.0).
    pub fn waste_percentage(&self) -> f64 {
        if self.canvas_area > 0 {
            (self.wasted_area() as f64 / self.canvas_area as f64) * 100.0
        } else {
            0.0
        }
    }
}
