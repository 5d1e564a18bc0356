use super::{HEIGHT_ALIGNMENT, PLACEMENT_PAD, SpanList, align_up};
use crate::config::AtlasConfig;
use crate::error::{AtlasError, Result};
use crate::model::Rect;
use tracing::trace;

/// Next-fit shelf packer.
///
/// Tiles are placed in the order they are offered. The first tile seeds the
/// occupied set at its anchor. Every later tile starts at its own anchor,
/// slides right past whatever it hits, and drops to the next row (by the
/// smallest clearance seen on the current one) when it runs out of width.
/// Adjacent placements of equal height on one row collapse into one span,
/// which keeps the span list short.
pub struct ShelfPacker {
    max_width: u32,
    max_height: u32,
    spans: SpanList,
    used_height: u32,
    placed: usize,
}

impl ShelfPacker {
    pub fn new(cfg: &AtlasConfig) -> Self {
        Self {
            max_width: cfg.max_width,
            max_height: cfg.max_height,
            spans: SpanList::new(),
            used_height: 0,
            placed: 0,
        }
    }

    /// Places a `w x h` tile and returns its stored placement.
    ///
    /// Every tile after the first is widened by [`PLACEMENT_PAD`].
    pub fn place(&mut self, id: &str, anchor: (u32, u32), w: u32, h: u32) -> Result<Rect> {
        let rect = if self.placed == 0 {
            self.seed(id, anchor, w, h)?
        } else {
            self.fit(id, anchor, w.saturating_add(PLACEMENT_PAD), h)?
        };
        self.spans.claim(rect);
        self.used_height = self.used_height.max(rect.bottom_edge());
        self.placed += 1;
        Ok(rect)
    }

    fn seed(&self, id: &str, anchor: (u32, u32), w: u32, h: u32) -> Result<Rect> {
        let (x, y) = anchor;
        if x.saturating_add(w) > self.max_width || y.saturating_add(h) > self.max_height {
            return Err(self.overflow(id, Rect::new(x, y, w, h)));
        }
        Ok(Rect::new(x, y, w, h))
    }

    fn fit(&self, id: &str, anchor: (u32, u32), w: u32, h: u32) -> Result<Rect> {
        let (x, y) = anchor;
        if w > self.max_width || y >= self.max_height {
            return Err(self.overflow(id, Rect::new(0, y, w, h)));
        }
        let mut cand = Rect::new(x, y, w, h);
        if x.saturating_add(w) > self.max_width {
            cand.x = 0;
        }

        // Smallest distance from the current row down to the bottom of a
        // span hit on this row.
        let mut clearance: Option<u32> = None;
        while let Some(span) = self.spans.first_overlap(&cand) {
            let drop = span.bottom_edge() - cand.y;
            let step = clearance.map_or(drop, |c| c.min(drop));
            cand.x = span.right_edge();
            if cand.right_edge() > self.max_width {
                trace!(id, from = cand.y, step, "wrap to next row");
                cand.x = 0;
                cand.y += step;
                clearance = None;
                if cand.y >= self.max_height {
                    break;
                }
            } else {
                clearance = Some(step);
            }
        }

        if cand.bottom_edge() > self.max_height {
            return Err(self.overflow(id, cand));
        }
        Ok(cand)
    }

    fn overflow(&self, id: &str, rect: Rect) -> AtlasError {
        AtlasError::PlacementOverflow {
            id: id.to_string(),
            rect,
            max_width: self.max_width,
            max_height: self.max_height,
        }
    }

    /// Occupied regions in storage (bottom-edge) order.
    pub fn spans(&self) -> &[Rect] {
        self.spans.as_slice()
    }

    pub fn span_count(&self) -> usize {
        self.spans.len()
    }

    /// Largest placement bottom edge so far.
    pub fn used_height(&self) -> u32 {
        self.used_height
    }

    /// Height of the emitted canvas: the used height rounded up to
    /// [`HEIGHT_ALIGNMENT`].
    pub fn canvas_height(&self) -> u32 {
        align_up(self.used_height, HEIGHT_ALIGNMENT)
    }

    pub fn canvas_width(&self) -> u32 {
        self.max_width
    }

    pub fn placed(&self) -> usize {
        self.placed
    }
}
