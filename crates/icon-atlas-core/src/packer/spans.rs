use crate::model::Rect;

/// Occupied canvas regions, kept sorted by bottom edge.
///
/// Spans never overlap. A span may cover several tiles that were placed
/// side by side on the same row with the same height.
#[derive(Debug, Default, Clone)]
pub struct SpanList {
    spans: Vec<Rect>,
}

impl SpanList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn as_slice(&self) -> &[Rect] {
        &self.spans
    }

    /// Index of the first span reaching below row `y`. Spans before it end
    /// at or above `y` and cannot touch anything placed at `y` or lower.
    fn first_below(&self, y: u32) -> usize {
        self.spans.partition_point(|s| s.bottom_edge() <= y)
    }

    /// First span in storage order that overlaps `rect`.
    pub fn first_overlap(&self, rect: &Rect) -> Option<Rect> {
        let start = self.first_below(rect.y);
        self.spans[start..].iter().find(|s| s.intersects(rect)).copied()
    }

    /// Records `rect` as occupied. Returns true if it was merged into the
    /// span ending exactly at `rect.x` on the same row.
    pub fn claim(&mut self, rect: Rect) -> bool {
        let bottom = rect.bottom_edge();
        let lo = self.spans.partition_point(|s| s.bottom_edge() < bottom);
        let hi = self.spans.partition_point(|s| s.bottom_edge() <= bottom);

        if let Some(left) = self.spans[lo..hi]
            .iter_mut()
            .find(|s| s.y == rect.y && s.right_edge() == rect.x)
        {
            left.w += rect.w;
            return true;
        }
        self.spans.insert(hi, rect);
        false
    }
}
