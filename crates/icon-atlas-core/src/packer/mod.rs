//! Placement of tiles on a width-bounded canvas.

pub mod shelf;
pub mod spans;

pub use shelf::ShelfPacker;
pub use spans::SpanList;

/// Extra columns added to every tile after the first, keeping a visible gap
/// between neighbours once the canvas is block-compressed. The pad is part
/// of the stored placement width.
pub const PLACEMENT_PAD: u32 = 1;

/// The emitted canvas height is a multiple of this.
pub const HEIGHT_ALIGNMENT: u32 = 4;

/// Rounds `v` up to the next multiple of `align`.
pub fn align_up(v: u32, align: u32) -> u32 {
    v.div_ceil(align) * align
}
