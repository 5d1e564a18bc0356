use crate::model::Tile;
use image::RgbaImage;

/// Copy all of `src` into `canvas` with its top-left corner at (dx, dy).
///
/// Rows are copied verbatim (no blending) and clipped to the canvas.
pub fn blit_rgba(src: &RgbaImage, canvas: &mut RgbaImage, dx: u32, dy: u32) {
    let (cw, ch) = canvas.dimensions();
    let (sw, sh) = src.dimensions();
    if dx >= cw || dy >= ch {
        return;
    }
    let w = sw.min(cw - dx) as usize;
    let h = sh.min(ch - dy);

    let src_stride = sw as usize * 4;
    let dst_stride = cw as usize * 4;
    let row_bytes = w * 4;
    let src_raw = src.as_raw();
    let dst: &mut [u8] = canvas;
    for row in 0..h as usize {
        let s = row * src_stride;
        let d = (dy as usize + row) * dst_stride + dx as usize * 4;
        dst[d..d + row_bytes].copy_from_slice(&src_raw[s..s + row_bytes]);
    }
}

/// Builds the atlas canvas: fully transparent, with every placed tile copied
/// at its placement origin using the tile's own (unpadded) size.
pub fn compose_canvas(width: u32, height: u32, tiles: &[Tile]) -> RgbaImage {
    let mut canvas = RgbaImage::new(width, height);
    for tile in tiles {
        if let Some(p) = tile.placement() {
            blit_rgba(tile.pixels(), &mut canvas, p.x, p.y);
        }
    }
    canvas
}
