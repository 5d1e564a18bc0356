use icon_atlas_core::compositing::{blit_rgba, compose_canvas};
use icon_atlas_core::prelude::*;
use image::{Rgba, RgbaImage};

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

fn solid(id: &str, w: u32, h: u32, c: Rgba<u8>) -> Tile {
    Tile::new(id, RgbaImage::from_pixel(w, h, c))
}

#[test]
fn tiles_land_at_their_placements_unpadded() {
    let cfg = AtlasConfig::builder().with_max_dimensions(32, 4096).build();
    let tiles = vec![
        solid("red", 4, 4, RED),
        solid("green", 3, 2, GREEN),
        solid("blue", 2, 5, BLUE),
    ];
    let out = pack_atlas(tiles, &AtlasJob::fresh("colors"), &cfg).expect("pack");

    assert_eq!(out.canvas.dimensions(), (32, 8));
    assert_eq!((out.width, out.height), (32, 8));
    let rects: Vec<Rect> = out.records.iter().map(|r| r.rect()).collect();
    assert_eq!(rects[0], Rect::new(0, 0, 4, 4));
    assert_eq!(rects[1], Rect::new(4, 0, 4, 2));
    assert_eq!(rects[2], Rect::new(8, 0, 3, 5));

    for (rect, color, (w, h)) in [
        (rects[0], RED, (4, 4)),
        (rects[1], GREEN, (3, 2)),
        (rects[2], BLUE, (2, 5)),
    ] {
        for y in 0..h {
            for x in 0..w {
                assert_eq!(*out.canvas.get_pixel(rect.x + x, rect.y + y), color);
            }
        }
    }

    // Pad columns stay transparent.
    assert_eq!(*out.canvas.get_pixel(7, 0), CLEAR);
    assert_eq!(*out.canvas.get_pixel(10, 0), CLEAR);
    // Below the short green tile and right of everything.
    assert_eq!(*out.canvas.get_pixel(5, 3), CLEAR);
    assert_eq!(*out.canvas.get_pixel(31, 7), CLEAR);
}

#[test]
fn compositing_copies_alpha_without_blending() {
    let half = Rgba([10, 20, 30, 128]);
    let mut a = Tile::new("a", RgbaImage::from_pixel(2, 2, half));
    a = a.with_anchor(1, 1);
    let out = pack_atlas(vec![a], &AtlasJob::fresh("alpha"), &AtlasConfig::default())
        .expect("pack");
    assert_eq!(*out.canvas.get_pixel(1, 1), half);
    assert_eq!(*out.canvas.get_pixel(0, 0), CLEAR);
    assert_eq!(out.height, 4);
}

#[test]
fn blit_clips_to_canvas() {
    let src = RgbaImage::from_pixel(4, 4, RED);
    let mut canvas = RgbaImage::new(3, 3);
    blit_rgba(&src, &mut canvas, 1, 1);
    assert_eq!(*canvas.get_pixel(0, 0), CLEAR);
    assert_eq!(*canvas.get_pixel(1, 1), RED);
    assert_eq!(*canvas.get_pixel(2, 2), RED);

    // Entirely outside: nothing happens.
    blit_rgba(&src, &mut canvas, 5, 0);
    assert_eq!(*canvas.get_pixel(0, 0), CLEAR);
}

#[test]
fn compose_skips_unplaced_tiles() {
    let tiles = vec![solid("loose", 2, 2, RED)];
    let canvas = compose_canvas(4, 4, &tiles);
    assert!(canvas.pixels().all(|p| *p == CLEAR));
}
