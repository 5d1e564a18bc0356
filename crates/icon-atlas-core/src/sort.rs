//! Size classification and ordering of tiles before packing.
//!
//! Tiles are ordered ascending by `max(width, height)` with a base-10
//! least-significant-digit radix sort. Every pass is a stable counting sort,
//! so tiles with equal keys keep their input order.

use crate::model::Tile;

const RADIX: u64 = 10;

/// Passes always run, covering keys `0..=9999`.
pub const MIN_RADIX_PASSES: u32 = 4;

/// Number of digit passes needed to order keys up to `max_key`.
///
/// Never fewer than [`MIN_RADIX_PASSES`]; larger keys get one pass per extra
/// decimal digit instead of having their high digits ignored.
pub fn radix_passes(max_key: u32) -> u32 {
    let mut digits = 1;
    let mut rest = max_key as u64 / RADIX;
    while rest > 0 {
        digits += 1;
        rest /= RADIX;
    }
    digits.max(MIN_RADIX_PASSES)
}

/// Stable ascending sort of `items` by `key`, without comparisons.
pub fn radix_sort_by_key<T, F>(items: Vec<T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> u32,
{
    if items.len() < 2 {
        return items;
    }
    let mut keyed: Vec<(u32, T)> = items.into_iter().map(|t| (key(&t), t)).collect();
    let max_key = keyed.iter().map(|(k, _)| *k).max().unwrap_or(0);
    let passes = radix_passes(max_key);

    let mut divisor = 1u64;
    for _ in 0..passes {
        let digit = |k: u32| ((k as u64 / divisor) % RADIX) as usize;

        let mut counts = [0usize; RADIX as usize];
        for (k, _) in &keyed {
            counts[digit(*k)] += 1;
        }
        let mut offsets = [0usize; RADIX as usize];
        let mut total = 0;
        for (bin, count) in counts.iter().enumerate() {
            offsets[bin] = total;
            total += count;
        }

        let mut slots: Vec<Option<(u32, T)>> = (0..keyed.len()).map(|_| None).collect();
        for entry in keyed.drain(..) {
            let bin = digit(entry.0);
            slots[offsets[bin]] = Some(entry);
            offsets[bin] += 1;
        }
        keyed = slots.into_iter().flatten().collect();
        divisor *= RADIX;
    }
    keyed.into_iter().map(|(_, t)| t).collect()
}

/// Orders tiles ascending by [`Tile::sort_key`], stable for equal keys.
pub fn sort_tiles(tiles: Vec<Tile>) -> Vec<Tile> {
    radix_sort_by_key(tiles, Tile::sort_key)
}
