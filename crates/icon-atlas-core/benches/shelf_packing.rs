use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use icon_atlas_core::prelude::*;
use image::RgbaImage;
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::hint::black_box;

fn generate_sizes(count: usize, min_size: u32, max_size: u32) -> Vec<(String, u32, u32)> {
    let mut rng = StdRng::seed_from_u64(0xA71A5);
    (0..count)
        .map(|i| {
            let w = rng.gen_range(min_size..=max_size);
            let h = rng.gen_range(min_size..=max_size);
            (format!("icon_{}", i), w, h)
        })
        .collect()
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("shelf_layout");
    let cfg = AtlasConfig::builder().with_max_dimensions(2048, 16384).build();

    for count in [100usize, 500, 2000] {
        let sizes = generate_sizes(count, 16, 64);
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("sorted", count), &sizes, |b, sizes| {
            b.iter(|| black_box(pack_layout(sizes.clone(), true, &cfg)))
        });
        group.bench_with_input(BenchmarkId::new("input_order", count), &sizes, |b, sizes| {
            b.iter(|| black_box(pack_layout(sizes.clone(), false, &cfg)))
        });
    }

    group.finish();
}

fn bench_radix_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("radix_sort");

    for count in [1000usize, 10000] {
        let keys: Vec<u32> = generate_sizes(count, 1, 9999)
            .into_iter()
            .map(|(_, w, h)| w.max(h))
            .collect();
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &keys, |b, keys| {
            b.iter(|| black_box(radix_sort_by_key(keys.clone(), |k| *k)))
        });
    }

    group.finish();
}

fn bench_full_atlas(c: &mut Criterion) {
    let mut group = c.benchmark_group("pack_atlas");
    let cfg = AtlasConfig::builder().with_max_dimensions(1024, 8192).build();
    let tiles: Vec<Tile> = generate_sizes(200, 16, 48)
        .into_iter()
        .map(|(id, w, h)| Tile::new(id, RgbaImage::new(w, h)))
        .collect();

    group.bench_function("standard_200", |b| {
        b.iter(|| {
            let job = AtlasJob::fresh("bench").with_sort(true);
            black_box(pack_atlas(tiles.clone(), &job, &cfg))
        })
    });

    group.finish();
}

criterion_group!(benches, bench_layout, bench_radix_sort, bench_full_atlas);
criterion_main!(benches);
