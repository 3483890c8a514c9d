//! Benchmarks for the restoration chain and compositing
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use face_enhance::composite::composite;
use face_enhance::filters::{bilateral_filter, clahe_luma, detail_enhance};
use face_enhance::{restore, ParameterSet, Rect, RestoreMode};
use image::{Rgb, RgbImage};

/// Synthetic textured image
fn generate_test_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let v = ((x * 3 + y * 5) % 120) as u8 + 60;
        Rgb([v, v.saturating_sub(20), 255 - v])
    })
}

fn bench_filters(c: &mut Criterion) {
    let mut group = c.benchmark_group("filters");

    for size in [128u32, 256, 512].iter() {
        let image = generate_test_image(*size, *size);
        group.throughput(Throughput::Elements(u64::from(size * size)));

        group.bench_with_input(BenchmarkId::new("bilateral", size), &image, |b, img| {
            b.iter(|| bilateral_filter(black_box(img), 7, 55.0, 55.0));
        });
        group.bench_with_input(BenchmarkId::new("detail_enhance", size), &image, |b, img| {
            b.iter(|| detail_enhance(black_box(img), 8.0, 0.08));
        });
        group.bench_with_input(BenchmarkId::new("clahe", size), &image, |b, img| {
            b.iter(|| clahe_luma(black_box(img), 1.2));
        });
    }

    group.finish();
}

fn bench_restore(c: &mut Criterion) {
    let mut group = c.benchmark_group("restore");
    group.sample_size(10);

    let params = ParameterSet::default();
    let crop = generate_test_image(64, 80);

    for scale in [2u32, 4].iter() {
        group.bench_with_input(BenchmarkId::new("face_crop", scale), scale, |b, &s| {
            b.iter(|| restore(black_box(&crop), &params, RestoreMode::FaceCrop, s, None));
        });
    }

    group.finish();
}

fn bench_composite(c: &mut Criterion) {
    let base = generate_test_image(256, 256);
    let restored = generate_test_image(320, 400);
    let roi = Rect::new(96, 78, 80, 100);

    c.bench_function("composite_80x100", |b| {
        b.iter(|| composite(black_box(&base), black_box(&restored), roi));
    });
}

criterion_group!(benches, bench_filters, bench_restore, bench_composite);
criterion_main!(benches);
