use criterion::{criterion_group, criterion_main, Criterion};
use image::RgbaImage;
use sketchbook::sketch::model::{BrushCap, Point, Rgba, ToolState};
use sketchbook::sketch::snapshot::Snapshot;
use sketchbook::sketch::surface::Surface;
use std::hint::black_box;

fn zigzag(surface: &mut Surface, tools: &ToolState) {
    surface.begin_stroke(Point::new(0.0, 0.0));
    for i in 1..200 {
        let x = (i * 5) as f32;
        let y = if i % 2 == 0 { 40.0 } else { 560.0 };
        surface.extend_stroke(Point::new(x, y), tools);
    }
}

fn bench_stroke(c: &mut Criterion) {
    let tools = ToolState::new(Rgba::rgba(200, 30, 30, 180), 12, BrushCap::Round);
    c.bench_function("zigzag_stroke_round_12px", |b| {
        b.iter(|| {
            let mut surface = Surface::new(1000, 600);
            zigzag(&mut surface, &tools);
            black_box(surface.end_stroke());
        })
    });
}

fn bench_snapshot(c: &mut Criterion) {
    let tools = ToolState::new(Rgba::BLACK, 5, BrushCap::Flat);
    let mut surface = Surface::new(1000, 600);
    zigzag(&mut surface, &tools);
    let pixels: RgbaImage = surface.pixels().clone();
    c.bench_function("snapshot_capture_1000x600", |b| {
        b.iter(|| black_box(Snapshot::capture(&pixels, None)))
    });
}

criterion_group!(benches, bench_stroke, bench_snapshot);
criterion_main!(benches);
