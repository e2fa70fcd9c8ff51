//! Criterion benchmarks for chain planning, grid resolution and one
//! recorded frame.
#![allow(missing_docs)]

use ascii_post::effect::chain::ChainPlan;
use ascii_post::effect::{
    AsciiRenderFeature, AspectRatio, ResolutionResolver, ScreenEffect,
};
use ascii_post::host::recording::RecordingHost;
use ascii_post::host::{SurfaceDesc, TextureId};
use ascii_post::options::EffectSettings;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::UVec2;

fn target(width: u32, height: u32) -> SurfaceDesc {
    SurfaceDesc::new(width, height, wgpu::TextureFormat::Rgba8UnormSrgb)
}

fn chain_plan_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain_plan");

    for (width, height) in [(640, 480), (1920, 1080), (3840, 2160)] {
        let _ = group.bench_function(format!("{width}x{height}"), |b| {
            b.iter(|| {
                black_box(ChainPlan::new(black_box(target(width, height)), 8))
            });
        });
    }
    group.finish();
}

fn resolution_benchmark(c: &mut Criterion) {
    let mut resolver = ResolutionResolver::new();
    let surface = UVec2::new(1920, 1080);

    let _ = c.bench_function("resolve_cached", |b| {
        b.iter(|| {
            black_box(resolver.resolve(
                black_box(surface),
                128,
                AspectRatio::SixteenToNine,
                false,
            ))
        });
    });

    let mut columns = 0u32;
    let _ = c.bench_function("resolve_changing_columns", |b| {
        b.iter(|| {
            columns = columns % 1024 + 1;
            black_box(resolver.resolve(
                surface,
                columns,
                AspectRatio::OneToOne,
                true,
            ))
        });
    });
}

fn recorded_frame_benchmark(c: &mut Criterion) {
    let mut effect = AsciiRenderFeature::new(EffectSettings {
        iterations: 4,
        ..EffectSettings::default()
    });
    effect.set_font_texture(Some(TextureId(0)));
    // Materials are created on the first frame and belong to this host.
    let mut host = RecordingHost::new();

    let _ = c.bench_function("recorded_frame_1080p", |b| {
        b.iter(|| {
            let _ = effect.configure(&mut host, target(1920, 1080));
            let report = effect.execute(&mut host).ok();
            let released = effect.cleanup(&mut host);
            black_box((report, released, host.take_commands().len()))
        });
    });
}

criterion_group!(
    benches,
    chain_plan_benchmark,
    resolution_benchmark,
    recorded_frame_benchmark
);
criterion_main!(benches);
