use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{Rng, SeedableRng};
use slice_trace::render::{self, RenderMode, RenderOptions, Viewport};
use std::fmt::Write;

// Slicer-style text: `layers` layers of concentric, slightly noisy rings.
fn generate_log(layers: usize, rings: usize, points: usize) -> String {
    let mut rng = rand::rngs::StdRng::seed_from_u64(42);
    let mut out = String::new();
    for layer in 0..layers {
        writeln!(out, "layer {layer}").unwrap();
        for ring in 0..rings {
            let r = 5_000.0 + ring as f64 * 2_000.0;
            for i in 0..points {
                let a = i as f64 / points as f64 * std::f64::consts::TAU;
                let jitter: f64 = rng.gen_range(-50.0..50.0);
                let x = (100_000.0 + (r + jitter) * a.cos()) as i64;
                let y = (100_000.0 + (r + jitter) * a.sin()) as i64;
                writeln!(out, "{x} {y}").unwrap();
            }
            out.push('\n');
        }
    }
    out
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    group.sample_size(10);

    for layers in [10, 100].iter() {
        let text = generate_log(*layers, 4, 200);
        group.bench_with_input(BenchmarkId::new("layers", layers), &text, |b, text| {
            b.iter(|| slice_trace::parse(text));
        });
    }
    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let trace = slice_trace::parse(&generate_log(1, 8, 400));
    let layer = &trace.layers[0];

    let mut group = c.benchmark_group("render_layer");
    group.sample_size(10);

    for mode in [RenderMode::Scatter, RenderMode::Outline, RenderMode::Fill] {
        let opts = RenderOptions::new().with_size(1024, 1024).with_mode(mode);
        let vp = Viewport::fit(layer.bounds().unwrap(), opts.width, opts.height, opts.margin);
        group.bench_with_input(BenchmarkId::new("mode", mode), &opts, |b, opts| {
            b.iter(|| render::render_layer(layer, &vp, opts).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_parse, bench_render);
criterion_main!(benches);
