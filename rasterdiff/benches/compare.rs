use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use rasterdiff::{diff, Dimensions, Pipeline, ReportEmitter};

/// Deterministic drift pattern: mostly small differences, some zeros.
fn rasters(dims: Dimensions) -> (Vec<f32>, Vec<f32>) {
    let len = dims.pixel_count();
    let golden: Vec<f32> = (0..len).map(|i| ((i % 97) as f32) * 0.37).collect();
    let comparison: Vec<f32> = golden
        .iter()
        .enumerate()
        .map(|(i, v)| v * (1.0 + ((i % 13) as f32 - 6.0) * 1e-5))
        .collect();
    (golden, comparison)
}

fn bench_compare(c: &mut Criterion) {
    let mut group = c.benchmark_group("compare");
    for side in [256u32, 1024, 2048] {
        let dims = Dimensions::new(side, side);
        let (golden, comparison) = rasters(dims);
        group.throughput(Throughput::Elements(dims.pixel_count() as u64));

        group.bench_with_input(BenchmarkId::new("diff_pass", side), &dims, |b, dims| {
            b.iter(|| {
                let out = diff::compute::<Vec<u8>>(
                    black_box(&golden),
                    black_box(&comparison),
                    dims.width,
                    None,
                )
                .unwrap();
                black_box(out.bad_pixel_count)
            })
        });

        group.bench_with_input(BenchmarkId::new("full", side), &dims, |b, dims| {
            b.iter(|| {
                let mut report = ReportEmitter::new(std::io::sink());
                let result = Pipeline::default()
                    .compare(black_box(&golden), black_box(&comparison), *dims, &mut report)
                    .unwrap();
                black_box(result.stats.count_nonzero)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_compare);
criterion_main!(benches);
