use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;
use tessera::prelude::*;

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut r = SmallRng::seed_from_u64(0);
    let dims = [64usize, 64, 64];
    let n: usize = dims.iter().product();
    let data: Vec<f64> = (0..n)
        .map(|t| {
            let (i, j, k) = (t % 64, (t / 64) % 64, t / 4096);
            (i as f64 * 0.1).sin() + (j as f64 * 0.07).cos() + k as f64 * 0.01
                + r.gen::<f64>() * 1e-3
        })
        .collect();
    let field = Field::new(&data, &dims).unwrap();

    let mut group = c.benchmark_group("driver");
    group.throughput(Throughput::Bytes((n * 8) as u64));

    for rate in [4.0, 8.0, 16.0] {
        let config = Config::fixed_rate(rate, 3);
        let mut dst = vec![0 as StreamWord; maximum_size::<f64>(&config, &dims) / (STREAM_WORD_BITS / 8)];
        group.bench_function(format!("compress_rate_{}", rate), |b| {
            b.iter(|| compress(&config, black_box(&field), &mut dst).unwrap())
        });

        let (stream, _) = compress_to_words(&config, &field).unwrap();
        let mut out = vec![0.0f64; n];
        group.bench_function(format!("decompress_rate_{}", rate), |b| {
            b.iter(|| {
                let mut target = FieldMut::new(&mut out, &dims).unwrap();
                decompress(&config, black_box(&stream), &mut target).unwrap()
            })
        });
    }

    let config = Config::reversible();
    let mut dst = vec![0 as StreamWord; maximum_size::<f64>(&config, &dims) / (STREAM_WORD_BITS / 8)];
    group.bench_function("compress_reversible", |b| {
        b.iter(|| compress(&config, black_box(&field), &mut dst).unwrap())
    });
    group.finish();

    let array = Array3::<f64>::with_contents([64, 64, 64], 8.0, &data).unwrap();
    let mut group = c.benchmark_group("array");
    group.bench_function("block_order_sweep", |b| {
        b.iter(|| {
            let mut sum = 0.0;
            for cell in array.iter() {
                sum += cell.get();
            }
            black_box(sum)
        })
    });
    group.bench_function("random_get", |b| {
        let mut r = SmallRng::seed_from_u64(1);
        b.iter(|| {
            let coords = [
                r.gen_range(0..64usize),
                r.gen_range(0..64usize),
                r.gen_range(0..64usize),
            ];
            black_box(array.get(coords))
        })
    });
    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
