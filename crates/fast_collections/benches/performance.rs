use std::collections::HashMap;
use std::hint::black_box;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fast_collections::{FastMap, FastSequence, FastTable};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

const SIZES: [usize; 4] = [100, 1_000, 10_000, 100_000];

fn push_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("push");
    for n in SIZES {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("fast_table", n), &n, |b, &n| {
            b.iter(|| {
                let mut table = FastTable::new();
                for i in 0..n {
                    table.push(i).unwrap();
                }
                black_box(table)
            })
        });
        group.bench_with_input(BenchmarkId::new("vec", n), &n, |b, &n| {
            b.iter(|| {
                let mut vec = Vec::new();
                for i in 0..n {
                    vec.push(i);
                }
                black_box(vec)
            })
        });
        group.bench_with_input(BenchmarkId::new("fast_sequence", n), &n, |b, &n| {
            b.iter(|| {
                let mut sequence = FastSequence::new();
                for i in 0..n {
                    sequence.push_back(i).unwrap();
                }
                black_box(sequence)
            })
        });
    }
    group.finish();
}

fn map_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("map");
    for n in SIZES {
        let mut rng = ChaCha8Rng::seed_from_u64(n as u64);
        let keys: Vec<u64> = (0..n).map(|_| rng.random()).collect();
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("fast_map_put", n), &keys, |b, keys| {
            b.iter(|| {
                let mut map = FastMap::new();
                for &key in keys {
                    map.put(key, key).unwrap();
                }
                black_box(map)
            })
        });
        group.bench_with_input(BenchmarkId::new("hash_map_insert", n), &keys, |b, keys| {
            b.iter(|| {
                let mut map = HashMap::new();
                for &key in keys {
                    map.insert(key, key);
                }
                black_box(map)
            })
        });

        let map: FastMap<u64, u64> = keys.iter().map(|&key| (key, key)).collect();
        group.bench_with_input(BenchmarkId::new("fast_map_get", n), &keys, |b, keys| {
            b.iter(|| {
                for key in keys {
                    black_box(map.get(key));
                }
            })
        });
    }
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default()
                .warm_up_time(Duration::from_millis(500))
                .measurement_time(Duration::from_millis(3000));
    targets = push_benchmark, map_benchmark
);
criterion_main!(benches);
