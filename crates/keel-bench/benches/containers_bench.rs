//! Container operation benchmarks: ordered tree vs hash table vs array.

use criterion::{criterion_group, criterion_main, Criterion};
use keel_bench::keys;
use keel_core::{Array, HashSet, Set};

const N: usize = 4096;

fn bench_set_insert(c: &mut Criterion) {
    let input = keys(N, 1);
    c.bench_function("set_insert_4k", |b| {
        b.iter(|| {
            let mut set: Set<u64> = Set::new();
            for &k in &input {
                set.insert(k);
            }
            criterion::black_box(set.len())
        });
    });
}

fn bench_set_iterate(c: &mut Criterion) {
    let input = keys(N, 2);
    let mut set: Set<u64> = Set::new();
    for &k in &input {
        set.insert(k);
    }
    c.bench_function("set_iterate_4k", |b| {
        b.iter(|| {
            let mut sum = 0u64;
            for &v in set.iter() {
                sum = sum.wrapping_add(v);
            }
            criterion::black_box(sum)
        });
    });
}

fn bench_hash_insert_find(c: &mut Criterion) {
    let input = keys(N, 3);
    c.bench_function("hash_set_insert_4k", |b| {
        b.iter(|| {
            let mut set: HashSet<u64> = HashSet::new();
            for &k in &input {
                set.insert(k);
            }
            criterion::black_box(set.len())
        });
    });

    let mut set: HashSet<u64> = HashSet::new();
    for &k in &input {
        set.insert(k);
    }
    c.bench_function("hash_set_find_4k", |b| {
        b.iter(|| {
            let mut hits = 0usize;
            for k in &input {
                hits += usize::from(set.contains(k));
            }
            criterion::black_box(hits)
        });
    });
}

fn bench_array_append(c: &mut Criterion) {
    let input = keys(N, 4);
    c.bench_function("array_append_4k", |b| {
        b.iter(|| {
            let mut a: Array<u64> = Array::new();
            for &k in &input {
                a.append(k);
            }
            criterion::black_box(a.len())
        });
    });
}

criterion_group!(
    benches,
    bench_set_insert,
    bench_set_iterate,
    bench_hash_insert_find,
    bench_array_append
);
criterion_main!(benches);
