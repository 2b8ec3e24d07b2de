//! Criterion benchmarks for ttlmemo: cached reads, recomputation, contended reads.

use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use ttlmemo_cell::{MonotonicClock, Ttl, TtlCell};

fn bench_fresh_hit(c: &mut Criterion) {
    let cell = TtlCell::new();
    let clock = MonotonicClock;
    cell.get(|| Ok::<_, ()>(42u64), Ttl::Forever, &clock).unwrap();

    let mut g = c.benchmark_group("fresh_hit");
    g.throughput(Throughput::Elements(1));
    g.bench_function("forever", |b| {
        b.iter(|| black_box(cell.get(|| Ok::<_, ()>(0u64), Ttl::Forever, &clock)).unwrap());
    });
    g.bench_function("finite_ttl", |b| {
        b.iter(|| black_box(cell.get(|| Ok::<_, ()>(0u64), Ttl::from_secs(3600), &clock)).unwrap());
    });
    g.finish();
}

fn bench_recompute(c: &mut Criterion) {
    let cell = TtlCell::new();
    let clock = MonotonicClock;
    let counter = AtomicU64::new(0);

    let mut g = c.benchmark_group("recompute");
    g.throughput(Throughput::Elements(1));
    g.bench_function("zero_ttl", |b| {
        b.iter(|| {
            black_box(cell.get(
                || Ok::<_, ()>(counter.fetch_add(1, Ordering::Relaxed)),
                Ttl::from_millis(0),
                &clock,
            ))
            .unwrap()
        });
    });
    g.finish();
}

fn bench_contended_hit(c: &mut Criterion) {
    let cell = TtlCell::new();
    let clock = MonotonicClock;
    cell.get(|| Ok::<_, ()>(String::from("cached")), Ttl::Forever, &clock).unwrap();

    let mut g = c.benchmark_group("contended_hit");
    g.throughput(Throughput::Elements(4 * 1_000));
    g.bench_function("4_threads_x_1000", |b| {
        b.iter(|| {
            thread::scope(|s| {
                for _ in 0..4 {
                    s.spawn(|| {
                        for _ in 0..1_000 {
                            black_box(cell.get(|| Ok::<_, ()>(String::new()), Ttl::Forever, &clock)).unwrap();
                        }
                    });
                }
            });
        });
    });
    g.finish();
}

criterion_group!(benches, bench_fresh_hit, bench_recompute, bench_contended_hit);
criterion_main!(benches);
