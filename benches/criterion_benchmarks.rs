//! Throughput microbenchmarks for the two hot, lock-free-of-async-await
//! paths: LRU admission/eviction and ring resolution. Neither benchmark
//! touches the async `Group`/`singleflight` machinery — those are
//! latency-bound by whatever the embedder's loader does, not by this
//! crate's own overhead.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use groupcache_rs::byte_view::ByteView;
use groupcache_rs::lru::Lru;
use groupcache_rs::ring::Ring;

fn lru_add_and_get(c: &mut Criterion) {
    c.bench_function("lru_add_1000_keys", |b| {
        b.iter(|| {
            let mut lru = Lru::new(1 << 20, None);
            for i in 0..1000 {
                lru.add(format!("key-{i}"), ByteView::copy_from(b"some cached value"));
            }
            black_box(&lru);
        });
    });

    c.bench_function("lru_get_hit", |b| {
        let mut lru = Lru::new(1 << 20, None);
        for i in 0..1000 {
            lru.add(format!("key-{i}"), ByteView::copy_from(b"some cached value"));
        }
        b.iter(|| black_box(lru.get("key-500")));
    });
}

fn ring_resolution(c: &mut Criterion) {
    let mut ring = Ring::new(50);
    ring.add((0..32).map(|i| format!("peer-{i}")));

    c.bench_function("ring_get_1000_keys", |b| {
        b.iter(|| {
            for i in 0..1000 {
                black_box(ring.get(&format!("key-{i}")));
            }
        });
    });
}

criterion_group!(benches, lru_add_and_get, ring_resolution);
criterion_main!(benches);
