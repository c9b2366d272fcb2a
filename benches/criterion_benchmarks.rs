use cachemap::{ByteEq, Cache, CacheConfig, Fnv1a64, NoopDestroy};
use core::num::NonZeroU32;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn make_cache(cap: u32, key_size: u32) -> Cache<Fnv1a64, ByteEq, NoopDestroy> {
    let config = CacheConfig {
        capacity: NonZeroU32::new(cap).unwrap(),
        key_size,
        alignment: 4,
    };
    Cache::with_capacity(config, Fnv1a64, ByteEq, NoopDestroy).unwrap()
}

pub fn criterion_benchmark(c: &mut Criterion) {
    const CACHE_SIZE: u32 = 1000;
    let mut group = c.benchmark_group("Cache Operations");

    {
        let mut cache = make_cache(CACHE_SIZE, 4);
        for i in 0..CACHE_SIZE {
            cache.lookup_or_insert(&i.to_le_bytes(), true);
        }

        group.bench_function("lookup hit", |b| {
            b.iter(|| {
                for i in 0..100u32 {
                    black_box(cache.lookup(&(i % CACHE_SIZE).to_le_bytes()));
                }
            });
        });

        group.bench_function("lookup miss", |b| {
            b.iter(|| {
                for i in 0..100u32 {
                    black_box(cache.lookup(&(i + CACHE_SIZE).to_le_bytes()));
                }
            });
        });

        group.bench_function("lookup_or_insert existing key", |b| {
            b.iter(|| {
                for i in 0..100u32 {
                    black_box(cache.lookup_or_insert(&(i % CACHE_SIZE).to_le_bytes(), true));
                }
            });
        });
    }

    {
        let mut cache = make_cache(CACHE_SIZE, 4);
        group.bench_function("lookup_or_insert fills then evicts", |b| {
            b.iter(|| {
                for i in 0..(CACHE_SIZE * 2) {
                    black_box(cache.lookup_or_insert(&i.to_le_bytes(), true));
                }
            });
        });
    }

    {
        fn same_bucket(_key: &[u8], _cap: u32) -> u32 {
            0
        }
        let mut chained: Cache<fn(&[u8], u32) -> u32, ByteEq, NoopDestroy> =
            Cache::new(4, same_bucket, ByteEq, NoopDestroy).unwrap();
        let (index_bytes, slot_bytes) = chained.set_capacity(64).unwrap();
        chained
            .set_buffers(
                vec![0u32; index_bytes / 4].into_boxed_slice(),
                vec![0u8; slot_bytes].into_boxed_slice(),
            )
            .unwrap();

        group.bench_function("lookup_or_insert single-bucket collision chain", |b| {
            b.iter(|| {
                for i in 0..64u32 {
                    black_box(chained.lookup_or_insert(&i.to_le_bytes(), true));
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
