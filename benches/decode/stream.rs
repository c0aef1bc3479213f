//! Benchmarks for decoding compressed integers and oop map values.

use criterion::Criterion;
use oopmap::util::compressed_stream::{CompressedReadStream, CompressedWriteStream};
use oopmap::KindMask;
use std::hint::black_box;

const NUM_INTS: usize = 4096;

pub fn bench(c: &mut Criterion) {
    c.bench_function("compressed_stream_read_uint", |b| {
        let mut stream = CompressedWriteStream::with_capacity(NUM_INTS * 2);
        for i in 0..NUM_INTS as u64 {
            // Mix of one, two and three byte encodings.
            stream.write_uint(i * i);
        }
        let bytes = stream.into_bytes();

        b.iter(|| {
            let mut reader = CompressedReadStream::new(black_box(&bytes));
            let mut checksum = 0u64;
            while !reader.is_at_end() {
                checksum ^= reader.read_uint().unwrap_or_default();
            }
            black_box(checksum);
        });
    });

    c.bench_function("oop_map_decode_256", |b| {
        let buf = super::typical_map(256);
        let map = buf.as_oop_map();
        b.iter(|| {
            let decoded = black_box(map).iter().filter(|value| value.is_ok()).count();
            black_box(decoded);
        });
    });

    c.bench_function("oop_map_decode_256_oops_only", |b| {
        let buf = super::typical_map(256);
        let map = buf.as_oop_map();
        b.iter(|| {
            let decoded = black_box(map).with_mask(KindMask::OOPS).count();
            black_box(decoded);
        });
    });
}
