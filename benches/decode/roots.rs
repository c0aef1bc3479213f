//! Benchmarks for turning oop maps into frame roots.

use criterion::Criterion;
use oopmap::{
    scan_frame, Address, FrameConvention, FrameRoot, OopMapBuf, OopMapReader, OopMapSetWriter,
};
use std::hint::black_box;

const NUM_MAPS: u32 = 512;

pub fn bench(c: &mut Criterion) {
    c.bench_function("scan_frame_256", |b| {
        let buf = super::typical_map(256);
        let map = buf.as_oop_map();
        let frame_base = Address::from_usize(0x7fff_0000);
        b.iter(|| {
            let mut checksum = 0usize;
            let scanned = scan_frame(
                &map,
                black_box(frame_base),
                FrameConvention::BYTES,
                None,
                &mut |root: FrameRoot| {
                    checksum ^= root.slot().address().map_or(0, Address::as_usize);
                },
            );
            black_box((scanned, checksum));
        });
    });

    c.bench_function("oop_map_set_lookup", |b| {
        let template = super::typical_map(8);
        let values = template.as_oop_map().values().unwrap_or_default();
        let maps: Vec<_> = (0..NUM_MAPS)
            .map(|i| OopMapBuf::from_values(i * 16, values.iter().copied()))
            .collect();
        let image = OopMapSetWriter::default()
            .write(&maps)
            .unwrap_or_else(|e| panic!("failed to write benchmark image: {e}"));
        let set = OopMapReader::default()
            .read_set(&image)
            .unwrap_or_else(|e| panic!("failed to read benchmark image: {e}"));

        b.iter(|| {
            let mut found = 0usize;
            for pc in (0..NUM_MAPS * 16).step_by(4) {
                found += set.find_map_at_offset(black_box(pc)).is_ok() as usize;
            }
            black_box(found);
        });
    });
}
