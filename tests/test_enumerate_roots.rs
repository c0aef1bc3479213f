//! End-to-end decoding of hand-encoded oop maps into the roots of a frame.

use oopmap::{
    collect_roots, Address, Error, FrameConvention, FrameRoot, OopMap, OopMapBuilder, RootSlot,
    ValueKind,
};

fn addr(raw: usize) -> Address {
    Address::from_usize(raw)
}

fn reference(slot: RootSlot, kind: ValueKind) -> FrameRoot {
    FrameRoot::Reference { slot, kind }
}

#[test]
fn stack_and_register_oops() {
    // Oop at stack 8, NarrowOop at stack 16, Oop in R3.
    let data = [0x00, 0x10, 0x01, 0x20, 0x80, 0x03];
    let map = OopMap::new(0x40, 3, &data);
    let roots = collect_roots(&map, addr(0x1000), FrameConvention::BYTES).unwrap();
    assert_eq!(
        roots,
        vec![
            reference(RootSlot::Memory(addr(0x1008)), ValueKind::Oop),
            reference(RootSlot::Memory(addr(0x1010)), ValueKind::NarrowOop),
            reference(RootSlot::Register(oopmap::Register::new(3)), ValueKind::Oop),
        ]
    );
}

#[test]
fn derived_pointer() {
    // Oop at stack 24, then a pointer 4 bytes into the object it references.
    let mut builder = OopMapBuilder::new(0x10);
    builder
        .set_oop(oopmap::Location::Stack(24))
        .set_derived_oop(oopmap::Location::Stack(24), 4);
    let buf = builder.finish();
    let roots = collect_roots(&buf.as_oop_map(), addr(0x2000), FrameConvention::BYTES).unwrap();
    assert_eq!(
        roots,
        vec![
            reference(RootSlot::Memory(addr(0x2018)), ValueKind::Oop),
            FrameRoot::Derived {
                base: addr(0x2018),
                derived: addr(0x201c)
            },
        ]
    );
}

#[test]
fn empty_map() {
    let map = OopMap::new(0, 0, &[]);
    assert_eq!(
        collect_roots(&map, addr(0x1000), FrameConvention::BYTES),
        Ok(vec![])
    );
}

#[test]
fn count_larger_than_data() {
    let data = [0x00, 0x10, 0x01, 0x20];
    let map = OopMap::new(0, 3, &data);
    assert_eq!(
        collect_roots(&map, addr(0x1000), FrameConvention::BYTES),
        Err(Error::OmvCountMismatch {
            declared: 3,
            decoded: 2,
            trailing: 0
        })
    );
}

#[test]
fn count_smaller_than_data() {
    let data = [0x00, 0x10, 0x01, 0x20];
    let map = OopMap::new(0, 1, &data);
    assert_eq!(
        collect_roots(&map, addr(0x1000), FrameConvention::BYTES),
        Err(Error::OmvCountMismatch {
            declared: 1,
            decoded: 1,
            trailing: 2
        })
    );
}

#[test]
fn continuation_bit_on_last_byte() {
    let data = [0x00, 0x90];
    let map = OopMap::new(0, 1, &data);
    assert_eq!(
        collect_roots(&map, addr(0x1000), FrameConvention::BYTES),
        Err(Error::MalformedEncoding { offset: 1 })
    );
}

#[test]
fn scaled_and_negated_offsets() {
    // Stack offsets in 8-byte slots, growing down from the frame base.
    let data = [0x00, 0x02, 0x01, 0x03];
    let map = OopMap::new(0, 2, &data);
    let convention = FrameConvention::new(8, true);
    let roots = collect_roots(&map, addr(0x1000), convention).unwrap();
    assert_eq!(
        roots,
        vec![
            reference(RootSlot::Memory(addr(0x0ff8)), ValueKind::Oop),
            reference(RootSlot::Memory(addr(0x1010)), ValueKind::NarrowOop),
        ]
    );
}

#[test]
fn repeated_enumeration_is_identical() {
    let data = [0x00, 0x10, 0x81, 0x05, 0x03, 0x30, 0x08];
    let map = OopMap::new(0, 3, &data);
    let first = collect_roots(&map, addr(0x4000), FrameConvention::BYTES).unwrap();
    let second = collect_roots(&map, addr(0x4000), FrameConvention::BYTES).unwrap();
    assert_eq!(first.len(), 3);
    assert_eq!(first, second);
}
