//! Randomly generated oop maps, encoded with the builder and decoded back.

use oopmap::{
    Error, KindMask, Location, OopMap, OopMapBuf, OopMapReader, OopMapSetWriter, OopMapValue,
    Register, ValueKind,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn random_location(rng: &mut ChaCha8Rng) -> Location {
    if rng.random_bool(0.25) {
        Location::Register(Register::new(rng.random_range(0..=u16::MAX)))
    } else {
        Location::Stack(rng.random_range(-4096i64..4096) as isize)
    }
}

fn random_value(rng: &mut ChaCha8Rng) -> OopMapValue {
    let location = random_location(rng);
    match rng.random_range(0..5) {
        0 => OopMapValue::Oop(location),
        1 => OopMapValue::NarrowOop(location),
        2 => OopMapValue::CalleeSaved {
            location,
            saved: Register::new(rng.random_range(0..64)),
        },
        3 => OopMapValue::Derived {
            base: location,
            offset: rng.random_range(i64::MIN..=i64::MAX) as isize,
        },
        _ => OopMapValue::Dead(location),
    }
}

fn random_values(rng: &mut ChaCha8Rng, len: usize) -> Vec<OopMapValue> {
    (0..len).map(|_| random_value(rng)).collect()
}

#[test]
fn decode_matches_builder() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x0a7_3a95);
    for _ in 0..200 {
        let len = rng.random_range(0..64);
        let values = random_values(&mut rng, len);
        let buf = OopMapBuf::from_values(rng.random(), values.iter().copied());
        let map = buf.as_oop_map();
        assert_eq!(map.omv_count() as usize, len);
        assert_eq!(map.values().unwrap(), values);
    }
}

#[test]
fn truncation_never_yields_roots_silently() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x7e57);
    for _ in 0..200 {
        let len = rng.random_range(1..32);
        let buf = OopMapBuf::from_values(0, random_values(&mut rng, len));
        let full = buf.as_oop_map();
        let cut = rng.random_range(0..full.omv_data_size());
        let truncated = OopMap::new(0, full.omv_count(), &full.omv_data()[..cut]);
        match truncated.values() {
            Err(Error::OmvCountMismatch { declared, .. }) => assert_eq!(declared, len),
            Err(Error::MalformedEncoding { offset }) => assert!(offset < cut),
            other => panic!("truncated map decoded as {:?}", other),
        }
    }
}

#[test]
fn image_round_trip() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x1a6e);
    let mut pcs: Vec<u32> = (0..100).map(|_| rng.random_range(0..0x10000)).collect();
    pcs.sort_unstable();
    pcs.dedup();
    let maps: Vec<OopMapBuf> = pcs
        .iter()
        .map(|&pc| {
            let len = rng.random_range(0..16);
            OopMapBuf::from_values(pc, random_values(&mut rng, len))
        })
        .collect();
    let image = OopMapSetWriter::default().write(&maps).unwrap();
    let set = OopMapReader::default().read_set(&image).unwrap();
    assert_eq!(set.len(), maps.len());
    for (read, written) in set.iter().zip(&maps) {
        assert_eq!(*read, written.as_oop_map());
    }
}

/// The mask hides values of other kinds but yields the ones of its kind in order.
macro_rules! mask_test {
    ($kind:ident) => {
        paste::paste! {
            #[test]
            fn [<mask_only_ $kind:snake>]() {
                let mut rng = ChaCha8Rng::seed_from_u64(ValueKind::$kind as u64);
                let values = random_values(&mut rng, 48);
                let buf = OopMapBuf::from_values(0, values.iter().copied());
                let masked: Vec<OopMapValue> = buf
                    .as_oop_map()
                    .with_mask(KindMask::NONE.with(ValueKind::$kind))
                    .collect::<Result<_, _>>()
                    .unwrap();
                let expected: Vec<OopMapValue> = values
                    .into_iter()
                    .filter(|value| value.kind() == ValueKind::$kind)
                    .collect();
                assert_eq!(masked, expected);
            }
        }
    };
}

mask_test!(Oop);
mask_test!(NarrowOop);
mask_test!(CalleeSaved);
mask_test!(Derived);
mask_test!(Dead);
