pub mod roots;
pub mod stream;

use oopmap::{Location, OopMapBuf, OopMapValue, Register};

/// A map shaped like the ones a JIT emits for a large method: mostly stack oops, some in
/// registers, a few derived pointers and callee-saved registers.
pub fn typical_map(values: usize) -> OopMapBuf {
    let values = (0..values).map(|i| {
        let slot = (i as isize) * 8;
        match i % 8 {
            0..=3 => OopMapValue::Oop(Location::Stack(slot)),
            4 => OopMapValue::NarrowOop(Location::Stack(slot)),
            5 => OopMapValue::Oop(Location::Register(Register::new((i % 16) as u16))),
            6 => OopMapValue::Derived {
                base: Location::Stack(slot - 48),
                offset: 16,
            },
            _ => OopMapValue::CalleeSaved {
                location: Location::Stack(-slot),
                saved: Register::new((i % 16) as u16),
            },
        }
    });
    OopMapBuf::from_values(0x100, values)
}
