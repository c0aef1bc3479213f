use crate::util::options::Options;
use crate::util::{Address, ByteOffset};

/// How a target turns an oop map stack offset into an address within a frame.
///
/// Compilers record stack locations relative to some frame base (the stack pointer at the
/// safepoint, usually) in units of a stack slot. The unit and direction belong to the target's
/// calling convention, so the enumerator takes them as a parameter.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FrameConvention {
    slot_size: usize,
    negate_offsets: bool,
}

impl FrameConvention {
    /// Offsets are plain byte offsets added to the frame base.
    pub const BYTES: FrameConvention = FrameConvention {
        slot_size: 1,
        negate_offsets: false,
    };

    /// A convention with `slot_size`-byte units, subtracting offsets from the base if
    /// `negate_offsets` is set. A zero slot size is treated as one.
    pub const fn new(slot_size: usize, negate_offsets: bool) -> Self {
        FrameConvention {
            slot_size: if slot_size == 0 { 1 } else { slot_size },
            negate_offsets,
        }
    }

    /// The convention configured by `stack_slot_size` and `negate_stack_offsets`.
    pub fn from_options(options: &Options) -> Self {
        Self::new(options.stack_slot_size, options.negate_stack_offsets)
    }

    /// Bytes per offset unit.
    pub const fn slot_size(&self) -> usize {
        self.slot_size
    }

    /// Byte displacement of stack offset `offset` from the frame base.
    pub const fn displacement(&self, offset: ByteOffset) -> ByteOffset {
        let bytes = offset.wrapping_mul(self.slot_size as ByteOffset);
        if self.negate_offsets {
            bytes.wrapping_neg()
        } else {
            bytes
        }
    }

    /// Address of the stack slot at `offset` in the frame based at `frame_base`.
    pub const fn slot_address(&self, frame_base: Address, offset: ByteOffset) -> Address {
        frame_base.wrapping_offset(self.displacement(offset))
    }
}

impl Default for FrameConvention {
    fn default() -> Self {
        FrameConvention::BYTES
    }
}
