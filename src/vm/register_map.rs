//! Where the registers of a caller frame were spilled by its callees.
//!
//! A frame's oop map may say that a reference lives in a register. By the time a stack walker
//! reaches that frame, the register may have been overwritten by a callee that saved it first;
//! the callee's oop map has a [`ValueKind::CalleeSaved`] entry saying where. Walking frames from
//! the youngest, [`RegisterMap::update`] records those spill slots, and older frames resolve
//! their register roots through the map.

use std::collections::HashMap;

use crate::error::Result;
use crate::oop_map::{KindMask, Location, OopMap, OopMapValue, ValueKind};
use crate::root_enumerator::RootSlot;
use crate::util::Address;
use crate::vm::{FrameConvention, Register};

/// Spill locations of callee-saved registers, keyed by register.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterMap {
    locations: HashMap<Register, Address>,
}

impl RegisterMap {
    /// An empty map: every register still holds its own value.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `register` was spilled to `slot`.
    pub fn set_location(&mut self, register: Register, slot: Address) {
        self.locations.insert(register, slot);
    }

    /// The slot `register` was spilled to, if any.
    pub fn location(&self, register: Register) -> Option<Address> {
        self.locations.get(&register).copied()
    }

    /// Number of registers with a known spill slot.
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// Is no register spilled?
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Forget every spill slot, e.g. before walking another thread.
    pub fn clear(&mut self) {
        self.locations.clear()
    }

    /// Replace a register slot by its spill slot if it has one.
    pub fn resolve(&self, slot: RootSlot) -> RootSlot {
        match slot {
            RootSlot::Register(reg) => self.location(reg).map_or(slot, RootSlot::Memory),
            memory => memory,
        }
    }

    /// Record the callee-saved registers of the frame based at `frame_base` whose safepoint is
    /// described by `map`. Returns how many registers were recorded.
    ///
    /// A register saved into another register takes over that register's spill slot if it has
    /// one, and is otherwise not recorded.
    ///
    /// # Errors
    /// The first decoding error. The map is left unchanged in that case.
    pub fn update(
        &mut self,
        map: &OopMap,
        frame_base: Address,
        convention: FrameConvention,
    ) -> Result<usize> {
        let saved: Vec<OopMapValue> = map
            .with_mask(KindMask::NONE.with(ValueKind::CalleeSaved))
            .collect::<Result<_>>()?;

        let mut recorded = 0;
        for value in saved {
            let OopMapValue::CalleeSaved { location, saved } = value else {
                continue;
            };
            let slot = match location {
                Location::Stack(offset) => Some(convention.slot_address(frame_base, offset)),
                Location::Register(holder) => self.location(holder),
            };
            if let Some(slot) = slot {
                trace!("{} saved at {}", saved, slot);
                self.set_location(saved, slot);
                recorded += 1;
            }
        }
        Ok(recorded)
    }
}
