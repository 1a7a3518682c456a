//! # Simulator Configuration

use helix_l4_sys::Word;

/// Simulated kernel configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimConfig {
    /// Number of interrupt pseudo-threads (thread numbers `0..count`)
    pub interrupt_count: Word,
    /// First thread number handed to user threads
    pub first_user_thread: Word,
    /// Version stamped into every global id
    pub version: Word,
    /// Start of the UTCB area in every address space
    pub utcb_area_base: Word,
    /// Size of the UTCB area in bytes
    pub utcb_area_size: Word,
    /// Size of one UTCB slot in bytes
    pub utcb_size: Word,
}

impl SimConfig {
    /// Number of UTCB slots per address space
    ///
    /// Zero when the slot size is zero.
    pub const fn utcb_slots(&self) -> Word {
        match self.utcb_area_size.checked_div(self.utcb_size) {
            Some(slots) => slots,
            None => 0,
        }
    }

    /// Is `location` the start of a UTCB slot?
    pub const fn is_utcb_slot(&self, location: Word) -> bool {
        let Some(offset) = location.checked_sub(self.utcb_area_base) else {
            return false;
        };
        match offset.checked_rem(self.utcb_size) {
            Some(rem) => offset < self.utcb_area_size && rem == 0,
            None => false,
        }
    }

    /// Location of UTCB slot `index`, if it fits in the address space
    pub const fn utcb_slot(&self, index: Word) -> Option<Word> {
        match index.checked_mul(self.utcb_size) {
            Some(offset) => self.utcb_area_base.checked_add(offset),
            None => None,
        }
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            interrupt_count: 32,
            first_user_thread: 64,
            version: 1,
            utcb_area_base: 0x0010_0000,
            utcb_area_size: 0x0001_0000,
            utcb_size: 0x200,
        }
    }
}
