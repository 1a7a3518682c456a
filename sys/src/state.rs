//! # Thread State
//!
//! Status bits the kernel reports in the returned control word of an
//! `ExchangeRegisters` call. They describe the target *before* the call.

use crate::Word;
use bitflags::bitflags;

bitflags! {
    /// Pre-call status of the target thread
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ThreadState: Word {
        /// Thread was halted
        const HALTED = 1 << 0;
        /// Thread was blocked in a receive
        const RECEIVING = 1 << 1;
        /// Thread was blocked in a send
        const SENDING = 1 << 2;
    }
}

impl ThreadState {
    /// Either IPC phase
    pub const IPCING: Self = Self::RECEIVING.union(Self::SENDING);

    /// Decode from a returned control word, dropping unrelated bits
    #[inline]
    pub const fn from_control(raw: Word) -> Self {
        Self::from_bits_truncate(raw)
    }

    /// Was the thread halted?
    #[inline]
    pub const fn was_halted(self) -> bool {
        self.contains(Self::HALTED)
    }

    /// Was the thread receiving?
    #[inline]
    pub const fn was_receiving(self) -> bool {
        self.contains(Self::RECEIVING)
    }

    /// Was the thread sending?
    #[inline]
    pub const fn was_sending(self) -> bool {
        self.contains(Self::SENDING)
    }

    /// Was the thread in either IPC phase?
    #[inline]
    pub const fn was_ipcing(self) -> bool {
        self.intersects(Self::IPCING)
    }
}
