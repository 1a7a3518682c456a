//! # Control Words
//!
//! The control word tells `ExchangeRegisters` which registers to write,
//! whether to deliver the current values, how to change the run state of
//! the target, and which in-flight IPC phase to cancel.
//!
//! Every word the thread subsystem issues comes from a constructor in this
//! module. Raw words from elsewhere go through [`ControlWord::checked`].

use crate::{ThreadError, ThreadResult, Word};
use bitflags::bitflags;

bitflags! {
    /// `ExchangeRegisters` control word
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ControlWord: Word {
        /// Halt (set) or resume (clear); only honoured with `HALT_VALID`
        const HALT = 1 << 0;
        /// Cancel a pending receive
        const ABORT_RECEIVE = 1 << 1;
        /// Cancel a pending send
        const ABORT_SEND = 1 << 2;
        /// Write the stack pointer
        const SET_SP = 1 << 3;
        /// Write the instruction pointer
        const SET_IP = 1 << 4;
        /// Write the flags register
        const SET_FLAGS = 1 << 5;
        /// Write the user-defined handle
        const SET_USER_HANDLE = 1 << 6;
        /// Write the pager
        const SET_PAGER = 1 << 7;
        /// The `HALT` bit carries a run-state change
        const HALT_VALID = 1 << 8;
        /// Deliver the current register values
        const DELIVER = 1 << 9;
        /// Ctrlxfer item: configuration (shares the deliver bit)
        const CTRLXFER_CONF = 1 << 9;
        /// Ctrlxfer item: read
        const CTRLXFER_READ = 1 << 10;
        /// Ctrlxfer item: write
        const CTRLXFER_WRITE = 1 << 11;
        /// Exception handler association
        const EXCEPTION_HANDLER = 1 << 12;
        /// Scheduler association
        const SCHEDULER = 1 << 13;
    }
}

impl ControlWord {
    /// Select nothing, change nothing; identity probe
    pub const QUERY: Self = Self::empty();

    /// Both IPC phases
    pub const ABORT_IPC: Self = Self::ABORT_RECEIVE.union(Self::ABORT_SEND);

    /// The register writes a resume may carry
    pub const REGISTERS: Self = Self::SET_SP.union(Self::SET_IP).union(Self::SET_FLAGS);

    /// All ctrlxfer item bits
    pub const CTRLXFER_ITEMS: Self = Self::CTRLXFER_CONF
        .union(Self::CTRLXFER_READ)
        .union(Self::CTRLXFER_WRITE);

    /// Read back the associations (pager, handle) without changing them
    pub const READ_ASSOCIATIONS: Self = Self::DELIVER;

    /// Replace the user-defined handle
    pub const WRITE_USER_HANDLE: Self = Self::SET_USER_HANDLE;

    /// Replace the pager
    pub const WRITE_PAGER: Self = Self::SET_PAGER;

    /// Resume the target, cancelling any IPC, writing the selected registers
    pub const fn resume(writes: &RegisterWrite) -> Self {
        Self::HALT_VALID
            .union(Self::ABORT_IPC)
            .union(writes.selection())
    }

    /// Halt the target after cancelling `abort`, delivering its registers
    pub const fn halt(abort: AbortIpc) -> Self {
        Self::HALT
            .union(Self::HALT_VALID)
            .union(Self::DELIVER)
            .union(abort.selection())
    }

    /// Toggle one ctrlxfer item
    ///
    /// [`CtrlXferItem::Conf`] on its own encodes as the deliver word; see
    /// [`Self::toggles_ctrlxfer`].
    pub const fn ctrlxfer(item: CtrlXferItem) -> Self {
        item.selection()
    }

    /// Validate a raw control word
    ///
    /// Rejects words that cancel an IPC phase or set `HALT` without
    /// `HALT_VALID`; the kernel would silently ignore the run-state part of
    /// such a word. Unknown bits are kept as-is.
    pub fn checked(raw: Word) -> ThreadResult<Self> {
        let word = Self::from_bits_retain(raw);
        let run_bits = Self::HALT.union(Self::ABORT_IPC);
        if word.intersects(run_bits) && !word.contains(Self::HALT_VALID) {
            return Err(ThreadError::InvalidControl(raw));
        }
        Ok(word)
    }

    /// Does this word change the run state?
    #[inline]
    pub const fn changes_run_state(self) -> bool {
        self.contains(Self::HALT_VALID)
    }

    /// Does this word halt the target?
    #[inline]
    pub const fn halts(self) -> bool {
        self.contains(Self::HALT_VALID.union(Self::HALT))
    }

    /// Is this word made of ctrlxfer items only?
    #[inline]
    pub const fn is_ctrlxfer_only(self) -> bool {
        !self.is_empty() && Self::CTRLXFER_ITEMS.contains(self)
    }

    /// Does this word toggle ctrlxfer items?
    ///
    /// `CTRLXFER_CONF` alone is the same word as [`Self::READ_ASSOCIATIONS`]
    /// and reads as a plain deliver; a toggle needs `CTRLXFER_READ` or
    /// `CTRLXFER_WRITE` in the word.
    #[inline]
    pub const fn toggles_ctrlxfer(self) -> bool {
        self.is_ctrlxfer_only()
            && self.intersects(Self::CTRLXFER_READ.union(Self::CTRLXFER_WRITE))
    }
}

/// Which in-flight IPC phase to cancel before halting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AbortIpc {
    /// Leave any IPC alone
    #[default]
    None,
    /// Cancel a pending receive; a pending send completes normally
    Receive,
    /// Cancel a pending send; a pending receive completes normally
    Send,
    /// Cancel both phases
    Both,
}

impl AbortIpc {
    /// Control-word bits for this phase selection
    pub const fn selection(self) -> ControlWord {
        match self {
            AbortIpc::None => ControlWord::empty(),
            AbortIpc::Receive => ControlWord::ABORT_RECEIVE,
            AbortIpc::Send => ControlWord::ABORT_SEND,
            AbortIpc::Both => ControlWord::ABORT_IPC,
        }
    }
}

/// Ctrlxfer configuration item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtrlXferItem {
    /// Configuration item
    Conf,
    /// Read item
    Read,
    /// Write item
    Write,
}

impl CtrlXferItem {
    /// Control-word bit for this item
    pub const fn selection(self) -> ControlWord {
        match self {
            CtrlXferItem::Conf => ControlWord::CTRLXFER_CONF,
            CtrlXferItem::Read => ControlWord::CTRLXFER_READ,
            CtrlXferItem::Write => ControlWord::CTRLXFER_WRITE,
        }
    }
}

/// Register values written by a resume
///
/// Fields left `None` are not selected in the control word and keep
/// whatever value the target already has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegisterWrite {
    /// New stack pointer
    pub sp: Option<Word>,
    /// New instruction pointer
    pub ip: Option<Word>,
    /// New flags register
    pub flags: Option<Word>,
}

impl RegisterWrite {
    /// Write nothing
    pub const fn none() -> Self {
        Self { sp: None, ip: None, flags: None }
    }

    /// Write stack and instruction pointer
    pub const fn sp_ip(sp: Word, ip: Word) -> Self {
        Self { sp: Some(sp), ip: Some(ip), flags: None }
    }

    /// Write stack pointer, instruction pointer and flags
    pub const fn sp_ip_flags(sp: Word, ip: Word, flags: Word) -> Self {
        Self { sp: Some(sp), ip: Some(ip), flags: Some(flags) }
    }

    /// Replace the flags value
    pub const fn with_flags(mut self, flags: Word) -> Self {
        self.flags = Some(flags);
        self
    }

    /// Control-word bits selecting the present fields
    pub const fn selection(&self) -> ControlWord {
        let mut word = ControlWord::empty();
        if self.sp.is_some() {
            word = word.union(ControlWord::SET_SP);
        }
        if self.ip.is_some() {
            word = word.union(ControlWord::SET_IP);
        }
        if self.flags.is_some() {
            word = word.union(ControlWord::SET_FLAGS);
        }
        word
    }
}
