//! # Kernel Boundary
//!
//! The two raw thread primitives, expressed as a trait so the thread
//! subsystem can run against a real kernel or the simulated one.
//!
//! ## ExchangeRegisters
//!
//! | Input    | Output                        |
//! |----------|-------------------------------|
//! | target   | result (other id form or nil) |
//! | control  | previous control / state      |
//! | sp       | sp                            |
//! | ip       | ip                            |
//! | flags    | flags                         |
//! | handle   | user-defined handle           |
//! | pager    | pager                         |
//!
//! ## ThreadControl
//!
//! `(dest, space, scheduler, pager, utcb_location) -> error word`, zero on
//! success.

use crate::{ControlWord, ThreadId, Word};

/// UTCB location meaning "keep the current placement"
pub const UTCB_UNCHANGED: Word = !0;

/// Arguments of an `ExchangeRegisters` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeArgs {
    /// Target thread, global or local
    pub target: ThreadId,
    /// Selection and run-state control
    pub control: ControlWord,
    /// Stack pointer, used with `SET_SP`
    pub sp: Word,
    /// Instruction pointer, used with `SET_IP`
    pub ip: Word,
    /// Flags, used with `SET_FLAGS`
    pub flags: Word,
    /// User-defined handle, used with `SET_USER_HANDLE`
    pub handle: Word,
    /// Pager, used with `SET_PAGER`
    pub pager: ThreadId,
}

impl ExchangeArgs {
    /// Arguments carrying only a target and control word
    pub const fn new(target: ThreadId, control: ControlWord) -> Self {
        Self {
            target,
            control,
            sp: 0,
            ip: 0,
            flags: 0,
            handle: 0,
            pager: ThreadId::NIL,
        }
    }

    /// Set the register values
    pub const fn registers(mut self, sp: Word, ip: Word, flags: Word) -> Self {
        self.sp = sp;
        self.ip = ip;
        self.flags = flags;
        self
    }

    /// Set the user-defined handle value
    pub const fn handle(mut self, handle: Word) -> Self {
        self.handle = handle;
        self
    }

    /// Set the pager value
    pub const fn pager(mut self, pager: ThreadId) -> Self {
        self.pager = pager;
        self
    }
}

/// Result of an `ExchangeRegisters` call
///
/// Fields a caller does not need are simply not read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExchangeOutput {
    /// The target's id in the other form; nil on failure
    pub result: ThreadId,
    /// Previous control word, state bits in the low three bits
    pub control: Word,
    /// Stack pointer
    pub sp: Word,
    /// Instruction pointer
    pub ip: Word,
    /// Flags
    pub flags: Word,
    /// User-defined handle
    pub handle: Word,
    /// Pager
    pub pager: ThreadId,
}

impl ExchangeOutput {
    /// Did the kernel accept the call?
    #[inline]
    pub const fn succeeded(&self) -> bool {
        !self.result.is_nil()
    }
}

/// Arguments of a `ThreadControl` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadControlArgs {
    /// Thread to reconfigure
    pub dest: ThreadId,
    /// Thread naming the address space
    pub space: ThreadId,
    /// New scheduler, nil for unchanged
    pub scheduler: ThreadId,
    /// New pager, nil for unchanged
    pub pager: ThreadId,
    /// New UTCB location, [`UTCB_UNCHANGED`] to keep it
    pub utcb_location: Word,
}

impl ThreadControlArgs {
    /// Rebind the pager of `dest`, touching nothing else
    pub const fn repage(dest: ThreadId, pager: ThreadId) -> Self {
        Self {
            dest,
            space: dest,
            scheduler: ThreadId::NIL,
            pager,
            utcb_location: UTCB_UNCHANGED,
        }
    }
}

/// The raw kernel primitives
///
/// Implementations perform exactly one kernel entry per call and never
/// retry. All failure information comes from the kernel.
pub trait Kernel {
    /// Exchange the register/state bundle of a thread
    fn exchange_registers(&self, args: ExchangeArgs) -> ExchangeOutput;

    /// Reconfigure a thread's space, scheduler, pager or UTCB placement
    ///
    /// Returns zero on success, otherwise an error code.
    fn thread_control(&self, args: ThreadControlArgs) -> Word;

    /// Error code left by the last failed call of the calling thread
    fn error_code(&self) -> Word;
}

impl<K: Kernel + ?Sized> Kernel for &K {
    fn exchange_registers(&self, args: ExchangeArgs) -> ExchangeOutput {
        (**self).exchange_registers(args)
    }

    fn thread_control(&self, args: ThreadControlArgs) -> Word {
        (**self).thread_control(args)
    }

    fn error_code(&self) -> Word {
        (**self).error_code()
    }
}
