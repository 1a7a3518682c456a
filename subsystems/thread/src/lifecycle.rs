//! # Thread Lifecycle
//!
//! Starting and stopping threads.
//!
//! ## States
//!
//! ```text
//!            start                stop(None)
//!   any ──────────────▶ Running ──────────────▶ Halted
//!
//!   Receiving ── stop(Receive | Both) ──▶ Halted
//!   Receiving ── stop(Send)           ──▶ Receiving (halts once the receive ends)
//!   Sending   ── stop(Send | Both)    ──▶ Halted
//! ```
//!
//! `start` always cancels both IPC phases, matching the kernel encoding of
//! a resume.

use crate::{
    AbortIpc, ControlWord, ExchangeArgs, ExchangeOutput, Kernel, RegisterWrite, ThreadController,
    ThreadId, ThreadResult, ThreadState, Word,
};

/// User registers captured when a thread was stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegisterSnapshot {
    /// Stack pointer
    pub sp: Word,
    /// Instruction pointer
    pub ip: Word,
    /// Flags register
    pub flags: Word,
}

impl RegisterSnapshot {
    fn from_output(out: &ExchangeOutput) -> Self {
        Self {
            sp: out.sp,
            ip: out.ip,
            flags: out.flags,
        }
    }

    /// Register writes putting these values back
    pub const fn restore(&self) -> RegisterWrite {
        RegisterWrite::sp_ip_flags(self.sp, self.ip, self.flags)
    }
}

/// Result of a capturing stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stopped {
    /// State before the stop
    pub state: ThreadState,
    /// Registers at the moment of halting
    pub registers: RegisterSnapshot,
}

impl<K: Kernel> ThreadController<K> {
    /// Resume `thread`, writing the registers present in `writes`
    ///
    /// Registers left out keep their current values; starting a thread for
    /// the first time without a stack and instruction pointer is only valid
    /// if the creator already set them.
    pub fn start(&self, thread: ThreadId, writes: RegisterWrite) -> ThreadResult<()> {
        let args = ExchangeArgs::new(thread, ControlWord::resume(&writes)).registers(
            writes.sp.unwrap_or(0),
            writes.ip.unwrap_or(0),
            writes.flags.unwrap_or(0),
        );
        self.exchange(args)?;
        Ok(())
    }

    /// Halt `thread` after cancelling the IPC phases in `abort`
    ///
    /// Returns the state the thread was in before the call. Aborting a
    /// phase the thread is not in leaves its IPC alone; the thread is still
    /// halted.
    pub fn stop(&self, thread: ThreadId, abort: AbortIpc) -> ThreadResult<ThreadState> {
        let out = self.halt(thread, abort)?;
        Ok(ThreadState::from_control(out.control))
    }

    /// Like [`stop`](Self::stop), also capturing sp, ip and flags
    pub fn stop_capture(&self, thread: ThreadId, abort: AbortIpc) -> ThreadResult<Stopped> {
        let out = self.halt(thread, abort)?;
        Ok(Stopped {
            state: ThreadState::from_control(out.control),
            registers: RegisterSnapshot::from_output(&out),
        })
    }

    fn halt(&self, thread: ThreadId, abort: AbortIpc) -> ThreadResult<ExchangeOutput> {
        self.exchange(ExchangeArgs::new(thread, ControlWord::halt(abort)))
    }
}
