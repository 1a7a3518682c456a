//! # Simulated Threads
//!
//! Per-thread state kept by the simulated kernel.

use helix_l4_sys::{ControlWord, ThreadId, ThreadState, Word};

/// IPC phase a thread is blocked in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpcPhase {
    /// Waiting to receive
    Receive,
    /// Waiting to send
    Send,
}

/// State of a thread as seen from outside
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ObservedState {
    /// Neither halted nor blocked
    Running = 0,
    /// Halted with no pending IPC
    Halted = 1,
    /// Blocked in a receive
    Receiving = 2,
    /// Blocked in a send
    Sending = 3,
}

impl ObservedState {
    /// Is the thread blocked in either IPC phase?
    pub fn is_ipcing(&self) -> bool {
        matches!(self, ObservedState::Receiving | ObservedState::Sending)
    }
}

/// Saved user registers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Registers {
    /// Stack pointer
    pub sp: Word,
    /// Instruction pointer
    pub ip: Word,
    /// Flags register
    pub flags: Word,
}

/// Simulated thread control block
#[derive(Debug, Clone)]
pub struct SimThread {
    /// Global id
    pub global: ThreadId,
    /// Local id (UTCB location)
    pub local: ThreadId,
    /// Thread number of the address space's first thread
    pub space: Word,
    /// User registers
    pub registers: Registers,
    /// User-defined handle
    pub handle: Word,
    /// Pager
    pub pager: ThreadId,
    /// Scheduler
    pub scheduler: ThreadId,
    /// Halt flag
    pub halted: bool,
    /// Pending IPC phase
    pub ipc: Option<IpcPhase>,
    /// Ctrlxfer item configuration
    pub ctrlxfer: ControlWord,
    /// May call `ThreadControl`
    pub privileged: bool,
    /// Interrupt pseudo-thread
    pub interrupt: bool,
    /// Error code left by this thread's last failed call
    pub error_code: Word,
}

impl SimThread {
    /// Create a halted thread with cleared registers
    pub fn new(global: ThreadId, local: ThreadId, space: Word) -> Self {
        Self {
            global,
            local,
            space,
            registers: Registers::default(),
            handle: 0,
            pager: ThreadId::NIL,
            scheduler: ThreadId::NIL,
            halted: true,
            ipc: None,
            ctrlxfer: ControlWord::empty(),
            privileged: false,
            interrupt: false,
            error_code: 0,
        }
    }

    /// Status bits reported by `ExchangeRegisters`
    pub fn state_bits(&self) -> ThreadState {
        let mut state = ThreadState::empty();
        if self.halted {
            state |= ThreadState::HALTED;
        }
        match self.ipc {
            Some(IpcPhase::Receive) => state |= ThreadState::RECEIVING,
            Some(IpcPhase::Send) => state |= ThreadState::SENDING,
            None => {}
        }
        state
    }

    /// Externally visible state
    ///
    /// A pending IPC phase wins over the halt flag: a halted thread still
    /// completes the transfer it is blocked in.
    pub fn observe(&self) -> ObservedState {
        match (self.ipc, self.halted) {
            (Some(IpcPhase::Receive), _) => ObservedState::Receiving,
            (Some(IpcPhase::Send), _) => ObservedState::Sending,
            (None, true) => ObservedState::Halted,
            (None, false) => ObservedState::Running,
        }
    }

    /// Cancel the IPC phases selected in `control`
    pub fn abort_ipc(&mut self, control: ControlWord) {
        let cancel = match self.ipc {
            Some(IpcPhase::Receive) => control.contains(ControlWord::ABORT_RECEIVE),
            Some(IpcPhase::Send) => control.contains(ControlWord::ABORT_SEND),
            None => false,
        };
        if cancel {
            self.ipc = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thread() -> SimThread {
        SimThread::new(ThreadId::global(70, 1), ThreadId::local(0x10_0000), 70)
    }

    #[test]
    fn test_new_thread_is_halted() {
        let t = thread();
        assert_eq!(t.observe(), ObservedState::Halted);
        assert_eq!(t.state_bits(), ThreadState::HALTED);
    }

    #[test]
    fn test_ipc_wins_over_halt() {
        let mut t = thread();
        t.ipc = Some(IpcPhase::Receive);
        assert_eq!(t.observe(), ObservedState::Receiving);
        assert!(t.state_bits().was_receiving());
        assert!(t.state_bits().was_halted());
    }

    #[test]
    fn test_abort_selects_phase() {
        let mut t = thread();
        t.ipc = Some(IpcPhase::Receive);
        t.abort_ipc(ControlWord::ABORT_SEND);
        assert_eq!(t.ipc, Some(IpcPhase::Receive));
        t.abort_ipc(ControlWord::ABORT_RECEIVE);
        assert_eq!(t.ipc, None);
    }
}
