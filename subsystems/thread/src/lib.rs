//! # Helix L4 Thread Subsystem
//!
//! Typed thread control on top of the two raw L4 primitives:
//!
//! - **Identity**: global/local id conversion, `myself`
//! - **Lifecycle**: start, stop, and stop-with-abort of a thread's IPC
//! - **Associations**: pager, user-defined handle, interrupt binding and
//!   ctrlxfer item configuration
//! - **Context**: the calling thread's own UTCB registers
//!
//! ## Key Principle
//!
//! Every operation is one kernel call, built from a named control word. The
//! kernel is the only judge of whether a call is allowed; failures come
//! back unchanged as [`ThreadError::Kernel`].
//!
//! ## Example
//!
//! ```ignore
//! let threads = ThreadController::new(kernel);
//! let stopped = threads.stop_capture(worker, AbortIpc::Both)?;
//! threads.start(worker, stopped.registers.restore())?;
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

pub mod association;
pub mod error;
pub mod identity;
pub mod lifecycle;
pub mod utcb;

pub use error::error_code_of;
pub use identity::{is_global, is_local};
pub use lifecycle::{RegisterSnapshot, Stopped};

pub use helix_l4_sys::{
    AbortIpc, ControlWord, CtrlXferItem, ErrorCode, ExchangeArgs, ExchangeOutput, Kernel,
    RegisterWrite, ThreadControlArgs, ThreadError, ThreadId, ThreadResult, ThreadState, Utcb,
    Word, UTCB_UNCHANGED,
};

/// Simulated kernel
#[cfg(feature = "sim")]
pub use helix_l4_sim as sim;

/// Thread controller
///
/// Issues thread-control calls through a [`Kernel`] on behalf of the
/// calling thread. It holds no state of its own: two controllers working on
/// the same target race at the kernel, and callers that need exclusivity
/// must serialize externally.
#[derive(Debug, Clone, Copy)]
pub struct ThreadController<K> {
    kernel: K,
}

impl<K: Kernel> ThreadController<K> {
    /// Create a controller over a kernel binding
    pub const fn new(kernel: K) -> Self {
        Self { kernel }
    }

    /// Get the kernel binding
    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    /// Issue one `ExchangeRegisters` call
    ///
    /// The control word is validated with [`ControlWord::checked`] first, so
    /// words built from raw bits are rejected before reaching the kernel.
    /// A nil result means the kernel refused; the reason is read from the
    /// kernel's error channel. A refusal that leaves no code behind is
    /// reported as [`ErrorCode::InvalidThread`].
    pub fn exchange(&self, args: ExchangeArgs) -> ThreadResult<ExchangeOutput> {
        log::trace!(
            "exchange_registers({:?}, control={:#x})",
            args.target,
            args.control.bits()
        );
        ControlWord::checked(args.control.bits())?;
        let out = self.kernel.exchange_registers(args);
        if out.succeeded() {
            return Ok(out);
        }
        let code = match ErrorCode::from_raw(self.kernel.error_code()) {
            ErrorCode::Ok => ErrorCode::InvalidThread,
            code => code,
        };
        log::debug!("exchange_registers({:?}) failed: {}", args.target, code);
        Err(ThreadError::Kernel(code))
    }

    /// Issue one `ThreadControl` call
    pub fn thread_control(&self, args: ThreadControlArgs) -> ThreadResult<()> {
        log::trace!("thread_control({:?})", args);
        match ErrorCode::from_raw(self.kernel.thread_control(args)) {
            ErrorCode::Ok => Ok(()),
            code => {
                log::debug!("thread_control({:?}) failed: {}", args.dest, code);
                Err(ThreadError::Kernel(code))
            }
        }
    }
}


#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use core::cell::Cell;
    use helix_l4_sim::{SimConfig, SimKernel};

    std::thread_local! {
        static TEST_UTCB: Cell<Option<&'static Utcb>> = const { Cell::new(None) };
    }

    fn locate() -> Option<&'static Utcb> {
        TEST_UTCB.with(Cell::get)
    }

    /// Bind a UTCB to the current test thread
    pub fn bind_utcb(utcb: Utcb) -> &'static Utcb {
        utcb::install_locator(locate);
        let leaked: &'static Utcb = Box::leak(Box::new(utcb));
        TEST_UTCB.with(|cell| cell.set(Some(leaked)));
        leaked
    }

    /// Kernel with a privileged root thread and one worker in its space
    pub fn kernel() -> (SimKernel, ThreadId, ThreadId) {
        let kernel = SimKernel::new(SimConfig::default());
        let root = kernel.spawn_space(true).expect("root thread");
        let worker = kernel.spawn_in(root).expect("worker thread");
        (kernel, root, worker)
    }
}
