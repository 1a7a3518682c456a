//! # User Thread Control Block
//!
//! Each thread owns one UTCB. The runtime fills in the identity registers
//! once at thread entry; after that only the owning thread writes it.
//! Reading another thread's associations must go through the kernel.

use crate::{ThreadId, Word};
use core::sync::atomic::{AtomicUsize, Ordering};
use static_assertions::{assert_eq_align, assert_eq_size};

/// Per-thread context block
///
/// One word per thread control register. The registers are atomics so a
/// shared `&Utcb` can be written by its owner without `unsafe`.
#[derive(Debug)]
#[repr(C)]
pub struct Utcb {
    my_global_id: AtomicUsize,
    my_local_id: AtomicUsize,
    processor_no: AtomicUsize,
    user_defined_handle: AtomicUsize,
    pager: AtomicUsize,
    exception_handler: AtomicUsize,
    error_code: AtomicUsize,
    xfer_timeouts: AtomicUsize,
    intended_receiver: AtomicUsize,
    actual_sender: AtomicUsize,
    virtual_sender: AtomicUsize,
    word_size_mask: AtomicUsize,
}

assert_eq_size!(Utcb, [Word; 12]);
assert_eq_align!(Utcb, Word);

impl Utcb {
    /// Create the block for a thread entering user space
    pub const fn new(global: ThreadId, local: ThreadId, processor_no: Word) -> Self {
        Self {
            my_global_id: AtomicUsize::new(global.raw()),
            my_local_id: AtomicUsize::new(local.raw()),
            processor_no: AtomicUsize::new(processor_no),
            user_defined_handle: AtomicUsize::new(0),
            pager: AtomicUsize::new(0),
            exception_handler: AtomicUsize::new(0),
            error_code: AtomicUsize::new(0),
            xfer_timeouts: AtomicUsize::new(0),
            intended_receiver: AtomicUsize::new(0),
            actual_sender: AtomicUsize::new(0),
            virtual_sender: AtomicUsize::new(0),
            word_size_mask: AtomicUsize::new(!0),
        }
    }

    #[inline]
    fn load(reg: &AtomicUsize) -> Word {
        reg.load(Ordering::Relaxed)
    }

    #[inline]
    fn store(reg: &AtomicUsize, value: Word) {
        reg.store(value, Ordering::Relaxed);
    }

    /// Global id of the owning thread
    pub fn my_global_id(&self) -> ThreadId {
        ThreadId::from_raw(Self::load(&self.my_global_id))
    }

    /// Local id of the owning thread
    pub fn my_local_id(&self) -> ThreadId {
        ThreadId::from_raw(Self::load(&self.my_local_id))
    }

    /// Processor the owning thread runs on
    pub fn processor_no(&self) -> Word {
        Self::load(&self.processor_no)
    }

    /// User-defined handle
    pub fn user_defined_handle(&self) -> Word {
        Self::load(&self.user_defined_handle)
    }

    /// Set the user-defined handle
    pub fn set_user_defined_handle(&self, handle: Word) {
        Self::store(&self.user_defined_handle, handle);
    }

    /// Pager
    pub fn pager(&self) -> ThreadId {
        ThreadId::from_raw(Self::load(&self.pager))
    }

    /// Set the pager
    pub fn set_pager(&self, pager: ThreadId) {
        Self::store(&self.pager, pager.raw());
    }

    /// Exception handler
    pub fn exception_handler(&self) -> ThreadId {
        ThreadId::from_raw(Self::load(&self.exception_handler))
    }

    /// Set the exception handler
    pub fn set_exception_handler(&self, handler: ThreadId) {
        Self::store(&self.exception_handler, handler.raw());
    }

    /// Error code of the last failed kernel call
    pub fn error_code(&self) -> Word {
        Self::load(&self.error_code)
    }

    /// Record an error code; written by the kernel side
    pub fn set_error_code(&self, code: Word) {
        Self::store(&self.error_code, code);
    }

    /// Transfer timeouts for string copies
    pub fn xfer_timeouts(&self) -> Word {
        Self::load(&self.xfer_timeouts)
    }

    /// Set the transfer timeouts
    pub fn set_xfer_timeouts(&self, timeouts: Word) {
        Self::store(&self.xfer_timeouts, timeouts);
    }

    /// Intended receiver of the last received message
    pub fn intended_receiver(&self) -> ThreadId {
        ThreadId::from_raw(Self::load(&self.intended_receiver))
    }

    /// Actual sender of the last received message
    pub fn actual_sender(&self) -> ThreadId {
        ThreadId::from_raw(Self::load(&self.actual_sender))
    }

    /// Set the virtual sender for the next propagated send
    pub fn set_virtual_sender(&self, sender: ThreadId) {
        Self::store(&self.virtual_sender, sender.raw());
    }

    /// Virtual sender
    pub fn virtual_sender(&self) -> ThreadId {
        ThreadId::from_raw(Self::load(&self.virtual_sender))
    }

    /// Word-size mask for mixed-width address spaces
    pub fn word_size_mask(&self) -> Word {
        Self::load(&self.word_size_mask)
    }

    /// Restore the full word-size mask
    pub fn reset_word_size_mask(&self) {
        Self::store(&self.word_size_mask, !0);
    }
}
