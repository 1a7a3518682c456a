//! # Calling Thread Context
//!
//! Accessors for the calling thread's own UTCB registers.
//!
//! Finding the UTCB is platform business (a segment register, a TLS
//! pointer, a fixed address). The platform installs a locator once at
//! startup; every accessor here goes through it. Without a locator, or
//! on a thread that has no UTCB, accessors fail with
//! [`ThreadError::ContextUnavailable`].
//!
//! These never enter the kernel. Other threads' associations are read
//! through [`ThreadController`](crate::ThreadController).

use crate::{ThreadError, ThreadId, ThreadResult, Utcb, Word};
use spin::Once;

/// Returns the calling thread's UTCB, if it has one
pub type UtcbLocator = fn() -> Option<&'static Utcb>;

static LOCATOR: Once<UtcbLocator> = Once::new();

/// Install the platform's UTCB locator
///
/// Only the first call takes effect. Returns `true` if `locator` is now
/// the installed one.
pub fn install_locator(locator: UtcbLocator) -> bool {
    let installed = *LOCATOR.call_once(|| {
        log::debug!("utcb locator installed");
        locator
    });
    installed as usize == locator as usize
}

/// The calling thread's UTCB
pub fn current() -> ThreadResult<&'static Utcb> {
    LOCATOR
        .get()
        .and_then(|locate| locate())
        .ok_or(ThreadError::ContextUnavailable)
}

/// Global id of the calling thread
pub fn myself() -> ThreadResult<ThreadId> {
    Ok(current()?.my_global_id())
}

/// Local id of the calling thread
pub fn my_local_id() -> ThreadResult<ThreadId> {
    Ok(current()?.my_local_id())
}

/// Processor the calling thread runs on
pub fn processor_no() -> ThreadResult<Word> {
    Ok(current()?.processor_no())
}

/// Pager of the calling thread
pub fn pager() -> ThreadResult<ThreadId> {
    Ok(current()?.pager())
}

/// Set the pager of the calling thread
pub fn set_pager(pager: ThreadId) -> ThreadResult<()> {
    current()?.set_pager(pager);
    Ok(())
}

/// Exception handler of the calling thread
pub fn exception_handler() -> ThreadResult<ThreadId> {
    Ok(current()?.exception_handler())
}

/// Set the exception handler of the calling thread
pub fn set_exception_handler(handler: ThreadId) -> ThreadResult<()> {
    current()?.set_exception_handler(handler);
    Ok(())
}

/// User-defined handle of the calling thread
pub fn user_defined_handle() -> ThreadResult<Word> {
    Ok(current()?.user_defined_handle())
}

/// Set the user-defined handle of the calling thread
pub fn set_user_defined_handle(handle: Word) -> ThreadResult<()> {
    current()?.set_user_defined_handle(handle);
    Ok(())
}

/// Error code left by the calling thread's last failed kernel call
pub fn error_code() -> ThreadResult<Word> {
    Ok(current()?.error_code())
}

/// Transfer timeouts of the calling thread
pub fn xfer_timeouts() -> ThreadResult<Word> {
    Ok(current()?.xfer_timeouts())
}

/// Set the transfer timeouts of the calling thread
pub fn set_xfer_timeouts(timeouts: Word) -> ThreadResult<()> {
    current()?.set_xfer_timeouts(timeouts);
    Ok(())
}

/// Receiver the last send was addressed to
pub fn intended_receiver() -> ThreadResult<ThreadId> {
    Ok(current()?.intended_receiver())
}

/// Sender of the last received message
pub fn actual_sender() -> ThreadResult<ThreadId> {
    Ok(current()?.actual_sender())
}

/// Sender to present for the next propagated send
pub fn set_virtual_sender(sender: ThreadId) -> ThreadResult<()> {
    current()?.set_virtual_sender(sender);
    Ok(())
}

/// Word size mask of the calling thread
pub fn word_size_mask() -> ThreadResult<Word> {
    Ok(current()?.word_size_mask())
}

/// Reset the word size mask to all ones
pub fn reset_word_size_mask() -> ThreadResult<()> {
    current()?.reset_word_size_mask();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    fn bind() -> &'static Utcb {
        testing::bind_utcb(Utcb::new(
            ThreadId::global(70, 1),
            ThreadId::local(0x10_0200),
            2,
        ))
    }

    // =========================================================================
    // Locator
    // =========================================================================

    #[test]
    fn test_unbound_thread_has_no_context() {
        bind();
        let result = std::thread::spawn(|| (myself(), set_pager(ThreadId::NIL)))
            .join()
            .unwrap();
        assert_eq!(result.0, Err(ThreadError::ContextUnavailable));
        assert_eq!(result.1, Err(ThreadError::ContextUnavailable));
    }

    #[test]
    fn test_locator_is_installed_once() {
        fn nowhere() -> Option<&'static Utcb> {
            None
        }
        bind();
        assert!(!install_locator(nowhere));
        assert!(current().is_ok());
    }

    // =========================================================================
    // Registers
    // =========================================================================

    #[test]
    fn test_identity_registers() {
        bind();
        assert_eq!(myself(), Ok(ThreadId::global(70, 1)));
        assert_eq!(my_local_id(), Ok(ThreadId::local(0x10_0200)));
        assert_eq!(processor_no(), Ok(2));
        assert_eq!(intended_receiver(), Ok(ThreadId::NIL));
        assert_eq!(actual_sender(), Ok(ThreadId::NIL));
        assert_eq!(error_code(), Ok(0));
    }

    #[test]
    fn test_association_registers() {
        let utcb = bind();
        let pager_id = ThreadId::global(64, 1);
        let handler = ThreadId::global(65, 1);

        set_pager(pager_id).unwrap();
        set_exception_handler(handler).unwrap();
        set_user_defined_handle(0xbeef).unwrap();

        assert_eq!(pager(), Ok(pager_id));
        assert_eq!(exception_handler(), Ok(handler));
        assert_eq!(user_defined_handle(), Ok(0xbeef));
        assert_eq!(utcb.pager(), pager_id);
    }

    #[test]
    fn test_transfer_registers() {
        let utcb = bind();
        let sender = ThreadId::global(66, 1);

        set_xfer_timeouts(0x1234).unwrap();
        set_virtual_sender(sender).unwrap();
        assert_eq!(xfer_timeouts(), Ok(0x1234));
        assert_eq!(utcb.virtual_sender(), sender);

        assert_eq!(word_size_mask(), Ok(!0));
        reset_word_size_mask().unwrap();
        assert_eq!(word_size_mask(), Ok(!0));
    }
}
