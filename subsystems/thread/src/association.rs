//! # Thread Associations
//!
//! Pager and user-defined handle of other threads, interrupt binding, and
//! ctrlxfer item configuration.
//!
//! The calling thread's own associations live in its UTCB; see
//! [`crate::utcb`].

use crate::{
    ControlWord, CtrlXferItem, ExchangeArgs, Kernel, ThreadControlArgs, ThreadController,
    ThreadId, ThreadResult, Word,
};

impl<K: Kernel> ThreadController<K> {
    /// Pager of `thread`
    ///
    /// A pure read; the target's ctrlxfer configuration is not touched.
    pub fn pager_of(&self, thread: ThreadId) -> ThreadResult<ThreadId> {
        let out = self.exchange(ExchangeArgs::new(thread, ControlWord::READ_ASSOCIATIONS))?;
        Ok(out.pager)
    }

    /// Replace the pager of `thread`
    pub fn set_pager_of(&self, thread: ThreadId, pager: ThreadId) -> ThreadResult<()> {
        self.exchange(ExchangeArgs::new(thread, ControlWord::WRITE_PAGER).pager(pager))?;
        Ok(())
    }

    /// User-defined handle of `thread`
    pub fn user_defined_handle_of(&self, thread: ThreadId) -> ThreadResult<Word> {
        let out = self.exchange(ExchangeArgs::new(thread, ControlWord::READ_ASSOCIATIONS))?;
        Ok(out.handle)
    }

    /// Replace the user-defined handle of `thread`
    pub fn set_user_defined_handle_of(&self, thread: ThreadId, handle: Word) -> ThreadResult<()> {
        self.exchange(ExchangeArgs::new(thread, ControlWord::WRITE_USER_HANDLE).handle(handle))?;
        Ok(())
    }

    /// Route interrupt `source` to `handler`
    ///
    /// The interrupt pseudo-thread's pager receives the interrupt messages.
    /// One `ThreadControl` call; the UTCB placement is left unchanged.
    pub fn associate_interrupt(&self, source: ThreadId, handler: ThreadId) -> ThreadResult<()> {
        self.thread_control(ThreadControlArgs::repage(source, handler))?;
        log::info!("interrupt {:?} associated with {:?}", source, handler);
        Ok(())
    }

    /// Detach interrupt `source` from its handler
    ///
    /// The pseudo-thread becomes its own pager again.
    pub fn deassociate_interrupt(&self, source: ThreadId) -> ThreadResult<()> {
        self.thread_control(ThreadControlArgs::repage(source, source))?;
        log::info!("interrupt {:?} deassociated", source);
        Ok(())
    }

    /// Toggle one ctrlxfer item of `thread`
    ///
    /// Returns the control word from before the toggle; its
    /// [`ControlWord::CTRLXFER_ITEMS`] bits are the previous configuration.
    /// Toggling the same item again restores it.
    ///
    /// [`CtrlXferItem::Conf`] alone is the same word as the association
    /// read: it reports the configuration and leaves it unchanged.
    pub fn toggle_ctrlxfer_items(
        &self,
        thread: ThreadId,
        item: CtrlXferItem,
    ) -> ThreadResult<ControlWord> {
        let out = self.exchange(ExchangeArgs::new(thread, ControlWord::ctrlxfer(item)))?;
        Ok(ControlWord::from_bits_retain(out.control))
    }
}
