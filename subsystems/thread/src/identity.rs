//! # Thread Identity
//!
//! Classification and conversion of thread ids.
//!
//! Raw word equality is not thread equality: the same thread is named by a
//! global id everywhere and by a local id inside its own address space.
//! [`ThreadController::same_threads`] is the only correct comparison.

use crate::{ControlWord, ExchangeArgs, Kernel, ThreadController, ThreadId, ThreadResult};

/// Does `id` use the local layout?
#[inline]
pub const fn is_local(id: ThreadId) -> bool {
    id.is_local()
}

/// Does `id` use the global layout?
#[inline]
pub const fn is_global(id: ThreadId) -> bool {
    id.is_global()
}

impl<K: Kernel> ThreadController<K> {
    /// Ask the kernel for the other representation of `id`
    fn convert(&self, id: ThreadId) -> ThreadResult<ThreadId> {
        let out = self.exchange(ExchangeArgs::new(id, ControlWord::QUERY))?;
        Ok(out.result)
    }

    /// Global id of `id`
    ///
    /// A global id is returned unchanged without a kernel call.
    pub fn global_id_of(&self, id: ThreadId) -> ThreadResult<ThreadId> {
        if id.is_local() {
            self.convert(id)
        } else {
            Ok(id)
        }
    }

    /// Local id of `id`
    ///
    /// A local id is returned unchanged without a kernel call.
    pub fn local_id_of(&self, id: ThreadId) -> ThreadResult<ThreadId> {
        if id.is_global() {
            self.convert(id)
        } else {
            Ok(id)
        }
    }

    /// Do `a` and `b` name the same thread?
    pub fn same_threads(&self, a: ThreadId, b: ThreadId) -> ThreadResult<bool> {
        Ok(self.global_id_of(a)? == self.global_id_of(b)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use crate::{ErrorCode, ThreadError};

    // =========================================================================
    // Classification
    // =========================================================================

    #[test]
    fn test_classification_is_a_partition() {
        let (kernel, root, worker) = testing::kernel();
        let local = kernel.thread(worker).unwrap().local;
        for id in [ThreadId::NIL, ThreadId::ANY, ThreadId::ANY_LOCAL, root, worker, local] {
            assert!(is_local(id) ^ is_global(id), "{:?}", id);
        }
    }

    // =========================================================================
    // Conversion
    // =========================================================================

    #[test]
    fn test_global_id_of_local() {
        let (kernel, root, worker) = testing::kernel();
        let threads = ThreadController::new(kernel.caller(root));
        let local = kernel.thread(worker).unwrap().local;

        assert_eq!(threads.global_id_of(local), Ok(worker));
        assert_eq!(threads.local_id_of(worker), Ok(local));
    }

    #[test]
    fn test_conversion_is_idempotent() {
        let (kernel, root, worker) = testing::kernel();
        let threads = ThreadController::new(kernel.caller(root));
        let local = kernel.thread(worker).unwrap().local;

        for id in [worker, local] {
            let global = threads.global_id_of(id).unwrap();
            assert_eq!(threads.global_id_of(global), Ok(global));
            let local = threads.local_id_of(id).unwrap();
            assert_eq!(threads.local_id_of(local), Ok(local));
        }
    }

    #[test]
    fn test_global_id_passthrough_needs_no_kernel() {
        let (kernel, root, _) = testing::kernel();
        let threads = ThreadController::new(kernel.caller(root));
        let unknown = ThreadId::global(4000, 1);
        assert_eq!(threads.global_id_of(unknown), Ok(unknown));
    }

    #[test]
    fn test_unknown_local_id_fails() {
        let (kernel, root, _) = testing::kernel();
        let threads = ThreadController::new(kernel.caller(root));
        let bogus = ThreadId::local(0x7fff_0000);
        assert_eq!(
            threads.global_id_of(bogus),
            Err(ThreadError::Kernel(ErrorCode::InvalidThread))
        );
    }

    // =========================================================================
    // Equality
    // =========================================================================

    #[test]
    fn test_same_threads_across_forms() {
        let (kernel, root, worker) = testing::kernel();
        let threads = ThreadController::new(kernel.caller(root));
        let worker_local = kernel.thread(worker).unwrap().local;
        let root_local = kernel.thread(root).unwrap().local;

        assert_eq!(threads.same_threads(worker, worker_local), Ok(true));
        assert_eq!(threads.same_threads(worker_local, worker_local), Ok(true));
        assert_eq!(threads.same_threads(root_local, worker), Ok(false));
        assert_ne!(worker.raw(), worker_local.raw());
    }

    #[test]
    fn test_same_threads_matches_global_ids() {
        let (kernel, root, worker) = testing::kernel();
        let threads = ThreadController::new(kernel.caller(root));
        let ids = [
            root,
            worker,
            kernel.thread(root).unwrap().local,
            kernel.thread(worker).unwrap().local,
        ];
        for a in ids {
            for b in ids {
                let expected = threads.global_id_of(a).unwrap() == threads.global_id_of(b).unwrap();
                assert_eq!(threads.same_threads(a, b), Ok(expected));
            }
        }
    }
}
