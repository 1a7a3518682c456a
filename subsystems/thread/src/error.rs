//! # Error Codes
//!
//! Display names of the kernel error codes.

use crate::{ErrorCode, Word};

/// Name of a raw kernel error code
///
/// Codes outside the known range map to `"invalid error code"`.
pub fn error_code_of(raw: Word) -> &'static str {
    ErrorCode::from_raw(raw).as_str()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use crate::{ThreadController, ThreadError, ThreadId};

    #[test]
    fn test_known_codes() {
        assert_eq!(error_code_of(0), "ok");
        assert_eq!(error_code_of(1), "no-privilege");
        assert_eq!(error_code_of(2), "invalid-thread");
        assert_eq!(error_code_of(8), "no-mem");
    }

    #[test]
    fn test_unknown_codes() {
        assert_eq!(error_code_of(9), "invalid error code");
        assert_eq!(error_code_of(42), "invalid error code");
        assert_eq!(error_code_of(Word::MAX), "invalid error code");
    }

    #[test]
    fn test_failed_call_names_its_code() {
        let (kernel, root, _) = testing::kernel();
        let threads = ThreadController::new(kernel.caller(root));

        let err = threads.pager_of(ThreadId::global(999, 1)).unwrap_err();
        let ThreadError::Kernel(code) = err else {
            panic!("unexpected error {:?}", err);
        };
        assert_eq!(error_code_of(code.raw()), "invalid-thread");
    }
}
