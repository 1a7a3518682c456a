//! # Error Codes
//!
//! The kernel reports failures as a small integer. [`ErrorCode`] names the
//! defined values; [`ThreadError`] is what the thread operations return.

use crate::Word;
use core::fmt;

/// Result type for thread operations
pub type ThreadResult<T> = Result<T, ThreadError>;

/// Kernel error code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// No error
    Ok,
    /// Caller lacks the privilege for the operation
    NoPrivilege,
    /// Unknown or invalid thread
    InvalidThread,
    /// Unknown or invalid address space
    InvalidSpace,
    /// Invalid scheduler thread
    InvalidScheduler,
    /// Invalid parameter
    InvalidParam,
    /// UTCB location outside the UTCB area
    UtcbArea,
    /// KIP location outside the KIP area
    KipArea,
    /// Kernel out of memory
    NoMem,
    /// Value the kernel does not define
    Unknown(Word),
}

impl ErrorCode {
    /// Raw value of [`ErrorCode::Ok`]
    pub const OK: Word = 0;
    /// Raw value of [`ErrorCode::NoPrivilege`]
    pub const NO_PRIVILEGE: Word = 1;
    /// Raw value of [`ErrorCode::InvalidThread`]
    pub const INVALID_THREAD: Word = 2;
    /// Raw value of [`ErrorCode::InvalidSpace`]
    pub const INVALID_SPACE: Word = 3;
    /// Raw value of [`ErrorCode::InvalidScheduler`]
    pub const INVALID_SCHEDULER: Word = 4;
    /// Raw value of [`ErrorCode::InvalidParam`]
    pub const INVALID_PARAM: Word = 5;
    /// Raw value of [`ErrorCode::UtcbArea`]
    pub const UTCB_AREA: Word = 6;
    /// Raw value of [`ErrorCode::KipArea`]
    pub const KIP_AREA: Word = 7;
    /// Raw value of [`ErrorCode::NoMem`]
    pub const NO_MEM: Word = 8;

    /// Decode a raw kernel error word
    pub const fn from_raw(raw: Word) -> Self {
        match raw {
            Self::OK => ErrorCode::Ok,
            Self::NO_PRIVILEGE => ErrorCode::NoPrivilege,
            Self::INVALID_THREAD => ErrorCode::InvalidThread,
            Self::INVALID_SPACE => ErrorCode::InvalidSpace,
            Self::INVALID_SCHEDULER => ErrorCode::InvalidScheduler,
            Self::INVALID_PARAM => ErrorCode::InvalidParam,
            Self::UTCB_AREA => ErrorCode::UtcbArea,
            Self::KIP_AREA => ErrorCode::KipArea,
            Self::NO_MEM => ErrorCode::NoMem,
            other => ErrorCode::Unknown(other),
        }
    }

    /// Encode back to the raw word
    pub const fn raw(self) -> Word {
        match self {
            ErrorCode::Ok => Self::OK,
            ErrorCode::NoPrivilege => Self::NO_PRIVILEGE,
            ErrorCode::InvalidThread => Self::INVALID_THREAD,
            ErrorCode::InvalidSpace => Self::INVALID_SPACE,
            ErrorCode::InvalidScheduler => Self::INVALID_SCHEDULER,
            ErrorCode::InvalidParam => Self::INVALID_PARAM,
            ErrorCode::UtcbArea => Self::UTCB_AREA,
            ErrorCode::KipArea => Self::KIP_AREA,
            ErrorCode::NoMem => Self::NO_MEM,
            ErrorCode::Unknown(raw) => raw,
        }
    }

    /// Is this the success code?
    pub const fn is_ok(self) -> bool {
        matches!(self, ErrorCode::Ok)
    }

    /// Diagnostic name
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Ok => "ok",
            ErrorCode::NoPrivilege => "no-privilege",
            ErrorCode::InvalidThread => "invalid-thread",
            ErrorCode::InvalidSpace => "invalid-space",
            ErrorCode::InvalidScheduler => "invalid-scheduler",
            ErrorCode::InvalidParam => "invalid-param",
            ErrorCode::UtcbArea => "utcb-area",
            ErrorCode::KipArea => "kip-area",
            ErrorCode::NoMem => "no-mem",
            ErrorCode::Unknown(_) => "invalid error code",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Word> for ErrorCode {
    fn from(raw: Word) -> Self {
        Self::from_raw(raw)
    }
}

/// Thread operation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadError {
    /// The kernel refused the call
    Kernel(ErrorCode),
    /// Control word combines bits the kernel would not honour together
    InvalidControl(Word),
    /// No UTCB is reachable from the calling thread
    ContextUnavailable,
}

impl ThreadError {
    /// Kernel error code, if the kernel reported this error
    pub const fn error_code(&self) -> Option<ErrorCode> {
        match self {
            ThreadError::Kernel(code) => Some(*code),
            _ => None,
        }
    }
}

impl fmt::Display for ThreadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThreadError::Kernel(code) => write!(f, "kernel error: {} ({})", code, code.raw()),
            ThreadError::InvalidControl(raw) => write!(f, "invalid control word {:#x}", raw),
            ThreadError::ContextUnavailable => f.write_str("no UTCB for the calling thread"),
        }
    }
}

impl From<ErrorCode> for ThreadError {
    fn from(code: ErrorCode) -> Self {
        ThreadError::Kernel(code)
    }
}
