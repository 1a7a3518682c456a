//! # Thread Identifiers
//!
//! A thread id is one machine word read in one of two ways:
//!
//! - **Global**: system-wide and stable. Packs a thread number above a
//!   version field. The low 6 bits are never all zero.
//! - **Local**: only meaningful inside one address space. It is the
//!   location of the thread's UTCB, so the low 6 bits are always zero.
//!
//! Converting between the two forms needs the kernel; see the identity
//! operations in the thread subsystem.

use crate::{Word, WORD_BITS};
use core::fmt;

/// Bits that are zero in every local id
const LOCAL_ZERO_MASK: Word = 0x3f;

/// Width of the version field of a global id
#[cfg(target_pointer_width = "32")]
const VERSION_BITS: u32 = 14;
#[cfg(not(target_pointer_width = "32"))]
const VERSION_BITS: u32 = 32;

const VERSION_MASK: Word = (1 << VERSION_BITS) - 1;

/// Thread identifier
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct ThreadId(Word);

impl ThreadId {
    /// "No thread"
    pub const NIL: Self = Self(0);

    /// Wildcard matching any thread
    pub const ANY: Self = Self(!0);

    /// Wildcard matching any thread of the caller's address space
    pub const ANY_LOCAL: Self = Self(!LOCAL_ZERO_MASK);

    /// Width of the thread-number field of a global id
    pub const THREAD_NO_BITS: u32 = WORD_BITS - VERSION_BITS;

    /// Create from raw value
    #[inline]
    pub const fn from_raw(raw: Word) -> Self {
        Self(raw)
    }

    /// Build a global id from a thread number and version
    ///
    /// Bits of `thread_no` and `version` beyond their field widths are
    /// dropped. A version whose low 6 bits are zero yields a word that reads
    /// as a local id; the kernel never hands such versions out.
    #[inline]
    pub const fn global(thread_no: Word, version: Word) -> Self {
        Self((thread_no << VERSION_BITS) | (version & VERSION_MASK))
    }

    /// Build a local id from a UTCB location
    ///
    /// The low 6 bits of `utcb_location` are cleared.
    #[inline]
    pub const fn local(utcb_location: Word) -> Self {
        Self(utcb_location & !LOCAL_ZERO_MASK)
    }

    /// Get the raw word
    #[inline]
    pub const fn raw(self) -> Word {
        self.0
    }

    /// Is this the nil thread?
    #[inline]
    pub const fn is_nil(self) -> bool {
        self.0 == 0
    }

    /// Does this word use the local layout?
    #[inline]
    pub const fn is_local(self) -> bool {
        self.0 & LOCAL_ZERO_MASK == 0
    }

    /// Does this word use the global layout?
    #[inline]
    pub const fn is_global(self) -> bool {
        !self.is_local()
    }

    /// Thread number field (global layout)
    #[inline]
    pub const fn thread_no(self) -> Word {
        self.0 >> VERSION_BITS
    }

    /// Version field (global layout)
    #[inline]
    pub const fn version(self) -> Word {
        self.0 & VERSION_MASK
    }
}

impl fmt::Debug for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_nil() {
            write!(f, "ThreadId(nil)")
        } else if *self == Self::ANY {
            write!(f, "ThreadId(any)")
        } else if self.is_local() {
            write!(f, "ThreadId(local {:#x})", self.0)
        } else {
            write!(f, "ThreadId({}.{})", self.thread_no(), self.version())
        }
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl From<ThreadId> for Word {
    fn from(id: ThreadId) -> Word {
        id.0
    }
}
