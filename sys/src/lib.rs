//! # Helix L4 System Interface
//!
//! This crate defines the user-visible ABI of the L4 thread primitives:
//! the word-level vocabulary every thread-control call is built from.
//!
//! ## Contents
//!
//! - **Thread identifiers**: global and local forms, nil/any values
//! - **Control words**: the `ExchangeRegisters` selection mask
//! - **Thread state**: the status bits returned by a halting exchange
//! - **Error codes**: the kernel's numeric failure vocabulary
//! - **UTCB**: the per-thread context block and its thread control registers
//! - **Kernel boundary**: the [`Kernel`] trait carrying the two raw primitives
//!
//! ## Design Philosophy
//!
//! Nothing in this crate talks to a kernel. The [`Kernel`] trait is the seam:
//! a real target binds it to the trap instruction, the simulated kernel
//! implements it in memory, and the thread subsystem is generic over it.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

pub mod control;
pub mod error;
pub mod id;
pub mod kernel;
pub mod state;
pub mod utcb;

pub use control::{AbortIpc, ControlWord, CtrlXferItem, RegisterWrite};
pub use error::{ErrorCode, ThreadError, ThreadResult};
pub use id::ThreadId;
pub use kernel::{ExchangeArgs, ExchangeOutput, Kernel, ThreadControlArgs, UTCB_UNCHANGED};
pub use state::ThreadState;
pub use utcb::Utcb;

use static_assertions::const_assert;

/// Machine word
///
/// Every kernel argument and result is exactly one word wide.
pub type Word = usize;

/// Number of bits in a [`Word`]
pub const WORD_BITS: u32 = Word::BITS;

const_assert!(WORD_BITS == 32 || WORD_BITS == 64);
