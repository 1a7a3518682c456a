//! # Helix L4 Simulated Kernel
//!
//! An in-memory model of the two L4 thread primitives, used to test the
//! thread subsystem and to run it on a development host.
//!
//! ## Model
//!
//! - A thread table keyed by thread number, guarded by one lock standing in
//!   for the kernel's internal critical section
//! - Interrupt pseudo-threads occupying the lowest thread numbers
//! - Address spaces named by their first thread
//! - Per-thread halt flag, pending IPC phase and ctrlxfer configuration
//!
//! The model does not schedule anything: a "running" thread is simply one
//! that is neither halted nor blocked in IPC.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

extern crate alloc;

pub mod config;
pub mod kernel;
pub mod thread;

pub use config::SimConfig;
pub use kernel::{SimCaller, SimKernel};
pub use thread::{IpcPhase, ObservedState, Registers, SimThread};
