//! Early memory management for a 32-bit ARM kernel
//!
//! Runs once, on the boot processor, before anything else in the kernel
//! touches memory:
//! - bump-allocates boot structures right after the kernel image
//! - lays out one metadata record per 1 MiB frame of RAM
//! - builds a section-mapped (one-level) ARMv7 translation table
//! - reserves the exception vector table
//! - identity-maps the kernel and the console MMIO window and switches
//!   translation on
//!
//! # Architecture
//! - Target: ARMv7-A, short-descriptor translation format
//! - All hardware access goes through [`mm::PhysMemory`] and
//!   [`mm::TranslationControl`], so the crate is testable on the host

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod arch;
pub mod boot;
pub mod exception;
pub mod mm;

#[cfg(test)]
mod testing;

pub use boot::{AddressSpace, BootContext, BootPhase};
