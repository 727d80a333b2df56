//! Processor-specific primitives.

#[cfg(target_arch = "arm")]
pub mod armv7;
