//! Kernel image for the section-mapped ARMv7 boot stage
//!
//! Built for a bare-metal ARM target this is the real kernel: boot
//! assembly, console, logger and the call into the boot memory path.
//! Built for the host it runs the same boot sequence against a simulated
//! RAM window and prints the trace.
//!
//! # Architecture
//! - Target: ARMv7-A (`armv7a-none-eabi`)
//! - Board: i.MX6-class, DRAM at 0x1000_0000, console UART in the
//!   0x0200_0000 MMIO window
//! - Boot: loaded by the firmware bootloader, entered at `_start`

#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]
#![deny(unsafe_op_in_unsafe_fn)]

#[cfg(target_os = "none")]
mod drivers;
#[cfg(target_os = "none")]
mod kernel;
#[cfg(target_os = "none")]
mod logger;

#[cfg(not(target_os = "none"))]
mod hosted;

#[cfg(not(target_os = "none"))]
fn main() {
    hosted::run();
}
