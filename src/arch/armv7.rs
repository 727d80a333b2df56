//! ARMv7-A CP15 primitives
//!
//! The privileged register writes behind [`TranslationControl`].

use core::arch::asm;

use crate::mm::{PhysAddr, TranslationControl};

/// DACR value: domain 0 is a client (permission bits are checked),
/// every other domain is no-access.
const DACR_DOMAIN0_CLIENT: u32 = 0b01;

/// SCTLR.M: MMU enable.
const SCTLR_MMU_ENABLE: u32 = 1 << 0;

/// The system control coprocessor of the boot CPU.
pub struct Cp15 {
    _private: (),
}

impl Cp15 {
    /// # Safety
    /// Must run in a privileged mode. Only one `Cp15` may exist, and it
    /// must only be used from the boot processor with interrupts masked.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl TranslationControl for Cp15 {
    fn load_vector_base(&mut self, base: PhysAddr) {
        // SAFETY: Privileged mode is guaranteed by `Cp15::new`. The
        // vector table is 32-byte aligned and stays in place forever.
        unsafe {
            asm!(
                "mcr p15, 0, {vbar}, c12, c0, 0",
                "isb",
                vbar = in(reg) base.as_u32(),
                options(nostack, preserves_flags)
            );
        }
    }

    fn load_translation_table_base(&mut self, base: PhysAddr) {
        // SAFETY: Privileged mode is guaranteed by `Cp15::new`. The caller
        // has identity-mapped every address the boot path still uses,
        // including the code running this sequence.
        unsafe {
            asm!(
                // Domain access, TTBCR.N = 0 (TTBR0 covers all 4 GiB), table base.
                "mcr p15, 0, {dacr}, c3, c0, 0",
                "mcr p15, 0, {zero}, c2, c0, 2",
                "mcr p15, 0, {ttbr}, c2, c0, 0",
                // Invalidate the unified TLB once before the first walk.
                "mcr p15, 0, {zero}, c8, c7, 0",
                "dsb",
                "isb",
                "mrc p15, 0, {sctlr}, c1, c0, 0",
                "orr {sctlr}, {sctlr}, {m}",
                "mcr p15, 0, {sctlr}, c1, c0, 0",
                "isb",
                dacr = in(reg) DACR_DOMAIN0_CLIENT,
                zero = in(reg) 0u32,
                ttbr = in(reg) base.as_u32(),
                m = in(reg) SCTLR_MMU_ENABLE,
                sctlr = out(reg) _,
                options(nostack)
            );
        }
    }
}
