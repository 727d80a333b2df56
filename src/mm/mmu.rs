//! MMU Activation
//!
//! The two privileged register loads that switch translation on sit
//! behind [`TranslationControl`], so everything that decides *what* gets
//! loaded can run against a fake on the build host.

use log::info;

use super::address::PhysAddr;
use super::layout::{L1_TABLE_ALIGN, VECTOR_TABLE_ALIGN};

/// Privileged writes to the translation base and vector base registers.
///
/// Each call is a single indivisible register update with no failure
/// signal.
pub trait TranslationControl {
    /// Point the processor at the exception vector table.
    fn load_vector_base(&mut self, base: PhysAddr);

    /// Point the processor at the L1 table and turn translation on.
    fn load_translation_table_base(&mut self, base: PhysAddr);
}

/// Install the vector table, then the translation table.
///
/// After this returns, every access goes through the table. There is no
/// way back; an unmapped access from here on is a hardware abort.
pub fn activate<C: TranslationControl>(ctl: &mut C, table_base: PhysAddr, vector_base: PhysAddr) {
    debug_assert!(table_base.is_aligned_to(L1_TABLE_ALIGN));
    debug_assert!(vector_base.is_aligned_to(VECTOR_TABLE_ALIGN));

    info!("loading vector base {}", vector_base);
    ctl.load_vector_base(vector_base);
    info!("loading translation table base {}", table_base);
    ctl.load_translation_table_base(table_base);
}
