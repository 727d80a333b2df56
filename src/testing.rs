//! Host-side stand-ins for RAM and the privileged registers.

use crate::mm::layout::RAM_BASE;
use crate::mm::{KernelImage, MemoryLayout, PhysAddr, TranslationControl, WindowMemory};

/// Fill pattern for memory nobody has written yet.
pub const POISON: u32 = 0xDEAD_BEEF;

/// Words of RAM backed on the host, starting at `RAM_BASE` (4 MiB).
const WINDOW_WORDS: usize = 1 << 20;

/// The first few MiB of board RAM, poisoned so zero-fill is visible.
pub struct FakeRam {
    kernel_start: PhysAddr,
    words: Vec<u32>,
}

impl FakeRam {
    /// Kernel image loaded at the start of RAM.
    pub fn new() -> Self {
        Self::with_kernel_at(RAM_BASE)
    }

    pub fn with_kernel_at(start: u32) -> Self {
        Self {
            kernel_start: PhysAddr::new(start),
            words: vec![POISON; WINDOW_WORDS],
        }
    }

    pub fn memory(&mut self) -> WindowMemory<'_> {
        WindowMemory::new(PhysAddr::new(RAM_BASE), &mut self.words)
    }

    /// Board layout with a kernel image of `kernel_size` bytes.
    pub fn layout(&self, kernel_size: u32) -> MemoryLayout {
        MemoryLayout::new(KernelImage::new(self.kernel_start, kernel_size))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterWrite {
    VectorBase(PhysAddr),
    TranslationTableBase(PhysAddr),
}

/// Records register loads in the order they happen.
#[derive(Debug, Default)]
pub struct RecordingControl {
    pub writes: Vec<RegisterWrite>,
}

impl TranslationControl for RecordingControl {
    fn load_vector_base(&mut self, base: PhysAddr) {
        self.writes.push(RegisterWrite::VectorBase(base));
    }

    fn load_translation_table_base(&mut self, base: PhysAddr) {
        self.writes.push(RegisterWrite::TranslationTableBase(base));
    }
}
