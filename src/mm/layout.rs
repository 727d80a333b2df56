//! Physical Memory Layout
//!
//! Board constants and the [`MemoryLayout`] value that carries them into
//! the boot path. The core never reads these constants directly; it only
//! sees the layout it was handed.

use super::address::{PhysAddr, SECTION_SIZE};

/// Physical base of DRAM.
pub const RAM_BASE: u32 = 0x1000_0000;

/// Size of DRAM in bytes (2 GiB).
pub const RAM_SIZE: u32 = 0x8000_0000;

/// Base of the MMIO window holding the console UART.
pub const MMIO_CONSOLE_BASE: u32 = 0x0200_0000;

/// Size of the MMIO window mapped for the console.
pub const MMIO_CONSOLE_SIZE: u32 = SECTION_SIZE;

/// The L1 table base register ignores the low 14 bits.
pub const L1_TABLE_ALIGN: u32 = 0x4000;

/// Number of L1 entries, one per MiB of a 4 GiB address space.
pub const L1_ENTRIES: usize = 4096;

/// The vector base register ignores the low 5 bits.
pub const VECTOR_TABLE_ALIGN: u32 = 0x20;

/// Every bootstrap allocation is a multiple of this many bytes.
pub const BOOT_ALLOC_GRANULE: u32 = 4;

/// A contiguous range of physical RAM.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RamRegion {
    pub base: PhysAddr,
    pub size: u32,
}

impl RamRegion {
    pub const fn new(base: PhysAddr, size: u32) -> Self {
        Self { base, size }
    }

    /// One past the last byte of RAM.
    #[inline]
    pub const fn end(&self) -> PhysAddr {
        self.base.add(self.size)
    }

    /// Number of section frames the region holds.
    #[inline]
    pub const fn frame_count(&self) -> u32 {
        self.size / SECTION_SIZE
    }

    #[inline]
    pub const fn contains(&self, pa: PhysAddr) -> bool {
        pa.as_u32() >= self.base.as_u32() && pa.offset_from(self.base) < self.size
    }
}

/// Bounds of the loaded kernel image, supplied by the linker or loader.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KernelImage {
    pub start: PhysAddr,
    pub size: u32,
}

impl KernelImage {
    pub const fn new(start: PhysAddr, size: u32) -> Self {
        Self { start, size }
    }

    /// One past the last byte of the image.
    #[inline]
    pub const fn end(&self) -> PhysAddr {
        self.start.add(self.size)
    }
}

/// Everything the boot path needs to know about the machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryLayout {
    pub ram: RamRegion,
    pub kernel: KernelImage,
    pub mmio_console: PhysAddr,
}

impl MemoryLayout {
    /// The board layout with the given kernel image.
    pub const fn new(kernel: KernelImage) -> Self {
        Self {
            ram: RamRegion::new(PhysAddr::new(RAM_BASE), RAM_SIZE),
            kernel,
            mmio_console: PhysAddr::new(MMIO_CONSOLE_BASE),
        }
    }

    /// Override the RAM region.
    pub const fn with_ram(mut self, ram: RamRegion) -> Self {
        self.ram = ram;
        self
    }
}
