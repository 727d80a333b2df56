//! Bootstrap Allocator
//!
//! A bump allocator over the physical memory that follows the kernel
//! image. Every structure the boot path needs (page metadata, the L1
//! table, the vector table) comes from here, and none of it is ever
//! returned.
//!
//! # Memory Layout
//! ```text
//! kernel.start     kernel.end   boot start (16 KiB aligned)        end
//!      |  kernel image  |  pad  |  metadata | L1 table | vectors |  ...
//! ```
//!
//! Exhaustion is not checked: running past the end of RAM is a boot
//! failure that surfaces as a hardware fault, not as an error here.

use log::trace;

use super::address::PhysAddr;
use super::layout::{KernelImage, BOOT_ALLOC_GRANULE, L1_TABLE_ALIGN};
use super::phys::PhysMemory;

/// Bump pointer over boot-time physical memory.
#[derive(Debug)]
pub struct BootAllocator {
    /// Next address to hand out. Never decreases.
    end: PhysAddr,
}

impl BootAllocator {
    /// Start allocating right after the kernel image, rounded up to the
    /// L1 table alignment.
    pub fn new(kernel: KernelImage) -> Self {
        Self {
            end: kernel.end().align_up(L1_TABLE_ALIGN),
        }
    }

    /// Allocate `size` bytes (rounded up to 4) and zero them.
    ///
    /// `allocate(0)` is a query: it returns the current bump pointer and
    /// touches nothing.
    pub fn allocate<M: PhysMemory>(&mut self, mem: &mut M, size: u32) -> PhysAddr {
        let result = self.end;
        if size == 0 {
            return result;
        }

        let rounded = super::address::align_up(size, BOOT_ALLOC_GRANULE);
        self.end = self.end.add(rounded);
        trace!("boot alloc clearing {} up to {}", result, self.end);
        mem.zero(result, rounded);

        result
    }

    /// The current bump pointer; everything below it is in use.
    #[inline]
    pub fn current(&self) -> PhysAddr {
        self.end
    }

    /// Round the bump pointer up so the next allocation is `align`-aligned.
    pub fn align_to(&mut self, align: u32) {
        self.end = self.end.align_up(align);
    }
}
