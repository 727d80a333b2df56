//! Memory management for early boot
//!
//! Provides:
//! - Typed physical/virtual addresses and section arithmetic
//! - The bootstrap bump allocator
//! - Per-frame metadata with a free list
//! - The section-mapped L1 translation table
//! - The kernel address space mapping and MMU activation
//!
//! Every structure here is carved out of physical memory exactly once and
//! never released.

pub mod address;
pub mod allocator;
pub mod frame;
pub mod layout;
pub mod mapper;
pub mod mmu;
pub mod paging;
pub mod phys;

pub use address::{PageNumber, PhysAddr, VirtAddr, SECTION_SHIFT, SECTION_SIZE};
pub use allocator::BootAllocator;
pub use frame::{page_number_to_address, page_to_number, FrameError, PageInfo, PageInfoTable};
pub use layout::{
    KernelImage, MemoryLayout, RamRegion, L1_ENTRIES, L1_TABLE_ALIGN, VECTOR_TABLE_ALIGN,
};
pub use mapper::map_kernel_address_space;
pub use mmu::{activate, TranslationControl};
pub use paging::{SectionEntry, SectionFlags, SectionTable};
pub use phys::{IdentityMemory, PhysMemory, WindowMemory};
