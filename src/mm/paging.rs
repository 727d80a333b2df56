//! ARMv7 Short-Descriptor L1 Translation Table
//!
//! One level of translation only: every L1 entry is either unmapped (0)
//! or a *section* descriptor mapping 1 MiB.
//!
//! # Section descriptor layout
//! ```text
//!  31        20 19 18 17 16 15 14  12 11 10 9 8    5 4  3 2 1 0
//! | base[31:20] |NS| 0|nG| S|AP2| TEX |  AP | |domain|XN|C|B|1 0|
//! ```
//!
//! The table is 4096 words, 16 KiB aligned, and lives in boot-allocated
//! physical memory; it is only ever touched through [`PhysMemory`].

use bitflags::bitflags;
use log::{debug, info};

use super::address::{PhysAddr, VirtAddr, SECTION_SHIFT, SECTION_SIZE};
use super::allocator::BootAllocator;
use super::layout::{L1_ENTRIES, L1_TABLE_ALIGN};
use super::phys::PhysMemory;

bitflags! {
    /// Attribute bits of a section descriptor (everything except the base
    /// address and the descriptor type).
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct SectionFlags: u32 {
        /// B: bufferable.
        const BUFFERABLE = 1 << 2;
        /// C: cacheable.
        const CACHEABLE = 1 << 3;
        /// XN: instruction fetches fault.
        const EXECUTE_NEVER = 1 << 4;
        /// Domain number [8:5].
        const DOMAIN = 0b1111 << 5;
        /// AP[1:0] = 01: privileged read/write, no user access.
        const AP_PRIV_RW = 0b01 << 10;
        /// AP[1:0] = 11: full access.
        const AP_FULL = 0b11 << 10;
        /// TEX[14:12].
        const TEX = 0b111 << 12;
        /// AP2: with AP[1:0] selects the read-only encodings.
        const AP_READ_ONLY = 1 << 15;
        /// S: shareable.
        const SHAREABLE = 1 << 16;
        /// nG: tag TLB entries with the ASID.
        const NOT_GLOBAL = 1 << 17;
        /// NS: non-secure.
        const NON_SECURE = 1 << 19;
    }
}

impl SectionFlags {
    /// Kernel RAM: privileged read/write, write-back cacheable.
    pub const KERNEL: Self = Self::AP_PRIV_RW
        .union(Self::CACHEABLE)
        .union(Self::BUFFERABLE);

    /// MMIO: privileged read/write, shareable device, never executed.
    pub const DEVICE: Self = Self::AP_PRIV_RW
        .union(Self::BUFFERABLE)
        .union(Self::EXECUTE_NEVER);

    /// Place the section in `domain` (0..=15).
    #[inline]
    pub const fn with_domain(self, domain: u8) -> Self {
        Self::from_bits_retain(
            (self.bits() & !Self::DOMAIN.bits()) | (((domain as u32) & 0xF) << 5),
        )
    }
}

/// A single L1 entry.
#[derive(Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct SectionEntry(u32);

impl SectionEntry {
    /// Descriptor type bits [1:0].
    const TYPE_MASK: u32 = 0b11;
    /// Type value for a valid section.
    pub const SECTION_VALID: u32 = 0b10;
    /// Section base address bits [31:20].
    const BASE_MASK: u32 = 0xFFF0_0000;
    /// Attribute bits [19:2].
    const ATTR_MASK: u32 = !(Self::BASE_MASK | Self::TYPE_MASK);

    /// The unmapped entry.
    #[inline]
    pub const fn unmapped() -> Self {
        Self(0)
    }

    /// A section entry for the 1 MiB containing `base`.
    #[inline]
    pub const fn section(base: VirtAddr, flags: SectionFlags) -> Self {
        Self((base.as_u32() & Self::BASE_MASK) | flags.bits() | Self::SECTION_VALID)
    }

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_unmapped(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_section(self) -> bool {
        self.0 & Self::TYPE_MASK == Self::SECTION_VALID
    }

    /// Section base address stored in the entry.
    #[inline]
    pub const fn base(self) -> u32 {
        self.0 & Self::BASE_MASK
    }

    #[inline]
    pub const fn attributes(self) -> SectionFlags {
        SectionFlags::from_bits_retain(self.0 & Self::ATTR_MASK)
    }

    #[inline]
    pub const fn domain(self) -> u8 {
        ((self.0 >> 5) & 0xF) as u8
    }
}

impl core::fmt::Debug for SectionEntry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.is_unmapped() {
            write!(f, "Section(unmapped)")
        } else {
            write!(f, "Section(base={:#010x}, attrs={:?})", self.base(), self.attributes())
        }
    }
}

/// The first-level translation table.
///
/// A handle onto 4096 entries at a 16 KiB aligned physical address.
#[derive(Debug)]
pub struct SectionTable {
    base: PhysAddr,
}

impl SectionTable {
    /// Size of the table in bytes.
    pub const SIZE: u32 = (L1_ENTRIES * 4) as u32;

    /// Allocate a zeroed (fully unmapped) table from the boot allocator.
    pub fn allocate<M: PhysMemory>(alloc: &mut BootAllocator, mem: &mut M) -> Self {
        alloc.align_to(L1_TABLE_ALIGN);
        let base = alloc.allocate(mem, Self::SIZE);
        debug_assert!(base.is_aligned_to(L1_TABLE_ALIGN));
        info!("l1 page table at: {}", base);
        Self { base }
    }

    /// Physical address to load into the translation table base register.
    #[inline]
    pub fn base(&self) -> PhysAddr {
        self.base
    }

    #[inline]
    fn entry_addr(&self, index: usize) -> PhysAddr {
        self.base.add((index as u32) * 4)
    }

    /// Read entry `index`.
    ///
    /// # Panics
    /// Panics if `index >= 4096`.
    pub fn entry<M: PhysMemory>(&self, mem: &M, index: usize) -> SectionEntry {
        assert!(index < L1_ENTRIES, "L1 index {index} out of range");
        SectionEntry(mem.read_u32(self.entry_addr(index)))
    }

    /// Map `size` bytes (rounded up to whole sections) starting at the
    /// sections containing `phys` and `virt`.
    ///
    /// The entry for each step is selected by the physical address and
    /// stores the virtual section base; for the identity mappings built at
    /// boot the two coincide. Existing entries are overwritten.
    pub fn map_region<M: PhysMemory>(
        &self,
        mem: &mut M,
        phys: PhysAddr,
        virt: VirtAddr,
        size: u32,
        flags: SectionFlags,
    ) {
        let phys = phys.section_base();
        let virt = virt.section_base();
        let sections = size.div_ceil(SECTION_SIZE);
        debug!(
            "map {} -> {}: {} section(s), attrs {:?}",
            phys, virt, sections, flags
        );

        for step in 0..sections {
            let offset = step << SECTION_SHIFT;
            let index = phys.add(offset).section_index();
            let entry = SectionEntry::section(virt.add(offset), flags);
            mem.write_u32(self.entry_addr(index), entry.raw());
        }
    }

    /// Iterate over the populated entries as `(index, entry)`.
    pub fn populated<'a, M: PhysMemory>(
        &'a self,
        mem: &'a M,
    ) -> impl Iterator<Item = (usize, SectionEntry)> + 'a {
        (0..L1_ENTRIES)
            .map(move |index| (index, SectionEntry(mem.read_u32(self.entry_addr(index)))))
            .filter(|(_, entry)| !entry.is_unmapped())
    }

    /// Log every populated entry.
    pub fn dump_table<M: PhysMemory>(&self, mem: &M) {
        info!("l1 table: {}", self.base);
        info!("__________________________");
        for (index, entry) in self.populated(mem) {
            info!(
                "\t| entry: {}, base: {:#010x} domain: {} attrs: {:?}",
                index,
                entry.base(),
                entry.domain(),
                entry.attributes()
            );
        }
        info!("__________________________");
    }
}
