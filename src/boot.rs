//! Boot Context
//!
//! The one value that owns every boot-time memory structure and threads
//! them through the boot sequence:
//!
//! ```text
//! Uninitialized -> RamDiscovered -> BootstrapAllocatorReady -> MetadataAllocated
//!     -> TableBuilt -> VectorTableAllocated -> Activated
//! ```
//!
//! [`BootContext::mem_init`] takes the first five steps. Activation
//! consumes the context and hands back an [`AddressSpace`], so nothing can
//! allocate boot memory or rebuild the table once translation is on.

use log::info;

use crate::exception::{ExceptionVector, VectorTable};
use crate::mm::{
    map_kernel_address_space, BootAllocator, FrameError, MemoryLayout, PageInfoTable, PhysAddr,
    PhysMemory, SectionTable, TranslationControl,
};

/// Where the boot sequence currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BootPhase {
    Uninitialized,
    RamDiscovered,
    BootstrapAllocatorReady,
    MetadataAllocated,
    TableBuilt,
    VectorTableAllocated,
    Activated,
}

impl BootPhase {
    /// The only state reachable from this one.
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Uninitialized => Some(Self::RamDiscovered),
            Self::RamDiscovered => Some(Self::BootstrapAllocatorReady),
            Self::BootstrapAllocatorReady => Some(Self::MetadataAllocated),
            Self::MetadataAllocated => Some(Self::TableBuilt),
            Self::TableBuilt => Some(Self::VectorTableAllocated),
            Self::VectorTableAllocated => Some(Self::Activated),
            Self::Activated => None,
        }
    }

    fn advance(&mut self, to: Self) {
        debug_assert_eq!(self.next(), Some(to), "boot phase skipped from {:?}", self);
        info!("[BOOT] {:?} -> {:?}", self, to);
        *self = to;
    }
}

/// Boot-time memory state, from RAM discovery up to activation.
pub struct BootContext<M: PhysMemory> {
    layout: MemoryLayout,
    mem: M,
    alloc: BootAllocator,
    pages: PageInfoTable,
    table: SectionTable,
    vectors: VectorTable,
    phase: BootPhase,
}

impl<M: PhysMemory> BootContext<M> {
    /// Discover RAM and allocate the page metadata, the L1 table and the
    /// vector table, in that order.
    pub fn mem_init(layout: MemoryLayout, mut mem: M) -> Self {
        let mut phase = BootPhase::Uninitialized;

        info!("mem init: {:#x} bytes of ram at {}", layout.ram.size, layout.ram.base);
        info!(
            "mem init: kernel start: {} kernel end: {}",
            layout.kernel.start,
            layout.kernel.end()
        );
        phase.advance(BootPhase::RamDiscovered);

        let mut alloc = BootAllocator::new(layout.kernel);
        info!("\t boot_end: {}", alloc.current());
        phase.advance(BootPhase::BootstrapAllocatorReady);

        let pages = PageInfoTable::allocate(&mut alloc, &mut mem, layout.ram);
        info!("\t npages: {}", pages.len());
        phase.advance(BootPhase::MetadataAllocated);

        let table = SectionTable::allocate(&mut alloc, &mut mem);
        phase.advance(BootPhase::TableBuilt);

        let vectors = VectorTable::allocate(&mut alloc, &mut mem);
        phase.advance(BootPhase::VectorTableAllocated);

        Self {
            layout,
            mem,
            alloc,
            pages,
            table,
            vectors,
            phase,
        }
    }

    #[inline]
    pub fn phase(&self) -> BootPhase {
        self.phase
    }

    #[inline]
    pub fn layout(&self) -> &MemoryLayout {
        &self.layout
    }

    #[inline]
    pub fn allocator(&self) -> &BootAllocator {
        &self.alloc
    }

    #[inline]
    pub fn pages(&self) -> &PageInfoTable {
        &self.pages
    }

    #[inline]
    pub fn table(&self) -> &SectionTable {
        &self.table
    }

    #[inline]
    pub fn vectors(&self) -> &VectorTable {
        &self.vectors
    }

    #[inline]
    pub fn memory(&self) -> &M {
        &self.mem
    }

    /// Reserve extra boot memory; it is mapped along with the kernel.
    pub fn allocate(&mut self, size: u32) -> PhysAddr {
        self.alloc.allocate(&mut self.mem, size)
    }

    /// Write the instruction word for one exception vector.
    pub fn set_vector(&mut self, vector: ExceptionVector, word: u32) {
        self.vectors.set(&mut self.mem, vector, word);
    }

    /// Build the free list, map the kernel address space and turn
    /// translation on.
    ///
    /// This is the last boot allocation point: the boot pointer is read
    /// here and everything below it is both reserved and mapped.
    pub fn map_kernel_address_space<C: TranslationControl>(
        mut self,
        ctl: &mut C,
    ) -> AddressSpace<M> {
        self.pages
            .build_free_list(&mut self.mem, self.layout.kernel, &self.alloc);

        map_kernel_address_space(
            &self.layout,
            &self.alloc,
            &self.table,
            &self.vectors,
            &mut self.mem,
            ctl,
        );
        self.phase.advance(BootPhase::Activated);

        AddressSpace {
            layout: self.layout,
            mem: self.mem,
            boot_end: self.alloc.current(),
            pages: self.pages,
            table: self.table,
            vectors: self.vectors,
        }
    }
}

/// The permanent kernel address space, live once translation is on.
pub struct AddressSpace<M: PhysMemory> {
    layout: MemoryLayout,
    mem: M,
    boot_end: PhysAddr,
    pages: PageInfoTable,
    table: SectionTable,
    vectors: VectorTable,
}

impl<M: PhysMemory> AddressSpace<M> {
    #[inline]
    pub fn layout(&self) -> &MemoryLayout {
        &self.layout
    }

    /// End of the boot-reserved region, fixed at activation.
    #[inline]
    pub fn boot_end(&self) -> PhysAddr {
        self.boot_end
    }

    #[inline]
    pub fn table(&self) -> &SectionTable {
        &self.table
    }

    #[inline]
    pub fn vectors(&self) -> &VectorTable {
        &self.vectors
    }

    #[inline]
    pub fn pages(&self) -> &PageInfoTable {
        &self.pages
    }

    #[inline]
    pub fn memory(&self) -> &M {
        &self.mem
    }

    pub fn dump_table(&self) {
        self.table.dump_table(&self.mem);
    }

    pub fn alloc_frame(&mut self) -> Result<PhysAddr, FrameError> {
        self.pages.alloc_frame(&mut self.mem)
    }

    pub fn free_frame(&mut self, pa: PhysAddr) -> Result<(), FrameError> {
        self.pages.free_frame(&mut self.mem, pa)
    }
}
