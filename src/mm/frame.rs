//! Physical Page Metadata
//!
//! One [`PageInfo`] record per section frame of RAM, laid out as a linear
//! array in boot-allocated memory. Free frames are threaded into a singly
//! linked list through the records themselves.
//!
//! # Design
//! - `ref_count == 0`: frame is not in use
//! - `next_free`: physical address of the next free record, 0 ends the list
//! - Frames holding the kernel image or boot structures have
//!   `ref_count == 0` but are never linked, so they are never handed out

use core::fmt;
use core::mem::size_of;

use log::{debug, info};

use super::address::{PageNumber, PhysAddr, SECTION_SIZE};
use super::allocator::BootAllocator;
use super::layout::{KernelImage, RamRegion};
use super::phys::PhysMemory;

/// Per-frame metadata record as stored in memory.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PageInfo {
    /// Weak link to the next free record (its physical address), or 0.
    pub next_free: u32,
    /// Number of users of the frame; 0 means free.
    pub ref_count: u32,
}

impl PageInfo {
    const SIZE: u32 = size_of::<PageInfo>() as u32;
    const NEXT_OFFSET: u32 = 0;
    const REF_OFFSET: u32 = 4;
}

/// Error type for frame operations on the metadata table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// The free list is empty.
    OutOfFrames,
    /// The address is not inside the RAM region the table describes.
    OutsideRam,
    /// The frame is not allocated (double free, or a reserved frame).
    NotAllocated,
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfFrames => write!(f, "no free frames left"),
            Self::OutsideRam => write!(f, "address outside managed RAM"),
            Self::NotAllocated => write!(f, "frame is not allocated"),
        }
    }
}

/// Page number for `pa`: `pa / SECTION_SIZE`, no bounds checking.
#[inline]
pub const fn page_to_number(pa: PhysAddr) -> PageNumber {
    PageNumber::containing(pa)
}

/// Base address of frame `pn`.
#[inline]
pub const fn page_number_to_address(pn: PageNumber) -> PhysAddr {
    pn.address()
}

/// The linear array of [`PageInfo`] records and its free list.
#[derive(Debug)]
pub struct PageInfoTable {
    /// Physical address of record 0.
    base: PhysAddr,
    /// RAM described by the table; record `i` belongs to its `i`-th frame.
    ram: RamRegion,
    /// Number of records.
    count: u32,
    /// Physical address of the first free record, or null.
    free_head: PhysAddr,
    free_count: u32,
}

impl PageInfoTable {
    /// Allocate one zeroed record per section frame of `ram`.
    pub fn allocate<M: PhysMemory>(
        alloc: &mut BootAllocator,
        mem: &mut M,
        ram: RamRegion,
    ) -> Self {
        let count = ram.size / SECTION_SIZE;
        let base = alloc.allocate(mem, count * PageInfo::SIZE);
        info!("pages at: {} ({} records)", base, count);

        Self {
            base,
            ram,
            count,
            free_head: PhysAddr::NULL,
            free_count: 0,
        }
    }

    /// Physical address of the table.
    #[inline]
    pub fn base(&self) -> PhysAddr {
        self.base
    }

    /// Number of records in the table.
    #[inline]
    pub fn len(&self) -> u32 {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of frames currently on the free list.
    #[inline]
    pub fn free_frames(&self) -> u32 {
        self.free_count
    }

    /// Physical address of the record describing the frame containing `pa`.
    ///
    /// Records are indexed from the first frame of RAM. There is no bounds
    /// check against the table length.
    #[inline]
    pub fn physical_to_page(&self, pa: PhysAddr) -> PhysAddr {
        let first = page_to_number(self.ram.base).as_u32();
        let index = page_to_number(pa).as_u32().wrapping_sub(first);
        self.base.add(index.wrapping_mul(PageInfo::SIZE))
    }

    /// Frame base address described by the record at `record`.
    #[inline]
    fn record_to_frame(&self, record: PhysAddr) -> PhysAddr {
        let index = record.offset_from(self.base) / PageInfo::SIZE;
        self.ram.base.section_base().add(index * SECTION_SIZE)
    }

    pub fn read<M: PhysMemory>(&self, mem: &M, pa: PhysAddr) -> PageInfo {
        let record = self.physical_to_page(pa);
        PageInfo {
            next_free: mem.read_u32(record.add(PageInfo::NEXT_OFFSET)),
            ref_count: mem.read_u32(record.add(PageInfo::REF_OFFSET)),
        }
    }

    fn write<M: PhysMemory>(&self, mem: &mut M, record: PhysAddr, info: PageInfo) {
        mem.write_u32(record.add(PageInfo::NEXT_OFFSET), info.next_free);
        mem.write_u32(record.add(PageInfo::REF_OFFSET), info.ref_count);
    }

    /// Classify every frame of RAM and link the free ones.
    ///
    /// A frame is free when it lies wholly inside RAM before the kernel
    /// image, or wholly inside RAM after the current boot pointer. Every
    /// other frame is reserved: `ref_count = 0` and not linked. Must run
    /// after the last boot allocation.
    pub fn build_free_list<M: PhysMemory>(
        &mut self,
        mem: &mut M,
        kernel: KernelImage,
        alloc: &BootAllocator,
    ) {
        let ram_start = u64::from(self.ram.base.as_u32());
        let ram_end = ram_start + u64::from(self.ram.size);
        let kernel_start = u64::from(kernel.start.as_u32());
        let boot_end = u64::from(alloc.current().as_u32());
        let section = u64::from(SECTION_SIZE);

        let within = |pa: u64, start: u64, end: u64| pa >= start && pa + section <= end;

        self.free_head = PhysAddr::NULL;
        self.free_count = 0;

        for i in 0..self.count {
            let frame = self.ram.base.section_base().add(i * SECTION_SIZE);
            let pa = u64::from(frame.as_u32());
            let record = self.physical_to_page(frame);

            let free = within(pa, ram_start, kernel_start) || within(pa, boot_end, ram_end);
            if free {
                self.write(
                    mem,
                    record,
                    PageInfo {
                        next_free: self.free_head.as_u32(),
                        ref_count: 0,
                    },
                );
                self.free_head = record;
                self.free_count += 1;
            } else {
                self.write(mem, record, PageInfo::default());
            }
        }

        info!(
            "page init done: {} free of {} frames",
            self.free_count, self.count
        );
    }

    /// Take a frame off the free list and give it one reference.
    ///
    /// The frame's contents are not touched.
    pub fn alloc_frame<M: PhysMemory>(&mut self, mem: &mut M) -> Result<PhysAddr, FrameError> {
        if self.free_head.is_null() {
            return Err(FrameError::OutOfFrames);
        }

        let record = self.free_head;
        let next = mem.read_u32(record.add(PageInfo::NEXT_OFFSET));
        self.write(
            mem,
            record,
            PageInfo {
                next_free: 0,
                ref_count: 1,
            },
        );
        self.free_head = PhysAddr::new(next);
        self.free_count -= 1;

        let frame = self.record_to_frame(record);
        debug!("alloc frame {} ({})", frame, page_to_number(frame));
        Ok(frame)
    }

    /// Drop one reference to the frame containing `pa`, returning it to
    /// the free list when the count reaches zero.
    pub fn free_frame<M: PhysMemory>(
        &mut self,
        mem: &mut M,
        pa: PhysAddr,
    ) -> Result<(), FrameError> {
        if !self.ram.contains(pa) {
            return Err(FrameError::OutsideRam);
        }

        let record = self.physical_to_page(pa);
        let mut info = self.read(mem, pa);
        if info.ref_count == 0 {
            return Err(FrameError::NotAllocated);
        }

        info.ref_count -= 1;
        if info.ref_count == 0 {
            info.next_free = self.free_head.as_u32();
            self.free_head = record;
            self.free_count += 1;
            debug!("free frame {}", pa.section_base());
        }
        self.write(mem, record, info);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mm::layout::RAM_BASE;
    use crate::testing::FakeRam;

    #[test]
    fn test_page_to_number() {
        for pa in [0u32, 0xFFFFF, 0x10_0000, 0x0200_0000, 0x1000_2000, 0xFFFF_FFFF] {
            assert_eq!(page_to_number(PhysAddr::new(pa)).as_u32(), pa / 0x10_0000);
        }
        assert_eq!(
            page_number_to_address(PageNumber::new(0x100)).as_u32(),
            0x1000_0000
        );
    }

    #[test]
    fn test_allocate_sizes_table() {
        let mut ram = FakeRam::new();
        let layout = ram.layout(0x2000);
        let mut mem = ram.memory();
        let mut alloc = BootAllocator::new(layout.kernel);

        let table = PageInfoTable::allocate(&mut alloc, &mut mem, layout.ram);
        assert_eq!(table.len(), 2048);
        assert_eq!(table.base().as_u32(), 0x1000_4000);
        assert_eq!(alloc.current().as_u32(), 0x1000_4000 + 2048 * 8);
    }

    #[test]
    fn test_physical_to_page_indexes_from_ram_base() {
        let mut ram = FakeRam::new();
        let layout = ram.layout(0x2000);
        let mut mem = ram.memory();
        let mut alloc = BootAllocator::new(layout.kernel);
        let table = PageInfoTable::allocate(&mut alloc, &mut mem, layout.ram);

        assert_eq!(table.physical_to_page(PhysAddr::new(RAM_BASE)), table.base());
        assert_eq!(
            table.physical_to_page(PhysAddr::new(RAM_BASE + 0x0030_1234)),
            table.base().add(3 * 8)
        );
    }

    #[test]
    fn test_free_list_skips_kernel_and_boot_region() {
        let mut ram = FakeRam::new();
        let layout = ram.layout(0x2000);
        let mut mem = ram.memory();
        let mut alloc = BootAllocator::new(layout.kernel);
        let mut table = PageInfoTable::allocate(&mut alloc, &mut mem, layout.ram);

        table.build_free_list(&mut mem, layout.kernel, &alloc);

        // Kernel starts at RAM base, so only the first frame is reserved.
        assert_eq!(table.free_frames(), 2047);
        let first = table.read(&mem, PhysAddr::new(RAM_BASE));
        assert_eq!(first, PageInfo::default());
        let second = table.read(&mem, PhysAddr::new(RAM_BASE + SECTION_SIZE));
        assert_eq!(second.ref_count, 0);
    }

    #[test]
    fn test_free_list_includes_pre_kernel_frames() {
        let mut ram = FakeRam::with_kernel_at(RAM_BASE + 0x0020_0000);
        let layout = ram.layout(0x2000);
        let mut mem = ram.memory();
        let mut alloc = BootAllocator::new(layout.kernel);
        let mut table = PageInfoTable::allocate(&mut alloc, &mut mem, layout.ram);

        table.build_free_list(&mut mem, layout.kernel, &alloc);

        // Frames 0 and 1 precede the kernel, frame 2 holds it.
        assert_eq!(table.free_frames(), 2047);
        let mut seen = [false; 3];
        for _ in 0..table.free_frames() {
            let frame = table.alloc_frame(&mut mem).unwrap();
            let index = frame.offset_from(PhysAddr::new(RAM_BASE)) / SECTION_SIZE;
            if index < 3 {
                seen[index as usize] = true;
            }
        }
        assert_eq!(seen, [true, true, false]);
    }

    #[test]
    fn test_free_list_excludes_partially_reserved_frame() {
        // Kernel starts mid-frame: the frame holding its first byte is not free.
        let mut ram = FakeRam::with_kernel_at(RAM_BASE + 0x0008_0000);
        let layout = ram.layout(0x2000);
        let mut mem = ram.memory();
        let mut alloc = BootAllocator::new(layout.kernel);
        let mut table = PageInfoTable::allocate(&mut alloc, &mut mem, layout.ram);

        table.build_free_list(&mut mem, layout.kernel, &alloc);
        assert_eq!(table.free_frames(), 2047);
        assert_eq!(table.read(&mem, PhysAddr::new(RAM_BASE)), PageInfo::default());
    }

    #[test]
    fn test_alloc_and_free_frame() {
        let mut ram = FakeRam::new();
        let layout = ram.layout(0x2000);
        let mut mem = ram.memory();
        let mut alloc = BootAllocator::new(layout.kernel);
        let mut table = PageInfoTable::allocate(&mut alloc, &mut mem, layout.ram);
        table.build_free_list(&mut mem, layout.kernel, &alloc);

        let frame = table.alloc_frame(&mut mem).unwrap();
        // Head of the list is the highest free frame.
        assert_eq!(frame.as_u32(), 0x8FF0_0000);
        assert_eq!(table.free_frames(), 2046);
        assert_eq!(table.read(&mem, frame).ref_count, 1);

        table.free_frame(&mut mem, frame).unwrap();
        assert_eq!(table.free_frames(), 2047);
        assert_eq!(table.free_frame(&mut mem, frame), Err(FrameError::NotAllocated));

        let again = table.alloc_frame(&mut mem).unwrap();
        assert_eq!(again, frame);
    }

    #[test]
    fn test_free_frame_rejects_reserved_and_foreign() {
        let mut ram = FakeRam::new();
        let layout = ram.layout(0x2000);
        let mut mem = ram.memory();
        let mut alloc = BootAllocator::new(layout.kernel);
        let mut table = PageInfoTable::allocate(&mut alloc, &mut mem, layout.ram);
        table.build_free_list(&mut mem, layout.kernel, &alloc);

        assert_eq!(
            table.free_frame(&mut mem, PhysAddr::new(RAM_BASE)),
            Err(FrameError::NotAllocated)
        );
        assert_eq!(
            table.free_frame(&mut mem, PhysAddr::new(0x0200_0000)),
            Err(FrameError::OutsideRam)
        );
    }

    #[test]
    fn test_out_of_frames() {
        let mut ram = FakeRam::new();
        let layout = ram
            .layout(0x2000)
            .with_ram(RamRegion::new(PhysAddr::new(RAM_BASE), 2 * SECTION_SIZE));
        let mut mem = ram.memory();
        let mut alloc = BootAllocator::new(layout.kernel);
        let mut table = PageInfoTable::allocate(&mut alloc, &mut mem, layout.ram);
        table.build_free_list(&mut mem, layout.kernel, &alloc);

        assert_eq!(table.free_frames(), 1);
        assert!(table.alloc_frame(&mut mem).is_ok());
        assert_eq!(table.alloc_frame(&mut mem), Err(FrameError::OutOfFrames));
    }
}
