//! Kernel Address Space Mapper
//!
//! Decides what the single kernel address space contains and switches it
//! on:
//! - the console MMIO window, identity-mapped as device memory
//! - everything from the start of the kernel image up to the current boot
//!   pointer, identity-mapped as kernel memory
//!
//! The boot pointer is read here, after every boot allocation has been
//! made. Anything allocated later would not be mapped and would become
//! unreachable as soon as translation is on.

use log::info;

use super::address::VirtAddr;
use super::allocator::BootAllocator;
use super::layout::{MemoryLayout, MMIO_CONSOLE_SIZE};
use super::mmu::{self, TranslationControl};
use super::paging::{SectionFlags, SectionTable};
use super::phys::PhysMemory;
use crate::exception::VectorTable;

/// Populate `table` with the kernel mappings, dump it, and activate it
/// together with `vectors`.
pub fn map_kernel_address_space<M, C>(
    layout: &MemoryLayout,
    alloc: &BootAllocator,
    table: &SectionTable,
    vectors: &VectorTable,
    mem: &mut M,
    ctl: &mut C,
) where
    M: PhysMemory,
    C: TranslationControl,
{
    // Console first so diagnostics keep working once translation is on.
    table.map_region(
        mem,
        layout.mmio_console,
        VirtAddr::identity(layout.mmio_console),
        MMIO_CONSOLE_SIZE,
        SectionFlags::DEVICE,
    );

    let kernel_start = layout.kernel.start;
    let boot_end = alloc.current();
    info!("kernel start is {}, boot end is {}", kernel_start, boot_end);
    // Measured from the section base: map_region rounds the start down.
    table.map_region(
        mem,
        kernel_start,
        VirtAddr::identity(kernel_start),
        boot_end.offset_from(kernel_start.section_base()),
        SectionFlags::KERNEL,
    );

    table.dump_table(mem);

    mmu::activate(ctl, table.base(), vectors.base());
    info!("mapped kernel identity");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mm::address::PhysAddr;
    use crate::testing::{FakeRam, RecordingControl, RegisterWrite};

    #[test]
    fn test_maps_console_and_kernel_then_activates() {
        let mut ram = FakeRam::new();
        let layout = ram.layout(0x2000);
        let mut mem = ram.memory();
        let mut alloc = BootAllocator::new(layout.kernel);
        let table = SectionTable::allocate(&mut alloc, &mut mem);
        let vectors = VectorTable::allocate(&mut alloc, &mut mem);
        let mut ctl = RecordingControl::default();

        map_kernel_address_space(&layout, &alloc, &table, &vectors, &mut mem, &mut ctl);

        let console = table.entry(&mem, 0x020);
        assert_eq!(console.raw(), 0x0200_0000 | SectionFlags::DEVICE.bits() | 0b10);
        let kernel = table.entry(&mem, 0x100);
        assert_eq!(kernel.raw(), 0x1000_0000 | SectionFlags::KERNEL.bits() | 0b10);
        assert_eq!(table.populated(&mem).count(), 2);

        assert_eq!(
            ctl.writes,
            [
                RegisterWrite::VectorBase(vectors.base()),
                RegisterWrite::TranslationTableBase(table.base()),
            ]
        );
    }

    #[test]
    fn test_kernel_mapping_covers_late_boot_allocations() {
        let mut ram = FakeRam::new();
        let layout = ram.layout(0x000F_0000);
        let mut mem = ram.memory();
        let mut alloc = BootAllocator::new(layout.kernel);
        let table = SectionTable::allocate(&mut alloc, &mut mem);
        let vectors = VectorTable::allocate(&mut alloc, &mut mem);
        // Pushes the boot pointer into the next section.
        alloc.allocate(&mut mem, 0x0002_0000);
        let mut ctl = RecordingControl::default();

        map_kernel_address_space(&layout, &alloc, &table, &vectors, &mut mem, &mut ctl);

        assert!(alloc.current() > PhysAddr::new(0x1010_0000));
        assert!(table.entry(&mem, 0x101).is_section());
        assert!(table.entry(&mem, 0x102).is_unmapped());
    }

    #[test]
    fn test_kernel_mapping_from_mid_section_start() {
        // Kernel ends exactly on a section boundary, so every boot
        // structure lands in the section after the one holding the kernel.
        let mut ram = FakeRam::with_kernel_at(0x100F_F000);
        let layout = ram.layout(0x1000);
        let mut mem = ram.memory();
        let mut alloc = BootAllocator::new(layout.kernel);
        let table = SectionTable::allocate(&mut alloc, &mut mem);
        let vectors = VectorTable::allocate(&mut alloc, &mut mem);
        let mut ctl = RecordingControl::default();

        map_kernel_address_space(&layout, &alloc, &table, &vectors, &mut mem, &mut ctl);

        assert_eq!(table.base().as_u32(), 0x1010_0000);
        let first = layout.kernel.start.section_index();
        let last = PhysAddr::new(alloc.current().as_u32() - 1).section_index();
        assert_eq!((first, last), (0x100, 0x101));
        for index in first..=last {
            let entry = table.entry(&mem, index);
            assert!(entry.is_section(), "section {index:#x} unmapped");
            assert_eq!(entry.attributes(), SectionFlags::KERNEL);
        }
        assert!(table.entry(&mem, table.base().section_index()).is_section());
        assert!(table.entry(&mem, 0x102).is_unmapped());
    }
}
