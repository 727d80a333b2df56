//! Physical and Virtual Address Types
//!
//! Type-safe wrappers for 32-bit ARM addresses that prevent mixing
//! physical and virtual addresses at compile time.
//!
//! The unit of mapping at this stage is the 1 MiB *section* of the
//! short-descriptor translation format, so page numbers and alignment
//! helpers here are expressed in sections, not 4 KiB pages.

use core::fmt;

/// Section size (1 MiB), the mapping granule of the L1 table.
pub const SECTION_SIZE: u32 = 0x10_0000;
/// Section offset mask.
pub const SECTION_MASK: u32 = SECTION_SIZE - 1;
/// Bits to shift for a section number / L1 index.
pub const SECTION_SHIFT: u32 = 20;

/// Round `value` up to the next multiple of `align` (a power of two).
#[inline]
pub const fn align_up(value: u32, align: u32) -> u32 {
    debug_assert!(align.is_power_of_two());
    value.wrapping_add(align - 1) & !(align - 1)
}

/// Round `value` down to a multiple of `align` (a power of two).
#[inline]
pub const fn align_down(value: u32, align: u32) -> u32 {
    debug_assert!(align.is_power_of_two());
    value & !(align - 1)
}

/// A physical memory address.
///
/// Physical addresses are what the bootstrap allocator hands out and what
/// the base registers accept. They are never implicitly a [`VirtAddr`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct PhysAddr(u32);

impl PhysAddr {
    /// The null physical address, also the free-list terminator.
    pub const NULL: Self = Self(0);

    #[inline]
    pub const fn new(addr: u32) -> Self {
        Self(addr)
    }

    /// Get the raw address value.
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Check if the address is a multiple of `align`.
    #[inline]
    pub const fn is_aligned_to(self, align: u32) -> bool {
        self.0 & (align - 1) == 0
    }

    /// Align the address down to the containing section.
    #[inline]
    pub const fn section_base(self) -> Self {
        Self(self.0 & !SECTION_MASK)
    }

    /// Align the address up to the next multiple of `align`.
    #[inline]
    pub const fn align_up(self, align: u32) -> Self {
        Self(align_up(self.0, align))
    }

    /// Index of the L1 entry covering this address.
    #[inline]
    pub const fn section_index(self) -> usize {
        (self.0 >> SECTION_SHIFT) as usize
    }

    /// Add an offset to this address (32-bit wrapping, like the hardware).
    #[inline]
    pub const fn add(self, offset: u32) -> Self {
        Self(self.0.wrapping_add(offset))
    }

    /// Byte distance from `base` up to this address.
    #[inline]
    pub const fn offset_from(self, base: Self) -> u32 {
        self.0.wrapping_sub(base.0)
    }
}

impl fmt::Debug for PhysAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PhysAddr({:#010x})", self.0)
    }
}

impl fmt::Display for PhysAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// A virtual memory address.
///
/// Numerically the same range as [`PhysAddr`], semantically disjoint.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct VirtAddr(u32);

impl VirtAddr {
    #[inline]
    pub const fn new(addr: u32) -> Self {
        Self(addr)
    }

    /// Identity-map a physical address.
    #[inline]
    pub const fn identity(phys: PhysAddr) -> Self {
        Self(phys.as_u32())
    }

    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Align the address down to the containing section.
    #[inline]
    pub const fn section_base(self) -> Self {
        Self(self.0 & !SECTION_MASK)
    }

    /// Add an offset to this address (32-bit wrapping).
    #[inline]
    pub const fn add(self, offset: u32) -> Self {
        Self(self.0.wrapping_add(offset))
    }
}

impl fmt::Debug for VirtAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VirtAddr({:#010x})", self.0)
    }
}

impl fmt::Display for VirtAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// Dense index of a physical page frame: `address / SECTION_SIZE`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[repr(transparent)]
pub struct PageNumber(u32);

impl PageNumber {
    #[inline]
    pub const fn new(number: u32) -> Self {
        Self(number)
    }

    /// Page number of the frame containing `pa`.
    #[inline]
    pub const fn containing(pa: PhysAddr) -> Self {
        Self(pa.as_u32() / SECTION_SIZE)
    }

    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Base physical address of this frame.
    #[inline]
    pub const fn address(self) -> PhysAddr {
        PhysAddr::new(self.0.wrapping_mul(SECTION_SIZE))
    }
}

impl fmt::Display for PageNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_helpers() {
        assert_eq!(align_up(0x1000_2000, 0x4000), 0x1000_4000);
        assert_eq!(align_up(0x1000_4000, 0x4000), 0x1000_4000);
        assert_eq!(align_up(5, 4), 8);
        assert_eq!(align_down(0x0210_0fff, SECTION_SIZE), 0x0210_0000);
    }

    #[test]
    fn test_section_base_and_index() {
        let pa = PhysAddr::new(0x1234_5678);
        assert_eq!(pa.section_base().as_u32(), 0x1230_0000);
        assert_eq!(pa.section_index(), 0x123);
        assert_eq!(VirtAddr::new(0xFFFF_FFFF).section_base().as_u32(), 0xFFF0_0000);
    }

    #[test]
    fn test_page_number_round_trip() {
        let pn = PageNumber::containing(PhysAddr::new(0x1010_0004));
        assert_eq!(pn.as_u32(), 0x101);
        assert_eq!(pn.address().as_u32(), 0x1010_0000);
    }

    #[test]
    fn test_wrapping_add() {
        assert_eq!(PhysAddr::new(0xFFF0_0000).add(SECTION_SIZE).as_u32(), 0);
    }
}
