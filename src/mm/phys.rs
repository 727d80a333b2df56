//! Physical Memory Access
//!
//! Every structure the boot path builds lives in raw physical memory.
//! Components reach it only through [`PhysMemory`], so the same code runs
//! against real RAM on the board and against a plain word buffer on the
//! build host.

use core::ptr;
use core::sync::atomic::{compiler_fence, Ordering};

use super::address::PhysAddr;

/// Word-granular access to physical memory.
///
/// All addresses passed in are 4-byte aligned.
pub trait PhysMemory {
    fn read_u32(&self, pa: PhysAddr) -> u32;

    fn write_u32(&mut self, pa: PhysAddr, value: u32);

    /// Zero `len` bytes starting at `pa`. `len` is a multiple of 4.
    fn zero(&mut self, pa: PhysAddr, len: u32) {
        let mut offset = 0;
        while offset < len {
            self.write_u32(pa.add(offset), 0);
            offset += 4;
        }
    }
}

/// Direct access to physical RAM through identically-numbered pointers.
///
/// Valid while translation is off, and afterwards for any range that is
/// identity-mapped.
pub struct IdentityMemory {
    _private: (),
}

impl IdentityMemory {
    /// # Safety
    /// Every address later passed to this accessor must be backed by RAM
    /// that nothing else in the program holds a reference to, and must be
    /// reachable at the same numeric address.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl PhysMemory for IdentityMemory {
    #[inline]
    fn read_u32(&self, pa: PhysAddr) -> u32 {
        debug_assert!(pa.is_aligned_to(4));
        // SAFETY: Guaranteed by the contract of `IdentityMemory::new`.
        unsafe { ptr::read_volatile(pa.as_u32() as usize as *const u32) }
    }

    #[inline]
    fn write_u32(&mut self, pa: PhysAddr, value: u32) {
        debug_assert!(pa.is_aligned_to(4));
        // SAFETY: Guaranteed by the contract of `IdentityMemory::new`.
        unsafe { ptr::write_volatile(pa.as_u32() as usize as *mut u32, value) }
    }

    fn zero(&mut self, pa: PhysAddr, len: u32) {
        let base = pa.as_u32() as usize as *mut u32;
        for i in 0..(len / 4) as usize {
            // SAFETY: Guaranteed by the contract of `IdentityMemory::new`.
            unsafe { ptr::write_volatile(base.add(i), 0) };
        }
        // Keep the clear ordered before the table writes that follow it.
        compiler_fence(Ordering::SeqCst);
    }
}

/// A window of word-addressed memory standing in for physical RAM.
///
/// Word `i` of the slice is the physical word at `base + 4 * i`. Accesses
/// outside the window panic.
pub struct WindowMemory<'a> {
    base: PhysAddr,
    words: &'a mut [u32],
}

impl<'a> WindowMemory<'a> {
    pub fn new(base: PhysAddr, words: &'a mut [u32]) -> Self {
        debug_assert!(base.is_aligned_to(4));
        Self { base, words }
    }

    pub fn base(&self) -> PhysAddr {
        self.base
    }

    /// One past the last byte covered by the window.
    pub fn end(&self) -> PhysAddr {
        self.base.add((self.words.len() * 4) as u32)
    }

    #[inline]
    fn index(&self, pa: PhysAddr) -> usize {
        debug_assert!(pa.is_aligned_to(4));
        (pa.offset_from(self.base) / 4) as usize
    }
}

impl PhysMemory for WindowMemory<'_> {
    #[inline]
    fn read_u32(&self, pa: PhysAddr) -> u32 {
        self.words[self.index(pa)]
    }

    #[inline]
    fn write_u32(&mut self, pa: PhysAddr, value: u32) {
        let i = self.index(pa);
        self.words[i] = value;
    }

    fn zero(&mut self, pa: PhysAddr, len: u32) {
        let start = self.index(pa);
        self.words[start..start + (len / 4) as usize].fill(0);
    }
}
