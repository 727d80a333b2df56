//! ARMv7 Exception Vector Table
//!
//! Eight consecutive instruction words, one per exception kind. The
//! processor jumps to `VBAR + offset` on an exception, so the table must
//! be 32-byte aligned.
//!
//! This module only places the table. What goes into each slot (usually a
//! branch to a handler) is written by whoever owns the handlers, through
//! [`VectorTable::set`].

use log::info;

use crate::mm::{BootAllocator, PhysAddr, PhysMemory, VECTOR_TABLE_ALIGN};

/// `b .` in A32: an exception that lands here spins in place.
pub const BRANCH_TO_SELF: u32 = 0xEAFF_FFFE;

/// The eight vector slots, in table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExceptionVector {
    Reset = 0,
    UndefinedInstruction = 1,
    SupervisorCall = 2,
    PrefetchAbort = 3,
    DataAbort = 4,
    Reserved = 5,
    Irq = 6,
    Fiq = 7,
}

impl ExceptionVector {
    pub const ALL: [Self; 8] = [
        Self::Reset,
        Self::UndefinedInstruction,
        Self::SupervisorCall,
        Self::PrefetchAbort,
        Self::DataAbort,
        Self::Reserved,
        Self::Irq,
        Self::Fiq,
    ];

    /// Byte offset of the slot from the vector base.
    #[inline]
    pub const fn offset(self) -> u32 {
        self as u32 * 4
    }
}

/// Handle onto the boot-allocated vector table.
#[derive(Debug)]
pub struct VectorTable {
    base: PhysAddr,
}

impl VectorTable {
    /// Size of the table in bytes: one instruction word per vector.
    pub const SIZE: u32 = (ExceptionVector::ALL.len() * 4) as u32;

    /// Reserve a zeroed, 32-byte aligned table from the boot allocator.
    pub fn allocate<M: PhysMemory>(alloc: &mut BootAllocator, mem: &mut M) -> Self {
        alloc.align_to(VECTOR_TABLE_ALIGN);
        let base = alloc.allocate(mem, Self::SIZE);
        info!("vector table at: {}", base);
        Self { base }
    }

    /// Physical address to load into the vector base register.
    #[inline]
    pub fn base(&self) -> PhysAddr {
        self.base
    }

    /// Write the instruction word for `vector`.
    pub fn set<M: PhysMemory>(&self, mem: &mut M, vector: ExceptionVector, word: u32) {
        mem.write_u32(self.base.add(vector.offset()), word);
    }

    pub fn get<M: PhysMemory>(&self, mem: &M, vector: ExceptionVector) -> u32 {
        mem.read_u32(self.base.add(vector.offset()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeRam, POISON};

    #[test]
    fn test_vector_offsets() {
        assert_eq!(ExceptionVector::Reset.offset(), 0x00);
        assert_eq!(ExceptionVector::SupervisorCall.offset(), 0x08);
        assert_eq!(ExceptionVector::DataAbort.offset(), 0x10);
        assert_eq!(ExceptionVector::Irq.offset(), 0x18);
        assert_eq!(ExceptionVector::Fiq.offset(), 0x1C);
    }

    #[test]
    fn test_allocation_is_aligned_and_zeroed() {
        let mut ram = FakeRam::new();
        let kernel = ram.layout(0x2000).kernel;
        let mut mem = ram.memory();
        let mut alloc = BootAllocator::new(kernel);

        alloc.allocate(&mut mem, 0x14);
        let vectors = VectorTable::allocate(&mut alloc, &mut mem);
        assert_eq!(vectors.base().as_u32(), 0x1000_4020);
        assert_eq!(VectorTable::SIZE, 32);
        assert_eq!(alloc.current().as_u32(), vectors.base().as_u32() + VectorTable::SIZE);
        for vector in ExceptionVector::ALL {
            assert_eq!(vectors.get(&mem, vector), 0);
        }
        assert_eq!(mem.read_u32(PhysAddr::new(0x1000_4040)), POISON);
    }

    #[test]
    fn test_set_slot() {
        let mut ram = FakeRam::new();
        let kernel = ram.layout(0x2000).kernel;
        let mut mem = ram.memory();
        let mut alloc = BootAllocator::new(kernel);
        let vectors = VectorTable::allocate(&mut alloc, &mut mem);

        vectors.set(&mut mem, ExceptionVector::Irq, BRANCH_TO_SELF);
        assert_eq!(vectors.get(&mem, ExceptionVector::Irq), BRANCH_TO_SELF);
        assert_eq!(vectors.get(&mem, ExceptionVector::Fiq), 0);
    }
}
