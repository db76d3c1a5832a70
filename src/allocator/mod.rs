//! Sequence storage - who owns the memory behind a typed sequence
//!
//! Design: one generic container (`RawSequence`) parameterised by a storage
//! strategy (`SequenceAllocator`):
//! 1. `BridgeAllocator` hands out memory the engine already owns (aliasing, no copy, no free)
//! 2. `HeapAllocator` hands out independently owned memory (owning, freed on drop)
//!
//! The container never knows which one it got; the same assign/copy path runs
//! for both.

mod bridge;
mod heap;
mod sequence;

#[cfg(test)]
mod tests;

pub use bridge::{BridgeAllocator, RawRegion};
pub use heap::HeapAllocator;
pub use sequence::RawSequence;

use std::fmt;

/// Whether a sequence borrows engine memory or owns its own
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OwnershipMode {
    /// Storage is engine memory, valid only while the engine value is borrowed
    Aliasing,
    /// Storage is independently allocated and may outlive any engine value
    Owning,
}

impl fmt::Display for OwnershipMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aliasing => write!(f, "aliasing"),
            Self::Owning => write!(f, "owning"),
        }
    }
}

/// Storage strategy for `RawSequence`
///
/// # Safety
/// `allocate(n)` must return a pointer valid for reads and writes of
/// `n.min(self.max_size())` elements of `T`, aligned for `T`, for as long as
/// the allocator (and any borrow it carries) is alive. `deallocate` must
/// accept exactly the pointers and counts previously produced by `allocate`.
pub unsafe trait SequenceAllocator<T> {
    /// Ownership mode of every sequence built on this allocator
    const MODE: OwnershipMode;

    /// Obtain storage for `requested` elements
    fn allocate(&mut self, requested: usize) -> *mut T;

    /// Give storage back
    ///
    /// # Safety
    /// `ptr` and `count` must come from a previous `allocate` on an equal allocator.
    unsafe fn deallocate(&mut self, ptr: *mut T, count: usize);

    /// Largest element count this allocator can serve
    fn max_size(&self) -> usize;
}
