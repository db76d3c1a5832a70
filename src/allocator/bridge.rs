//! Ownership bridging - let a sequence sit directly on engine memory
//!
//! The engine already allocated the buffer and will free it through its own
//! refcounting/GC. The bridge pretends to allocate by returning that memory,
//! and pretends to free by doing nothing.

use super::{OwnershipMode, SequenceAllocator};
use crate::logging::trace;
use core::marker::PhantomData;

/// Borrowed (pointer, element-count) pair into engine memory
///
/// Never owned and never freed by this crate. Produced fresh by every decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawRegion<T> {
    ptr: *mut T,
    len: usize,
}

impl<T> RawRegion<T> {
    #[inline]
    pub const fn new(ptr: *mut T, len: usize) -> Self {
        Self { ptr, len }
    }

    #[inline]
    pub const fn ptr(&self) -> *mut T {
        self.ptr
    }

    /// Element count (not bytes)
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.ptr.is_null()
    }
}

/// Allocator that "allocates" a foreign memory range
///
/// `'a` is the borrow of the engine value that owns the memory, so a sequence
/// built on this allocator cannot outlive the call that decoded it.
pub struct BridgeAllocator<'a, T> {
    memory_ptr: *mut T,
    memory_size: usize,
    _borrow: PhantomData<&'a [T]>,
}

impl<'a, T> BridgeAllocator<'a, T> {
    /// Bridge `memory_size` elements starting at `memory_ptr`
    ///
    /// # Safety
    /// Unless `memory_size` is zero, `memory_ptr` must be non-null, aligned
    /// for `T` and valid for reads and writes of `memory_size` elements for
    /// the whole of `'a`.
    #[inline]
    pub unsafe fn new(memory_ptr: *mut T, memory_size: usize) -> Self {
        Self {
            memory_ptr,
            memory_size,
            _borrow: PhantomData,
        }
    }

    /// # Safety
    /// Same contract as [`BridgeAllocator::new`].
    #[inline]
    pub unsafe fn from_region(region: RawRegion<T>) -> Self {
        Self::new(region.ptr(), region.len())
    }

    /// The bridged range
    #[inline]
    pub fn region(&self) -> RawRegion<T> {
        RawRegion::new(self.memory_ptr, self.memory_size)
    }
}

// Handing out the same range twice is the point, so copies are fine.
impl<T> Clone for BridgeAllocator<'_, T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for BridgeAllocator<'_, T> {}

// Stateless identity: any two bridges are interchangeable.
impl<T> PartialEq for BridgeAllocator<'_, T> {
    #[inline]
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl<T> Eq for BridgeAllocator<'_, T> {}

impl<T> core::fmt::Debug for BridgeAllocator<'_, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BridgeAllocator")
            .field("memory_ptr", &self.memory_ptr)
            .field("memory_size", &self.memory_size)
            .finish()
    }
}

// SAFETY: the constructor contract guarantees the range is valid for
// `memory_size` elements, and `allocate` never hands out more than
// `max_size()` usable elements.
unsafe impl<T> SequenceAllocator<T> for BridgeAllocator<'_, T> {
    const MODE: OwnershipMode = OwnershipMode::Aliasing;

    /// Returns the bridged pointer whatever `requested` is.
    ///
    /// Requesting more than `max_size()` is a caller precondition violation
    /// and is not checked here.
    #[inline]
    fn allocate(&mut self, requested: usize) -> *mut T {
        trace!(
            event = "bridge_allocate",
            requested,
            available = self.memory_size,
            address = ?self.memory_ptr
        );
        self.memory_ptr
    }

    /// The engine owns this memory.
    #[inline]
    unsafe fn deallocate(&mut self, _ptr: *mut T, _count: usize) {}

    #[inline]
    fn max_size(&self) -> usize {
        self.memory_size
    }
}
