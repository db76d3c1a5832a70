//! Generic element container over a `SequenceAllocator`
//!
//! Elements are plain `Copy` data; nothing is dropped element-wise.

use super::{HeapAllocator, OwnershipMode, SequenceAllocator};
use core::ptr;

pub struct RawSequence<T, A: SequenceAllocator<T>> {
    ptr: *mut T,
    len: usize,
    capacity: usize,
    alloc: A,
}

impl<T: Copy, A: SequenceAllocator<T>> RawSequence<T, A> {
    /// Empty sequence that will draw storage from `alloc`
    #[inline]
    pub fn new_in(alloc: A) -> Self {
        Self {
            ptr: ptr::null_mut(),
            len: 0,
            capacity: 0,
            alloc,
        }
    }

    #[inline]
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    #[inline]
    pub fn mode(&self) -> OwnershipMode {
        A::MODE
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        if self.len == 0 {
            return &[];
        }
        // SAFETY: storage holds `len` initialised elements (assign_raw contract)
        unsafe { core::slice::from_raw_parts(self.ptr, self.len) }
    }

    /// Replace the contents with `count` elements read from `src`
    ///
    /// Storage comes from the allocator; when the allocator bridges the very
    /// memory `src` points at, this is a copy of the range onto itself and
    /// no write happens.
    ///
    /// # Safety
    /// `src` must be valid for reads of `count` elements. `count` must not
    /// exceed `self.allocator().max_size()`; this is a precondition and is
    /// only checked in debug builds. When the storage handed out is `src`
    /// itself, nothing is written, so shared references into that range may
    /// stay live across the call; otherwise the storage must be writable and
    /// unaliased.
    pub unsafe fn assign_raw(&mut self, src: *const T, count: usize) {
        self.reserve_storage(count);
        if count > 0 && !ptr::eq(src, self.ptr) {
            // `copy`, not `copy_nonoverlapping`: source and destination may overlap
            ptr::copy(src, self.ptr, count);
        }
        self.len = count;
    }

    unsafe fn reserve_storage(&mut self, count: usize) {
        debug_assert!(
            count <= self.alloc.max_size(),
            "requested {} elements, allocator serves at most {}",
            count,
            self.alloc.max_size()
        );
        if self.ptr.is_null() || count > self.capacity {
            self.release_storage();
            self.ptr = self.alloc.allocate(count);
            self.capacity = count.min(self.alloc.max_size());
        }
    }

    fn release_storage(&mut self) {
        if !self.ptr.is_null() && self.capacity > 0 {
            // SAFETY: ptr/capacity were produced by `allocate` on this allocator
            unsafe { self.alloc.deallocate(self.ptr, self.capacity) };
        }
        self.ptr = ptr::null_mut();
        self.capacity = 0;
        self.len = 0;
    }
}

impl<T: Copy> RawSequence<T, HeapAllocator<T>> {
    #[inline]
    pub fn new() -> Self {
        Self::new_in(HeapAllocator::new())
    }

    /// Owning copy of `src`
    pub fn from_slice(src: &[T]) -> Self {
        let mut seq = Self::new();
        // SAFETY: src is a live slice; heap max_size covers any slice length
        unsafe { seq.assign_raw(src.as_ptr(), src.len()) };
        seq
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        if self.len == 0 {
            return &mut [];
        }
        // SAFETY: owning storage, exclusively borrowed through `self`
        unsafe { core::slice::from_raw_parts_mut(self.ptr, self.len) }
    }

    pub fn into_vec(self) -> Vec<T> {
        self.as_slice().to_vec()
    }
}

impl<T: Copy> Default for RawSequence<T, HeapAllocator<T>> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy> Clone for RawSequence<T, HeapAllocator<T>> {
    fn clone(&self) -> Self {
        Self::from_slice(self.as_slice())
    }
}

impl<T, A: SequenceAllocator<T>> Drop for RawSequence<T, A> {
    fn drop(&mut self) {
        if !self.ptr.is_null() && self.capacity > 0 {
            // SAFETY: ptr/capacity were produced by `allocate` on this allocator
            unsafe { self.alloc.deallocate(self.ptr, self.capacity) };
        }
    }
}

impl<T: Copy + core::fmt::Debug, A: SequenceAllocator<T>> core::fmt::Debug for RawSequence<T, A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

