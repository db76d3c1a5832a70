//! Owning storage on the global heap

use super::{OwnershipMode, SequenceAllocator};
use crate::logging::{log_allocation, log_deallocation};
use core::marker::PhantomData;
use core::ptr::NonNull;
use std::alloc::{self, Layout};

/// Independently owned element storage
pub struct HeapAllocator<T> {
    _marker: PhantomData<T>,
}

impl<T> HeapAllocator<T> {
    #[inline]
    pub const fn new() -> Self {
        Self { _marker: PhantomData }
    }

    #[inline]
    fn layout(count: usize) -> Layout {
        match Layout::array::<T>(count) {
            Ok(layout) => layout,
            Err(_) => capacity_overflow(),
        }
    }
}

impl<T> Default for HeapAllocator<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for HeapAllocator<T> {
    #[inline]
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> Copy for HeapAllocator<T> {}

impl<T> PartialEq for HeapAllocator<T> {
    #[inline]
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl<T> Eq for HeapAllocator<T> {}

impl<T> core::fmt::Debug for HeapAllocator<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("HeapAllocator")
    }
}

// SAFETY: storage comes straight from the global allocator with
// `Layout::array::<T>(requested)`, and is returned with the same layout.
unsafe impl<T> SequenceAllocator<T> for HeapAllocator<T> {
    const MODE: OwnershipMode = OwnershipMode::Owning;

    fn allocate(&mut self, requested: usize) -> *mut T {
        let layout = Self::layout(requested);
        if layout.size() == 0 {
            return NonNull::dangling().as_ptr();
        }

        // SAFETY: layout has non-zero size
        let ptr = unsafe { alloc::alloc(layout) };
        if ptr.is_null() {
            alloc::handle_alloc_error(layout);
        }
        log_allocation(layout.size(), ptr);
        ptr as *mut T
    }

    unsafe fn deallocate(&mut self, ptr: *mut T, count: usize) {
        let layout = Self::layout(count);
        if layout.size() == 0 {
            return;
        }
        log_deallocation(ptr as *const u8);
        alloc::dealloc(ptr as *mut u8, layout);
    }

    #[inline]
    fn max_size(&self) -> usize {
        isize::MAX as usize / core::mem::size_of::<T>().max(1)
    }
}

#[cold]
#[inline(never)]
fn capacity_overflow() -> ! {
    panic!("capacity overflow")
}
