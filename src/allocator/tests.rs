//! Allocator tests
//!
//! Test suite organized by component:
//! - Bridge: pointer passthrough, no-op free, stateless identity
//! - Heap: independent storage
//! - RawSequence: identity copy over bridged memory, owning copies

#[cfg(test)]
mod tests {
    use super::super::*;

    // ===== Bridge Tests =====

    #[test]
    fn bridge_allocate_returns_construction_pointer() {
        let mut backing = [1u32, 2, 3, 4];
        let ptr = backing.as_mut_ptr();
        let mut bridge = unsafe { BridgeAllocator::new(ptr, backing.len()) };

        for requested in [0, 1, 4, 5, 1_000, usize::MAX] {
            assert_eq!(bridge.allocate(requested), ptr, "requested {}", requested);
        }
    }

    #[test]
    fn bridge_max_size_is_element_count() {
        let mut backing = [0.0f64; 7];
        let bridge = unsafe { BridgeAllocator::new(backing.as_mut_ptr(), backing.len()) };
        assert_eq!(bridge.max_size(), 7);
        assert_eq!(bridge.region().len(), 7);
    }

    #[test]
    fn bridge_deallocate_leaves_memory_alone() {
        let mut backing = [9u8, 8, 7];
        let ptr = backing.as_mut_ptr();
        let mut bridge = unsafe { BridgeAllocator::new(ptr, backing.len()) };

        let got = bridge.allocate(3);
        unsafe { bridge.deallocate(got, 3) };

        assert_eq!(backing, [9, 8, 7]);
    }

    #[test]
    fn bridges_compare_equal_regardless_of_range() {
        let mut a = [1i16; 4];
        let mut b = [2i16; 16];
        let first = unsafe { BridgeAllocator::new(a.as_mut_ptr(), a.len()) };
        let second = unsafe { BridgeAllocator::new(b.as_mut_ptr(), b.len()) };
        assert_eq!(first, second);
    }

    #[test]
    fn bridge_mode_is_aliasing() {
        assert_eq!(
            <BridgeAllocator<'_, u8> as SequenceAllocator<u8>>::MODE,
            OwnershipMode::Aliasing
        );
        assert_eq!(
            <HeapAllocator<u8> as SequenceAllocator<u8>>::MODE,
            OwnershipMode::Owning
        );
    }

    // ===== Heap Tests =====

    #[test]
    fn heap_allocations_are_distinct() {
        let mut heap = HeapAllocator::<u64>::new();
        let a = heap.allocate(8);
        let b = heap.allocate(8);
        assert_ne!(a, b);
        assert_eq!(a as usize % core::mem::align_of::<u64>(), 0);
        unsafe {
            heap.deallocate(a, 8);
            heap.deallocate(b, 8);
        }
    }

    #[test]
    fn heap_zero_sized_request_is_dangling_not_null() {
        let mut heap = HeapAllocator::<f32>::new();
        let ptr = heap.allocate(0);
        assert!(!ptr.is_null());
        unsafe { heap.deallocate(ptr, 0) };
    }

    // ===== RawSequence Tests =====

    #[test]
    fn bridged_sequence_aliases_source_memory() {
        let mut backing = [10i32, 20, 30];
        let ptr = backing.as_mut_ptr();

        let seq = unsafe {
            let mut seq = RawSequence::new_in(BridgeAllocator::new(ptr, 3));
            seq.assign_raw(ptr, 3);
            seq
        };

        assert_eq!(seq.as_ptr(), ptr as *const i32);
        assert_eq!(seq.as_slice(), &[10, 20, 30]);
        assert_eq!(seq.capacity(), 3);
        assert_eq!(seq.mode(), OwnershipMode::Aliasing);
        drop(seq);

        // Dropping the bridged sequence must not free or clobber engine memory
        assert_eq!(backing, [10, 20, 30]);
    }

    #[test]
    fn bridged_sequence_capacity_capped_at_region() {
        let mut backing = [1u16, 2];
        let ptr = backing.as_mut_ptr();

        let seq = unsafe {
            let mut seq = RawSequence::new_in(BridgeAllocator::new(ptr, 2));
            seq.assign_raw(ptr, 2);
            seq
        };
        assert_eq!(seq.len(), 2);
        assert_eq!(seq.capacity(), 2);
        assert_eq!(seq.as_slice(), &[1, 2]);
    }

    #[test]
    fn bridged_assign_onto_itself_leaves_shared_borrows_intact() {
        let backing = [4u32, 5, 6];
        let held: &[u32] = &backing;
        let ptr = held.as_ptr() as *mut u32;

        // same range as source and storage: nothing is written through `ptr`
        let seq = unsafe {
            let mut seq = RawSequence::new_in(BridgeAllocator::new(ptr, 3));
            seq.assign_raw(ptr, 3);
            seq
        };

        assert_eq!(held, &[4, 5, 6]);
        assert_eq!(seq.as_slice(), held);
        assert_eq!(seq.as_ptr(), held.as_ptr());
    }

    #[test]
    fn empty_bridge_over_null_is_empty_slice() {
        let seq = unsafe {
            let mut seq = RawSequence::new_in(BridgeAllocator::<u8>::new(core::ptr::null_mut(), 0));
            seq.assign_raw(core::ptr::null(), 0);
            seq
        };
        assert!(seq.is_empty());
        assert_eq!(seq.as_slice(), &[] as &[u8]);
    }

    #[test]
    fn heap_sequence_owns_a_copy() {
        let mut source = vec![1.5f32, 2.5, 3.5];
        let seq = RawSequence::from_slice(&source);
        source[0] = 100.0;

        assert_ne!(seq.as_ptr(), source.as_ptr());
        assert_eq!(seq.as_slice(), &[1.5, 2.5, 3.5]);
        assert_eq!(seq.mode(), OwnershipMode::Owning);
    }

    #[test]
    fn heap_sequence_reassign_grows_storage() {
        let mut seq = RawSequence::from_slice(&[1u8, 2]);
        let longer = [5u8, 6, 7, 8, 9];
        unsafe { seq.assign_raw(longer.as_ptr(), longer.len()) };
        assert_eq!(seq.as_slice(), &longer);
        assert!(seq.capacity() >= longer.len());

        let shorter = [4u8];
        unsafe { seq.assign_raw(shorter.as_ptr(), shorter.len()) };
        assert_eq!(seq.as_slice(), &shorter);
    }

    #[test]
    fn heap_sequence_clone_and_mutate_independently() {
        let mut original = RawSequence::from_slice(&[1i64, 2, 3]);
        let copy = original.clone();
        original.as_mut_slice()[0] = -1;

        assert_eq!(original.as_slice(), &[-1, 2, 3]);
        assert_eq!(copy.into_vec(), vec![1, 2, 3]);
    }
}
