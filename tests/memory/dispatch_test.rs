/*!
 * Dispatcher Tests
 * Request routing, error normalization and native call accounting
 */

use gc_alloc::core::limits::MAX_ALIGNMENT;
use gc_alloc::memory::dispatch;
use gc_alloc::{
    AllocationRequest, Allocator, AllocatorMode, GcAllocator, MemoryError, Policy,
    RecordingCollector, POINTER_WIDTH,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

fn allocator(policy: Policy) -> (Arc<RecordingCollector>, GcAllocator<RecordingCollector>) {
    let collector = Arc::new(RecordingCollector::new());
    let allocator = GcAllocator::new(Arc::clone(&collector), policy);
    (collector, allocator)
}

#[test]
fn test_max_alignment_is_pointer_width() {
    assert_eq!(MAX_ALIGNMENT, POINTER_WIDTH);
}

#[test]
fn test_each_policy_uses_its_own_primitive() {
    let collector = Arc::new(RecordingCollector::new());
    for policy in Policy::ALL {
        let allocator = GcAllocator::new(Arc::clone(&collector), policy);
        allocator.alloc(24).unwrap();
    }

    let counts = collector.counts();
    assert_eq!(counts.allocate, 1);
    assert_eq!(counts.allocate_atomic, 1);
    assert_eq!(counts.allocate_uncollectable, 1);
}

#[test]
fn test_non_zeroed_uses_same_primitive() {
    let (collector, allocator) = allocator(Policy::Atomic);
    let block = allocator.alloc_non_zeroed(100).unwrap();
    assert_eq!(block.len(), 100);
    assert_eq!(collector.counts().allocate_atomic, 1);
    assert_eq!(collector.category_of(block.as_ptr()), Some(Policy::Atomic));
}

#[test]
fn test_alloc_is_zeroed() {
    let (_collector, allocator) = allocator(Policy::Default);
    let block = allocator.alloc(256).unwrap();
    assert!(unsafe { block.as_slice() }.iter().all(|b| *b == 0));
}

#[test]
fn test_rejected_modes_make_no_native_call() {
    let (collector, allocator) = allocator(Policy::Uncollectable);
    for mode in [
        AllocatorMode::ResizeNonZeroed,
        AllocatorMode::QueryFeatures,
        AllocatorMode::QueryInfo,
    ] {
        assert!(!mode.is_supported());
        let err = unsafe { allocator.request(&AllocationRequest::new(mode, 16)) }.unwrap_err();
        assert_eq!(err, MemoryError::ModeNotImplemented(mode));
    }
    assert_eq!(collector.counts().total(), 0);
}

#[test]
fn test_supported_modes() {
    assert_eq!(
        AllocatorMode::supported(),
        &[
            AllocatorMode::Alloc,
            AllocatorMode::AllocNonZeroed,
            AllocatorMode::Resize,
            AllocatorMode::Free,
            AllocatorMode::FreeAll,
        ]
    );
}

#[test]
fn test_resize_null_allocates_under_policy() {
    for policy in Policy::ALL {
        let (collector, allocator) = allocator(policy);
        let block = unsafe { allocator.resize(std::ptr::null_mut(), 48) }.unwrap();
        assert_eq!(block.len(), 48);
        assert_eq!(collector.category_of(block.as_ptr()), Some(policy));
        assert_eq!(collector.counts().reallocate, 0);
        assert_eq!(collector.counts().heap_calls(), 1);
        assert_eq!(collector.live_blocks(), 1);
    }
}

#[test]
fn test_resize_to_zero_is_release_not_failure() {
    for policy in Policy::ALL {
        let (collector, allocator) = allocator(policy);
        let block = allocator.alloc(32).unwrap();
        let released = unsafe { allocator.resize(block.as_ptr(), 0) }.unwrap();
        assert!(!released.is_some());
        assert_eq!(collector.live_blocks(), 0);
    }
}

#[test]
fn test_resize_keeps_policy_of_block() {
    let (collector, allocator) = allocator(Policy::Uncollectable);
    let block = allocator.alloc(16).unwrap();
    let grown = unsafe { allocator.resize(block.as_ptr(), 4096) }.unwrap();
    assert_eq!(collector.category_of(grown.as_ptr()), Some(Policy::Uncollectable));
}

#[test]
fn test_out_of_memory_carries_request() {
    let collector = Arc::new(RecordingCollector::with_max_heap(1024));
    let allocator = GcAllocator::atomic(Arc::clone(&collector));
    let err = allocator.alloc(4096).unwrap_err();
    assert_eq!(
        err,
        MemoryError::OutOfMemory {
            requested: 4096,
            policy: Policy::Atomic,
        }
    );
    assert!(err.to_string().contains("4096"));
}

#[test]
fn test_free_all_collects_once_per_call() {
    let (collector, allocator) = allocator(Policy::Default);
    allocator.free_all();
    allocator.free_all();
    assert_eq!(collector.counts().force_collect, 2);
    assert_eq!(collector.counts().heap_calls(), 0);
}

#[test]
fn test_dispatch_free_function() {
    let collector = RecordingCollector::new();
    let block =
        unsafe { dispatch(&collector, Policy::Default.bind(), &AllocationRequest::alloc(8)) }
            .unwrap();
    let freed = unsafe {
        dispatch(
            &collector,
            Policy::Default.bind(),
            &AllocationRequest::free(block.as_ptr()),
        )
    }
    .unwrap();
    assert!(freed.is_empty());
    assert_eq!(collector.live_blocks(), 0);
}

proptest! {
    #[test]
    fn prop_alloc_returns_exact_size_and_distinct_blocks(
        sizes in prop::collection::vec(0usize..4096, 1..32),
        policy_index in 0usize..3,
    ) {
        let policy = Policy::ALL[policy_index];
        let (collector, allocator) = allocator(policy);

        let mut seen = HashSet::new();
        for size in &sizes {
            let block = allocator.alloc(*size).unwrap();
            prop_assert_eq!(block.len(), *size);
            prop_assert!(block.is_some());
            prop_assert!(seen.insert(block.address()));
        }
        prop_assert_eq!(collector.live_blocks(), sizes.len());
    }

    #[test]
    fn prop_over_alignment_never_reaches_collector(
        size in 0usize..4096,
        shift in 1u32..12,
        policy_index in 0usize..3,
    ) {
        let policy = Policy::ALL[policy_index];
        let (collector, allocator) = allocator(policy);
        let alignment = MAX_ALIGNMENT << shift;

        let err = allocator.alloc_aligned(size, alignment).unwrap_err();
        prop_assert_eq!(err, MemoryError::InvalidArgument { alignment, max: MAX_ALIGNMENT });
        prop_assert_eq!(collector.counts().total(), 0);
    }

    #[test]
    fn prop_resize_preserves_common_prefix(
        initial in 1usize..512,
        target in 1usize..512,
        fill in any::<u8>(),
    ) {
        let (_collector, allocator) = allocator(Policy::Default);
        let mut block = allocator.alloc(initial).unwrap();
        unsafe { block.as_mut_slice().fill(fill) };

        let resized = unsafe { allocator.resize(block.as_ptr(), target) }.unwrap();
        prop_assert_eq!(resized.len(), target);
        let common = initial.min(target);
        let prefix_kept = unsafe { resized.as_slice() }[..common].iter().all(|b| *b == fill);
        prop_assert!(prefix_kept);
    }
}
