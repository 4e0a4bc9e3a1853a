/*!
 * Policy Interchangeability Tests
 * Generic code behaves the same over every allocator policy
 */

use gc_alloc::{Allocator, GcAllocator, MemoryResult, Policy, RecordingCollector};
use pretty_assertions::assert_eq;
use std::sync::Arc;

/// Builds a small growable byte buffer through any allocator
fn build_buffer(allocator: &impl Allocator, chunks: &[&[u8]]) -> MemoryResult<Vec<u8>> {
    let mut block = allocator.alloc(0)?;
    let mut len = 0;
    for chunk in chunks {
        block = unsafe { allocator.resize(block.as_ptr(), len + chunk.len())? };
        unsafe { block.as_mut_slice()[len..].copy_from_slice(chunk) };
        len += chunk.len();
    }
    let contents = unsafe { block.as_slice() }.to_vec();
    unsafe { allocator.free(block.as_ptr()) };
    Ok(contents)
}

#[test]
fn test_generic_code_is_policy_agnostic() {
    let collector = Arc::new(RecordingCollector::new());
    let chunks: [&[u8]; 3] = [b"conservative ", b"mark and ", b"sweep"];

    let results: Vec<Vec<u8>> = Policy::ALL
        .iter()
        .map(|policy| {
            let allocator = GcAllocator::new(Arc::clone(&collector), *policy);
            build_buffer(&allocator, &chunks).unwrap()
        })
        .collect();

    for result in &results {
        assert_eq!(result.as_slice(), b"conservative mark and sweep");
    }
    assert_eq!(collector.live_blocks(), 0);
}

#[test]
fn test_trait_objects_share_dispatch() {
    let collector = Arc::new(RecordingCollector::new());
    let allocators: Vec<Box<dyn Allocator>> = vec![
        Box::new(GcAllocator::default_policy(Arc::clone(&collector))),
        Box::new(GcAllocator::atomic(Arc::clone(&collector))),
        Box::new(GcAllocator::uncollectable(Arc::clone(&collector))),
    ];

    let policies: Vec<Policy> = allocators.iter().map(|a| a.policy()).collect();
    assert_eq!(policies, Policy::ALL.to_vec());

    for allocator in &allocators {
        let block = allocator.alloc(32).unwrap();
        assert_eq!(collector.category_of(block.as_ptr()), Some(allocator.policy()));
    }
    assert_eq!(collector.live_blocks(), 3);
}

#[test]
fn test_policy_properties() {
    assert!(Policy::Default.is_scanned() && Policy::Default.is_collected());
    assert!(!Policy::Atomic.is_scanned() && Policy::Atomic.is_collected());
    assert!(Policy::Uncollectable.is_scanned() && !Policy::Uncollectable.is_collected());
    assert_eq!(Policy::default(), Policy::Default);
}

#[test]
fn test_allocators_are_shareable_across_threads() {
    let collector = Arc::new(RecordingCollector::new());
    let allocator = GcAllocator::default_policy(Arc::clone(&collector));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let allocator = allocator.clone();
            std::thread::spawn(move || {
                for size in 1..=64 {
                    allocator.alloc(size).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(collector.counts().allocate, 4 * 64);
    assert_eq!(collector.live_blocks(), 4 * 64);
}
