/*!
 * Execution Context Tests
 * Switching policies without touching other callers
 */

use gc_alloc::lifecycle::current_override;
use gc_alloc::{bootstrap, Allocator, GcConfig, Policy, RecordingCollector};
use pretty_assertions::assert_eq;
use std::sync::Arc;

#[test]
fn test_with_policy_builds_matching_allocator() {
    let collector = Arc::new(RecordingCollector::new());
    let ctx = bootstrap(Arc::clone(&collector), GcConfig::new());

    for policy in Policy::ALL {
        let derived = ctx.with_policy(policy);
        let block = derived.allocator().alloc(8).unwrap();
        assert_eq!(collector.category_of(block.as_ptr()), Some(policy));
    }
    assert_eq!(ctx.policy(), Policy::Default);
}

#[test]
fn test_scoped_policy_applies_to_allocator() {
    let collector = Arc::new(RecordingCollector::new());
    let ctx = bootstrap(Arc::clone(&collector), GcConfig::new());

    let block = {
        let _scope = ctx.scoped(Policy::Uncollectable);
        assert_eq!(current_override(), Some(Policy::Uncollectable));
        ctx.allocator().alloc(8).unwrap()
    };

    assert_eq!(collector.category_of(block.as_ptr()), Some(Policy::Uncollectable));
    assert_eq!(ctx.base_policy(), Policy::Default);
    assert_eq!(current_override(), None);
}

#[test]
fn test_collect_reports_heap_counters() {
    let collector = Arc::new(RecordingCollector::new());
    let ctx = bootstrap(Arc::clone(&collector), GcConfig::new());

    ctx.allocator().alloc(100).unwrap();
    let before = ctx.heap_stats();
    assert!(before.bytes_since_gc >= 100);

    let after = ctx.collect();
    assert_eq!(after.collections, before.collections + 1);
    assert_eq!(after.bytes_since_gc, 0);
    assert_eq!(after.total_bytes, before.total_bytes);
}
