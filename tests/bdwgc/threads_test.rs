/*!
 * Thread Registration Tests
 * Which threads may start libgc and how the rest join it
 */

use gc_alloc::{initialize, Allocator, Bdwgc, ExecutionContext, Policy};
use pretty_assertions::assert_eq;
use std::thread;

/// Must run before anything starts libgc
pub fn test_worker_thread_cannot_start_collector() {
    let err = thread::Builder::new()
        .name("gc-worker".to_string())
        .spawn(|| gc_alloc::NativeCollector::init(&Bdwgc::new()))
        .unwrap()
        .join()
        .unwrap()
        .unwrap_err();
    assert!(err.contains("main thread"), "unexpected error: {}", err);
}

pub fn test_init_thread_stays_registered(ctx: &ExecutionContext<Bdwgc>) {
    assert!(ctx.collector().is_init_thread());
    let registration = ctx.collector().register_current_thread().unwrap();
    assert!(!registration.is_owned());
}

pub fn test_worker_thread_registers_and_allocates(ctx: &ExecutionContext<Bdwgc>) {
    let worker = ctx.with_policy(Policy::Default);
    let collected = thread::spawn(move || {
        // Already started, so a worker may bootstrap again.
        let _again = initialize(false);
        let registration = worker.collector().register_current_thread().unwrap();
        assert!(registration.is_owned());
        assert!(!worker.collector().is_init_thread());

        let allocator = worker.allocator();
        let mut block = allocator.alloc(256).unwrap();
        unsafe { block.as_mut_slice().fill(7) };
        let stats = worker.collect();
        assert!(unsafe { block.as_slice() }.iter().all(|b| *b == 7));
        stats.collections
    })
    .join()
    .unwrap();

    assert!(collected > 0);
    assert_eq!(ctx.policy(), Policy::Default);
}

pub fn test_global_alloc_roundtrip(_ctx: &ExecutionContext<Bdwgc>) {
    use gc_alloc::GlobalGc;
    use std::alloc::{GlobalAlloc, Layout};

    let layout = Layout::from_size_align(48, 8).unwrap();
    unsafe {
        let ptr = GlobalGc::ATOMIC.alloc_zeroed(layout);
        assert!(!ptr.is_null());
        assert!(std::slice::from_raw_parts(ptr, 48).iter().all(|&b| b == 0));
        std::ptr::write_bytes(ptr, 0xab, 48);

        let grown = GlobalGc::ATOMIC.realloc(ptr, layout, 96);
        assert!(!grown.is_null());
        assert_eq!(*grown.add(47), 0xab);
        GlobalGc::ATOMIC.dealloc(grown, Layout::from_size_align(96, 8).unwrap());
    }
}
