/*!
 * Global Allocator Adapter
 *
 * Lets a policy back Rust's `#[global_allocator]`:
 *
 * ```ignore
 * #[global_allocator]
 * static GLOBAL: GlobalGc = GlobalGc::DEFAULT;
 * ```
 *
 * Only `DEFAULT` and `UNCOLLECTABLE` are sound as a process-wide allocator:
 * Rust heap blocks hold pointers, and atomic blocks are never scanned.
 *
 * Do not combine with `WarningMode::Log`. The warning callback may run while
 * libgc holds its allocation lock, and a `tracing` subscriber that allocates
 * would re-enter libgc through this allocator. Once `GlobalGc` serves an
 * allocation, `log_warning` drops every message.
 */

use super::native::{Bdwgc, NativeCollector};
use crate::lifecycle::warnings::mark_global_allocator_active;
use super::policy::Policy;
use crate::core::limits::MAX_ALIGNMENT;
use std::alloc::{GlobalAlloc, Layout};

/// `GlobalAlloc` over libgc with a fixed policy
#[derive(Debug, Clone, Copy)]
pub struct GlobalGc {
    policy: Policy,
}

impl GlobalGc {
    pub const DEFAULT: GlobalGc = GlobalGc::new(Policy::Default);
    pub const ATOMIC: GlobalGc = GlobalGc::new(Policy::Atomic);
    pub const UNCOLLECTABLE: GlobalGc = GlobalGc::new(Policy::Uncollectable);

    pub const fn new(policy: Policy) -> Self {
        Self { policy }
    }

    pub const fn policy(&self) -> Policy {
        self.policy
    }
}

unsafe impl GlobalAlloc for GlobalGc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        mark_global_allocator_active();
        if layout.align() > MAX_ALIGNMENT {
            return std::ptr::null_mut();
        }
        let binding = self.policy.bind::<Bdwgc>();
        (binding.allocate)(&Bdwgc, layout.size()).cast()
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = self.alloc(layout);
        // Only the atomic primitive hands out uncleared memory.
        if !ptr.is_null() && self.policy == Policy::Atomic {
            std::ptr::write_bytes(ptr, 0, layout.size());
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, _layout: Layout) {
        Bdwgc.deallocate(ptr.cast())
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        if layout.align() > MAX_ALIGNMENT {
            return std::ptr::null_mut();
        }
        Bdwgc.reallocate(ptr.cast(), new_size).cast()
    }
}
