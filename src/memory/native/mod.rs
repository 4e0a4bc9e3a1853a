/*!
 * Native Collector Boundary
 *
 * The primitives the allocator layer needs from the underlying collector.
 * Everything above this module talks to the collector only through
 * [`NativeCollector`], so a different backend (or an instrumented one in
 * tests) can be swapped in without touching process-wide state.
 *
 * ## Primitive contracts
 *
 * - `allocate`: scanned for pointers, reclaimed when unreachable, zeroed
 * - `allocate_atomic`: never scanned, reclaimed when unreachable
 * - `allocate_uncollectable`: scanned, never reclaimed until freed
 * - `reallocate`: keeps a prefix of the old contents and the old block's
 *   category; a null old pointer behaves like `allocate`
 * - `deallocate`: immediate release; null is a no-op
 * - `force_collect`: full collection cycle across the shared heap
 */

#[cfg(feature = "bdwgc")]
pub mod bdwgc;
pub mod recording;

#[cfg(feature = "bdwgc")]
pub use bdwgc::Bdwgc;
pub use recording::{CallCounts, RecordingCollector};

use super::stats::HeapStats;
use crate::core::types::Size;
use std::ffi::{c_char, c_void};

/// Name the standard library gives the process main thread
pub const MAIN_THREAD_NAME: &str = "main";

/// Fail unless called on the process main thread
///
/// A collector that treats its starting thread as the primordial thread keeps
/// scanning that thread's stack for the life of the process, so it must be
/// started from a thread that outlives every other.
pub fn require_main_thread() -> Result<(), String> {
    let current = std::thread::current();
    match current.name() {
        Some(MAIN_THREAD_NAME) => Ok(()),
        name => Err(format!(
            "collector must be started from the main thread, not {:?}",
            name.unwrap_or("<unnamed>")
        )),
    }
}

/// Collector warning callback
///
/// Receives a printf-style message and a single word-sized argument.
pub type WarnProc = unsafe extern "C" fn(msg: *mut c_char, arg: usize);

/// Native collector primitives
pub trait NativeCollector: Send + Sync + 'static {
    /// Bring the collector up. Must be idempotent.
    fn init(&self) -> Result<(), String>;

    /// Allocate scanned, collected memory
    fn allocate(&self, size: Size) -> *mut c_void;

    /// Allocate pointer-free memory that is never scanned
    fn allocate_atomic(&self, size: Size) -> *mut c_void;

    /// Allocate scanned memory that is never reclaimed automatically
    fn allocate_uncollectable(&self, size: Size) -> *mut c_void;

    /// Resize a block, preserving its prefix and category
    ///
    /// # Safety
    /// `ptr` must be null or a live block obtained from this collector.
    unsafe fn reallocate(&self, ptr: *mut c_void, size: Size) -> *mut c_void;

    /// Release a block immediately
    ///
    /// # Safety
    /// `ptr` must be null or a live block obtained from this collector, and
    /// must not be used afterwards.
    unsafe fn deallocate(&self, ptr: *mut c_void);

    /// Run a full collection
    fn force_collect(&self);

    /// Switch to incremental collection
    fn enable_incremental(&self);

    /// Install a warning handler, returning the previous one
    fn set_warning_handler(&self, handler: WarnProc) -> Option<WarnProc>;

    /// Grow the heap ahead of demand. Returns false if the collector refused.
    fn expand_heap(&self, bytes: Size) -> bool;

    /// Cap heap growth
    fn set_max_heap_size(&self, bytes: Size);

    /// Snapshot heap counters
    fn heap_stats(&self) -> HeapStats;
}
