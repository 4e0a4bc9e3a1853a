/*!
 * Recording Collector
 *
 * A `NativeCollector` backed by the host heap that records every primitive
 * call. It keeps the block categories and the prefix/category contract of
 * `reallocate`, honours a heap cap, and lets callers fire collector warnings
 * on demand. It performs no reachability analysis: `force_collect` only
 * counts, and collected blocks live until they are freed or the collector is
 * dropped.
 */

use super::{NativeCollector, WarnProc};
use crate::core::limits::RECORDING_MAX_REQUEST;
use crate::core::types::{Address, Size, POINTER_WIDTH};
use crate::memory::policy::Policy;
use crate::memory::stats::HeapStats;
use ahash::RandomState;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::alloc::Layout;
use std::ffi::{c_void, CString};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use tracing::warn;

/// Snapshot of how often each primitive was invoked
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CallCounts {
    pub init: usize,
    pub allocate: usize,
    pub allocate_atomic: usize,
    pub allocate_uncollectable: usize,
    pub reallocate: usize,
    pub deallocate: usize,
    pub force_collect: usize,
    pub enable_incremental: usize,
    pub set_warning_handler: usize,
    pub expand_heap: usize,
    pub set_max_heap_size: usize,
}

impl CallCounts {
    /// Calls that touch the heap (allocation, resize, free, collection)
    pub fn heap_calls(&self) -> usize {
        self.allocate
            + self.allocate_atomic
            + self.allocate_uncollectable
            + self.reallocate
            + self.deallocate
            + self.force_collect
    }

    /// Every recorded call
    pub fn total(&self) -> usize {
        self.heap_calls()
            + self.init
            + self.enable_incremental
            + self.set_warning_handler
            + self.expand_heap
            + self.set_max_heap_size
    }
}

#[derive(Default)]
struct Counters {
    init: AtomicUsize,
    allocate: AtomicUsize,
    allocate_atomic: AtomicUsize,
    allocate_uncollectable: AtomicUsize,
    reallocate: AtomicUsize,
    deallocate: AtomicUsize,
    force_collect: AtomicUsize,
    enable_incremental: AtomicUsize,
    set_warning_handler: AtomicUsize,
    expand_heap: AtomicUsize,
    set_max_heap_size: AtomicUsize,
}

#[inline]
fn bump(counter: &AtomicUsize) {
    counter.fetch_add(1, Ordering::Relaxed);
}

#[derive(Debug, Clone, Copy)]
struct Block {
    layout: Layout,
    len: Size,
    category: Policy,
}

/// Instrumented host-heap collector
pub struct RecordingCollector {
    counters: Counters,
    blocks: DashMap<Address, Block, RandomState>,
    live_bytes: AtomicUsize,
    reserved_bytes: AtomicUsize,
    bytes_since_gc: AtomicUsize,
    total_bytes: AtomicUsize,
    collections: AtomicU64,
    max_heap: AtomicUsize,
    initialized: AtomicBool,
    incremental: AtomicBool,
    warn_proc: Mutex<Option<WarnProc>>,
    fail_init: Option<String>,
}

impl RecordingCollector {
    pub fn new() -> Self {
        Self {
            counters: Counters::default(),
            blocks: DashMap::with_hasher(RandomState::new()),
            live_bytes: AtomicUsize::new(0),
            reserved_bytes: AtomicUsize::new(0),
            bytes_since_gc: AtomicUsize::new(0),
            total_bytes: AtomicUsize::new(0),
            collections: AtomicU64::new(0),
            max_heap: AtomicUsize::new(0),
            initialized: AtomicBool::new(false),
            incremental: AtomicBool::new(false),
            warn_proc: Mutex::new(None),
            fail_init: None,
        }
    }

    /// A collector whose heap refuses to grow past `bytes`
    pub fn with_max_heap(bytes: Size) -> Self {
        let collector = Self::new();
        collector.max_heap.store(bytes, Ordering::Relaxed);
        collector
    }

    /// A collector whose startup always fails with `reason`
    pub fn failing_init(reason: impl Into<String>) -> Self {
        let mut collector = Self::new();
        collector.fail_init = Some(reason.into());
        collector
    }

    pub fn counts(&self) -> CallCounts {
        let c = &self.counters;
        let load = |counter: &AtomicUsize| counter.load(Ordering::Relaxed);
        CallCounts {
            init: load(&c.init),
            allocate: load(&c.allocate),
            allocate_atomic: load(&c.allocate_atomic),
            allocate_uncollectable: load(&c.allocate_uncollectable),
            reallocate: load(&c.reallocate),
            deallocate: load(&c.deallocate),
            force_collect: load(&c.force_collect),
            enable_incremental: load(&c.enable_incremental),
            set_warning_handler: load(&c.set_warning_handler),
            expand_heap: load(&c.expand_heap),
            set_max_heap_size: load(&c.set_max_heap_size),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    pub fn is_incremental(&self) -> bool {
        self.incremental.load(Ordering::Acquire)
    }

    /// Number of blocks not yet freed
    pub fn live_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Bytes held by blocks not yet freed
    pub fn live_bytes(&self) -> Size {
        self.live_bytes.load(Ordering::Relaxed)
    }

    /// Category of the live block starting at `ptr`
    pub fn category_of(&self, ptr: *const u8) -> Option<Policy> {
        self.blocks
            .get(&(ptr as Address))
            .map(|entry| entry.value().category)
    }

    /// Requested length of the live block starting at `ptr`
    pub fn len_of(&self, ptr: *const u8) -> Option<Size> {
        self.blocks.get(&(ptr as Address)).map(|entry| entry.value().len)
    }

    /// The currently installed warning handler
    pub fn warning_handler(&self) -> Option<WarnProc> {
        *self.warn_proc.lock()
    }

    /// Fire a collector warning through the installed handler
    ///
    /// Returns false if no handler is installed.
    pub fn emit_warning(&self, msg: &str, arg: usize) -> bool {
        let Some(handler) = self.warning_handler() else {
            return false;
        };
        let Ok(msg) = CString::new(msg) else {
            return false;
        };
        let raw = msg.into_raw();
        unsafe {
            handler(raw, arg);
            drop(CString::from_raw(raw));
        }
        true
    }

    fn layout_for(size: Size) -> Option<Layout> {
        if size > RECORDING_MAX_REQUEST {
            return None;
        }
        Layout::from_size_align(size.max(1), POINTER_WIDTH).ok()
    }

    /// Reserve `delta` more live bytes against the heap cap
    fn reserve(&self, delta: Size) -> bool {
        let max = self.max_heap.load(Ordering::Relaxed);
        let prev = self.live_bytes.fetch_add(delta, Ordering::SeqCst);
        if max != 0 && prev + delta > max {
            self.live_bytes.fetch_sub(delta, Ordering::SeqCst);
            return false;
        }
        self.bytes_since_gc.fetch_add(delta, Ordering::Relaxed);
        self.total_bytes.fetch_add(delta, Ordering::Relaxed);
        true
    }

    fn release(&self, bytes: Size) {
        self.live_bytes.fetch_sub(bytes, Ordering::SeqCst);
    }

    fn allocate_block(&self, size: Size, category: Policy) -> *mut c_void {
        let Some(layout) = Self::layout_for(size) else {
            return std::ptr::null_mut();
        };
        if !self.reserve(layout.size()) {
            return std::ptr::null_mut();
        }
        let ptr = unsafe { std::alloc::alloc_zeroed(layout) };
        if ptr.is_null() {
            self.release(layout.size());
            return std::ptr::null_mut();
        }
        self.blocks.insert(
            ptr as Address,
            Block {
                layout,
                len: size,
                category,
            },
        );
        ptr.cast()
    }
}

impl Default for RecordingCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeCollector for RecordingCollector {
    fn init(&self) -> Result<(), String> {
        bump(&self.counters.init);
        if let Some(reason) = &self.fail_init {
            return Err(reason.clone());
        }
        self.initialized.store(true, Ordering::Release);
        Ok(())
    }

    fn allocate(&self, size: Size) -> *mut c_void {
        bump(&self.counters.allocate);
        self.allocate_block(size, Policy::Default)
    }

    fn allocate_atomic(&self, size: Size) -> *mut c_void {
        bump(&self.counters.allocate_atomic);
        self.allocate_block(size, Policy::Atomic)
    }

    fn allocate_uncollectable(&self, size: Size) -> *mut c_void {
        bump(&self.counters.allocate_uncollectable);
        self.allocate_block(size, Policy::Uncollectable)
    }

    unsafe fn reallocate(&self, ptr: *mut c_void, size: Size) -> *mut c_void {
        bump(&self.counters.reallocate);
        if ptr.is_null() {
            return self.allocate_block(size, Policy::Default);
        }
        if size == 0 {
            self.free_block(ptr);
            return std::ptr::null_mut();
        }

        let Some(block) = self.blocks.get(&(ptr as Address)).map(|e| *e.value()) else {
            warn!(address = ptr as Address, "reallocate of unknown block");
            return std::ptr::null_mut();
        };
        let Some(new_layout) = Self::layout_for(size) else {
            return std::ptr::null_mut();
        };

        let old_bytes = block.layout.size();
        let new_bytes = new_layout.size();
        if new_bytes > old_bytes && !self.reserve(new_bytes - old_bytes) {
            return std::ptr::null_mut();
        }

        let new_ptr = std::alloc::realloc(ptr.cast(), block.layout, new_bytes);
        if new_ptr.is_null() {
            if new_bytes > old_bytes {
                self.release(new_bytes - old_bytes);
            }
            return std::ptr::null_mut();
        }
        if new_bytes < old_bytes {
            self.release(old_bytes - new_bytes);
        }

        // The atomic primitive never clears; the others hand out zeroed tails.
        if block.category != Policy::Atomic && new_bytes > old_bytes {
            std::ptr::write_bytes(new_ptr.add(old_bytes), 0, new_bytes - old_bytes);
        }

        self.blocks.remove(&(ptr as Address));
        self.blocks.insert(
            new_ptr as Address,
            Block {
                layout: new_layout,
                len: size,
                category: block.category,
            },
        );
        new_ptr.cast()
    }

    unsafe fn deallocate(&self, ptr: *mut c_void) {
        bump(&self.counters.deallocate);
        self.free_block(ptr);
    }

    fn force_collect(&self) {
        bump(&self.counters.force_collect);
        self.collections.fetch_add(1, Ordering::Relaxed);
        self.bytes_since_gc.store(0, Ordering::Relaxed);
    }

    fn enable_incremental(&self) {
        bump(&self.counters.enable_incremental);
        self.incremental.store(true, Ordering::Release);
    }

    fn set_warning_handler(&self, handler: WarnProc) -> Option<WarnProc> {
        bump(&self.counters.set_warning_handler);
        self.warn_proc.lock().replace(handler)
    }

    fn expand_heap(&self, bytes: Size) -> bool {
        bump(&self.counters.expand_heap);
        let max = self.max_heap.load(Ordering::Relaxed);
        let reserved = self.reserved_bytes.load(Ordering::Relaxed);
        if max != 0 && reserved + bytes > max {
            return false;
        }
        self.reserved_bytes.fetch_add(bytes, Ordering::Relaxed);
        true
    }

    fn set_max_heap_size(&self, bytes: Size) {
        bump(&self.counters.set_max_heap_size);
        self.max_heap.store(bytes, Ordering::Relaxed);
    }

    fn heap_stats(&self) -> HeapStats {
        let live = self.live_bytes();
        let reserved = self.reserved_bytes.load(Ordering::Relaxed);
        HeapStats {
            heap_size: live.max(reserved),
            free_bytes: reserved.saturating_sub(live),
            bytes_since_gc: self.bytes_since_gc.load(Ordering::Relaxed),
            total_bytes: self.total_bytes.load(Ordering::Relaxed),
            collections: self.collections.load(Ordering::Relaxed),
        }
    }
}

impl RecordingCollector {
    unsafe fn free_block(&self, ptr: *mut c_void) {
        if ptr.is_null() {
            return;
        }
        match self.blocks.remove(&(ptr as Address)) {
            Some((_, block)) => {
                std::alloc::dealloc(ptr.cast(), block.layout);
                self.release(block.layout.size());
            }
            None => warn!(address = ptr as Address, "deallocate of unknown block"),
        }
    }
}

impl Drop for RecordingCollector {
    fn drop(&mut self) {
        for entry in self.blocks.iter() {
            unsafe { std::alloc::dealloc(*entry.key() as *mut u8, entry.value().layout) };
        }
    }
}
