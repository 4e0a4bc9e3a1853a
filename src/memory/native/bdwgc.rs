/*!
 * Boehm-Demers-Weiser Collector
 * Raw bindings to libgc and the `NativeCollector` implementation over them
 */

use super::{require_main_thread, NativeCollector, WarnProc};
use crate::core::types::Size;
use crate::memory::stats::HeapStats;
use std::ffi::{c_int, c_void};
use std::marker::PhantomData;
use std::sync::{Once, OnceLock};
use std::thread::{self, ThreadId};
use tracing::{debug, info};

const GC_SUCCESS: c_int = 0;
const GC_DUPLICATE: c_int = 1;

#[repr(C)]
struct GcStackBase {
    mem_base: *mut c_void,
}

#[link(name = "gc")]
extern "C" {
    fn GC_init();
    fn GC_is_init_called() -> c_int;
    fn GC_malloc(size: usize) -> *mut c_void;
    fn GC_malloc_atomic(size: usize) -> *mut c_void;
    fn GC_malloc_uncollectable(size: usize) -> *mut c_void;
    fn GC_realloc(ptr: *mut c_void, size: usize) -> *mut c_void;
    fn GC_free(ptr: *mut c_void);
    fn GC_gcollect();
    fn GC_enable_incremental();
    fn GC_get_warn_proc() -> Option<WarnProc>;
    fn GC_set_warn_proc(handler: WarnProc);
    fn GC_expand_hp(bytes: usize) -> c_int;
    fn GC_set_max_heap_size(bytes: usize);
    fn GC_get_heap_size() -> usize;
    fn GC_get_free_bytes() -> usize;
    fn GC_get_bytes_since_gc() -> usize;
    fn GC_get_total_bytes() -> usize;
    fn GC_get_gc_no() -> usize;
    fn GC_base(ptr: *mut c_void) -> *mut c_void;
    fn GC_allow_register_threads();
    fn GC_get_stack_base(base: *mut GcStackBase) -> c_int;
    fn GC_register_my_thread(base: *const GcStackBase) -> c_int;
    fn GC_unregister_my_thread() -> c_int;
    fn GC_general_register_disappearing_link(link: *mut *mut c_void, obj: *const c_void) -> c_int;
}

static INIT: Once = Once::new();

/// Thread that ran `GC_init`; libgc registers it for the life of the process
static INIT_THREAD: OnceLock<ThreadId> = OnceLock::new();

/// Handle to the process-wide libgc instance
///
/// Zero-sized: every handle refers to the same collector.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bdwgc;

impl Bdwgc {
    pub const fn new() -> Self {
        Self
    }

    /// Start of the collector block containing `ptr`, or null if `ptr` is not
    /// inside the collected heap
    pub fn base_of(&self, ptr: *const u8) -> *mut u8 {
        unsafe { GC_base(ptr as *mut c_void).cast() }
    }

    /// Whether the calling thread is the one libgc was started on
    pub fn is_init_thread(&self) -> bool {
        INIT_THREAD.get() == Some(&thread::current().id())
    }

    /// Register the calling thread so its stack is scanned for roots
    ///
    /// Threads other than the init thread must register before touching
    /// collected memory; the returned guard unregisters on drop. The init
    /// thread is registered by `GC_init` itself and gets a guard that never
    /// unregisters.
    pub fn register_current_thread(&self) -> Result<ThreadRegistration, String> {
        if self.is_init_thread() {
            return Ok(ThreadRegistration::new(false));
        }
        let mut base = GcStackBase {
            mem_base: std::ptr::null_mut(),
        };
        let status = unsafe { GC_get_stack_base(&mut base) };
        if status != GC_SUCCESS {
            return Err(format!("GC_get_stack_base failed with status {}", status));
        }
        match unsafe { GC_register_my_thread(&base) } {
            GC_SUCCESS => Ok(ThreadRegistration::new(true)),
            GC_DUPLICATE => Ok(ThreadRegistration::new(false)),
            other => Err(format!("GC_register_my_thread failed with status {}", other)),
        }
    }

    /// Arrange for `*link` to be cleared once `obj` becomes unreachable
    ///
    /// # Safety
    /// `link` must stay valid for as long as `obj` may be collected and must
    /// live somewhere the collector does not scan (e.g. the host heap).
    pub unsafe fn register_disappearing_link(
        &self,
        link: *mut *mut c_void,
        obj: *const c_void,
    ) -> bool {
        GC_general_register_disappearing_link(link, obj) == GC_SUCCESS
    }
}

impl NativeCollector for Bdwgc {
    /// Start libgc on the first call; later calls from any thread are no-ops
    ///
    /// The first call must come from the process main thread.
    fn init(&self) -> Result<(), String> {
        if !INIT.is_completed() {
            require_main_thread()?;
        }
        INIT.call_once(|| unsafe {
            GC_init();
            GC_allow_register_threads();
            let _ = INIT_THREAD.set(thread::current().id());
            debug!("libgc initialized on the main thread");
        });
        if unsafe { GC_is_init_called() } != 0 {
            Ok(())
        } else {
            Err("libgc did not complete initialization".to_string())
        }
    }

    #[inline]
    fn allocate(&self, size: Size) -> *mut c_void {
        unsafe { GC_malloc(size) }
    }

    #[inline]
    fn allocate_atomic(&self, size: Size) -> *mut c_void {
        unsafe { GC_malloc_atomic(size) }
    }

    #[inline]
    fn allocate_uncollectable(&self, size: Size) -> *mut c_void {
        unsafe { GC_malloc_uncollectable(size) }
    }

    #[inline]
    unsafe fn reallocate(&self, ptr: *mut c_void, size: Size) -> *mut c_void {
        GC_realloc(ptr, size)
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: *mut c_void) {
        GC_free(ptr)
    }

    fn force_collect(&self) {
        unsafe { GC_gcollect() }
    }

    fn enable_incremental(&self) {
        unsafe { GC_enable_incremental() };
        info!("libgc incremental collection enabled");
    }

    fn set_warning_handler(&self, handler: WarnProc) -> Option<WarnProc> {
        unsafe {
            let previous = GC_get_warn_proc();
            GC_set_warn_proc(handler);
            previous
        }
    }

    fn expand_heap(&self, bytes: Size) -> bool {
        unsafe { GC_expand_hp(bytes) != 0 }
    }

    fn set_max_heap_size(&self, bytes: Size) {
        unsafe { GC_set_max_heap_size(bytes) }
    }

    fn heap_stats(&self) -> HeapStats {
        unsafe {
            HeapStats {
                heap_size: GC_get_heap_size(),
                free_bytes: GC_get_free_bytes(),
                bytes_since_gc: GC_get_bytes_since_gc(),
                total_bytes: GC_get_total_bytes(),
                collections: GC_get_gc_no() as u64,
            }
        }
    }
}

/// Keeps the current thread registered with libgc until dropped
#[must_use = "the thread is unregistered when the guard is dropped"]
pub struct ThreadRegistration {
    owned: bool,
    _thread_bound: PhantomData<*const ()>,
}

impl ThreadRegistration {
    fn new(owned: bool) -> Self {
        Self {
            owned,
            _thread_bound: PhantomData,
        }
    }

    /// Whether dropping this guard unregisters the thread
    pub fn is_owned(&self) -> bool {
        self.owned
    }
}

impl Drop for ThreadRegistration {
    fn drop(&mut self) {
        if self.owned {
            unsafe {
                GC_unregister_my_thread();
            }
        }
    }
}
