/*!
 * Memory Traits
 * The allocator seam generic code is written against
 */

use super::policy::Policy;
use super::types::*;
use crate::core::types::Size;

/// Generic allocator interface
///
/// Every policy implements this identically; code written against it works
/// with any of them. Only the scanning and reclamation behaviour of the
/// backing collector differs.
pub trait Allocator: Send + Sync {
    /// Run one request through the dispatcher
    ///
    /// # Safety
    /// `request.old` must be null or a live block from the same collector.
    unsafe fn request(&self, request: &AllocationRequest) -> MemoryResult<Allocation>;

    /// Policy backing this allocator
    fn policy(&self) -> Policy;

    /// Allocate `size` bytes (zeroed when the primitive zeroes)
    fn alloc(&self, size: Size) -> MemoryResult<Allocation> {
        unsafe { self.request(&AllocationRequest::alloc(size)) }
    }

    /// Allocate with an explicit alignment
    fn alloc_aligned(&self, size: Size, alignment: Size) -> MemoryResult<Allocation> {
        unsafe { self.request(&AllocationRequest::alloc(size).with_alignment(alignment)) }
    }

    /// Allocate without asking for zeroing
    fn alloc_non_zeroed(&self, size: Size) -> MemoryResult<Allocation> {
        unsafe { self.request(&AllocationRequest::alloc_non_zeroed(size)) }
    }

    /// Resize a previous allocation (or allocate under this policy, if `old`
    /// is null)
    ///
    /// Resizing a live block to 0 bytes releases it and returns an empty
    /// [`Allocation`] rather than `OutOfMemory`.
    ///
    /// # Safety
    /// `old` must be null or a live block from the same collector.
    unsafe fn resize(&self, old: *mut u8, size: Size) -> MemoryResult<Allocation> {
        self.request(&AllocationRequest::resize(old, size))
    }

    /// Release a block now, regardless of reachability
    ///
    /// # Safety
    /// `ptr` must be null or a live block from the same collector, and must
    /// not be used afterwards.
    unsafe fn free(&self, ptr: *mut u8) {
        // Free never fails.
        let _ = self.request(&AllocationRequest::free(ptr));
    }

    /// Run a full collection over the shared heap
    fn free_all(&self) {
        let _ = unsafe { self.request(&AllocationRequest::free_all()) };
    }
}
