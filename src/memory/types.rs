/*!
 * Memory Types
 * Requests, outcomes and errors shared by every allocator policy
 */

use crate::core::limits::DEFAULT_ALIGNMENT;
use crate::core::types::{Address, Size};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::ffi::c_void;
use std::fmt;
use std::ptr::NonNull;
use thiserror::Error;

use super::policy::Policy;

/// Memory operation result
pub type MemoryResult<T> = Result<T, MemoryError>;

/// Memory errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum MemoryError {
    #[error("Invalid argument: alignment {alignment} exceeds the {max}-byte pointer width")]
    #[diagnostic(
        code(memory::invalid_argument),
        help("The collector only aligns blocks to a pointer slot. Request a smaller alignment.")
    )]
    InvalidArgument { alignment: Size, max: Size },

    #[error("Out of memory: {policy} allocator could not provide {requested} bytes")]
    #[diagnostic(
        code(memory::out_of_memory),
        help("Drop references to unused objects or raise the collector's heap limit.")
    )]
    OutOfMemory { requested: Size, policy: Policy },

    #[error("Allocator mode not implemented: {0}")]
    #[diagnostic(
        code(memory::mode_not_implemented),
        help("Only alloc, alloc_non_zeroed, resize, free and free_all are supported.")
    )]
    ModeNotImplemented(AllocatorMode),
}

/// Operation modes understood by the generic allocator interface
///
/// The interface names more modes than the collector layer supports; anything
/// outside [`AllocatorMode::supported`] is rejected with
/// [`MemoryError::ModeNotImplemented`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocatorMode {
    Alloc,
    AllocNonZeroed,
    Resize,
    ResizeNonZeroed,
    Free,
    FreeAll,
    QueryFeatures,
    QueryInfo,
}

impl AllocatorMode {
    const SUPPORTED: [AllocatorMode; 5] = [
        AllocatorMode::Alloc,
        AllocatorMode::AllocNonZeroed,
        AllocatorMode::Resize,
        AllocatorMode::Free,
        AllocatorMode::FreeAll,
    ];

    /// The closed set of modes the dispatcher implements
    pub const fn supported() -> &'static [AllocatorMode] {
        &Self::SUPPORTED
    }

    /// Whether the dispatcher implements this mode
    pub fn is_supported(self) -> bool {
        Self::SUPPORTED.contains(&self)
    }

    /// Whether this mode is subject to the alignment precondition
    pub(crate) fn checks_alignment(self) -> bool {
        matches!(
            self,
            AllocatorMode::Alloc | AllocatorMode::AllocNonZeroed | AllocatorMode::Resize
        )
    }
}

impl fmt::Display for AllocatorMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            AllocatorMode::Alloc => "alloc",
            AllocatorMode::AllocNonZeroed => "alloc_non_zeroed",
            AllocatorMode::Resize => "resize",
            AllocatorMode::ResizeNonZeroed => "resize_non_zeroed",
            AllocatorMode::Free => "free",
            AllocatorMode::FreeAll => "free_all",
            AllocatorMode::QueryFeatures => "query_features",
            AllocatorMode::QueryInfo => "query_info",
        };
        f.write_str(name)
    }
}

/// Memory allocation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationRequest {
    pub mode: AllocatorMode,
    pub size: Size,
    pub alignment: Size,
    pub old: *mut c_void,
}

impl AllocationRequest {
    /// Create a request with pointer-width alignment and no prior block
    pub fn new(mode: AllocatorMode, size: Size) -> Self {
        Self {
            mode,
            size,
            alignment: DEFAULT_ALIGNMENT,
            old: std::ptr::null_mut(),
        }
    }

    pub fn alloc(size: Size) -> Self {
        Self::new(AllocatorMode::Alloc, size)
    }

    pub fn alloc_non_zeroed(size: Size) -> Self {
        Self::new(AllocatorMode::AllocNonZeroed, size)
    }

    pub fn resize(old: *mut u8, size: Size) -> Self {
        Self::new(AllocatorMode::Resize, size).with_old(old)
    }

    pub fn free(old: *mut u8) -> Self {
        Self::new(AllocatorMode::Free, 0).with_old(old)
    }

    pub fn free_all() -> Self {
        Self::new(AllocatorMode::FreeAll, 0)
    }

    pub fn with_alignment(mut self, alignment: Size) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_old(mut self, old: *mut u8) -> Self {
        self.old = old.cast();
        self
    }
}

/// A buffer handed out by the collector
///
/// The memory is owned by the collector, not by this value: dropping an
/// `Allocation` releases nothing. Whether the block stays alive depends on the
/// policy it came from and on what still references it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    ptr: Option<NonNull<u8>>,
    len: Size,
}

impl Allocation {
    pub(crate) fn new(ptr: NonNull<u8>, len: Size) -> Self {
        Self {
            ptr: Some(ptr),
            len,
        }
    }

    /// Outcome of operations that return no buffer (free, free-all)
    pub const fn empty() -> Self {
        Self { ptr: None, len: 0 }
    }

    /// Raw pointer to the start of the buffer, null for an empty outcome
    #[inline]
    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr.map_or(std::ptr::null_mut(), NonNull::as_ptr)
    }

    #[inline]
    pub fn non_null(&self) -> Option<NonNull<u8>> {
        self.ptr
    }

    #[inline]
    pub fn address(&self) -> Address {
        self.as_ptr() as Address
    }

    /// Length in bytes, always the size that was requested
    #[inline]
    pub fn len(&self) -> Size {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the outcome carries a buffer at all
    #[inline]
    pub fn is_some(&self) -> bool {
        self.ptr.is_some()
    }

    /// View the buffer as bytes
    ///
    /// # Safety
    /// The block must still be live: not freed, and for collected policies
    /// still reachable from somewhere the collector scans.
    pub unsafe fn as_slice<'a>(&self) -> &'a [u8] {
        match self.ptr {
            Some(ptr) => std::slice::from_raw_parts(ptr.as_ptr(), self.len),
            None => &[],
        }
    }

    /// View the buffer as mutable bytes
    ///
    /// # Safety
    /// Same liveness requirement as [`Allocation::as_slice`], and no other
    /// reference to the block may be active.
    pub unsafe fn as_mut_slice<'a>(&mut self) -> &'a mut [u8] {
        match self.ptr {
            Some(ptr) => std::slice::from_raw_parts_mut(ptr.as_ptr(), self.len),
            None => &mut [],
        }
    }
}
