/*!
 * Allocation Dispatcher
 *
 * Translates one generic request into exactly one native call. The only
 * policy-specific input is the bound allocation primitive; resize, free and
 * free-all are shared, and results are normalized the same way for every
 * policy:
 *
 * - alignment above pointer width is rejected before any native call
 * - a null block from allocate/resize becomes `OutOfMemory`
 * - resize of a null block allocates with the bound primitive
 * - resize of a live block to 0 bytes releases it and succeeds
 * - free and free-all always succeed
 * - modes outside the supported set are rejected before any native call
 */

use super::native::NativeCollector;
use super::policy::Binding;
use super::types::{Allocation, AllocationRequest, AllocatorMode, MemoryError, MemoryResult};
use crate::core::limits::MAX_ALIGNMENT;
use std::ptr::NonNull;
use tracing::{trace, warn};

/// Run `request` against `collector` using `binding`'s allocation primitive
///
/// # Safety
/// `request.old` must be null or a live block obtained from `collector`.
pub unsafe fn dispatch<C: NativeCollector>(
    collector: &C,
    binding: Binding<C>,
    request: &AllocationRequest,
) -> MemoryResult<Allocation> {
    let mode = request.mode;
    if !mode.is_supported() {
        warn!(%mode, policy = %binding.policy, "rejected unsupported allocator mode");
        return Err(MemoryError::ModeNotImplemented(mode));
    }

    if mode.checks_alignment() && request.alignment > MAX_ALIGNMENT {
        return Err(MemoryError::InvalidArgument {
            alignment: request.alignment,
            max: MAX_ALIGNMENT,
        });
    }

    let old = request.old as usize;
    trace!(
        %mode,
        policy = %binding.policy,
        size = request.size,
        old,
        "dispatching allocator request"
    );

    match mode {
        AllocatorMode::Alloc | AllocatorMode::AllocNonZeroed => {
            let raw = (binding.allocate)(collector, request.size);
            into_allocation(raw.cast(), request, binding)
        }
        AllocatorMode::Resize if request.old.is_null() => {
            // Growing from nothing is an allocation under this policy.
            let raw = (binding.allocate)(collector, request.size);
            into_allocation(raw.cast(), request, binding)
        }
        AllocatorMode::Resize => {
            let raw = collector.reallocate(request.old, request.size);
            // Shrinking to nothing releases the block.
            if raw.is_null() && request.size == 0 && !request.old.is_null() {
                return Ok(Allocation::empty());
            }
            into_allocation(raw.cast(), request, binding)
        }
        AllocatorMode::Free => {
            collector.deallocate(request.old);
            Ok(Allocation::empty())
        }
        AllocatorMode::FreeAll => {
            collector.force_collect();
            Ok(Allocation::empty())
        }
        AllocatorMode::ResizeNonZeroed | AllocatorMode::QueryFeatures | AllocatorMode::QueryInfo => {
            Err(MemoryError::ModeNotImplemented(mode))
        }
    }
}

fn into_allocation<C>(
    raw: *mut u8,
    request: &AllocationRequest,
    binding: Binding<C>,
) -> MemoryResult<Allocation> {
    match NonNull::new(raw) {
        Some(ptr) => Ok(Allocation::new(ptr, request.size)),
        None => {
            warn!(
                mode = %request.mode,
                policy = %binding.policy,
                requested = request.size,
                "collector returned null"
            );
            Err(MemoryError::OutOfMemory {
                requested: request.size,
                policy: binding.policy,
            })
        }
    }
}
