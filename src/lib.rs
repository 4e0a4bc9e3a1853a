/*!
 * gc-alloc
 *
 * Allocator policies over a conservative mark-and-sweep garbage collector.
 * Three interchangeable policies share one dispatcher:
 *
 * - `Policy::Default`: scanned for pointers, reclaimed when unreachable
 * - `Policy::Atomic`: never scanned, reclaimed when unreachable
 * - `Policy::Uncollectable`: scanned, reclaimed only when freed
 *
 * Enable the `bdwgc` feature to link libgc as the native collector.
 */

pub mod core;
pub mod lifecycle;
pub mod memory;
pub mod monitoring;

// Re-exports
pub use crate::core::errors::{ConfigError, GcError};
pub use crate::core::types::{GcResult, POINTER_WIDTH};
pub use lifecycle::{bootstrap, ExecutionContext, GcConfig, PolicyScope, WarningMode};
#[cfg(feature = "bdwgc")]
pub use lifecycle::{initialize, initialize_from_env};
pub use memory::{
    dispatch, Allocation, AllocationRequest, Allocator, AllocatorMode, GcAllocator, HeapStats,
    MemoryError, MemoryResult, NativeCollector, Policy, RecordingCollector,
};
#[cfg(feature = "bdwgc")]
pub use memory::{native::Bdwgc, GlobalGc};
pub use monitoring::init_tracing;
