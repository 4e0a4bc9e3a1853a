/*!
 * Memory Module
 * Allocator policies over the native collector
 */

pub mod dispatch;
#[cfg(feature = "bdwgc")]
pub mod global;
pub mod native;
pub mod policy;
pub mod stats;
pub mod traits;
pub mod types;

// Re-export for convenience
pub use dispatch::dispatch;
#[cfg(feature = "bdwgc")]
pub use global::GlobalGc;
pub use native::{CallCounts, NativeCollector, RecordingCollector, WarnProc};
pub use policy::{AllocFn, Binding, GcAllocator, Policy};
pub use stats::HeapStats;
pub use traits::*;
pub use types::*;
