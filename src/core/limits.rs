/*!
 * Limits and Constants
 *
 * Centralized location for allocator-wide limits, defaults, and the names of
 * the environment variables the configuration layer reads.
 */

use super::types::Size;

// =============================================================================
// ALLOCATION LIMITS
// =============================================================================

/// Largest alignment the collector can satisfy (one pointer slot)
pub const MAX_ALIGNMENT: Size = super::types::POINTER_WIDTH;

/// Default alignment used when a request does not specify one
pub const DEFAULT_ALIGNMENT: Size = super::types::POINTER_WIDTH;

/// Largest single request accepted by the recording collector (1GB)
/// Anything above this is reported as out-of-memory instead of reaching the host heap
pub const RECORDING_MAX_REQUEST: Size = 1024 * 1024 * 1024;

// =============================================================================
// STRESS SCENARIO
// =============================================================================

/// Iterations of the incremental stress scenario
pub const STRESS_ITERATIONS: usize = 1024;

/// Objects allocated per stress iteration
pub const STRESS_OBJECTS_PER_ITERATION: usize = 1024;

/// Bytes per stress object
pub const STRESS_OBJECT_SIZE: Size = 1024;

// =============================================================================
// ENVIRONMENT
// =============================================================================

/// Enable incremental collection ("1"/"true"/"0"/"false")
pub const ENV_INCREMENTAL: &str = "GC_ALLOC_INCREMENTAL";

/// Collector warning routing ("discard" or "log")
pub const ENV_WARNINGS: &str = "GC_ALLOC_WARNINGS";

/// Bytes to pre-expand the heap by at startup
pub const ENV_INITIAL_HEAP: &str = "GC_ALLOC_INITIAL_HEAP";

/// Upper bound on heap growth in bytes
pub const ENV_MAX_HEAP: &str = "GC_ALLOC_MAX_HEAP";

/// Emit JSON-formatted traces
pub const ENV_TRACE_JSON: &str = "GC_ALLOC_TRACE_JSON";
