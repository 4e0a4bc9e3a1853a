/*!
 * Heap Statistics
 * Snapshot of the collector's heap counters
 */

use crate::core::types::Size;
use serde::{Deserialize, Serialize};

/// Collector heap statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct HeapStats {
    /// Bytes currently reserved for the collected heap
    pub heap_size: Size,
    /// Bytes in the heap not currently in use
    pub free_bytes: Size,
    /// Bytes allocated since the last collection
    pub bytes_since_gc: Size,
    /// Bytes allocated over the lifetime of the process
    pub total_bytes: Size,
    /// Number of completed collections
    pub collections: u64,
}

impl HeapStats {
    /// Bytes of the heap currently in use
    pub fn used_bytes(&self) -> Size {
        self.heap_size.saturating_sub(self.free_bytes)
    }

    /// Fraction of the heap in use, 0.0 for an empty heap
    pub fn usage_ratio(&self) -> f64 {
        if self.heap_size == 0 {
            0.0
        } else {
            self.used_bytes() as f64 / self.heap_size as f64
        }
    }
}
