/*!
 * Execution Context
 *
 * Holds the collector handle and the policy used by code that does not pick
 * one explicitly. The policy is changed in one of two ways, neither of which
 * affects other callers:
 *
 * - `with_policy` returns a new context value to thread through calls
 * - `scoped` overrides the current thread's policy until the guard drops
 */

use super::config::GcConfig;
use crate::memory::native::NativeCollector;
use crate::memory::policy::{GcAllocator, Policy};
use crate::memory::stats::HeapStats;
use crate::monitoring::CollectionSpan;
use std::cell::Cell;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

thread_local! {
    static POLICY_OVERRIDE: Cell<Option<Policy>> = const { Cell::new(None) };
}

/// Policy override active on the calling thread, if any
pub fn current_override() -> Option<Policy> {
    POLICY_OVERRIDE.with(Cell::get)
}

/// Collector handle plus the allocator currently in effect
pub struct ExecutionContext<C: NativeCollector> {
    collector: Arc<C>,
    policy: Policy,
    config: GcConfig,
}

impl<C: NativeCollector> ExecutionContext<C> {
    pub(crate) fn new(collector: Arc<C>, config: GcConfig) -> Self {
        Self {
            collector,
            policy: Policy::Default,
            config,
        }
    }

    /// The same context with a different base policy
    pub fn with_policy(&self, policy: Policy) -> Self {
        Self {
            collector: Arc::clone(&self.collector),
            policy,
            config: self.config,
        }
    }

    /// Override the policy for this thread until the guard is dropped
    ///
    /// Overrides nest; dropping a guard restores whatever was in effect when
    /// it was created.
    pub fn scoped(&self, policy: Policy) -> PolicyScope {
        let previous = POLICY_OVERRIDE.with(|cell| cell.replace(Some(policy)));
        debug!(%policy, ?previous, "entered scoped allocator policy");
        PolicyScope {
            previous,
            _thread_bound: PhantomData,
        }
    }

    /// Policy in effect for the calling thread
    pub fn policy(&self) -> Policy {
        current_override().unwrap_or(self.policy)
    }

    /// Policy this context was created with, ignoring thread overrides
    pub fn base_policy(&self) -> Policy {
        self.policy
    }

    /// Allocator for the policy in effect
    pub fn allocator(&self) -> GcAllocator<C> {
        GcAllocator::new(Arc::clone(&self.collector), self.policy())
    }

    /// Allocator for an explicit policy
    pub fn allocator_for(&self, policy: Policy) -> GcAllocator<C> {
        GcAllocator::new(Arc::clone(&self.collector), policy)
    }

    pub fn collector(&self) -> &Arc<C> {
        &self.collector
    }

    pub fn config(&self) -> &GcConfig {
        &self.config
    }

    /// Run a full collection and return the heap counters afterwards
    pub fn collect(&self) -> HeapStats {
        let span = CollectionSpan::new("explicit", self.collector.heap_stats());
        self.collector.force_collect();
        let after = self.collector.heap_stats();
        span.finish(after);
        after
    }

    pub fn heap_stats(&self) -> HeapStats {
        self.collector.heap_stats()
    }
}

impl<C: NativeCollector> Clone for ExecutionContext<C> {
    fn clone(&self) -> Self {
        self.with_policy(self.policy)
    }
}

impl<C: NativeCollector> std::fmt::Debug for ExecutionContext<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("policy", &self.policy)
            .field("config", &self.config)
            .finish()
    }
}

/// Restores the previous thread policy on drop
#[must_use = "the policy override ends when the guard is dropped"]
pub struct PolicyScope {
    previous: Option<Policy>,
    _thread_bound: PhantomData<*const ()>,
}

impl Drop for PolicyScope {
    fn drop(&mut self) {
        POLICY_OVERRIDE.with(|cell| cell.set(self.previous));
    }
}
