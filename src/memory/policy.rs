/*!
 * Allocator Policies
 *
 * A policy names which native allocation primitive backs a request:
 *
 * | Policy          | Scanned for pointers | Reclaimed automatically |
 * |-----------------|----------------------|-------------------------|
 * | `Default`       | yes                  | yes                     |
 * | `Atomic`        | no                   | yes                     |
 * | `Uncollectable` | yes                  | no (free explicitly)    |
 *
 * Resize, free and free-all are shared by all three and live in the
 * dispatcher.
 */

use super::dispatch::dispatch;
use super::native::NativeCollector;
use super::traits::Allocator;
use super::types::{Allocation, AllocationRequest, MemoryResult};
use crate::core::types::Size;
use serde::{Deserialize, Serialize};
use std::ffi::c_void;
use std::fmt;
use std::sync::Arc;

/// Native allocation primitive for a collector type
pub type AllocFn<C> = fn(&C, Size) -> *mut c_void;

/// Which native allocation primitive backs an allocator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// Collected and scanned for pointers
    #[default]
    Default,
    /// Collected, never scanned; for pointer-free data
    Atomic,
    /// Scanned, never collected; acts as a root until freed
    Uncollectable,
}

impl Policy {
    pub const ALL: [Policy; 3] = [Policy::Default, Policy::Atomic, Policy::Uncollectable];

    /// Bind this policy to its allocation primitive on collector type `C`
    pub fn bind<C: NativeCollector>(self) -> Binding<C> {
        let allocate: AllocFn<C> = match self {
            Policy::Default => C::allocate,
            Policy::Atomic => C::allocate_atomic,
            Policy::Uncollectable => C::allocate_uncollectable,
        };
        Binding {
            policy: self,
            allocate,
        }
    }

    /// Whether blocks from this policy are scanned for pointers
    pub fn is_scanned(self) -> bool {
        !matches!(self, Policy::Atomic)
    }

    /// Whether unreachable blocks from this policy are reclaimed
    pub fn is_collected(self) -> bool {
        !matches!(self, Policy::Uncollectable)
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Policy::Default => write!(f, "default"),
            Policy::Atomic => write!(f, "atomic"),
            Policy::Uncollectable => write!(f, "uncollectable"),
        }
    }
}

/// A policy resolved to a concrete allocation primitive
pub struct Binding<C> {
    pub policy: Policy,
    pub allocate: AllocFn<C>,
}

impl<C> Clone for Binding<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for Binding<C> {}

impl<C> fmt::Debug for Binding<C> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Binding")
            .field("policy", &self.policy)
            .finish()
    }
}

/// An allocator instance: a policy bound to a collector handle
///
/// Cheap to clone and free to construct; holds no mutable state.
pub struct GcAllocator<C: NativeCollector> {
    collector: Arc<C>,
    binding: Binding<C>,
}

impl<C: NativeCollector> GcAllocator<C> {
    pub fn new(collector: Arc<C>, policy: Policy) -> Self {
        Self {
            collector,
            binding: policy.bind(),
        }
    }

    pub fn default_policy(collector: Arc<C>) -> Self {
        Self::new(collector, Policy::Default)
    }

    pub fn atomic(collector: Arc<C>) -> Self {
        Self::new(collector, Policy::Atomic)
    }

    pub fn uncollectable(collector: Arc<C>) -> Self {
        Self::new(collector, Policy::Uncollectable)
    }

    #[inline]
    pub fn policy(&self) -> Policy {
        self.binding.policy
    }

    #[inline]
    pub fn collector(&self) -> &Arc<C> {
        &self.collector
    }

    /// Same collector, different policy
    pub fn with_policy(&self, policy: Policy) -> Self {
        Self::new(Arc::clone(&self.collector), policy)
    }
}

impl<C: NativeCollector> Allocator for GcAllocator<C> {
    unsafe fn request(&self, request: &AllocationRequest) -> MemoryResult<Allocation> {
        dispatch(&*self.collector, self.binding, request)
    }

    fn policy(&self) -> Policy {
        self.binding.policy
    }
}

impl<C: NativeCollector> Clone for GcAllocator<C> {
    fn clone(&self) -> Self {
        Self {
            collector: Arc::clone(&self.collector),
            binding: self.binding,
        }
    }
}

impl<C: NativeCollector> fmt::Debug for GcAllocator<C> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("GcAllocator")
            .field("policy", &self.binding.policy)
            .finish()
    }
}
