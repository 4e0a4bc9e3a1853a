/*!
 * Core Types
 * Common types used across the allocator layer
 */

/// Address type for raw collector memory
pub type Address = usize;

/// Size type for allocation requests
pub type Size = usize;

/// Width of a native pointer slot in bytes
///
/// The collector only guarantees pointer-width alignment for the blocks it
/// hands out, so this is also the largest alignment a request may ask for.
pub const POINTER_WIDTH: Size = std::mem::size_of::<*const ()>();

/// Common result type for crate-level operations
pub type GcResult<T> = Result<T, super::errors::GcError>;
