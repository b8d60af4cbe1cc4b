//! Backing memory providers
//!
//! This module defines the [`HeapSource`] capability trait — the allocate /
//! resize / free triple that every provider exposes — and the concrete
//! [`VirtualHeap`] provider used by the demo workloads.
//!
//! Anything implementing [`HeapSource`] can serve as a backing provider or
//! stand in anywhere an allocator is expected. The tracing interceptor in
//! [`crate::trace`] implements the trait itself, so interceptors can wrap
//! other interceptors.
//!
//! Addresses handed out by a provider are opaque [`Address`] integers. They
//! are bookkeeping values for the event log and the UI, never dereferenced.

pub mod virtual_heap;

pub use virtual_heap::VirtualHeap;

use crate::trace::event::Address;
use std::fmt;

/// Errors a backing provider can report from `allocate`.
///
/// These propagate unchanged through any interceptor layers back to the
/// original caller; instrumentation never wraps or retries them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocFailure {
    /// The request would exceed the provider's size ceiling
    OutOfMemory { requested: usize, limit: usize },

    /// The requested alignment is not supported (must be a power of two)
    UnsupportedAlignment { align: usize },

    /// Zero-sized allocations are not representable as events
    ZeroSized,
}

impl fmt::Display for AllocFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocFailure::OutOfMemory { requested, limit } => {
                write!(
                    f,
                    "out of memory: requested {} bytes, limit is {}",
                    requested, limit
                )
            }
            AllocFailure::UnsupportedAlignment { align } => {
                write!(f, "unsupported alignment: {} is not a power of two", align)
            }
            AllocFailure::ZeroSized => write!(f, "cannot allocate zero bytes"),
        }
    }
}

impl std::error::Error for AllocFailure {}

/// The allocator capability: allocate / resize / free.
///
/// Methods take `&self` — providers are shared across producer threads and
/// manage their own interior mutability.
pub trait HeapSource {
    /// Allocate `size` bytes with the given alignment, returning the address
    /// of the new block. `align` must be a power of two.
    fn allocate(&self, size: usize, align: usize) -> Result<Address, AllocFailure>;

    /// Attempt to resize the block at `addr` from `old_size` to `new_size`
    /// without moving it. Returns `true` on success; on `false` the block is
    /// untouched and still `old_size` bytes.
    fn resize(&self, addr: Address, old_size: usize, new_size: usize, align: usize) -> bool;

    /// Release the block at `addr`. `size` and `align` must match the values
    /// the block was allocated with.
    fn free(&self, addr: Address, size: usize, align: usize);
}

// Allow passing providers around behind references and smart pointers
// without re-wrapping.
impl<S: HeapSource + ?Sized> HeapSource for &S {
    fn allocate(&self, size: usize, align: usize) -> Result<Address, AllocFailure> {
        (**self).allocate(size, align)
    }

    fn resize(&self, addr: Address, old_size: usize, new_size: usize, align: usize) -> bool {
        (**self).resize(addr, old_size, new_size, align)
    }

    fn free(&self, addr: Address, size: usize, align: usize) {
        (**self).free(addr, size, align)
    }
}

impl<S: HeapSource + ?Sized> HeapSource for std::sync::Arc<S> {
    fn allocate(&self, size: usize, align: usize) -> Result<Address, AllocFailure> {
        (**self).allocate(size, align)
    }

    fn resize(&self, addr: Address, old_size: usize, new_size: usize, align: usize) -> bool {
        (**self).resize(addr, old_size, new_size, align)
    }

    fn free(&self, addr: Address, size: usize, align: usize) {
        (**self).free(addr, size, align)
    }
}
