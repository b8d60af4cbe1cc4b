//! Simulated backing provider
//!
//! [`VirtualHeap`] hands out opaque addresses from a bump frontier starting
//! at a high base address, with a configurable size ceiling. Freed blocks go
//! into a free list binned by size, and later allocations of the same size
//! are served from the bin first — so freed addresses genuinely get reissued,
//! which is exactly the address-reuse case the live-range replay has to
//! handle.
//!
//! No bytes are stored anywhere. The heap is pure bookkeeping: addresses are
//! made up, sized, and retired, which is all the tracing layer ever looks at.

use super::{AllocFailure, HeapSource};
use crate::trace::event::Address;
use rustc_hash::FxHashMap;
use std::sync::Mutex;

/// Base address for the first allocation. High enough to look like a real
/// heap address in the UI and to never collide with zero/null.
pub const VIRTUAL_HEAP_BASE: Address = 0x1000_0000;

/// Default size ceiling: 10 MB.
pub const DEFAULT_HEAP_SIZE: usize = 10 * 1024 * 1024;

struct HeapState {
    /// Next fresh address to hand out
    next_address: Address,
    /// Freed addresses, binned by the exact size they were allocated with
    free_bins: FxHashMap<usize, Vec<Address>>,
    /// Reserved span of every block ever handed out, keyed by start address.
    /// Spans survive free so a reused address keeps its reservation.
    reserved: FxHashMap<Address, usize>,
    /// Bytes currently allocated (live, not yet freed)
    allocated_bytes: usize,
}

/// A simulated heap that allocates opaque addresses instead of memory.
pub struct VirtualHeap {
    state: Mutex<HeapState>,
    max_size: usize,
}

impl VirtualHeap {
    /// Create a heap with the given size ceiling in bytes.
    pub fn new(max_size: usize) -> Self {
        VirtualHeap {
            state: Mutex::new(HeapState {
                next_address: VIRTUAL_HEAP_BASE,
                free_bins: FxHashMap::default(),
                reserved: FxHashMap::default(),
                allocated_bytes: 0,
            }),
            max_size,
        }
    }

    /// Bytes currently allocated and not yet freed.
    pub fn allocated_bytes(&self) -> usize {
        self.lock().allocated_bytes
    }

    /// The size ceiling this heap was created with.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HeapState> {
        // A panic while holding the lock leaves only bookkeeping behind;
        // the state is still usable, so recover instead of propagating.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for VirtualHeap {
    fn default() -> Self {
        Self::new(DEFAULT_HEAP_SIZE)
    }
}

impl HeapSource for VirtualHeap {
    fn allocate(&self, size: usize, align: usize) -> Result<Address, AllocFailure> {
        if size == 0 {
            return Err(AllocFailure::ZeroSized);
        }
        if !align.is_power_of_two() {
            return Err(AllocFailure::UnsupportedAlignment { align });
        }

        let mut state = self.lock();

        if size > self.max_size.saturating_sub(state.allocated_bytes) {
            return Err(AllocFailure::OutOfMemory {
                requested: size,
                limit: self.max_size,
            });
        }

        // Reuse a freed address of the same size when one is available and
        // already suitably aligned.
        if let Some(bin) = state.free_bins.get_mut(&size) {
            if let Some(pos) = bin.iter().position(|&a| a % align as Address == 0) {
                let addr = bin.swap_remove(pos);
                state.allocated_bytes += size;
                return Ok(addr);
            }
        }

        // Fresh allocation from the bump frontier, rounded up to alignment.
        let align = align as Address;
        let addr = state.next_address.saturating_add(align - 1) & !(align - 1);
        state.next_address = addr.saturating_add(size as Address);
        state.reserved.insert(addr, size);
        state.allocated_bytes += size;

        Ok(addr)
    }

    fn resize(&self, addr: Address, old_size: usize, new_size: usize, _align: usize) -> bool {
        if new_size == 0 {
            return false;
        }

        let mut state = self.lock();

        // A block can only stay in place within the span it was originally
        // reserved with; growing past that would collide with its neighbour.
        let reserved = match state.reserved.get(&addr) {
            Some(&span) => span,
            None => return false,
        };
        if new_size > reserved {
            return false;
        }

        state.allocated_bytes = state.allocated_bytes.saturating_sub(old_size) + new_size;
        true
    }

    fn free(&self, addr: Address, size: usize, _align: usize) {
        let mut state = self.lock();
        state.allocated_bytes = state.allocated_bytes.saturating_sub(size);
        state.free_bins.entry(size).or_default().push(addr);
    }
}
