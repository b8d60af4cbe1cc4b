//! Tracing allocator interceptor
//!
//! [`TraceAllocator`] wraps any backing [`HeapSource`], forwards every
//! request to it verbatim, and records each successful allocation and each
//! free request in its [`EventLog`].
//!
//! Logging is best-effort and non-fatal: if the log refuses an append (it
//! was built with an entry cap and is full), the interceptor bumps a
//! dropped-event counter and the operation still completes with its normal
//! outcome. A logging failure never changes the result seen by the caller.
//!
//! The interceptor implements [`HeapSource`] itself, so instances chain: an
//! interceptor wrapping an interceptor wrapping a real provider records the
//! same operations in both logs.

use super::event::{Address, AllocationEvent};
use super::log::EventLog;
use crate::provider::{AllocFailure, HeapSource};
use std::sync::atomic::{AtomicUsize, Ordering};

/// A [`HeapSource`] wrapper that logs every operation it forwards.
pub struct TraceAllocator<S: HeapSource> {
    source: S,
    log: EventLog,
    /// Appends refused by the log (diagnostic side channel, see module docs)
    dropped_events: AtomicUsize,
    track_resize: bool,
}

impl<S: HeapSource> TraceAllocator<S> {
    /// Wrap `source` with a fresh unbounded log. Resize calls are forwarded
    /// but not recorded.
    pub fn new(source: S) -> Self {
        Self::with_log(source, EventLog::new())
    }

    /// Wrap `source` with a caller-built log (e.g. one with an entry cap).
    pub fn with_log(source: S, log: EventLog) -> Self {
        TraceAllocator {
            source,
            log,
            dropped_events: AtomicUsize::new(0),
            track_resize: false,
        }
    }

    /// Record successful resizes as a `Free` + `Alloc` pair at the same
    /// address. Off by default; when off, resize is invisible to the log.
    pub fn track_resize(mut self, enabled: bool) -> Self {
        self.track_resize = enabled;
        self
    }

    /// A point-in-time copy of the event history.
    pub fn snapshot(&self) -> Vec<AllocationEvent> {
        self.log.snapshot()
    }

    /// Number of events recorded so far.
    pub fn event_count(&self) -> usize {
        self.log.len()
    }

    /// Number of events the log refused to store. Non-zero means the trace
    /// is incomplete; the operations themselves were unaffected.
    pub fn dropped_events(&self) -> usize {
        self.dropped_events.load(Ordering::Relaxed)
    }

    /// The wrapped backing provider.
    pub fn source(&self) -> &S {
        &self.source
    }

    fn record(&self, event: AllocationEvent) {
        if self.log.append(event).is_err() {
            self.dropped_events.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl<S: HeapSource> HeapSource for TraceAllocator<S> {
    /// Forwards to the backing provider; on success records
    /// `Alloc { address, size }` with the returned address and the
    /// originally requested size. Failures propagate untouched, unrecorded.
    fn allocate(&self, size: usize, align: usize) -> Result<Address, AllocFailure> {
        let address = self.source.allocate(size, align)?;
        // Alloc events always carry size > 0; a provider that accepts a
        // zero-byte request succeeds untraced.
        if size > 0 {
            self.record(AllocationEvent::Alloc { address, size });
        }
        Ok(address)
    }

    /// Forwards verbatim. Only recorded when `track_resize` is on and the
    /// provider reports success, as a `Free` + `Alloc` pair carrying the
    /// new size.
    fn resize(&self, addr: Address, old_size: usize, new_size: usize, align: usize) -> bool {
        let resized = self.source.resize(addr, old_size, new_size, align);
        if resized && self.track_resize {
            self.record(AllocationEvent::Free { address: addr });
            // A resize to zero is just the free; Alloc events carry size > 0.
            if new_size > 0 {
                self.record(AllocationEvent::Alloc {
                    address: addr,
                    size: new_size,
                });
            }
        }
        resized
    }

    /// Records `Free { addr }` before forwarding: the address value itself
    /// stays valid for bookkeeping even after the block it names is gone.
    fn free(&self, addr: Address, size: usize, align: usize) {
        self.record(AllocationEvent::Free { address: addr });
        self.source.free(addr, size, align);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::VirtualHeap;
    use crate::trace::log::EventLog;

    #[test]
    fn allocate_records_event() {
        let tracer = TraceAllocator::new(VirtualHeap::new(1024));
        let addr = tracer.allocate(64, 8).unwrap();

        let snap = tracer.snapshot();
        assert_eq!(
            snap,
            vec![AllocationEvent::Alloc { address: addr, size: 64 }]
        );
    }

    #[test]
    fn failed_allocate_records_nothing() {
        let tracer = TraceAllocator::new(VirtualHeap::new(16));
        assert!(tracer.allocate(64, 8).is_err());
        assert!(tracer.snapshot().is_empty());
    }

    #[test]
    fn free_records_before_forwarding() {
        let tracer = TraceAllocator::new(VirtualHeap::new(1024));
        let addr = tracer.allocate(32, 8).unwrap();
        tracer.free(addr, 32, 8);

        let snap = tracer.snapshot();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[1], AllocationEvent::Free { address: addr });
    }

    #[test]
    fn resize_untracked_by_default() {
        let tracer = TraceAllocator::new(VirtualHeap::new(1024));
        let addr = tracer.allocate(64, 8).unwrap();
        assert!(tracer.resize(addr, 64, 32, 8));
        assert_eq!(tracer.event_count(), 1);
    }

    #[test]
    fn resize_tracked_as_free_alloc_pair() {
        let tracer = TraceAllocator::new(VirtualHeap::new(1024)).track_resize(true);
        let addr = tracer.allocate(64, 8).unwrap();
        assert!(tracer.resize(addr, 64, 32, 8));

        let snap = tracer.snapshot();
        assert_eq!(
            &snap[1..],
            &[
                AllocationEvent::Free { address: addr },
                AllocationEvent::Alloc { address: addr, size: 32 },
            ]
        );
    }

    #[test]
    fn failed_resize_records_nothing_even_when_tracked() {
        let tracer = TraceAllocator::new(VirtualHeap::new(1024)).track_resize(true);
        let addr = tracer.allocate(64, 8).unwrap();
        assert!(!tracer.resize(addr, 64, 4096, 8));
        assert_eq!(tracer.event_count(), 1);
    }

    #[test]
    fn log_full_is_absorbed() {
        let tracer = TraceAllocator::with_log(VirtualHeap::new(1024), EventLog::with_max_events(1));

        let a = tracer.allocate(8, 8).unwrap();
        // Log is now full. The free must still reach the provider.
        tracer.free(a, 8, 8);
        let b = tracer.allocate(8, 8).unwrap();
        assert_eq!(a, b);

        assert_eq!(tracer.event_count(), 1);
        assert_eq!(tracer.dropped_events(), 2);
    }

    /// A permissive provider that hands out addresses for any request,
    /// zero-sized ones included.
    struct AnythingGoes(AtomicUsize);

    impl HeapSource for AnythingGoes {
        fn allocate(&self, _size: usize, _align: usize) -> Result<Address, AllocFailure> {
            Ok(0x1000 + self.0.fetch_add(1, Ordering::Relaxed) as Address)
        }

        fn resize(&self, _addr: Address, _old: usize, _new: usize, _align: usize) -> bool {
            true
        }

        fn free(&self, _addr: Address, _size: usize, _align: usize) {}
    }

    #[test]
    fn zero_sized_allocation_is_not_recorded() {
        let tracer = TraceAllocator::new(AnythingGoes(AtomicUsize::new(0)));

        let addr = tracer.allocate(0, 8).unwrap();
        assert_eq!(addr, 0x1000);
        assert!(tracer.snapshot().is_empty());

        // Non-zero requests against the same provider are still traced.
        tracer.allocate(8, 8).unwrap();
        assert_eq!(tracer.event_count(), 1);
    }

    #[test]
    fn tracked_resize_to_zero_records_only_the_free() {
        let tracer = TraceAllocator::new(AnythingGoes(AtomicUsize::new(0))).track_resize(true);

        let addr = tracer.allocate(64, 8).unwrap();
        assert!(tracer.resize(addr, 64, 0, 8));

        let snap = tracer.snapshot();
        assert_eq!(&snap[1..], &[AllocationEvent::Free { address: addr }]);
    }

    #[test]
    fn interceptors_chain() {
        let inner = TraceAllocator::new(VirtualHeap::new(1024));
        let outer = TraceAllocator::new(inner);

        let addr = outer.allocate(16, 8).unwrap();
        outer.free(addr, 16, 8);

        assert_eq!(outer.snapshot(), outer.source().snapshot());
    }
}
