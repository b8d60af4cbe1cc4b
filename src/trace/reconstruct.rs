//! Live-range reconstruction
//!
//! A pure replay over an event snapshot that recovers the set of byte ranges
//! currently allocated. No state is carried between calls: each call walks
//! the full history from scratch, trading CPU for immunity to
//! incremental-update bugs.
//!
//! Malformed histories never fail. A free for an address with no active
//! allocation — a double free, or a free of an address this log never saw —
//! is ignored. When address reuse puts several active allocations at the
//! same start address, a free removes the earliest still-active one; that is
//! the allocation being freed whenever frees pair with their allocation in
//! chronological order. Out-of-order frees across unsynchronized threads
//! make the attribution ambiguous, and this replay makes no attempt to
//! resolve that beyond the documented first-match rule.

use super::event::{Address, AllocationEvent};

/// A contiguous `[start, end)` span considered currently allocated.
///
/// Ephemeral: computed on demand, rendered, discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveRange {
    pub start: Address,
    pub end: Address,
}

impl LiveRange {
    /// Length of the range in bytes.
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether `addr` falls inside `[start, end)`.
    pub fn contains(&self, addr: Address) -> bool {
        addr >= self.start && addr < self.end
    }
}

/// Replay `events` in order and return the ranges still allocated at the end.
///
/// `Alloc` appends `[address, address + size)` to the active list; `Free`
/// removes the first active entry starting at that address, or does nothing
/// if there is none. The result preserves allocation order of the surviving
/// ranges. This never fails and never panics, whatever the input.
pub fn live_ranges(events: &[AllocationEvent]) -> Vec<LiveRange> {
    let mut active: Vec<LiveRange> = Vec::new();

    for event in events {
        match *event {
            AllocationEvent::Alloc { address, size } => {
                // Saturate rather than overflow: a range ending past the
                // address space is clamped to its top, never a panic.
                active.push(LiveRange {
                    start: address,
                    end: address.saturating_add(size as Address),
                });
            }
            AllocationEvent::Free { address } => {
                if let Some(pos) = active.iter().position(|r| r.start == address) {
                    active.remove(pos);
                }
            }
        }
    }

    active
}

/// Total number of live bytes across all ranges.
pub fn live_bytes(ranges: &[LiveRange]) -> u64 {
    ranges.iter().map(LiveRange::len).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alloc(address: Address, size: usize) -> AllocationEvent {
        AllocationEvent::Alloc { address, size }
    }

    fn free(address: Address) -> AllocationEvent {
        AllocationEvent::Free { address }
    }

    #[test]
    fn empty_history_yields_no_ranges() {
        assert_eq!(live_ranges(&[]), Vec::new());
    }

    #[test]
    fn alloc_free_alloc_sequence() {
        // allocate(100) -> A1; allocate(20) -> A2; free(A1); allocate(200) -> A3
        let events = [alloc(0x100, 100), alloc(0x200, 20), free(0x100), alloc(0x400, 200)];
        assert_eq!(
            live_ranges(&events),
            vec![
                LiveRange { start: 0x200, end: 0x200 + 20 },
                LiveRange { start: 0x400, end: 0x400 + 200 },
            ]
        );
    }

    #[test]
    fn free_of_unknown_address_is_ignored() {
        let events = [alloc(0x100, 8), free(0xdead_beef)];
        assert_eq!(
            live_ranges(&events),
            vec![LiveRange { start: 0x100, end: 0x108 }]
        );
    }

    #[test]
    fn double_free_is_ignored() {
        let events = [alloc(0x100, 8), free(0x100), free(0x100)];
        assert_eq!(live_ranges(&events), Vec::new());
    }

    #[test]
    fn free_before_alloc_is_ignored() {
        let events = [free(0x100), alloc(0x100, 8)];
        assert_eq!(
            live_ranges(&events),
            vec![LiveRange { start: 0x100, end: 0x108 }]
        );
    }

    #[test]
    fn reused_address_survives_as_single_range() {
        // allocate(50) -> A; free(A); allocate(50) -> A again
        let events = [alloc(0x100, 50), free(0x100), alloc(0x100, 50)];
        assert_eq!(
            live_ranges(&events),
            vec![LiveRange { start: 0x100, end: 0x100 + 50 }]
        );
    }

    #[test]
    fn free_removes_earliest_active_at_address() {
        // Two active allocations at the same address (pathological input):
        // the free takes the older one, leaving the newer size live.
        let events = [alloc(0x100, 10), alloc(0x100, 20), free(0x100)];
        assert_eq!(
            live_ranges(&events),
            vec![LiveRange { start: 0x100, end: 0x100 + 20 }]
        );
    }

    #[test]
    fn alloc_at_top_of_address_space_saturates() {
        // An allocation whose end would pass u64::MAX clamps to it instead
        // of overflowing.
        let events = [alloc(Address::MAX - 4, 64)];
        let ranges = live_ranges(&events);
        assert_eq!(
            ranges,
            vec![LiveRange { start: Address::MAX - 4, end: Address::MAX }]
        );
        assert_eq!(ranges[0].len(), 4);
        assert!(ranges[0].contains(Address::MAX - 1));
    }

    #[test]
    fn inverted_range_reports_zero_length() {
        let r = LiveRange { start: 0x200, end: 0x100 };
        assert_eq!(r.len(), 0);
    }

    #[test]
    fn replay_is_deterministic() {
        let events = [
            alloc(0x100, 10),
            alloc(0x200, 20),
            free(0x100),
            alloc(0x100, 30),
            free(0x200),
        ];
        assert_eq!(live_ranges(&events), live_ranges(&events));
    }

    #[test]
    fn live_bytes_sums_ranges() {
        let events = [alloc(0x100, 10), alloc(0x200, 20)];
        let ranges = live_ranges(&events);
        assert_eq!(live_bytes(&ranges), 30);
    }

    #[test]
    fn range_contains() {
        let r = LiveRange { start: 0x100, end: 0x110 };
        assert!(r.contains(0x100));
        assert!(r.contains(0x10f));
        assert!(!r.contains(0x110));
        assert!(!r.contains(0xff));
        assert_eq!(r.len(), 16);
        assert!(!r.is_empty());
    }
}
