//! Demo producer workloads
//!
//! Named allocation patterns that drive a shared [`HeapSource`] from several
//! threads, so the UI has live traffic to render. Each thread runs its own
//! seeded [`StdRng`], keeps a local list of its outstanding blocks, and
//! frees everything it still holds before exiting.
//!
//! Providers are passed in explicitly (behind `Arc`); workloads never touch
//! any global allocator state.

use crate::provider::HeapSource;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Available allocation patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workload {
    /// Allocate and free in roughly equal measure; live set stays stable
    Churn,
    /// Allocations outpace frees; live set grows (leak-shaped)
    Ramp,
    /// Bursts of allocations followed by bulk frees
    Spike,
}

impl Workload {
    /// All workloads, for usage listings.
    pub fn all() -> [Workload; 3] {
        [Workload::Churn, Workload::Ramp, Workload::Spike]
    }

    /// The name used on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Workload::Churn => "churn",
            Workload::Ramp => "ramp",
            Workload::Spike => "spike",
        }
    }

    /// Parse a command-line workload name.
    pub fn from_name(name: &str) -> Option<Workload> {
        Workload::all().into_iter().find(|w| w.name() == name)
    }
}

/// Alignments the producers pick from.
const ALIGNMENTS: [usize; 4] = [1, 4, 8, 16];

/// A block a producer thread is still holding.
struct Held {
    addr: crate::trace::Address,
    size: usize,
    align: usize,
}

/// Spawn `threads` producer threads running `workload` against `source`.
///
/// Threads run until `stop` is raised, then free whatever they still hold
/// and exit. Each thread is seeded from its index, so a given
/// workload/thread-count pair replays the same operation mix.
pub fn spawn_producers<S>(
    source: Arc<S>,
    workload: Workload,
    threads: usize,
    stop: Arc<AtomicBool>,
) -> Vec<JoinHandle<()>>
where
    S: HeapSource + Send + Sync + 'static,
{
    (0..threads)
        .map(|i| {
            let source = Arc::clone(&source);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                let mut rng = StdRng::seed_from_u64(0x6865_6170 + i as u64);
                let mut held: Vec<Held> = Vec::new();

                while !stop.load(Ordering::Relaxed) {
                    match workload {
                        Workload::Churn => step_churn(&*source, &mut rng, &mut held),
                        Workload::Ramp => step_ramp(&*source, &mut rng, &mut held),
                        Workload::Spike => step_spike(&*source, &mut rng, &mut held),
                    }
                    thread::sleep(Duration::from_millis(rng.gen_range(20..80)));
                }

                // Drain on shutdown so the final ledger balances out.
                for block in held.drain(..) {
                    source.free(block.addr, block.size, block.align);
                }
            })
        })
        .collect()
}

fn try_alloc<S: HeapSource>(source: &S, rng: &mut StdRng, held: &mut Vec<Held>) -> bool {
    let size = rng.gen_range(16..2048);
    let align = ALIGNMENTS[rng.gen_range(0..ALIGNMENTS.len())];
    match source.allocate(size, align) {
        Ok(addr) => {
            held.push(Held { addr, size, align });
            true
        }
        // Out of memory: give some back so the pattern can continue.
        Err(_) => {
            free_one(source, rng, held);
            false
        }
    }
}

fn free_one<S: HeapSource>(source: &S, rng: &mut StdRng, held: &mut Vec<Held>) {
    if held.is_empty() {
        return;
    }
    let block = held.swap_remove(rng.gen_range(0..held.len()));
    source.free(block.addr, block.size, block.align);
}

/// Alloc or free with even odds once a few blocks are outstanding.
fn step_churn<S: HeapSource>(source: &S, rng: &mut StdRng, held: &mut Vec<Held>) {
    if held.len() < 4 || rng.gen_bool(0.5) {
        try_alloc(source, rng, held);
    } else {
        free_one(source, rng, held);
    }
}

/// Three allocations for every free.
fn step_ramp<S: HeapSource>(source: &S, rng: &mut StdRng, held: &mut Vec<Held>) {
    if rng.gen_bool(0.75) {
        try_alloc(source, rng, held);
    } else {
        free_one(source, rng, held);
    }
}

/// Burst-allocate, then dump the whole holding on the next step.
fn step_spike<S: HeapSource>(source: &S, rng: &mut StdRng, held: &mut Vec<Held>) {
    if held.is_empty() {
        for _ in 0..rng.gen_range(4..12) {
            if !try_alloc(source, rng, held) {
                break;
            }
        }
    } else {
        for block in held.drain(..) {
            source.free(block.addr, block.size, block.align);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::VirtualHeap;
    use crate::trace::{live_ranges, TraceAllocator};

    #[test]
    fn workload_names_round_trip() {
        for w in Workload::all() {
            assert_eq!(Workload::from_name(w.name()), Some(w));
        }
        assert_eq!(Workload::from_name("bogus"), None);
    }

    #[test]
    fn producers_drain_on_stop() {
        let tracer = Arc::new(TraceAllocator::new(VirtualHeap::new(1024 * 1024)));
        let stop = Arc::new(AtomicBool::new(false));

        let handles = spawn_producers(Arc::clone(&tracer), Workload::Churn, 2, Arc::clone(&stop));
        thread::sleep(Duration::from_millis(200));
        stop.store(true, Ordering::Relaxed);
        for h in handles {
            h.join().unwrap();
        }

        // Every allocation was freed on the way out.
        let snap = tracer.snapshot();
        assert!(!snap.is_empty());
        assert_eq!(live_ranges(&snap), Vec::new());
        assert_eq!(tracer.source().allocated_bytes(), 0);
    }
}
