//! # Introduction
//!
//! heapscope instruments memory allocation activity for observability. A
//! [`trace::TraceAllocator`] wraps any backing [`provider::HeapSource`],
//! forwards every allocate / resize / free request to it, and records each
//! operation as an immutable [`trace::AllocationEvent`] in an append-only
//! [`trace::EventLog`]. A pure replay, [`trace::live_ranges`], reconstructs
//! from any snapshot the set of byte ranges currently allocated — tolerating
//! double frees, unknown-address frees, and address reuse without ever
//! failing.
//!
//! ## Data flow
//!
//! ```text
//! producer threads → TraceAllocator → backing HeapSource
//!                        │
//!                        ▼ append
//!                    EventLog ──snapshot()──► live_ranges() ──► TUI
//! ```
//!
//! 1. [`provider`] — the `HeapSource` capability trait and the simulated
//!    [`provider::VirtualHeap`] backing provider.
//! 2. [`trace`] — events, the log, the interceptor, and live-range
//!    reconstruction.
//! 3. [`workload`] — named multi-threaded producer patterns for the demo.
//! 4. [`ui`] — ratatui-based TUI; not part of the stable library API.
//!
//! Addresses are opaque integers throughout: this crate does bookkeeping
//! about allocations, it never dereferences them.

pub mod provider;
pub mod trace;
pub mod ui;
pub mod workload;
