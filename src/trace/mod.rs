//! Allocation tracing core
//!
//! This module is the instrumentation heart of the crate:
//!
//! - [`event`]: the immutable [`AllocationEvent`] record and the opaque
//!   [`Address`] type.
//! - [`log`]: the thread-safe, append-only [`EventLog`] with point-in-time
//!   snapshots.
//! - [`interceptor`]: [`TraceAllocator`], which wraps any backing
//!   [`HeapSource`](crate::provider::HeapSource) and records its traffic.
//! - [`reconstruct`]: the pure [`live_ranges`] replay recovering the
//!   currently-allocated byte ranges from a snapshot.
//!
//! Producers share a [`TraceAllocator`] across threads; consumers pull
//! snapshots on their own schedule and either render the raw ledger or feed
//! the snapshot through [`live_ranges`]. Nothing in here ever dereferences
//! an address or fails because of malformed event histories.

pub mod event;
pub mod interceptor;
pub mod log;
pub mod reconstruct;

pub use event::{Address, AllocationEvent};
pub use interceptor::TraceAllocator;
pub use log::{EventLog, LogFull};
pub use reconstruct::{live_bytes, live_ranges, LiveRange};
