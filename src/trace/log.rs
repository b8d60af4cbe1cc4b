//! Append-only event log
//!
//! [`EventLog`] holds the full chronological history of allocation events.
//! Writers append, readers take independent snapshots; insertion order is
//! the only ordering and is the operation order as observed by the
//! interceptor, not any global clock.
//!
//! The log is unbounded by default. That is deliberate: a producer that is
//! never drained grows without bound, and callers who need bounded memory
//! impose their own retention policy via [`EventLog::with_max_events`]
//! rather than the log silently evicting history.

use super::event::AllocationEvent;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

/// Error returned when an append would exceed the configured entry cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogFull {
    pub max_events: usize,
}

impl fmt::Display for LogFull {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event log full ({} entries)", self.max_events)
    }
}

impl std::error::Error for LogFull {}

/// Thread-safe, append-only, ordered store of [`AllocationEvent`]s.
pub struct EventLog {
    events: Mutex<Vec<AllocationEvent>>,
    max_events: Option<usize>,
}

impl EventLog {
    /// Create an unbounded log.
    pub fn new() -> Self {
        EventLog {
            events: Mutex::new(Vec::new()),
            max_events: None,
        }
    }

    /// Create a log that refuses appends past `max_events` entries.
    pub fn with_max_events(max_events: usize) -> Self {
        EventLog {
            events: Mutex::new(Vec::new()),
            max_events: Some(max_events),
        }
    }

    /// Append an event to the end of the log.
    ///
    /// Entries are never reordered or dropped once appended. The lock is
    /// held only for the push itself.
    pub fn append(&self, event: AllocationEvent) -> Result<(), LogFull> {
        let mut events = self.lock();
        if let Some(max) = self.max_events {
            if events.len() >= max {
                return Err(LogFull { max_events: max });
            }
        }
        events.push(event);
        Ok(())
    }

    /// An independent copy of the log as it stood at the moment of the call.
    ///
    /// Appends that complete after the snapshot is taken are not visible in
    /// it; the caller processes the copy after the lock is released.
    pub fn snapshot(&self) -> Vec<AllocationEvent> {
        self.lock().clone()
    }

    /// Number of events currently in the log.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the log has no events yet.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<AllocationEvent>> {
        // Appends are a single push; a panic mid-append cannot leave the
        // vec torn, so a poisoned lock is recovered rather than propagated.
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLog")
            .field("len", &self.len())
            .field("max_events", &self.max_events)
            .finish()
    }
}
