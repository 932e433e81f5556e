//! Latest-selection-wins loading for dashboard panels.
//!
//! Every load is stamped with a ticket from a shared [`LoadTracker`]. A result
//! is applied only if its ticket is still the newest one issued, so a slow
//! response for an old filter can never overwrite a newer selection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadTicket(u64);

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoadTracker {
    latest: Arc<AtomicU64>,
}

impl LoadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> LoadTicket {
        LoadTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}

#[derive(Debug)]
pub struct DashboardView<T> {
    tracker: LoadTracker,
    value: Option<T>,
    applied: Option<LoadTicket>,
    discarded: usize,
}

impl<T> DashboardView<T> {
    pub fn new(tracker: LoadTracker) -> Self {
        Self {
            tracker,
            value: None,
            applied: None,
            discarded: 0,
        }
    }

    pub fn begin_load(&self) -> LoadTicket {
        self.tracker.issue()
    }

    /// Stores `value` if `ticket` is the newest issued; returns whether it was applied.
    pub fn complete(&mut self, ticket: LoadTicket, value: T) -> bool {
        if !self.tracker.is_current(ticket) {
            self.discarded += 1;
            tracing::debug!(generation = ticket.generation(), "discarding stale dashboard load");
            return false;
        }
        self.value = Some(value);
        self.applied = Some(ticket);
        true
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn applied_ticket(&self) -> Option<LoadTicket> {
        self.applied
    }

    pub fn discarded(&self) -> usize {
        self.discarded
    }
}
