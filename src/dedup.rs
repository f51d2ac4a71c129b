//! Time-windowed duplicate suppression for tag reads.
//!
//! A reader reports the same tag many times per second while it sits in the
//! field. The cache lets one read per EPC through per window and suppresses
//! the rest, so the collector sees at most one event per tag per window.

use crate::tag::Epc;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Per-EPC claim table shared by every delivery of the poll loop.
///
/// Entries are never evicted: the map grows by one entry per distinct tag
/// for the lifetime of the process.
#[derive(Debug)]
pub struct DedupCache {
    /// Minimum time between two accepted reads of the same EPC
    window: Duration,
    /// Time of the last accepted read for each EPC
    last_accepted: Mutex<HashMap<Epc, Instant>>,
}

impl DedupCache {
    /// Create an empty cache with the given suppression window.
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    /// use rfid_forwarder::dedup::DedupCache;
    ///
    /// let cache = DedupCache::new(Duration::from_secs(10));
    /// assert!(cache.is_empty());
    /// ```
    pub fn new(window: Duration) -> Self {
        DedupCache {
            window,
            last_accepted: Mutex::new(HashMap::new()),
        }
    }

    /// Claim `epc` for sending at time `now`.
    ///
    /// Returns `true` if the EPC has never been accepted or its last acceptance
    /// is at least one window old; the acceptance time is then set to `now`.
    /// Returns `false` otherwise and leaves the stored time untouched, so a
    /// stream of suppressed reads never extends the window.
    ///
    /// The lookup and the update happen under one lock, so two callers racing
    /// on the same EPC cannot both win.
    pub fn try_claim(&self, epc: Epc, now: Instant) -> bool {
        // A poisoned lock only means another claimer panicked; the map is still valid.
        let mut last_accepted = self
            .last_accepted
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        match last_accepted.get(&epc) {
            Some(last) if now.saturating_duration_since(*last) < self.window => false,
            _ => {
                last_accepted.insert(epc, now);
                true
            }
        }
    }

    /// Number of distinct EPCs ever accepted.
    pub fn len(&self) -> usize {
        self.last_accepted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
