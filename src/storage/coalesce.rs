//! Single-writer save coalescing.
//!
//! At most one caller performs a physical write at a time. A caller that
//! loses the race leaves a redo mark and returns at once; the winning
//! writer keeps looping while redo marks appear, so the latest in-memory
//! state always reaches disk without queueing individual changes.

use crate::core::Result;
use log::warn;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// What a single `request` call ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// This caller wrote the snapshot (possibly more than once).
    Written,
    /// Another caller was writing; it will pick this request up.
    Coalesced,
    /// This caller's last write attempt failed and was logged.
    Failed,
}

/// Counters for observing the coordinator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveStats {
    /// Calls to `request`.
    pub requested: u64,
    /// Successful physical writes.
    pub flushed: u64,
    /// Requests handed over to an in-flight writer.
    pub coalesced: u64,
    /// Writes that returned an error.
    pub failed: u64,
}

#[derive(Default)]
pub struct SaveCoordinator {
    writing: AtomicBool,
    redo: AtomicBool,
    requested: AtomicU64,
    flushed: AtomicU64,
    coalesced: AtomicU64,
    failed: AtomicU64,
}

impl SaveCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a save. `write` must read the live state when called.
    ///
    /// Never waits on another caller's write. Errors from `write` are logged
    /// under `label` and reported through the outcome only.
    pub fn request<F>(&self, label: &str, mut write: F) -> SaveOutcome
    where
        F: FnMut() -> Result<()>,
    {
        self.requested.fetch_add(1, Ordering::Relaxed);
        let mut outcome = SaveOutcome::Coalesced;

        loop {
            if self
                .writing
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                // Anything flagged before this point is covered by the write below.
                self.redo.store(false, Ordering::SeqCst);

                outcome = match write() {
                    Ok(()) => {
                        self.flushed.fetch_add(1, Ordering::Relaxed);
                        SaveOutcome::Written
                    }
                    Err(err) => {
                        self.failed.fetch_add(1, Ordering::Relaxed);
                        warn!("Failed to save {}: {}", label, err);
                        SaveOutcome::Failed
                    }
                };

                self.writing.store(false, Ordering::SeqCst);

                if !self.redo.load(Ordering::SeqCst) {
                    return outcome;
                }
                continue;
            }

            self.redo.store(true, Ordering::SeqCst);
            if self.writing.load(Ordering::SeqCst) {
                // The holder re-checks `redo` after releasing.
                if outcome == SaveOutcome::Coalesced {
                    self.coalesced.fetch_add(1, Ordering::Relaxed);
                }
                return outcome;
            }
            // Holder released between our attempt and the flag store; it may
            // have missed the mark, so try to take over.
        }
    }

    /// True while some caller is inside a physical write.
    pub fn is_writing(&self) -> bool {
        self.writing.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> SaveStats {
        SaveStats {
            requested: self.requested.load(Ordering::Relaxed),
            flushed: self.flushed.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}
