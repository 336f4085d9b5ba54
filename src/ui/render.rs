//! Repaint coalescing.
//!
//! Any number of render requests between two refresh ticks collapse into a
//! single paint. The scheduler only tracks the pending flag; the host's
//! refresh loop drives the tick by calling [`RenderScheduler::take`], which
//! makes coalescing testable without a real UI refresh mechanism.

use std::cell::Cell;

/// Per-session paint coalescing
#[derive(Default)]
pub struct RenderScheduler {
    pending: Cell<bool>,
}

impl RenderScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a repaint. Returns true if this call armed the pending
    /// flag, false if a paint was already scheduled.
    pub fn request(&self) -> bool {
        if self.pending.get() {
            return false;
        }
        self.pending.set(true);
        true
    }

    /// Called once per refresh tick: clears the pending flag and reports
    /// whether a paint is due. The paint must read the engine's state at
    /// this point, not at request time.
    pub fn take(&self) -> bool {
        self.pending.replace(false)
    }

    /// Whether a paint is currently scheduled
    pub fn is_pending(&self) -> bool {
        self.pending.get()
    }

    /// Drop any scheduled paint (session stopping)
    pub fn clear(&self) {
        self.pending.set(false);
    }
}
