// SPDX-License-Identifier: GPL-3.0-only

//! Single vs double activation on gallery thumbnails
//!
//! Each thumbnail has its own slot in a tiny state machine:
//!
//! ```text
//!         activate                 window elapses
//! Idle ─────────────▶ PendingToggle ───────────────▶ Idle  (toggle fires)
//!                          │
//!                          │ activate within window
//!                          ▼
//!                         Idle  (toggle cancelled, view fullscreen)
//! ```
//!
//! Time is injected through [`Clock`], so the window is testable with
//! [`ManualClock`].

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::trace;

/// Monotonic time source
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.lock().map(|now| *now).unwrap_or_else(|e| *e.into_inner())
    }
}

/// Result of one ambiguous activation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// First activation: a toggle fires unless another one follows in time
    PendingToggle,
    /// Second activation within the window: the toggle is cancelled
    ViewFullscreen,
}

/// Per-thumbnail pending-toggle slots
#[derive(Debug)]
pub struct ActivationDebouncer {
    window: Duration,
    pending: BTreeMap<usize, Instant>,
}

impl ActivationDebouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: BTreeMap::new(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Register an activation of thumbnail `index` at `now`
    ///
    /// Callers fire due toggles with [`Self::poll`] first; a slot whose
    /// window already elapsed is treated as a fresh first activation.
    pub fn activate(&mut self, index: usize, now: Instant) -> Activation {
        match self.pending.remove(&index) {
            Some(since) if now.saturating_duration_since(since) <= self.window => {
                trace!(index, "Second activation, cancelling toggle");
                Activation::ViewFullscreen
            }
            _ => {
                trace!(index, "First activation, toggle pending");
                self.pending.insert(index, now);
                Activation::PendingToggle
            }
        }
    }

    /// Drain slots whose window has elapsed; their toggles fire now
    pub fn poll(&mut self, now: Instant) -> Vec<usize> {
        let due: Vec<usize> = self
            .pending
            .iter()
            .filter(|(_, since)| now.saturating_duration_since(**since) > self.window)
            .map(|(index, _)| *index)
            .collect();
        for index in &due {
            self.pending.remove(index);
        }
        due
    }

    /// Drop a pending toggle without firing it (explicit controls)
    pub fn cancel(&mut self, index: usize) -> bool {
        self.pending.remove(&index).is_some()
    }

    /// Drop every pending toggle (indices are stale after a delete)
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn is_pending(&self, index: usize) -> bool {
        self.pending.contains_key(&index)
    }

    /// Earliest instant at which [`Self::poll`] will fire something
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending
            .values()
            .min()
            .map(|since| *since + self.window + Duration::from_millis(1))
    }
}
