//! Acquisition state
//!
//! ```txt
//!   start
//!     ||
//!     \/
//! +----------------+  long low   +------------+  second  +--------+
//! | AwaitingSignal | ==========> | MarkerSeen | =======> | Locked |
//! +----------------+             +------------+   tick   +--------+
//!     /\                                                     ||
//!     ||================= lock timeout (optional) ============||
//! ```
//!
//! The state only controls what a display may show. Minutes
//! are decoded in every state.

#[cfg(not(test))]
use log::{info, warn};

#[cfg(test)]
use std::println as info;
#[cfg(test)]
use std::println as warn;

/// Receiver acquisition state
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum_macros::AsRefStr,
    strum_macros::Display,
)]
pub enum SyncState {
    /// No sequence start has been seen
    #[default]
    #[strum(serialize = "awaiting signal")]
    AwaitingSignal,

    /// The first long pulse has been seen
    #[strum(serialize = "marker seen")]
    MarkerSeen,

    /// At least one second has been counted since the first
    /// long pulse
    #[strum(serialize = "locked")]
    Locked,
}

/// Tracks [`SyncState`]
///
/// Without a lock timeout, `Locked` is permanent. With one,
/// the machine returns to `AwaitingSignal` once the given
/// number of milliseconds pass with no second tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncMachine {
    state: SyncState,
    lock_timeout_ms: Option<u64>,
    ms_since_tick: u64,
}

impl SyncMachine {
    /// New machine, awaiting signal
    pub fn new(lock_timeout_ms: Option<u64>) -> Self {
        Self {
            state: SyncState::AwaitingSignal,
            lock_timeout_ms,
            ms_since_tick: 0,
        }
    }

    /// Current state
    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Lock timeout, in milliseconds, if any
    pub fn lock_timeout(&self) -> Option<u64> {
        self.lock_timeout_ms
    }

    /// True if decoded times may be shown
    pub fn is_locked(&self) -> bool {
        self.state == SyncState::Locked
    }

    /// Return to `AwaitingSignal`
    pub fn reset(&mut self) {
        self.state = SyncState::AwaitingSignal;
        self.ms_since_tick = 0;
    }

    /// The first long low pulse was seen
    ///
    /// Returns the new state if it changed.
    pub fn sequence_start(&mut self) -> Option<SyncState> {
        self.ms_since_tick = 0;
        if self.state == SyncState::AwaitingSignal {
            self.transition(SyncState::MarkerSeen)
        } else {
            None
        }
    }

    /// The second index changed
    ///
    /// Returns the new state if it changed.
    pub fn second_tick(&mut self) -> Option<SyncState> {
        self.ms_since_tick = 0;
        if self.state == SyncState::MarkerSeen {
            self.transition(SyncState::Locked)
        } else {
            None
        }
    }

    /// Account for `duration_ms` of elapsed time
    ///
    /// Call once per edge, before handling it. Returns
    /// `Some(SyncState::AwaitingSignal)` if the lock has timed
    /// out; the caller must then restart acquisition.
    pub fn elapse(&mut self, duration_ms: u64) -> Option<SyncState> {
        self.ms_since_tick = self.ms_since_tick.saturating_add(duration_ms);
        match self.lock_timeout_ms {
            Some(timeout) if self.state != SyncState::AwaitingSignal => {
                if self.ms_since_tick > timeout {
                    warn!(
                        "sync: no seconds for {} ms (limit {} ms); signal lost",
                        self.ms_since_tick, timeout
                    );
                    self.ms_since_tick = 0;
                    self.transition(SyncState::AwaitingSignal)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    fn transition(&mut self, to: SyncState) -> Option<SyncState> {
        info!("sync: {} → {}", self.state, to);
        self.state = to;
        Some(to)
    }
}

impl Default for SyncMachine {
    fn default() -> Self {
        Self::new(None)
    }
}
