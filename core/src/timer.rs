//! Auto-dismiss lifecycle for the notification slot.
//!
//! The timer is `Idle` or `Armed`. Each arm bumps a generation number; a
//! scheduled expiry only takes effect if its generation is still current, and
//! arming again or disarming aborts the task that was scheduled before.

use std::time::Duration;

use tokio::task::AbortHandle;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Armed { generation: u64, expires_at: Instant },
}

#[derive(Debug)]
pub struct NotificationTimer {
    state: TimerState,
    generation: u64,
    pending: Option<AbortHandle>,
}

impl Default for NotificationTimer {
    fn default() -> Self {
        Self {
            state: TimerState::Idle,
            generation: 0,
            pending: None,
        }
    }
}

impl NotificationTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.state, TimerState::Armed { .. })
    }

    /// Generation of the most recent notification, armed or not.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start a new countdown, replacing any previous one.
    pub fn arm(&mut self, now: Instant, duration: Duration) -> u64 {
        self.cancel_pending();
        self.generation += 1;
        self.state = TimerState::Armed {
            generation: self.generation,
            expires_at: now + duration,
        };
        self.generation
    }

    /// Keep the handle of the task that will fire for the current generation.
    pub fn track(&mut self, handle: AbortHandle) {
        self.cancel_pending();
        self.pending = Some(handle);
    }

    /// Fire a scheduled expiry. Returns `true` when it was still current.
    pub fn expire(&mut self, generation: u64) -> bool {
        match self.state {
            TimerState::Armed { generation: armed, .. } if armed == generation => {
                self.state = TimerState::Idle;
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    /// Manual dismissal: back to `Idle` now, pending expiry cancelled.
    pub fn disarm(&mut self) {
        self.cancel_pending();
        self.state = TimerState::Idle;
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}
