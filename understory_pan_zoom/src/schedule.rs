// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cancellable one-shot deadlines driven by the host clock.

/// A one-shot task that becomes due at a host timestamp.
///
/// Scheduling replaces any pending deadline, so repeated calls debounce: the
/// task fires once, `delay` milliseconds after the last call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScheduledTask {
    deadline: Option<u64>,
}

impl ScheduledTask {
    /// Schedules the task `delay_ms` after `now_ms`, replacing any pending deadline.
    pub fn schedule(&mut self, now_ms: u64, delay_ms: u64) {
        self.deadline = Some(now_ms.saturating_add(delay_ms));
    }

    /// Cancels the pending deadline. Returns `true` if one was pending.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    /// Returns `true` while a deadline is pending.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns the pending deadline, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<u64> {
        self.deadline
    }

    /// Consumes the deadline if it is due at `now_ms`.
    pub fn fire_if_due(&mut self, now_ms: u64) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now_ms => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
