//! Runtime counters for the pulse rail.
//!
//! Collected by the [`PulseScheduler`](crate::scheduler::PulseScheduler)
//! and serialisable so a telemetry adapter can ship them as-is.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PulseStats {
    /// Pulses that energized a coil.
    pub pulses_started: u32,
    /// Pulses cut off by their own duration timeout.
    pub pulses_completed: u32,
    /// Pulses cut short because a newer request for the same relay arrived.
    pub pulses_superseded: u32,
    /// Start attempts that found the rail busy or the gate closed.
    pub deferrals: u32,
}

impl PulseStats {
    pub(crate) fn record_start(&mut self) {
        self.pulses_started = self.pulses_started.wrapping_add(1);
    }

    pub(crate) fn record_completion(&mut self) {
        self.pulses_completed = self.pulses_completed.wrapping_add(1);
    }

    pub(crate) fn record_supersede(&mut self) {
        self.pulses_superseded = self.pulses_superseded.wrapping_add(1);
    }

    pub(crate) fn record_deferral(&mut self) {
        self.deferrals = self.deferrals.wrapping_add(1);
    }

    /// Pulses that are still energized (started but not yet ended).
    pub fn in_flight(&self) -> u32 {
        self.pulses_started
            .wrapping_sub(self.pulses_completed)
            .wrapping_sub(self.pulses_superseded)
    }
}
