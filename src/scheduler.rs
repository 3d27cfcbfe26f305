//! Latching-relay pulse scheduler.
//!
//! Owns the state of the shared pulse rail and decides when a latching
//! relay may energize a coil.
//!
//! ```text
//!            start_pulse
//!                │
//!                ▼
//!   ┌──────── admitted? ────────┐
//!   │ yes                       │ no
//!   ▼                           ▼
//! energize coil            RetryPulse after retry_ms
//! owner = relay                 │
//! EndPulse after pulse_ms       └──▶ start_pulse (again)
//! close gate, ReopenGate
//! after min_spacing_ms
//!   │
//!   ▼
//! end_pulse: release both coils, clear owner if it is this relay
//! ```
//!
//! A pulse is admitted when the rail has no owner (or simultaneous pulses
//! are allowed) and the spacing gate is open. A relay that is not admitted
//! retries at a fixed interval until it is; there is no retry ceiling.

use log::{debug, info};

use crate::app::ports::{GpioPort, TimerService};
use crate::config::{PulseTiming, RailConfig};
use crate::diagnostics::PulseStats;
use crate::relay::{Relay, RelayId};
use crate::timer::{Task, TaskToken};

// ═══════════════════════════════════════════════════════════════
//  Rail state
// ═══════════════════════════════════════════════════════════════

/// Pulse admission control for one power rail.
///
/// There is exactly one of these per [`RelayService`](crate::app::service::RelayService);
/// it is the only state shared between relays.
#[derive(Debug)]
pub struct PulseScheduler {
    /// Relay whose pulse currently holds the rail. Back-reference only.
    owner: Option<RelayId>,
    /// Pulse starts are allowed.
    gate_open: bool,
    /// The shared gate-reopen task, while the gate is closed.
    gate_task: Option<TaskToken>,
    simultaneous: bool,
    timing: PulseTiming,
    stats: PulseStats,
}

impl PulseScheduler {
    pub fn new(config: &RailConfig) -> Self {
        Self {
            owner: None,
            gate_open: true,
            gate_task: None,
            simultaneous: config.simultaneous_pulses,
            timing: config.timing,
            stats: PulseStats::default(),
        }
    }

    pub fn timing(&self) -> PulseTiming {
        self.timing
    }

    pub fn simultaneous_pulses(&self) -> bool {
        self.simultaneous
    }

    /// Allow or forbid overlapping pulses. Read at every admission check.
    pub fn set_simultaneous_pulses(&mut self, allowed: bool) {
        if allowed != self.simultaneous {
            info!("pulse rail: simultaneous pulses {}", if allowed { "allowed" } else { "forbidden" });
        }
        self.simultaneous = allowed;
    }

    /// Relay currently recorded as holding the rail.
    pub fn owner(&self) -> Option<RelayId> {
        self.owner
    }

    pub fn is_gate_open(&self) -> bool {
        self.gate_open
    }

    pub fn stats(&self) -> PulseStats {
        self.stats
    }

    /// Whether a pulse requested now would start immediately.
    pub fn admits(&self) -> bool {
        (self.owner.is_none() || self.simultaneous) && self.gate_open
    }

    // ── Pulse lifecycle ───────────────────────────────────────

    /// Start a pulse on the coil matching the relay's requested state, or
    /// schedule a retry if the rail is not available.
    ///
    /// The relay must not hold a pending task.
    pub fn start_pulse(
        &mut self,
        relay: &mut Relay,
        gpio: &mut impl GpioPort,
        timer: &mut impl TimerService,
    ) {
        let id = relay.id();
        let coil = relay.target_coil();

        if self.admits() {
            gpio.write(coil, relay.energized());
            relay.set_pulsing(true);
            relay.clear_deferrals();
            self.owner = Some(id);
            self.stats.record_start();
            relay.arm(timer.schedule(Task::EndPulse(id), self.timing.pulse_ms));
            debug!("{}: pulse on pin {} for {}ms", id, coil, self.timing.pulse_ms);

            if !self.simultaneous {
                self.close_gate(timer);
            }
        } else {
            let attempt = relay.note_deferral();
            self.stats.record_deferral();
            info!(
                "{}: another pulse is active, retry #{} in {}ms",
                id, attempt, self.timing.retry_ms
            );
            relay.arm(timer.schedule(Task::RetryPulse(id), self.timing.retry_ms));
        }
    }

    /// Release both coils of `relay` and give up the rail if it holds it.
    ///
    /// Always safe to call, also when the relay is not pulsing. Returns
    /// whether a pulse was in flight.
    pub fn end_pulse(&mut self, relay: &mut Relay, gpio: &mut impl GpioPort) -> bool {
        relay.release_coils(gpio);
        let was_pulsing = relay.is_pulsing();
        relay.set_pulsing(false);
        if self.owner == Some(relay.id()) {
            self.owner = None;
        }
        was_pulsing
    }

    /// Pulse-duration timeout for `relay`.
    pub fn expire(&mut self, relay: &mut Relay, gpio: &mut impl GpioPort) {
        if self.end_pulse(relay, gpio) {
            self.stats.record_completion();
            debug!("{}: pulse ended", relay.id());
        }
    }

    /// Drop whatever the relay was doing (in-flight pulse or pending retry)
    /// so a new request can start clean.
    pub fn supersede(
        &mut self,
        relay: &mut Relay,
        gpio: &mut impl GpioPort,
        timer: &mut impl TimerService,
    ) {
        if self.end_pulse(relay, gpio) {
            self.stats.record_supersede();
            debug!("{}: pulse superseded", relay.id());
        }
        if let Some(token) = relay.take_pending() {
            timer.unschedule(token);
        }
    }

    // ── Spacing gate ──────────────────────────────────────────

    fn close_gate(&mut self, timer: &mut impl TimerService) {
        if let Some(token) = self.gate_task.take() {
            timer.unschedule(token);
        }
        self.gate_open = false;
        self.gate_task = Some(timer.schedule(Task::ReopenGate, self.timing.min_spacing_ms));
    }

    /// Handle the gate-reopen task. Ignores a stale token.
    pub fn reopen_gate(&mut self, token_id: u32) -> bool {
        match &self.gate_task {
            Some(token) if token.id() == token_id => {
                self.gate_task = None;
                self.gate_open = true;
                debug!("pulse rail: gate open");
                true
            }
            _ => false,
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
