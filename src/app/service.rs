//! Relay service — the public surface of the relay core.
//!
//! [`RelayService`] owns the relay bank, the [`PulseScheduler`] and the
//! two driven ports. It exposes `init` / `on` / `off` / `toggle` and takes
//! expired timer tasks back through [`RelayService::handle_fired`].
//!
//! ```text
//!  on/off/toggle ──▶ ┌──────────────────────────┐ ──▶ GpioPort
//!                    │       RelayService        │
//!  Fired tasks   ──▶ │ Relays · PulseScheduler   │ ──▶ TimerService
//!                    └──────────────────────────┘ ──▶ RelayObserver
//! ```
//!
//! Execution is single-threaded and cooperative: every call runs to
//! completion before the next one starts. Use
//! [`SharedRelayService`](super::shared::SharedRelayService) when timer
//! callbacks can preempt the main loop.

use heapless::Vec;
use log::{debug, info, warn};

use crate::config::{RailConfig, RelayConfig};
use crate::error::{Error, Result};
use crate::relay::{MAX_RELAYS, Relay, RelayId};
use crate::scheduler::PulseScheduler;
use crate::timer::{Fired, SimTimer, Task};

use super::ports::{GpioPort, RelayObserver, TimerService};

// ───────────────────────────────────────────────────────────────
// RelayService
// ───────────────────────────────────────────────────────────────

pub struct RelayService<G, T> {
    relays: Vec<Relay, MAX_RELAYS>,
    scheduler: PulseScheduler,
    gpio: G,
    timer: T,
}

impl<G: GpioPort, T: TimerService> RelayService<G, T> {
    /// Construct the service. Relays are added with [`add`](Self::add).
    pub fn new(config: &RailConfig, gpio: G, timer: T) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            relays: Vec::new(),
            scheduler: PulseScheduler::new(config),
            gpio,
            timer,
        })
    }

    // ── Bank management ───────────────────────────────────────

    /// Register a relay. Its pins are not touched until [`init`](Self::init).
    pub fn add(&mut self, config: RelayConfig) -> Result<RelayId> {
        config.validate()?;
        let id = RelayId::new(self.relays.len() as u8);
        self.relays
            .push(Relay::new(id, config))
            .map_err(|_| Error::Capacity)?;
        debug!("{}: added {:?}", id, config);
        Ok(id)
    }

    /// Bind the state-change observer of a relay, replacing any previous one.
    pub fn set_observer(
        &mut self,
        id: RelayId,
        observer: impl RelayObserver + 'static,
    ) -> Result<()> {
        let relay = self
            .relays
            .get_mut(id.index())
            .ok_or(Error::UnknownRelay(id))?;
        relay.set_observer(Box::new(observer));
        Ok(())
    }

    pub fn relay(&self, id: RelayId) -> Option<&Relay> {
        self.relays.get(id.index())
    }

    pub fn relays(&self) -> impl Iterator<Item = &Relay> {
        self.relays.iter()
    }

    pub fn len(&self) -> usize {
        self.relays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relays.is_empty()
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Release the relay's coils and make it ready for switching.
    ///
    /// Safe to call again; a pending pulse or retry is dropped.
    pub fn init(&mut self, id: RelayId) {
        let Some(relay) = self.relays.get_mut(id.index()) else {
            return;
        };
        if relay.is_latching() {
            self.scheduler.supersede(relay, &mut self.gpio, &mut self.timer);
        } else {
            relay.release_coils(&mut self.gpio);
        }
        relay.mark_initialized();
        debug!("{}: initialised", id);
    }

    /// Initialise every registered relay.
    pub fn init_all(&mut self) {
        for index in 0..self.relays.len() {
            self.init(RelayId::new(index as u8));
        }
    }

    // ── Switching ─────────────────────────────────────────────

    pub fn on(&mut self, id: RelayId) {
        self.set(id, true);
    }

    pub fn off(&mut self, id: RelayId) {
        self.set(id, false);
    }

    pub fn toggle(&mut self, id: RelayId) {
        let Some(relay) = self.relays.get(id.index()) else {
            return;
        };
        let on = relay.is_on();
        debug!("{}: toggle", id);
        self.set(id, !on);
    }

    /// Set the logical state of a relay.
    ///
    /// The state is updated immediately; for latching relays the physical
    /// pulse may start later if the rail is busy. Unknown ids are ignored.
    pub fn set(&mut self, id: RelayId, on: bool) {
        let Some(relay) = self.relays.get_mut(id.index()) else {
            return;
        };
        if !relay.is_initialized() {
            warn!("{}: switched before init, ignored", id);
            return;
        }
        info!("{}: {}", id, if on { "on" } else { "off" });

        relay.set_on(on);
        if relay.is_latching() {
            self.scheduler.supersede(relay, &mut self.gpio, &mut self.timer);
            self.scheduler
                .start_pulse(relay, &mut self.gpio, &mut self.timer);
        } else {
            let level = if on { relay.energized() } else { relay.released() };
            self.gpio.write(relay.config().pin, level);
        }
        relay.notify();
    }

    // ── Timer dispatch ────────────────────────────────────────

    /// Run an expired timer task.
    ///
    /// Tasks whose token no longer matches (cancelled or superseded after
    /// expiry was queued) are dropped.
    pub fn handle_fired(&mut self, fired: Fired) {
        match fired.task {
            Task::ReopenGate => {
                if !self.scheduler.reopen_gate(fired.token_id) {
                    debug!("stale gate task #{} ignored", fired.token_id);
                }
            }
            Task::EndPulse(id) | Task::RetryPulse(id) => {
                let Some(relay) = self.relays.get_mut(id.index()) else {
                    return;
                };
                if !relay.consume_fired(fired.token_id) {
                    debug!("{}: stale {:?} #{} ignored", id, fired.task, fired.token_id);
                    return;
                }
                if matches!(fired.task, Task::EndPulse(_)) {
                    self.scheduler.expire(relay, &mut self.gpio);
                } else {
                    self.scheduler
                        .start_pulse(relay, &mut self.gpio, &mut self.timer);
                }
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Logical state, or `None` for an unknown id.
    pub fn is_on(&self, id: RelayId) -> Option<bool> {
        self.relay(id).map(Relay::is_on)
    }

    pub fn has_pending_task(&self, id: RelayId) -> bool {
        self.relay(id).is_some_and(Relay::has_pending_task)
    }

    /// Relays with a coil currently energized by a pulse.
    pub fn pulsing(&self) -> impl Iterator<Item = RelayId> + '_ {
        self.relays
            .iter()
            .filter(|r| r.is_pulsing())
            .map(Relay::id)
    }

    pub fn set_simultaneous_pulses(&mut self, allowed: bool) {
        self.scheduler.set_simultaneous_pulses(allowed);
    }

    pub fn scheduler(&self) -> &PulseScheduler {
        &self.scheduler
    }

    pub fn gpio(&self) -> &G {
        &self.gpio
    }

    pub fn gpio_mut(&mut self) -> &mut G {
        &mut self.gpio
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }
}

// ───────────────────────────────────────────────────────────────
// Virtual-clock driving
// ───────────────────────────────────────────────────────────────

impl<G: GpioPort> RelayService<G, SimTimer> {
    pub fn now_ms(&self) -> u64 {
        self.timer.now_ms()
    }

    /// Fire every task due up to and including `t_ms`, in expiry order, then
    /// leave the clock at `t_ms`.
    pub fn advance_to(&mut self, t_ms: u64) {
        while let Some(fired) = self.timer.pop_due(t_ms) {
            self.handle_fired(fired);
        }
        self.timer.set_now(t_ms);
    }

    pub fn advance_by(&mut self, ms: u64) {
        let target = self.now_ms() + ms;
        self.advance_to(target);
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
