//! Per-relay model.
//!
//! A [`Relay`] is the logical source of truth for one physical relay: its
//! pins and polarity, the last requested state and the single pending
//! timer task. Nothing is read back from hardware.
//!
//! Normal relays are driven continuously; latching relays are switched by
//! a pulse on the set coil (`pin`) or the reset coil (`off_pin`), which the
//! [`PulseScheduler`](crate::scheduler::PulseScheduler) generates.

use core::fmt;

use embedded_hal::digital::PinState;

use crate::app::ports::{GpioPort, RelayObserver};
use crate::config::{PinId, RelayConfig};
use crate::timer::TaskToken;

/// Maximum number of relays one service drives.
pub const MAX_RELAYS: usize = 16;

/// Identity of a relay within its service.
///
/// Rail ownership is tracked by id, never by pin number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelayId(u8);

impl RelayId {
    pub const fn new(index: u8) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for RelayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.0)
    }
}

/// Logical relay state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Off,
    On,
}

impl From<bool> for RelayState {
    fn from(on: bool) -> Self {
        if on { Self::On } else { Self::Off }
    }
}

pub struct Relay {
    id: RelayId,
    config: RelayConfig,
    on: bool,
    initialized: bool,
    /// A coil is energized by a pulse of this relay.
    pulsing: bool,
    /// Pulse-end or retry task currently scheduled for this relay.
    pending: Option<TaskToken>,
    /// Consecutive start attempts that found the rail busy.
    deferrals: u32,
    observer: Option<Box<dyn RelayObserver>>,
}

impl Relay {
    pub(crate) fn new(id: RelayId, config: RelayConfig) -> Self {
        Self {
            id,
            config,
            on: false,
            initialized: false,
            pulsing: false,
            pending: None,
            deferrals: 0,
            observer: None,
        }
    }

    pub fn id(&self) -> RelayId {
        self.id
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    pub fn state(&self) -> RelayState {
        RelayState::from(self.on)
    }

    pub fn is_latching(&self) -> bool {
        self.config.latching
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_pulsing(&self) -> bool {
        self.pulsing
    }

    pub fn has_pending_task(&self) -> bool {
        self.pending.is_some()
    }

    /// Id of the pending task's token, if any.
    pub fn pending_token_id(&self) -> Option<u32> {
        self.pending.as_ref().map(TaskToken::id)
    }

    pub fn deferrals(&self) -> u32 {
        self.deferrals
    }

    /// Level that energizes a coil.
    pub fn energized(&self) -> PinState {
        PinState::from(self.config.on_high)
    }

    /// Level that releases a coil.
    pub fn released(&self) -> PinState {
        PinState::from(!self.config.on_high)
    }

    /// Coil to pulse for the requested state: set coil for on, reset coil
    /// for off.
    pub fn target_coil(&self) -> PinId {
        if self.on {
            self.config.pin
        } else {
            self.config.off_pin
        }
    }

    // ── Crate-internal mutation ───────────────────────────────

    /// Release every coil this relay drives.
    pub(crate) fn release_coils(&self, gpio: &mut impl GpioPort) {
        gpio.write(self.config.pin, self.released());
        if self.config.latching {
            gpio.write(self.config.off_pin, self.released());
        }
    }

    pub(crate) fn mark_initialized(&mut self) {
        self.initialized = true;
    }

    pub(crate) fn set_on(&mut self, on: bool) {
        self.on = on;
    }

    pub(crate) fn set_pulsing(&mut self, pulsing: bool) {
        self.pulsing = pulsing;
    }

    /// Store the token of a freshly scheduled task.
    ///
    /// The previous token must have been cancelled or consumed by firing.
    pub(crate) fn arm(&mut self, token: TaskToken) {
        debug_assert!(
            self.pending.is_none(),
            "{} already has a pending task",
            self.id
        );
        self.pending = Some(token);
    }

    /// Hand the pending token back, e.g. to cancel it.
    pub(crate) fn take_pending(&mut self) -> Option<TaskToken> {
        self.pending.take()
    }

    /// Consume the pending token if `token_id` is the one that just fired.
    pub(crate) fn consume_fired(&mut self, token_id: u32) -> bool {
        if self.pending_token_id() == Some(token_id) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    pub(crate) fn note_deferral(&mut self) -> u32 {
        self.deferrals = self.deferrals.saturating_add(1);
        self.deferrals
    }

    pub(crate) fn clear_deferrals(&mut self) {
        self.deferrals = 0;
    }

    pub(crate) fn set_observer(&mut self, observer: Box<dyn RelayObserver>) {
        self.observer = Some(observer);
    }

    pub(crate) fn notify(&mut self) {
        let (id, on) = (self.id, self.on);
        if let Some(observer) = self.observer.as_mut() {
            observer.on_change(id, on);
        }
    }
}

impl fmt::Debug for Relay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relay")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("on", &self.on)
            .field("initialized", &self.initialized)
            .field("pulsing", &self.pulsing)
            .field("pending", &self.pending)
            .field("deferrals", &self.deferrals)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}
