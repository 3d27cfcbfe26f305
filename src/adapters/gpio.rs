//! `embedded-hal` GPIO adapter.
//!
//! Implements [`GpioPort`] over a table of [`OutputPin`]s keyed by
//! [`PinId`]. The relay core treats pin writes as infallible, so write
//! errors are logged here and otherwise swallowed.

use embedded_hal::digital::{Error as _, OutputPin, PinState};
use heapless::Vec;
use log::{error, warn};

use crate::app::ports::GpioPort;
use crate::config::PinId;
use crate::error::{Error, Result};

/// Two coils per relay at most.
pub const MAX_PINS: usize = crate::relay::MAX_RELAYS * 2;

/// Output pins of one board, addressed by id.
pub struct HalPins<P> {
    pins: Vec<(PinId, P), MAX_PINS>,
}

impl<P> Default for HalPins<P> {
    fn default() -> Self {
        Self { pins: Vec::new() }
    }
}

impl<P: OutputPin> HalPins<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `pin` under `id`. A second registration replaces the first.
    pub fn add(&mut self, id: PinId, pin: P) -> Result<()> {
        if let Some(slot) = self.pins.iter_mut().find(|(p, _)| *p == id) {
            slot.1 = pin;
            return Ok(());
        }
        self.pins.push((id, pin)).map_err(|_| Error::Capacity)
    }

    pub fn get(&self, id: PinId) -> Option<&P> {
        self.pins.iter().find(|(p, _)| *p == id).map(|(_, pin)| pin)
    }
}

impl<P: OutputPin> GpioPort for HalPins<P> {
    fn write(&mut self, pin: PinId, level: PinState) {
        let Some((_, output)) = self.pins.iter_mut().find(|(p, _)| *p == pin) else {
            warn!("gpio: write to unregistered pin {}", pin);
            return;
        };
        if let Err(e) = output.set_state(level) {
            error!("gpio: pin {} write {:?} failed: {:?}", pin, level, e.kind());
        }
    }
}
