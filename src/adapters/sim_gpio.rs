//! In-memory GPIO for simulation.
//!
//! Keeps the last level written to each pin and logs every edge, so a
//! virtual-clock run reads like a logic-analyser trace.

use embedded_hal::digital::PinState;
use heapless::FnvIndexMap;
use log::{error, info};

use crate::app::ports::GpioPort;
use crate::config::PinId;

/// Power-of-two capacity required by `FnvIndexMap`.
const SIM_PINS: usize = 64;

#[derive(Default)]
pub struct SimGpio {
    levels: FnvIndexMap<PinId, PinState, SIM_PINS>,
    /// Prefix for log lines, e.g. the current virtual time.
    label: heapless::String<16>,
}

impl SimGpio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last level written to `pin`, if any.
    pub fn level(&self, pin: PinId) -> Option<PinState> {
        self.levels.get(&pin).copied()
    }

    pub fn is_high(&self, pin: PinId) -> bool {
        self.level(pin) == Some(PinState::High)
    }

    /// Set the prefix of subsequent log lines.
    pub fn set_label(&mut self, label: &str) {
        self.label.clear();
        for c in label.chars() {
            if self.label.push(c).is_err() {
                break;
            }
        }
    }
}

impl GpioPort for SimGpio {
    fn write(&mut self, pin: PinId, level: PinState) {
        let previous = self.level(pin);
        if self.levels.insert(pin, level).is_err() {
            error!("sim gpio: pin table full, pin {} dropped", pin);
            return;
        }
        if previous != Some(level) {
            info!("{} pin {:>2} -> {:?}", self.label, pin, level);
        }
    }
}
