//! Log-based state observer.
//!
//! Implements [`RelayObserver`] by writing every state change to the `log`
//! facade. A telemetry adapter would implement the same trait.

use log::info;

use crate::app::ports::RelayObserver;
use crate::relay::RelayId;

/// Observer that logs relay state changes under a fixed name.
pub struct LogObserver {
    name: &'static str,
}

impl LogObserver {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

impl RelayObserver for LogObserver {
    fn on_change(&mut self, relay: RelayId, on: bool) {
        info!(
            "STATE | {} ({}) -> {}",
            self.name,
            relay,
            if on { "ON" } else { "OFF" }
        );
    }
}
