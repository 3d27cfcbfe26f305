//! Rail and relay configuration
//!
//! All tunable parameters for the relay bank and its pulse rail.
//! Values can be overridden by loading a JSON document, e.g. from the
//! simulator command line or a provisioning blob.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// GPIO identifier as understood by the [`GpioPort`](crate::app::ports::GpioPort).
pub type PinId = u8;

/// Pulse timing tunables for latching relays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PulseTiming {
    /// How long a coil stays energized per pulse (milliseconds)
    pub pulse_ms: u32,
    /// Backoff before retrying a pulse that found the rail busy (milliseconds)
    pub retry_ms: u32,
    /// Minimum spacing between pulse starts when pulses may not overlap (milliseconds)
    pub min_spacing_ms: u32,
}

impl Default for PulseTiming {
    fn default() -> Self {
        Self {
            pulse_ms: 50,
            retry_ms: 50,
            min_spacing_ms: 500,
        }
    }
}

impl PulseTiming {
    /// Reject values that would leave a coil energized forever or spin the
    /// retry loop without advancing the clock.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pulse_ms == 0 {
            return Err(ConfigError::ValidationFailed("pulse_ms must be non-zero"));
        }
        if self.retry_ms == 0 {
            return Err(ConfigError::ValidationFailed("retry_ms must be non-zero"));
        }
        Ok(())
    }
}

/// Configuration of the shared pulse rail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RailConfig {
    /// Whether several latching relays may pulse at the same time.
    pub simultaneous_pulses: bool,
    pub timing: PulseTiming,
}

impl RailConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.timing.validate()
    }

    /// Parse and validate a JSON rail configuration.
    ///
    /// Missing fields fall back to their defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(|_| ConfigError::Malformed)?;
        config.validate()?;
        Ok(config)
    }
}

/// Construction-time description of one physical relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Drive pin of a normal relay, or the "set" coil of a latching one.
    pub pin: PinId,
    /// "Reset" coil of a latching relay. Ignored for normal relays.
    #[serde(default)]
    pub off_pin: PinId,
    /// Driving the pin high energizes the coil.
    #[serde(default = "default_on_high")]
    pub on_high: bool,
    /// The relay is bi-stable and is switched by pulses.
    #[serde(default)]
    pub latching: bool,
}

const fn default_on_high() -> bool {
    true
}

impl RelayConfig {
    /// A continuously driven relay on `pin`.
    pub const fn normal(pin: PinId, on_high: bool) -> Self {
        Self {
            pin,
            off_pin: pin,
            on_high,
            latching: false,
        }
    }

    /// A bi-stable relay with separate set and reset coils.
    pub const fn latching(set_pin: PinId, reset_pin: PinId, on_high: bool) -> Self {
        Self {
            pin: set_pin,
            off_pin: reset_pin,
            on_high,
            latching: true,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.latching && self.off_pin == self.pin {
            return Err(ConfigError::ValidationFailed(
                "latching relay needs distinct set and reset pins",
            ));
        }
        Ok(())
    }
}
