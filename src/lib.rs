//! Relay driver library.
//!
//! Drives normal (continuously energized) and latching (bi-stable) relays.
//! Latching relays are switched by short coil pulses; the
//! [`scheduler::PulseScheduler`] bounds each pulse and serializes pulses
//! that share a current-limited rail.
//!
//! Hardware and timers are reached only through the traits in
//! [`app::ports`], so everything here runs on the host against the
//! virtual-clock [`timer::SimTimer`].

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod relay;
pub mod scheduler;
pub mod timer;

pub use app::ports::{GpioPort, RelayObserver, TimerService};
pub use app::service::RelayService;
pub use config::{PinId, PulseTiming, RailConfig, RelayConfig};
pub use error::{ConfigError, Error};
pub use relay::{RelayId, RelayState};
