//! Port traits — the boundary between relay logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ RelayService (domain)
//! ```
//!
//! Driven adapters (GPIO, timers, state observers) implement these traits.
//! The [`RelayService`](super::service::RelayService) consumes them via
//! generics, so the relay core never touches hardware directly.

use embedded_hal::digital::PinState;

use crate::config::PinId;
use crate::relay::RelayId;
use crate::timer::{Task, TaskToken};

// ───────────────────────────────────────────────────────────────
// GPIO port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port for digital outputs.
///
/// Writes are synchronous and, from the domain's point of view, always
/// succeed. Adapters over fallible pins report failures themselves.
pub trait GpioPort {
    /// Drive `pin` to `level`.
    fn write(&mut self, pin: PinId, level: PinState);
}

// ───────────────────────────────────────────────────────────────
// Timer port (driven adapter: domain ↔ task service)
// ───────────────────────────────────────────────────────────────

/// One-shot task scheduling on a single millisecond clock.
///
/// When a task expires the platform hands a [`Fired`](crate::timer::Fired)
/// back to [`RelayService::handle_fired`](super::service::RelayService::handle_fired).
pub trait TimerService {
    /// Arrange for `task` to fire once after `delay_ms`.
    ///
    /// Every call mints a fresh token; the caller owns it until it either
    /// fires or is handed back to [`unschedule`](Self::unschedule).
    fn schedule(&mut self, task: Task, delay_ms: u32) -> TaskToken;

    /// Cancel a pending task. Once this returns the task never fires.
    /// No-op if it already fired.
    fn unschedule(&mut self, token: TaskToken);
}

// ───────────────────────────────────────────────────────────────
// State observer (driven adapter: domain → notifications)
// ───────────────────────────────────────────────────────────────

/// Notified synchronously after a relay's logical state was set.
///
/// The notification runs after the pins have been driven (or the pulse
/// requested), so observers always see the updated state.
pub trait RelayObserver {
    fn on_change(&mut self, relay: RelayId, on: bool);
}

impl<F> RelayObserver for F
where
    F: FnMut(RelayId, bool),
{
    fn on_change(&mut self, relay: RelayId, on: bool) {
        self(relay, on);
    }
}
