//! Adapters — concrete implementations of the port traits.
//!
//! | Adapter     | Implements     | Connects to                   |
//! |-------------|----------------|-------------------------------|
//! | `gpio`      | GpioPort       | `embedded-hal` output pins    |
//! | `sim_gpio`  | GpioPort       | In-memory levels (simulation) |
//! | `log_sink`  | RelayObserver  | `log` output                  |
//!
//! The virtual-clock [`TimerService`](crate::app::ports::TimerService)
//! lives next to the task types in [`timer`](crate::timer).

pub mod gpio;
pub mod log_sink;
pub mod sim_gpio;
