//! Application core — relay switching logic, zero I/O.
//!
//! All interaction with hardware and timers happens through the **port
//! traits** defined in [`ports`], keeping this layer fully testable without
//! real peripherals.

pub mod ports;
pub mod service;
pub mod shared;
