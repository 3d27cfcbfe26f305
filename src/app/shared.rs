//! Shared access to a [`RelayService`] from preemptive contexts.
//!
//! On a platform where hardware timer callbacks can interrupt the main
//! loop, rail ownership and the spacing gate must not be mutated from two
//! places at once. [`SharedRelayService`] puts the whole service behind a
//! critical-section mutex; every operation, including timer dispatch, runs
//! with interrupts masked and to completion.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use crate::relay::RelayId;
use crate::timer::Fired;

use super::ports::{GpioPort, TimerService};
use super::service::RelayService;

pub struct SharedRelayService<G, T> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<RelayService<G, T>>>,
}

impl<G: GpioPort, T: TimerService> SharedRelayService<G, T> {
    pub const fn new(service: RelayService<G, T>) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(service)),
        }
    }

    /// Run `f` with exclusive access to the service.
    pub fn with<R>(&self, f: impl FnOnce(&mut RelayService<G, T>) -> R) -> R {
        self.inner.lock(|cell| f(&mut cell.borrow_mut()))
    }

    pub fn on(&self, id: RelayId) {
        self.with(|svc| svc.on(id));
    }

    pub fn off(&self, id: RelayId) {
        self.with(|svc| svc.off(id));
    }

    pub fn toggle(&self, id: RelayId) {
        self.with(|svc| svc.toggle(id));
    }

    pub fn is_on(&self, id: RelayId) -> Option<bool> {
        self.with(|svc| svc.is_on(id))
    }

    /// Entry point for the platform's timer callback.
    pub fn handle_fired(&self, fired: Fired) {
        self.with(|svc| svc.handle_fired(fired));
    }

    pub fn into_inner(self) -> RelayService<G, T> {
        self.inner.into_inner().into_inner()
    }
}
