//! Integration tests: RelayService state machine → GPIO.

use crate::mock_hw::{add_latching, bench, timing};
use embedded_hal::digital::PinState;
use relay_pulse::config::{PulseTiming, RelayConfig};
use relay_pulse::{RelayId, RelayState};
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn normal_relay_follows_polarity() {
    let mut b = bench(false, PulseTiming::default());
    let high = b.add(RelayConfig::normal(10, true)).unwrap();
    let low = b.add(RelayConfig::normal(11, false)).unwrap();
    b.init_all();

    b.on(high);
    b.on(low);
    assert_eq!(b.gpio().level(10), Some(PinState::High));
    assert_eq!(b.gpio().level(11), Some(PinState::Low));

    b.off(high);
    b.off(low);
    assert_eq!(b.gpio().level(10), Some(PinState::Low));
    assert_eq!(b.gpio().level(11), Some(PinState::High));
}

#[test]
fn normal_relay_never_schedules() {
    let mut b = bench(false, PulseTiming::default());
    let id = b.add(RelayConfig::normal(10, true)).unwrap();
    b.init(id);

    b.on(id);
    b.toggle(id);
    b.toggle(id);

    assert_eq!(b.timer().pending(), 0);
    assert_eq!(b.scheduler().owner(), None);
    assert_eq!(b.is_on(id), Some(true));
}

#[test]
fn normal_relay_does_not_touch_off_pin() {
    let mut b = bench(false, PulseTiming::default());
    let id = b
        .add(RelayConfig {
            pin: 10,
            off_pin: 11,
            on_high: true,
            latching: false,
        })
        .unwrap();
    b.init(id);
    b.on(id);
    b.off(id);

    assert_eq!(b.gpio().level(11), None);
}

#[test]
fn toggle_flips_logical_state() {
    let mut b = bench(false, PulseTiming::default());
    let id = add_latching(&mut b, 1, 2);

    assert_eq!(b.relay(id).unwrap().state(), RelayState::Off);
    b.toggle(id);
    assert_eq!(b.relay(id).unwrap().state(), RelayState::On);
    b.toggle(id);
    assert_eq!(b.relay(id).unwrap().state(), RelayState::Off);
}

#[test]
fn logical_state_is_immediate_while_deferred() {
    let mut b = bench(false, PulseTiming::default());
    let r1 = add_latching(&mut b, 1, 2);
    let r2 = add_latching(&mut b, 3, 4);

    b.on(r1);
    b.on(r2);

    assert_eq!(b.is_on(r2), Some(true));
    assert!(!b.gpio().is_high(3));
}

#[test]
fn observer_runs_after_pin_is_driven() {
    let mut b = bench(false, PulseTiming::default());
    let id = b.add(RelayConfig::normal(10, true)).unwrap();
    b.init(id);
    let calls: Rc<RefCell<Vec<(RelayId, bool)>>> = Rc::default();
    let sink = Rc::clone(&calls);
    b.set_observer(id, move |r: RelayId, on: bool| sink.borrow_mut().push((r, on)))
        .unwrap();

    b.on(id);
    b.off(id);
    b.off(id);

    assert_eq!(*calls.borrow(), vec![(id, true), (id, false), (id, false)]);
}

#[test]
fn latching_observer_fires_even_when_deferred() {
    let mut b = bench(false, PulseTiming::default());
    let r1 = add_latching(&mut b, 1, 2);
    let r2 = add_latching(&mut b, 3, 4);
    let calls: Rc<RefCell<Vec<bool>>> = Rc::default();
    let sink = Rc::clone(&calls);
    b.set_observer(r2, move |_: RelayId, on: bool| sink.borrow_mut().push(on))
        .unwrap();

    b.on(r1);
    b.on(r2);

    assert_eq!(*calls.borrow(), vec![true]);
    assert!(b.has_pending_task(r2));
}

#[test]
fn active_low_latching_relay_pulses_low() {
    let mut b = bench(false, timing(50, 50, 500));
    let id = b.add(RelayConfig::latching(5, 6, false)).unwrap();
    b.init(id);
    assert_eq!(b.gpio().level(5), Some(PinState::High));
    assert_eq!(b.gpio().level(6), Some(PinState::High));

    b.on(id);
    assert_eq!(b.gpio().level(5), Some(PinState::Low));

    b.advance_to(50);
    assert_eq!(b.gpio().level(5), Some(PinState::High));
    assert_eq!(b.gpio().level(6), Some(PinState::High));
}
