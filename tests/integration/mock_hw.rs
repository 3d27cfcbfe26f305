//! Mock hardware adapter for integration tests.
//!
//! Records every pin write so tests can assert on the full history and on
//! how many coils were ever energized at the same time, without touching
//! real GPIO registers.

use embedded_hal::digital::PinState;
use relay_pulse::GpioPort;
use relay_pulse::config::{PulseTiming, RailConfig, RelayConfig};
use relay_pulse::timer::SimTimer;
use relay_pulse::{RelayId, RelayService};
use std::collections::HashMap;

// ── MockGpio ──────────────────────────────────────────────────

#[derive(Default)]
pub struct MockGpio {
    levels: HashMap<u8, PinState>,
    pub writes: Vec<(u8, PinState)>,
    /// Highest number of pins that were high at the same moment.
    pub max_high: usize,
}

#[allow(dead_code)]
impl MockGpio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self, pin: u8) -> Option<PinState> {
        self.levels.get(&pin).copied()
    }

    pub fn is_high(&self, pin: u8) -> bool {
        self.level(pin) == Some(PinState::High)
    }

    pub fn high_count(&self) -> usize {
        self.levels.values().filter(|l| **l == PinState::High).count()
    }

    /// Last pin among `pins` that was driven high.
    pub fn last_energized(&self, pins: &[u8]) -> Option<u8> {
        self.writes
            .iter()
            .rev()
            .find(|(p, l)| *l == PinState::High && pins.contains(p))
            .map(|(p, _)| *p)
    }

    pub fn times_energized(&self, pin: u8) -> usize {
        self.writes
            .iter()
            .filter(|(p, l)| *p == pin && *l == PinState::High)
            .count()
    }
}

impl GpioPort for MockGpio {
    fn write(&mut self, pin: u8, level: PinState) {
        self.levels.insert(pin, level);
        self.writes.push((pin, level));
        self.max_high = self.max_high.max(self.high_count());
    }
}

// ── Fixtures ──────────────────────────────────────────────────

pub type Bench = RelayService<MockGpio, SimTimer>;

pub fn timing(pulse_ms: u32, retry_ms: u32, min_spacing_ms: u32) -> PulseTiming {
    PulseTiming {
        pulse_ms,
        retry_ms,
        min_spacing_ms,
    }
}

pub fn bench(simultaneous_pulses: bool, timing: PulseTiming) -> Bench {
    let config = RailConfig {
        simultaneous_pulses,
        timing,
    };
    RelayService::new(&config, MockGpio::new(), SimTimer::new()).expect("valid rail config")
}

/// Add an active-high latching relay on `set`/`reset` and initialise it.
pub fn add_latching(bench: &mut Bench, set: u8, reset: u8) -> RelayId {
    let id = bench
        .add(RelayConfig::latching(set, reset, true))
        .expect("bank has room");
    bench.init(id);
    id
}
