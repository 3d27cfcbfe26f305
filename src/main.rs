//! Relay rail simulator.
//!
//! Replays a latching-relay contention scenario on the virtual clock and
//! logs every coil edge with its timestamp.
//!
//! ```bash
//! # Two relays requested 10 ms apart on a serialized rail
//! relay-sim
//!
//! # Same, with overlapping pulses allowed
//! relay-sim --simultaneous
//!
//! # Rail parameters from a JSON document
//! relay-sim --config rail.json --second-at 20 --until 2000
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use tracing_subscriber::EnvFilter;

use relay_pulse::adapters::log_sink::LogObserver;
use relay_pulse::adapters::sim_gpio::SimGpio;
use relay_pulse::timer::SimTimer;
use relay_pulse::{RailConfig, RelayConfig, RelayService};

/// Latching relay rail simulator
#[derive(Parser, Debug)]
#[command(name = "relay-sim")]
#[command(version, about, long_about = None)]
struct Args {
    /// JSON rail configuration; flags below override its fields
    #[arg(short = 'c', long)]
    config: Option<std::path::PathBuf>,

    /// Allow latching pulses to overlap
    #[arg(long)]
    simultaneous: bool,

    /// Pulse duration in milliseconds
    #[arg(long)]
    pulse_ms: Option<u32>,

    /// Retry backoff while the rail is busy, in milliseconds
    #[arg(long)]
    retry_ms: Option<u32>,

    /// Minimum spacing between pulse starts, in milliseconds
    #[arg(long)]
    spacing_ms: Option<u32>,

    /// Time at which the second relay is switched on
    #[arg(long, default_value = "10")]
    second_at: u64,

    /// Time at which the first relay is switched back off
    #[arg(long)]
    first_off_at: Option<u64>,

    /// Simulation end time in milliseconds
    #[arg(short = 'u', long, default_value = "1000")]
    until: u64,
}

fn load_config(args: &Args) -> Result<RailConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            RailConfig::from_json(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => RailConfig::default(),
    };
    config.simultaneous_pulses |= args.simultaneous;
    if let Some(ms) = args.pulse_ms {
        config.timing.pulse_ms = ms;
    }
    if let Some(ms) = args.retry_ms {
        config.timing.retry_ms = ms;
    }
    if let Some(ms) = args.spacing_ms {
        config.timing.min_spacing_ms = ms;
    }
    config.validate()?;
    Ok(config)
}

/// Advance to `t_ms`, stopping at every task expiry so log lines carry the
/// time of the edge.
fn run_until(svc: &mut RelayService<SimGpio, SimTimer>, t_ms: u64) {
    while let Some(due) = svc.timer().next_due().filter(|due| *due <= t_ms) {
        svc.gpio_mut().set_label(&format!("t={due:>5}ms"));
        svc.advance_to(due);
    }
    svc.advance_to(t_ms);
    svc.gpio_mut().set_label(&format!("t={t_ms:>5}ms"));
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    info!("rail: {:?}", config);

    let mut svc = RelayService::new(&config, SimGpio::new(), SimTimer::new())?;
    let first = svc.add(RelayConfig::latching(1, 2, true))?;
    let second = svc.add(RelayConfig::latching(3, 4, true))?;
    svc.set_observer(first, LogObserver::new("first"))?;
    svc.set_observer(second, LogObserver::new("second"))?;
    svc.gpio_mut().set_label("t=    0ms");
    svc.init_all();

    svc.on(first);

    run_until(&mut svc, args.second_at);
    svc.on(second);

    if let Some(off_at) = args.first_off_at {
        run_until(&mut svc, off_at);
        svc.off(first);
    }

    run_until(&mut svc, args.until);

    let stats = svc.scheduler().stats();
    info!("stats: {}", serde_json::to_string(&stats)?);
    Ok(())
}
