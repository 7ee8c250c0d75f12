//! Retry-limit sweep over a synthetic shared-medium model.
//!
//! The real experiment drives the observers from a discrete-event
//! simulation engine. This example stands a small stochastic model in
//! for the engine — per-packet collision draws, a fixed round-trip
//! time, a retry limit — purely to exercise the full pipeline: trace
//! events in, per-device statistics, range aggregation, parallel
//! repetitions, confidence intervals, plot-ready columns out.
//!
//! ```text
//! cargo run --example retry_sweep -- --devices 8 --repetitions 15
//! ```

use anyhow::Result;
use clap::Parser;
use indicatif::ProgressBar;
use lansweep::{
    ExperimentRunner, FrameRef, LinkEvent, RepetitionOutcome, SimTime, SweepConfig,
    TopologyObserver, defaults,
};
use lansweep_core::time::HumanDuration;
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of devices (device 0 is the baseline node, the last
    /// device the echo responder)
    #[arg(long, default_value_t = defaults::DEFAULT_TOPOLOGY_SIZE)]
    devices: usize,

    /// Echo requests each client sends per repetition
    #[arg(long, default_value_t = 50)]
    packets: usize,

    /// Interval between consecutive echo requests
    #[arg(long, default_value = "100ms")]
    interval: HumanDuration,

    /// Round-trip time of a successful echo
    #[arg(long, default_value = "2ms")]
    rtt: HumanDuration,

    /// Probability that one transmission attempt collides
    #[arg(long, default_value_t = 0.3)]
    collision_probability: f64,

    /// First retry-limit value of the sweep
    #[arg(long, default_value_t = defaults::DEFAULT_SWEEP_START)]
    start: u32,

    /// Sweep step
    #[arg(long, default_value_t = defaults::DEFAULT_SWEEP_STEP)]
    step: u32,

    /// Last retry-limit value of the sweep
    #[arg(long, default_value_t = defaults::DEFAULT_SWEEP_END)]
    end: u32,

    /// Randomized repetitions per sweep point
    #[arg(long, default_value_t = defaults::DEFAULT_REPETITIONS)]
    repetitions: usize,

    /// Maximum repetition workers running at once
    #[arg(long, default_value_t = defaults::DEFAULT_MAX_WORKERS)]
    workers: usize,

    /// Master seed for the sweep
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

/// smallest UDP-over-IPv4 frame the observers' gate accepts
fn udp_frame() -> Vec<u8> {
    let mut bytes = vec![0u8; 34];
    bytes[12..14].copy_from_slice(&0x0800u16.to_be_bytes());
    bytes[14] = 0x45; // version 4, IHL 5
    bytes[14 + 9] = 17; // UDP
    bytes
}

/// one randomized repetition of the synthetic model.
fn repetition(args: &Args, retry_limit: u32, seed: u64) -> RepetitionOutcome {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut observer = TopologyObserver::new(args.devices);
    let bytes = udp_frame();

    let mut packet_id = 0_u64;

    for device in defaults::FIRST_CLIENT..args.devices - 1 {
        let mut now = SimTime::ZERO;

        for _ in 0..args.packets {
            packet_id += 1;
            let frame = FrameRef::new(packet_id, &bytes);

            observer
                .observe(device, LinkEvent::FrameFromNetworkLayer(frame, now))
                .expect("client device is in range");

            // each attempt collides independently; the retry limit
            // bounds how often the device backs off before giving up
            let mut delivered = false;
            for _attempt in 0..=retry_limit {
                if rng.gen_bool(args.collision_probability) {
                    observer
                        .observe(device, LinkEvent::BackoffRetry(frame))
                        .expect("client device is in range");
                } else {
                    delivered = true;
                    break;
                }
            }

            if delivered {
                observer
                    .observe(device, LinkEvent::TransmitComplete(frame))
                    .expect("client device is in range");
                let response_at = now + args.rtt.0;
                observer
                    .observe(device, LinkEvent::FrameToNetworkLayer(frame, response_at))
                    .expect("client device is in range");
            } else {
                observer
                    .observe(device, LinkEvent::TransmitDropped(frame))
                    .expect("client device is in range");
            }

            now = now + args.interval.0;
        }
    }

    RepetitionOutcome::from_observer(&observer, defaults::FIRST_CLIENT, args.devices - 2)
        .expect("client range is valid for the configured topology")
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    anyhow::ensure!(
        args.devices >= 3,
        "need at least 3 devices: a baseline node, one client and the responder"
    );
    anyhow::ensure!(
        (0.0..=1.0).contains(&args.collision_probability),
        "collision probability must be in [0.0, 1.0]"
    );

    let config = SweepConfig {
        start: args.start,
        step: args.step,
        end: args.end,
        repetitions: args.repetitions,
        max_workers: args.workers,
        worker_timeout: Duration::from_secs(60),
        seed: args.seed,
    };

    let total = config.retry_limits().count() * config.repetitions;
    let progress = ProgressBar::new(total as u64);

    let runner = {
        let args = args.clone();
        let progress = progress.clone();
        ExperimentRunner::new(config, move |retry_limit, seed| {
            let outcome = repetition(&args, retry_limit, seed);
            progress.inc(1);
            outcome
        })?
    };

    let report = runner.run()?;
    progress.finish_and_clear();

    print!("{report}");
    Ok(())
}
