use std::time::Duration;

/// Default number of devices in the experiment topology.
///
/// Device `0` is the control/baseline node, device
/// `DEFAULT_TOPOLOGY_SIZE - 1` the echo responder; everything in
/// between is a traffic-generating client.
pub const DEFAULT_TOPOLOGY_SIZE: usize = 12;

/// Default number of randomized repetitions per sweep point.
///
/// Ten is the minimum for a meaningful confidence interval; the
/// reference configuration runs fifteen.
pub const DEFAULT_REPETITIONS: usize = 15;

/// Default retry-limit sweep: `start..=end` advancing by `step`.
pub const DEFAULT_SWEEP_START: u32 = 1;
pub const DEFAULT_SWEEP_STEP: u32 = 1;
pub const DEFAULT_SWEEP_END: u32 = 10;

/// Default maximum number of repetition workers running at once.
pub const DEFAULT_MAX_WORKERS: usize = 4;

/// Default time the coordinator waits for a repetition result before
/// marking the repetition as failed.
pub const DEFAULT_WORKER_TIMEOUT: Duration = Duration::from_secs(60);

/// first client device index (device `0` is reserved as the baseline
/// node and excluded from the headline metrics).
pub const FIRST_CLIENT: usize = 1;
