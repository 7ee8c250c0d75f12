/*!
# lansweep

Retry-limit sweep orchestration for shared-medium echo experiments.

Feed the per-device link-layer observers of [`lansweep_core`] from any
simulation engine, extract one [`RepetitionOutcome`] per randomized
run, and let the [`ExperimentRunner`] fan repetitions out over worker
threads, fold them into cross-repetition statistics and attach a
Student-t 95% confidence half-width to every sweep point. The result is
a [`SweepReport`]: three plot-ready `(retry limit, mean, half-width)`
series, one per headline metric.
*/

mod report;
mod runner;
pub mod student_t;

// convenient re-export of the `lansweep_core` observer surface
pub use lansweep_core::{
    DeviceObserver, EtherType, FrameRef, FrameView, IpProtocol, LinkEvent, RangeError,
    RunningAverage, SimTime, TopologyObserver, defaults,
};

pub use self::{
    report::{Metric, MetricSeries, SweepPoint, SweepReport},
    runner::{ExperimentRunner, RepetitionOutcome, RunnerError, SweepConfig},
};
