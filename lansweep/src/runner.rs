use crate::{
    report::{SweepPoint, SweepReport},
    student_t,
};
use lansweep_core::{RangeError, RunningAverage, TopologyObserver, defaults};
use log::{debug, warn};
use rand_chacha::ChaChaRng;
use rand_core::{Rng as _, SeedableRng as _};
use std::{
    sync::{Arc, mpsc},
    thread,
    time::Duration,
};

/// The fixed-size record one simulation repetition produces.
///
/// The echo delay is carried as a plain `f64` microsecond count so the
/// cross-repetition statistics treat all three metrics uniformly; a
/// repetition in which no echo completed contributes NaN, which
/// (deliberately) degrades that sweep point's mean rather than aborting
/// the sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepetitionOutcome {
    pub mean_attempts: f64,
    pub mean_echo_delay_us: f64,
    pub percent_success: f64,
}

impl RepetitionOutcome {
    /// extract the three headline metrics from a finished run's
    /// observer, over the client device range `from..=to`.
    ///
    /// By convention that range excludes device 0 (the baseline node)
    /// and the responder; see [`defaults::FIRST_CLIENT`].
    pub fn from_observer(
        observer: &TopologyObserver,
        from: usize,
        to: usize,
    ) -> Result<Self, RangeError> {
        let mean_attempts = observer.mean_attempts_over(from, to)?;
        let mean_echo_delay_us = observer
            .mean_echo_delay_over(from, to)?
            .map(|delay| delay.as_micros() as f64)
            .unwrap_or(f64::NAN);
        let percent_success = 100.0 - observer.percent_dropped_over(from, to)?;

        Ok(Self {
            mean_attempts,
            mean_echo_delay_us,
            percent_success,
        })
    }
}

/// Configuration of a retry-limit sweep.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// first retry-limit value of the sweep (inclusive)
    pub start: u32,
    /// sweep step, at least 1
    pub step: u32,
    /// last retry-limit value of the sweep (inclusive)
    pub end: u32,
    /// randomized repetitions per sweep point, at least 2
    pub repetitions: usize,
    /// maximum repetition workers running at once, at least 1
    pub max_workers: usize,
    /// how long the coordinator waits for one repetition result before
    /// marking the repetition as failed
    pub worker_timeout: Duration,
    /// master seed; every repetition derives its own independent seed
    /// from it
    pub seed: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            start: defaults::DEFAULT_SWEEP_START,
            step: defaults::DEFAULT_SWEEP_STEP,
            end: defaults::DEFAULT_SWEEP_END,
            repetitions: defaults::DEFAULT_REPETITIONS,
            max_workers: defaults::DEFAULT_MAX_WORKERS,
            worker_timeout: defaults::DEFAULT_WORKER_TIMEOUT,
            seed: 0,
        }
    }
}

impl SweepConfig {
    /// the retry-limit values this sweep visits, in order.
    pub fn retry_limits(&self) -> impl Iterator<Item = u32> + use<> {
        (self.start..=self.end).step_by(self.step.max(1) as usize)
    }

    fn validate(&self) -> Result<(), RunnerError> {
        if self.step == 0 {
            return Err(RunnerError::ZeroStep);
        }
        if self.start > self.end {
            return Err(RunnerError::EmptySweep {
                start: self.start,
                end: self.end,
            });
        }
        if self.repetitions < 2 {
            return Err(RunnerError::TooFewRepetitions(self.repetitions));
        }
        if self.max_workers == 0 {
            return Err(RunnerError::NoWorkers);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RunnerError {
    #[error("sweep step must be at least 1")]
    ZeroStep,
    #[error("sweep range {start}..={end} is empty")]
    EmptySweep { start: u32, end: u32 },
    #[error("at least 2 repetitions are needed for a confidence interval, got {0}")]
    TooFewRepetitions(usize),
    #[error("at least one worker is needed")]
    NoWorkers,
    #[error(
        "retry limit {retry_limit}: only {collected} of {launched} repetitions \
         reported a result, cannot estimate a confidence interval"
    )]
    TooFewResults {
        retry_limit: u32,
        collected: usize,
        launched: usize,
    },
}

/// The outer Monte-Carlo sweep.
///
/// For every retry-limit value the runner launches the configured
/// number of independent repetitions, fanned out over at most
/// `max_workers` worker threads. The repetition itself — building a
/// topology with the retry limit applied, running the simulation to its
/// stopping time and reading the observer — belongs to the caller:
/// any `Fn(retry_limit, seed) -> RepetitionOutcome` will do, which
/// keeps the simulation engine and this crate decoupled.
///
/// Workers hand their one result record back over a channel; no state
/// is shared between repetitions. The coordinator waits for every
/// launched worker of a wave (bounded by `worker_timeout` per result)
/// before folding the wave into the cross-repetition statistics, so a
/// crashed or hung repetition costs one sample, never the whole sweep.
pub struct ExperimentRunner<F> {
    config: SweepConfig,
    repetition: Arc<F>,
}

impl<F> ExperimentRunner<F>
where
    F: Fn(u32, u64) -> RepetitionOutcome + Send + Sync + 'static,
{
    pub fn new(config: SweepConfig, repetition: F) -> Result<Self, RunnerError> {
        config.validate()?;
        Ok(Self {
            config,
            repetition: Arc::new(repetition),
        })
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// run the whole sweep and collect the three metric series.
    pub fn run(&self) -> Result<SweepReport, RunnerError> {
        let points = self.config.retry_limits().count();
        let mut report = SweepReport::with_capacity(points);

        let mut master_rng = ChaChaRng::seed_from_u64(self.config.seed);

        // cross-repetition accumulators, reset between sweep points
        let mut attempts_acc = RunningAverage::<f64>::new();
        let mut echo_acc = RunningAverage::<f64>::new();
        let mut success_acc = RunningAverage::<f64>::new();

        for retry_limit in self.config.retry_limits() {
            attempts_acc.reset();
            echo_acc.reset();
            success_acc.reset();

            let outcomes = self.run_point(retry_limit, &mut master_rng)?;
            for outcome in &outcomes {
                attempts_acc.update(outcome.mean_attempts);
                echo_acc.update(outcome.mean_echo_delay_us);
                success_acc.update(outcome.percent_success);
            }

            let n = outcomes.len();
            let point = |acc: &RunningAverage<f64>| SweepPoint {
                retry_limit,
                mean: acc.mean(),
                half_width: student_t::half_width(acc.sample_variance(), n),
            };
            report.attempts.points.push(point(&attempts_acc));
            report.echo_delay.points.push(point(&echo_acc));
            report.success.points.push(point(&success_acc));

            debug!(
                "retry limit {retry_limit}: {n} repetitions, \
                 mean attempts {:.3}, mean echo {:.1}us, success {:.2}%",
                attempts_acc.mean(),
                echo_acc.mean(),
                success_acc.mean(),
            );
        }

        Ok(report)
    }

    /// run all repetitions for one retry-limit value, in waves of at
    /// most `max_workers` threads.
    fn run_point(
        &self,
        retry_limit: u32,
        master_rng: &mut ChaChaRng,
    ) -> Result<Vec<RepetitionOutcome>, RunnerError> {
        let repetitions = self.config.repetitions;

        // seeds are drawn up front so the sequence only depends on the
        // master seed, not on worker scheduling
        let seeds: Vec<u64> = (0..repetitions).map(|_| master_rng.next_u64()).collect();

        let mut collected = Vec::with_capacity(repetitions);

        for wave in seeds.chunks(self.config.max_workers) {
            let (sender, receiver) = mpsc::channel();

            for &seed in wave {
                let sender = sender.clone();
                let repetition = Arc::clone(&self.repetition);
                thread::spawn(move || {
                    let outcome = repetition(retry_limit, seed);
                    // the coordinator may have timed us out already
                    let _ = sender.send(outcome);
                });
            }
            drop(sender);

            let mut outstanding = wave.len();
            while outstanding > 0 {
                match receiver.recv_timeout(self.config.worker_timeout) {
                    Ok(outcome) => {
                        collected.push(outcome);
                        outstanding -= 1;
                    }
                    Err(mpsc::RecvTimeoutError::Timeout) => {
                        warn!(
                            "retry limit {retry_limit}: a repetition did not report \
                             within {:?}, marking it failed",
                            self.config.worker_timeout
                        );
                        outstanding -= 1;
                    }
                    Err(mpsc::RecvTimeoutError::Disconnected) => {
                        // remaining workers panicked without sending
                        warn!(
                            "retry limit {retry_limit}: {outstanding} repetition(s) \
                             ended without a result"
                        );
                        break;
                    }
                }
            }
        }

        if collected.len() < 2 {
            return Err(RunnerError::TooFewResults {
                retry_limit,
                collected: collected.len(),
                launched: repetitions,
            });
        }
        if collected.len() < repetitions {
            warn!(
                "retry limit {retry_limit}: statistics computed over {} of {} repetitions",
                collected.len(),
                repetitions
            );
        }

        Ok(collected)
    }
}
