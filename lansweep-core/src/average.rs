use std::marker::PhantomData;

/// A numeric observation that can be folded into a [`RunningAverage`].
///
/// The accumulator works in `f64` internally; sample types only need a
/// widening conversion. The `i64`/`u64` conversions are lossy above
/// 2^53, far beyond anything a microsecond-resolution simulation
/// produces.
pub trait Sample: Copy {
    fn into_f64(self) -> f64;
}

macro_rules! impl_sample {
    ($($t:ty),* $(,)?) => {
        $(
            impl Sample for $t {
                #[inline]
                fn into_f64(self) -> f64 {
                    self as f64
                }
            }
        )*
    };
}

impl_sample!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

/// Incremental mean/variance accumulator for a stream of samples.
///
/// Uses Welford's online algorithm so that folding a sample is `O(1)` in
/// time and memory and remains numerically stable over arbitrarily long
/// runs (a naive sum/count pair loses precision and can overflow when a
/// simulation produces millions of samples).
///
/// The accumulator is deliberately forgiving about "no data": an empty
/// accumulator reports a [`NaN`] mean rather than panicking, because the
/// observers feed it opportunistically and a silent device is a normal
/// outcome of a short simulation run.
///
/// # Example
///
/// ```
/// # use lansweep_core::RunningAverage;
/// let mut avg = RunningAverage::<u32>::new();
///
/// avg.update(2);
/// avg.update(4);
///
/// assert_eq!(avg.count(), 2);
/// assert_eq!(avg.mean(), 3.0);
/// assert_eq!(avg.sample_variance(), 2.0);
/// ```
///
/// [`NaN`]: f64::NAN
#[derive(Debug, Clone)]
pub struct RunningAverage<T> {
    count: u64,
    mean: f64,
    /// running sum of squared deviations from the current mean
    m2: f64,
    marker: PhantomData<T>,
}

impl<T> Default for RunningAverage<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RunningAverage<T> {
    /// create an empty accumulator.
    pub const fn new() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
            marker: PhantomData,
        }
    }

    /// fold one observation into the accumulator.
    pub fn update(&mut self, sample: T)
    where
        T: Sample,
    {
        let sample = sample.into_f64();

        self.count += 1;
        let delta = sample - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = sample - self.mean;
        self.m2 += delta * delta2;
    }

    /// number of samples folded in since creation or the last [`reset`].
    ///
    /// [`reset`]: Self::reset
    #[inline]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// `true` if no sample has been folded in yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// the arithmetic mean of the samples seen so far.
    ///
    /// Returns [`f64::NAN`] when the accumulator is empty.
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            f64::NAN
        } else {
            self.mean
        }
    }

    /// the unbiased sample variance (`N - 1` denominator).
    ///
    /// Returns [`f64::NAN`] when fewer than two samples have been seen:
    /// the spread of a single observation is undefined.
    pub fn sample_variance(&self) -> f64 {
        if self.count < 2 {
            f64::NAN
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// the sample standard deviation, `sqrt(sample_variance)`.
    pub fn std_dev(&self) -> f64 {
        self.sample_variance().sqrt()
    }

    /// restore the empty state.
    ///
    /// Used between independent experiment repetitions, never mid-run.
    pub fn reset(&mut self) {
        self.count = 0;
        self.mean = 0.0;
        self.m2 = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_mean_is_nan() {
        let avg = RunningAverage::<u32>::new();
        assert_eq!(avg.count(), 0);
        assert!(avg.is_empty());
        assert!(avg.mean().is_nan());
    }

    #[test]
    fn single_sample() {
        let mut avg = RunningAverage::<u32>::new();
        avg.update(7);
        assert_eq!(avg.mean(), 7.0);
        // variance of one sample is undefined
        assert!(avg.sample_variance().is_nan());
    }

    #[test]
    fn mean_matches_arithmetic_mean() {
        let samples = [3_u32, 1, 4, 1, 5, 9, 2, 6, 5, 3];
        let mut avg = RunningAverage::<u32>::new();
        for s in samples {
            avg.update(s);
        }

        let expected = samples.iter().map(|s| *s as f64).sum::<f64>() / samples.len() as f64;
        assert!((avg.mean() - expected).abs() < 1e-12);
        assert_eq!(avg.count(), samples.len() as u64);
    }

    #[test]
    fn variance_matches_two_pass_formula() {
        let samples = [2.0_f64, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let mut avg = RunningAverage::<f64>::new();
        for s in samples {
            avg.update(s);
        }

        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        let expected = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>()
            / (samples.len() - 1) as f64;
        assert!((avg.sample_variance() - expected).abs() < 1e-12);
        assert!((avg.std_dev() - expected.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn reset_restores_empty_state() {
        let mut avg = RunningAverage::<i64>::new();
        avg.update(100);
        avg.update(-100);
        avg.reset();

        assert!(avg.is_empty());
        assert!(avg.mean().is_nan());

        avg.update(5);
        assert_eq!(avg.mean(), 5.0);
        assert_eq!(avg.count(), 1);
    }

    #[test]
    fn stable_for_large_offsets() {
        // samples with a large common offset defeat a naive sum-of-squares
        let mut avg = RunningAverage::<f64>::new();
        for s in [1e9 + 4.0, 1e9 + 7.0, 1e9 + 13.0, 1e9 + 16.0] {
            avg.update(s);
        }
        assert!((avg.mean() - (1e9 + 10.0)).abs() < 1e-3);
        assert!((avg.sample_variance() - 30.0).abs() < 1e-6);
    }

    #[test]
    fn idempotent_queries() {
        let mut avg = RunningAverage::<u32>::new();
        avg.update(2);
        avg.update(8);
        assert_eq!(avg.mean(), avg.mean());
        assert_eq!(avg.sample_variance(), avg.sample_variance());
        assert_eq!(avg.count(), avg.count());
    }
}
