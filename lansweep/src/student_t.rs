//! Student-t interval estimation for small repetition counts.

/// Two-sided 95% critical values of the Student-t distribution
/// (`t_{0.975, df}`), for `df` 1 through 30.
const T_975: [f64; 30] = [
    12.706, 4.303, 3.182, 2.776, 2.571, 2.447, 2.365, 2.306, 2.262, 2.228, //
    2.201, 2.179, 2.160, 2.145, 2.131, 2.120, 2.110, 2.101, 2.093, 2.086, //
    2.080, 2.074, 2.069, 2.064, 2.060, 2.056, 2.052, 2.048, 2.045, 2.042,
];

/// Critical value `t_{0.975, df}` for a two-sided 95% confidence
/// interval.
///
/// Exact table values up to 30 degrees of freedom, the usual
/// coarse-table steps at 40/60/120, and the asymptotic normal value
/// beyond. `df == 0` (fewer than two samples) yields NaN: no interval
/// exists.
pub fn t_critical_975(df: usize) -> f64 {
    match df {
        0 => f64::NAN,
        1..=30 => T_975[df - 1],
        31..=40 => 2.021,
        41..=60 => 2.000,
        61..=120 => 1.980,
        _ => 1.960,
    }
}

/// Half-width of the two-sided 95% confidence interval of a sample
/// mean: `t_{0.975, n-1} * sqrt(variance / n)`.
///
/// NaN when fewer than two samples were collected.
pub fn half_width(sample_variance: f64, n: usize) -> f64 {
    if n < 2 {
        return f64::NAN;
    }
    t_critical_975(n - 1) * (sample_variance / n as f64).sqrt()
}
