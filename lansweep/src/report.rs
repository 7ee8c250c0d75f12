//! Plot-ready sweep results.
//!
//! The sweep produces, for each of the three headline metrics, an
//! ordered sequence of `(retry limit, mean, confidence half-width)`
//! triples. Rendering the plots themselves is left to an external
//! collaborator; the [`Display`] impl emits the whitespace-separated
//! columns such tools consume.
//!
//! [`Display`]: std::fmt::Display

use std::fmt;

/// The three headline metrics of the experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    /// mean transmission attempts per successfully sent packet
    Attempts,
    /// mean echo round-trip time, in microseconds
    EchoDelayMicros,
    /// percentage of packets successfully delivered (100 − dropped)
    SuccessPercent,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Attempts => write!(f, "attempts"),
            Metric::EchoDelayMicros => write!(f, "echo_delay_us"),
            Metric::SuccessPercent => write!(f, "success_pct"),
        }
    }
}

/// One point of a sweep: the retry limit, the cross-repetition sample
/// mean, and the 95% confidence half-width around it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepPoint {
    pub retry_limit: u32,
    pub mean: f64,
    pub half_width: f64,
}

/// The ordered sequence of sweep points for one metric.
#[derive(Debug, Clone)]
pub struct MetricSeries {
    pub metric: Metric,
    pub points: Vec<SweepPoint>,
}

impl fmt::Display for MetricSeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# {} : retry_limit mean half_width", self.metric)?;
        for point in &self.points {
            writeln!(
                f,
                "{} {:.6} {:.6}",
                point.retry_limit, point.mean, point.half_width
            )?;
        }
        Ok(())
    }
}

/// Full result of a retry-limit sweep: one series per metric.
#[derive(Debug, Clone)]
pub struct SweepReport {
    pub attempts: MetricSeries,
    pub echo_delay: MetricSeries,
    pub success: MetricSeries,
}

impl SweepReport {
    pub(crate) fn with_capacity(points: usize) -> Self {
        let series = |metric| MetricSeries {
            metric,
            points: Vec::with_capacity(points),
        };
        Self {
            attempts: series(Metric::Attempts),
            echo_delay: series(Metric::EchoDelayMicros),
            success: series(Metric::SuccessPercent),
        }
    }

    /// iterate over the three series in a fixed order.
    pub fn series(&self) -> impl Iterator<Item = &MetricSeries> {
        [&self.attempts, &self.echo_delay, &self.success].into_iter()
    }
}

impl fmt::Display for SweepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for series in self.series() {
            series.fmt(f)?;
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_display_is_column_data() {
        let series = MetricSeries {
            metric: Metric::Attempts,
            points: vec![
                SweepPoint {
                    retry_limit: 1,
                    mean: 1.5,
                    half_width: 0.25,
                },
                SweepPoint {
                    retry_limit: 2,
                    mean: 1.25,
                    half_width: 0.125,
                },
            ],
        };

        let rendered = series.to_string();
        let mut lines = rendered.lines();
        assert_eq!(
            lines.next(),
            Some("# attempts : retry_limit mean half_width")
        );
        assert_eq!(lines.next(), Some("1 1.500000 0.250000"));
        assert_eq!(lines.next(), Some("2 1.250000 0.125000"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn report_holds_one_series_per_metric() {
        let report = SweepReport::with_capacity(4);
        let metrics: Vec<Metric> = report.series().map(|s| s.metric).collect();
        assert_eq!(
            metrics,
            [Metric::Attempts, Metric::EchoDelayMicros, Metric::SuccessPercent]
        );
    }
}
