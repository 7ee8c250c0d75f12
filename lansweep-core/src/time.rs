use logos::{Lexer, Logos};
use std::{fmt, ops::Add, str::FromStr, time::Duration};

/// An instant on the simulated clock, at microsecond resolution.
///
/// The simulation engine owns and advances the clock; this crate only
/// ever receives `SimTime` values alongside trace events and takes
/// differences between them. The microsecond truncation matches the
/// resolution of the echo-delay statistic.
///
/// ```
/// # use lansweep_core::SimTime;
/// # use std::time::Duration;
/// let request = SimTime::from_micros(10);
/// let response = SimTime::from_micros(110);
///
/// assert_eq!(
///     response.duration_since(request),
///     Duration::from_micros(100),
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SimTime(u64);

impl SimTime {
    /// the start of simulated time.
    pub const ZERO: Self = Self(0);

    #[inline(always)]
    pub const fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    #[inline(always)]
    pub const fn as_micros(self) -> u64 {
        self.0
    }

    /// elapsed simulated time since `earlier`.
    ///
    /// Saturates to zero if `earlier` is in the future. Events are
    /// delivered in non-decreasing simulated-time order, so a genuine
    /// negative difference cannot occur within one run.
    #[inline]
    pub fn duration_since(self, earlier: Self) -> Duration {
        Duration::from_micros(self.0.saturating_sub(earlier.0))
    }
}

impl Add<Duration> for SimTime {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self {
        Self(self.0 + rhs.as_micros() as u64)
    }
}

impl From<Duration> for SimTime {
    /// interpret a [`Duration`] as an offset from [`SimTime::ZERO`],
    /// truncated to microseconds.
    fn from(value: Duration) -> Self {
        Self(value.as_micros() as u64)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        <Duration as fmt::Debug>::fmt(&Duration::from_micros(self.0), f)
    }
}

/// Error returned when parsing a human-readable duration string.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DurationParseError {
    #[error("unexpected token in duration string: {0:?}")]
    UnexpectedToken(String),
    #[error("expected duration to start with a number: {0:?}")]
    ExpectedNumber(String),
    #[error("expected a unit after the number: {0:?}")]
    ExpectedUnit(String),
    #[error("duration value out of range: {0:?}")]
    OutOfRange(String),
}

/// Parse a human-readable duration such as `"150ms"` or `"1s 500ms"`.
///
/// Accepted units are `ns`, `us`/`μs`, `ms`, `s` and `m` (minutes).
/// Several number/unit groups may be concatenated; they are summed.
///
/// ```
/// # use lansweep_core::time::parse_duration;
/// # use std::time::Duration;
/// assert_eq!(parse_duration("250us").unwrap(), Duration::from_micros(250));
/// assert_eq!(parse_duration("1s 500ms").unwrap(), Duration::from_millis(1_500));
/// ```
pub fn parse_duration(s: &str) -> Result<Duration, DurationParseError> {
    let mut lex = Lexer::new(s);

    let mut total = Duration::ZERO;
    let mut groups = 0_usize;

    while let Some(next) = lex.next() {
        let token: Token = next.map_err(|()| DurationParseError::UnexpectedToken(s.to_owned()))?;

        if token != Token::Value {
            return Err(DurationParseError::ExpectedNumber(s.to_owned()));
        }
        let number: u64 = lex
            .slice()
            .parse()
            .map_err(|_| DurationParseError::OutOfRange(s.to_owned()))?;

        let Some(Ok(unit)) = lex.next() else {
            return Err(DurationParseError::ExpectedUnit(s.to_owned()));
        };
        let duration = match unit {
            Token::NanoSeconds => Duration::from_nanos(number),
            Token::MicroSeconds => Duration::from_micros(number),
            Token::MilliSeconds => Duration::from_millis(number),
            Token::Seconds => Duration::from_secs(number),
            Token::Minutes => Duration::from_secs(number * 60),
            Token::Value => return Err(DurationParseError::ExpectedUnit(s.to_owned())),
        };
        total += duration;
        groups += 1;
    }

    if groups == 0 {
        return Err(DurationParseError::ExpectedNumber(s.to_owned()));
    }

    Ok(total)
}

/// Wrapper so duration flags can be parsed straight from a CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HumanDuration(pub Duration);

impl FromStr for HumanDuration {
    type Err = DurationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_duration(s).map(Self)
    }
}

impl fmt::Display for HumanDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        <Duration as fmt::Debug>::fmt(&self.0, f)
    }
}

#[derive(Logos, Debug, PartialEq)]
#[logos(skip r"[ \t\n\f]+")] // Ignore this regex pattern between tokens
enum Token {
    #[token("ns")]
    NanoSeconds,
    #[regex("us|μs")]
    MicroSeconds,
    #[token("ms")]
    MilliSeconds,
    #[token("s")]
    Seconds,
    #[token("m")]
    Minutes,

    #[regex("[0-9]+")]
    Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logos_lexer() {
        let mut lex = Token::lexer("1ns");

        assert_eq!(lex.next(), Some(Ok(Token::Value)));
        assert_eq!(lex.slice(), "1");

        assert_eq!(lex.next(), Some(Ok(Token::NanoSeconds)));
        assert_eq!(lex.slice(), "ns");
    }

    #[test]
    fn parse() {
        assert_eq!(parse_duration("123ms").unwrap().as_millis(), 123);
        assert_eq!(parse_duration("1s 2000ms 3000000us").unwrap().as_secs(), 6);
        assert_eq!(parse_duration("2m").unwrap().as_secs(), 120);
    }

    #[test]
    fn parse_invalid() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("150").is_err());
        assert!(parse_duration("ms").is_err());
        assert!(parse_duration("abc").is_err());
    }

    #[test]
    fn sim_time_difference() {
        let a = SimTime::from_micros(250);
        let b = SimTime::from_micros(1_000);

        assert_eq!(b.duration_since(a), Duration::from_micros(750));
        // saturating: never negative
        assert_eq!(a.duration_since(b), Duration::ZERO);
    }

    #[test]
    fn sim_time_add_duration() {
        let t = SimTime::ZERO + Duration::from_millis(3);
        assert_eq!(t.as_micros(), 3_000);
    }

    #[test]
    fn sim_time_display() {
        assert_eq!(SimTime::from_micros(1_500).to_string(), "1.5ms");
    }

    #[test]
    fn human_duration_from_str() {
        let HumanDuration(d) = "250us".parse().unwrap();
        assert_eq!(d, Duration::from_micros(250));
    }
}
