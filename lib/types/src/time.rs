use serde::{Deserialize, Serialize};
use std::fmt;

const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Consensus timestamp: nanoseconds since the Unix epoch, as assigned by the
/// originating ledger. Strictly ordered, so plain integer comparison is the
/// point-in-time comparison.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub const MIN: Timestamp = Timestamp(i64::MIN);
    pub const MAX: Timestamp = Timestamp(i64::MAX);

    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    pub const fn from_seconds_nanos(seconds: i64, nanos: u32) -> Self {
        Self(seconds * NANOS_PER_SECOND + nanos as i64)
    }

    pub const fn as_nanos(self) -> i64 {
        self.0
    }

    /// The latest timestamp strictly before `self`. Used when walking history
    /// backwards one snapshot at a time.
    pub const fn pred(self) -> Self {
        Self(self.0.saturating_sub(1))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let seconds = self.0.div_euclid(NANOS_PER_SECOND);
        let nanos = self.0.rem_euclid(NANOS_PER_SECOND);
        write!(f, "{seconds}.{nanos:09}")
    }
}

/// Half-open consensus time range `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimestampRange {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl TimestampRange {
    pub const fn new(start: Timestamp, end: Timestamp) -> Self {
        Self { start, end }
    }

    /// Range with no upper bound, i.e. a projection that is still current.
    pub const fn open_ended(start: Timestamp) -> Self {
        Self {
            start,
            end: Timestamp::MAX,
        }
    }

    pub fn contains(&self, timestamp: Timestamp) -> bool {
        self.start <= timestamp && timestamp < self.end
    }

    /// The latest instant inside the range; "as of" reads scoped to this
    /// range are performed at this timestamp.
    pub const fn as_of(&self) -> Timestamp {
        Timestamp::from_nanos(self.end.as_nanos().saturating_sub(1))
    }
}

impl fmt::Display for TimestampRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_as_seconds_dot_nanos() {
        let ts = Timestamp::from_seconds_nanos(1_700_000_000, 42);
        assert_eq!(ts.to_string(), "1700000000.000000042");
    }

    #[test]
    fn range_is_half_open() {
        let range = TimestampRange::new(Timestamp::from_nanos(100), Timestamp::from_nanos(200));
        assert!(range.contains(Timestamp::from_nanos(100)));
        assert!(range.contains(Timestamp::from_nanos(199)));
        assert!(!range.contains(Timestamp::from_nanos(200)));
        assert_eq!(range.as_of(), Timestamp::from_nanos(199));
    }
}
