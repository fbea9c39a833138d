use crate::{Timestamp, TimestampRange};
use alloy::primitives::B256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Caller-supplied block reference, resolved to a consensus time range by the
/// block resolver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockReference {
    Earliest,
    Latest,
    Number(u64),
}

impl fmt::Display for BlockReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Earliest => write!(f, "earliest"),
            Self::Latest => write!(f, "latest"),
            Self::Number(number) => write!(f, "{number}"),
        }
    }
}

/// Point in history a call is replayed against. Constructed once per request
/// and immutable afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoricalReference {
    /// No timestamp bound; state as currently persisted.
    Latest,
    Block(u64),
    /// Explicit consensus timestamp, used by debug-style calls.
    At(Timestamp),
}

impl Default for HistoricalReference {
    fn default() -> Self {
        Self::Latest
    }
}

/// Metadata of one record file: the unit history is indexed by. A record
/// file covers the half-open consensus range `[consensus_start,
/// consensus_end + 1)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFile {
    pub index: u64,
    pub consensus_start: Timestamp,
    pub consensus_end: Timestamp,
    pub hash: B256,
}

impl RecordFile {
    pub fn timestamp_range(&self) -> TimestampRange {
        TimestampRange::new(
            self.consensus_start,
            Timestamp::from_nanos(self.consensus_end.as_nanos().saturating_add(1)),
        )
    }
}
