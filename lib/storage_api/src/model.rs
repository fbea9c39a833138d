use alloy::primitives::Bytes;
use mirror_replay_types::{EntityId, Timestamp};
use serde::{Deserialize, Serialize};

/// One raw file-content row as persisted from the record stream. The bytes
/// are the full file contents effective at `consensus_timestamp`; whether
/// they decode under the file's schema is the caller's problem.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContent {
    pub file: EntityId,
    pub bytes: Bytes,
    pub consensus_timestamp: Timestamp,
}

/// Association between an account and a token at a point in time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRelationship {
    pub account: EntityId,
    pub token: EntityId,
    pub balance: i64,
    pub associated: bool,
    pub frozen: bool,
}
