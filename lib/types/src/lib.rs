mod time;
pub use time::{Timestamp, TimestampRange};

mod entity;
pub use entity::{EntityId, EntityIdParseError, EntityIdentifier, EntityKind, EntityRecord};

mod block;
pub use block::{BlockReference, HistoricalReference, RecordFile};

mod call;
pub use call::{CallRequest, CallResult, ExecutionOutcome, HaltReason};
