use mirror_replay_storage_api::{ReadRecordFiles, RepositoryError};
use mirror_replay_types::{BlockReference, TimestampRange};

/// Maps a block reference to the consensus time range of the matching record
/// file. The returned range is half-open and used verbatim by the entity
/// resolver and the system file loader.
#[derive(Clone, Debug)]
pub struct BlockResolver<R> {
    repository: R,
}

impl<R: ReadRecordFiles> BlockResolver<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    pub fn resolve(&self, reference: BlockReference) -> Result<TimestampRange, BlockError> {
        match reference {
            BlockReference::Earliest => self
                .repository
                .earliest()?
                .map(|record| record.timestamp_range())
                .ok_or(BlockError::Unknown(reference)),
            BlockReference::Latest => self
                .repository
                .latest()?
                .map(|record| record.timestamp_range())
                .ok_or(BlockError::Unknown(reference)),
            BlockReference::Number(index) => {
                let latest = self
                    .repository
                    .latest()?
                    .ok_or(BlockError::Unknown(reference))?;
                if index > latest.index {
                    return Err(BlockError::OutOfRange {
                        requested: index,
                        latest: latest.index,
                    });
                }
                if index == latest.index {
                    return Ok(latest.timestamp_range());
                }
                self.repository
                    .by_index(index)?
                    .map(|record| record.timestamp_range())
                    .ok_or(BlockError::Unknown(reference))
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BlockError {
    /// History is empty or the index cannot be matched to a record.
    #[error("block {0} not found")]
    Unknown(BlockReference),
    #[error("block index {requested} exceeds latest known index {latest}")]
    OutOfRange { requested: u64, latest: u64 },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
