use crate::RepositoryResult;
use mirror_replay_types::RecordFile;

/// The record-index-to-timestamp mapping used by the block resolver.
pub trait ReadRecordFiles: Send + Sync {
    fn earliest(&self) -> RepositoryResult<Option<RecordFile>>;

    fn latest(&self) -> RepositoryResult<Option<RecordFile>>;

    fn by_index(&self, index: u64) -> RepositoryResult<Option<RecordFile>>;
}

impl<T: ReadRecordFiles + ?Sized> ReadRecordFiles for std::sync::Arc<T> {
    fn earliest(&self) -> RepositoryResult<Option<RecordFile>> {
        (**self).earliest()
    }

    fn latest(&self) -> RepositoryResult<Option<RecordFile>> {
        (**self).latest()
    }

    fn by_index(&self, index: u64) -> RepositoryResult<Option<RecordFile>> {
        (**self).by_index(index)
    }
}
