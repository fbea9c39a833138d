use crate::{FileContent, RepositoryResult};
use mirror_replay_types::{EntityId, Timestamp};

/// Reads over the raw file-content rows written by the record stream.
pub trait ReadFileData: Send + Sync {
    /// Most recent full contents of `file` with effective time <= `as_of`.
    /// Walking further back through history is done by re-calling with
    /// `as_of` just below the previous row's consensus timestamp.
    fn file_content_at(
        &self,
        file: EntityId,
        as_of: Timestamp,
    ) -> RepositoryResult<Option<FileContent>>;
}

impl<T: ReadFileData + ?Sized> ReadFileData for std::sync::Arc<T> {
    fn file_content_at(
        &self,
        file: EntityId,
        as_of: Timestamp,
    ) -> RepositoryResult<Option<FileContent>> {
        (**self).file_content_at(file, as_of)
    }
}
