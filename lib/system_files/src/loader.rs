use crate::config::SystemFilesConfig;
use crate::genesis::genesis_default;
use crate::metrics::SYSTEM_FILES_METRICS;
use crate::schema::{SystemFileContents, SystemFileId};
use dashmap::DashMap;
use mirror_replay_storage_api::{ReadFileData, RepositoryResult};
use mirror_replay_types::{EntityId, Timestamp};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Upper bound on fetch/decode attempts before giving up on persisted
/// content and falling back to the genesis default.
pub const MAX_DECODE_ATTEMPTS: usize = 10;

/// Decoded contents of one system file plus its expiration metadata.
///
/// `expires_at` is derived from the loader configuration at build time, not
/// from anything persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SystemFileSnapshot {
    pub file: SystemFileId,
    pub contents: SystemFileContents,
    pub expires_at: Timestamp,
}

/// Reconstructs system files as of a timestamp, tolerating corrupt
/// historical snapshots.
///
/// The cache is keyed by the query `(file, as_of)`, not by the underlying
/// data: two loads with identical arguments always observe identical
/// results, even if newer content was persisted in between. Concurrent loads
/// of the same key may do the fetch/decode work twice; both compute the same
/// deterministic snapshot, so last-writer-wins is fine.
#[derive(Debug)]
pub struct SystemFileLoader<R> {
    repository: R,
    config: SystemFilesConfig,
    cache: DashMap<(SystemFileId, Timestamp), Arc<SystemFileSnapshot>>,
}

impl<R: ReadFileData> SystemFileLoader<R> {
    pub fn new(repository: R, config: SystemFilesConfig) -> Self {
        Self {
            repository,
            config,
            cache: DashMap::new(),
        }
    }

    /// Loads `file` as of `as_of`. Returns `None` for files that are not
    /// recognized system files; repository failures propagate, corrupt
    /// content does not.
    pub fn load(
        &self,
        file: EntityId,
        as_of: Timestamp,
    ) -> RepositoryResult<Option<Arc<SystemFileSnapshot>>> {
        let Some(file_id) = SystemFileId::from_entity_id(file) else {
            return Ok(None);
        };

        if let Some(hit) = self.cache.get(&(file_id, as_of)) {
            SYSTEM_FILES_METRICS.cache_hits.inc();
            return Ok(Some(hit.clone()));
        }
        SYSTEM_FILES_METRICS.cache_misses.inc();

        let contents = self.materialize(file, file_id, as_of)?;
        let snapshot = Arc::new(SystemFileSnapshot {
            file: file_id,
            contents,
            expires_at: self.snapshot_expiry(),
        });
        self.cache.insert((file_id, as_of), snapshot.clone());
        Ok(Some(snapshot))
    }

    /// Walks file history backwards from `as_of`, one snapshot per attempt,
    /// until something decodes or the retry budget is exhausted.
    fn materialize(
        &self,
        file: EntityId,
        file_id: SystemFileId,
        as_of: Timestamp,
    ) -> RepositoryResult<SystemFileContents> {
        let mut upper_bound = as_of;
        for attempt in 1..=MAX_DECODE_ATTEMPTS as u64 {
            let Some(row) = self.repository.file_content_at(file, upper_bound)? else {
                tracing::debug!(
                    file = %file,
                    %as_of,
                    "no persisted content at or before timestamp, using genesis default"
                );
                SYSTEM_FILES_METRICS.genesis_fallbacks.inc();
                return Ok(genesis_default(file_id));
            };
            match SystemFileContents::decode(file_id, &row.bytes) {
                Ok(contents) => {
                    SYSTEM_FILES_METRICS.decode_attempts.observe(attempt);
                    return Ok(contents);
                }
                Err(err) => {
                    tracing::warn!(
                        file = %file,
                        timestamp = %row.consensus_timestamp,
                        attempt,
                        %err,
                        "undecodable system file snapshot, retrying with older content"
                    );
                    upper_bound = row.consensus_timestamp.pred();
                }
            }
        }

        tracing::warn!(
            file = %file,
            %as_of,
            "no decodable snapshot within {MAX_DECODE_ATTEMPTS} attempts, using genesis default"
        );
        SYSTEM_FILES_METRICS.genesis_fallbacks.inc();
        Ok(genesis_default(file_id))
    }

    fn snapshot_expiry(&self) -> Timestamp {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        let expiry = now + self.config.cache_ttl;
        Timestamp::from_nanos(expiry.as_nanos().try_into().unwrap_or(i64::MAX))
    }
}
