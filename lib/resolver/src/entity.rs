use mirror_replay_storage_api::{ReadEntities, RepositoryError, RepositoryResult};
use mirror_replay_types::{EntityId, EntityIdentifier, EntityRecord, Timestamp};

/// Resolves an entity identifier to its persisted record, either as of "now"
/// or as of a historical consensus timestamp.
///
/// Read-only; results are safe to cache per call (the state container does
/// that) but must never be cached across calls with different timestamps.
#[derive(Clone, Debug)]
pub struct EntityResolver<R> {
    repository: R,
}

impl<R: ReadEntities> EntityResolver<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Resolution order: identifiers that already encode a numeric id
    /// (including long-zero addresses) are looked up directly; everything
    /// else goes through the address/alias projection.
    ///
    /// Without `as_of`, only non-deleted current records are visible. With
    /// `as_of`, the projection active at that timestamp is returned
    /// regardless of current deletion state, and an address or alias the
    /// entity had not yet been assigned at `as_of` does not resolve, even
    /// if a current lookup under it would succeed.
    pub fn resolve(
        &self,
        identifier: &EntityIdentifier,
        as_of: Option<Timestamp>,
    ) -> Result<EntityRecord, ResolveError> {
        let record = match as_of {
            None => self
                .lookup_current(identifier)?
                .filter(|record| !record.deleted),
            Some(timestamp) => self.lookup_at(identifier, timestamp)?,
        };
        match record {
            Some(record) => Ok(record),
            None => {
                tracing::debug!(identifier = %identifier, ?as_of, "entity did not resolve");
                Err(ResolveError::NotFound(identifier.clone()))
            }
        }
    }

    fn lookup_current(
        &self,
        identifier: &EntityIdentifier,
    ) -> RepositoryResult<Option<EntityRecord>> {
        match identifier {
            EntityIdentifier::Num(id) => self.repository.entity_by_id(*id),
            EntityIdentifier::EvmAddress(address) => {
                match EntityId::from_long_zero_address(address) {
                    Some(id) => self.repository.entity_by_id(id),
                    None => self.repository.entity_by_evm_address(address),
                }
            }
            EntityIdentifier::Alias(alias) => self.repository.entity_by_alias(alias),
        }
    }

    fn lookup_at(
        &self,
        identifier: &EntityIdentifier,
        as_of: Timestamp,
    ) -> RepositoryResult<Option<EntityRecord>> {
        match identifier {
            EntityIdentifier::Num(id) => self.repository.entity_by_id_at(*id, as_of),
            EntityIdentifier::EvmAddress(address) => {
                match EntityId::from_long_zero_address(address) {
                    Some(id) => self.repository.entity_by_id_at(id, as_of),
                    None => self.repository.entity_by_evm_address_at(address, as_of),
                }
            }
            EntityIdentifier::Alias(alias) => self.repository.entity_by_alias_at(alias, as_of),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("entity `{0}` could not be resolved")]
    NotFound(EntityIdentifier),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Address, Bytes};
    use mirror_replay_types::{EntityKind, TimestampRange};
    use std::sync::Mutex;

    /// Entity rows with explicit effective ranges; historical lookups match
    /// the projection whose range contains the timestamp, and address/alias
    /// lookups additionally require the key to be set on that projection.
    #[derive(Default)]
    struct FakeEntities {
        projections: Mutex<Vec<EntityRecord>>,
    }

    impl FakeEntities {
        fn push(&self, record: EntityRecord) {
            self.projections.lock().unwrap().push(record);
        }

        fn current(&self, matches: impl Fn(&EntityRecord) -> bool) -> Option<EntityRecord> {
            self.projections
                .lock()
                .unwrap()
                .iter()
                .filter(|record| matches(record) && record.timestamp_range.end == Timestamp::MAX)
                .max_by_key(|record| record.timestamp_range.start)
                .cloned()
        }

        fn at(
            &self,
            as_of: Timestamp,
            matches: impl Fn(&EntityRecord) -> bool,
        ) -> Option<EntityRecord> {
            self.projections
                .lock()
                .unwrap()
                .iter()
                .find(|record| matches(record) && record.timestamp_range.contains(as_of))
                .cloned()
        }
    }

    impl ReadEntities for &FakeEntities {
        fn entity_by_id(&self, id: EntityId) -> RepositoryResult<Option<EntityRecord>> {
            Ok(self.current(|record| record.id == id))
        }

        fn entity_by_evm_address(
            &self,
            address: &Address,
        ) -> RepositoryResult<Option<EntityRecord>> {
            Ok(self.current(|record| record.evm_address.as_ref() == Some(address)))
        }

        fn entity_by_alias(&self, alias: &[u8]) -> RepositoryResult<Option<EntityRecord>> {
            Ok(self.current(|record| record.alias.as_ref().is_some_and(|a| a.as_ref() == alias)))
        }

        fn entity_by_id_at(
            &self,
            id: EntityId,
            as_of: Timestamp,
        ) -> RepositoryResult<Option<EntityRecord>> {
            Ok(self.at(as_of, |record| record.id == id))
        }

        fn entity_by_evm_address_at(
            &self,
            address: &Address,
            as_of: Timestamp,
        ) -> RepositoryResult<Option<EntityRecord>> {
            Ok(self.at(as_of, |record| {
                record.evm_address.as_ref() == Some(address)
            }))
        }

        fn entity_by_alias_at(
            &self,
            alias: &[u8],
            as_of: Timestamp,
        ) -> RepositoryResult<Option<EntityRecord>> {
            Ok(self.at(as_of, |record| {
                record.alias.as_ref().is_some_and(|a| a.as_ref() == alias)
            }))
        }
    }

    fn record(id: u64, balance: i64, range: TimestampRange) -> EntityRecord {
        EntityRecord {
            id: EntityId::new(0, 0, id),
            kind: EntityKind::Account,
            balance,
            key: None,
            deleted: false,
            expiration: None,
            evm_address: None,
            alias: None,
            created: Some(range.start),
            timestamp_range: range,
        }
    }

    fn ts(nanos: i64) -> Timestamp {
        Timestamp::from_nanos(nanos)
    }

    #[test]
    fn historical_lookup_does_not_see_later_mutations() {
        let entities = FakeEntities::default();
        // Projection with balance 100 effective [10, 50), then 250 from 50.
        entities.push(record(1001, 100, TimestampRange::new(ts(10), ts(50))));
        entities.push(record(1001, 250, TimestampRange::open_ended(ts(50))));

        let resolver = EntityResolver::new(&entities);
        let identifier = EntityIdentifier::Num(EntityId::new(0, 0, 1001));

        let old = resolver.resolve(&identifier, Some(ts(20))).unwrap();
        assert_eq!(old.balance, 100);
        let new = resolver.resolve(&identifier, Some(ts(60))).unwrap();
        assert_eq!(new.balance, 250);
        let current = resolver.resolve(&identifier, None).unwrap();
        assert_eq!(current.balance, 250);

        // Before the entity existed at all.
        assert!(matches!(
            resolver.resolve(&identifier, Some(ts(5))),
            Err(ResolveError::NotFound(_))
        ));
    }

    #[test]
    fn current_lookup_hides_deleted_entities_but_historical_does_not() {
        let entities = FakeEntities::default();
        let mut deleted = record(1002, 0, TimestampRange::open_ended(ts(10)));
        deleted.deleted = true;
        entities.push(deleted);

        let resolver = EntityResolver::new(&entities);
        let identifier = EntityIdentifier::Num(EntityId::new(0, 0, 1002));

        assert!(matches!(
            resolver.resolve(&identifier, None),
            Err(ResolveError::NotFound(_))
        ));
        let historical = resolver.resolve(&identifier, Some(ts(20))).unwrap();
        assert!(historical.deleted);
    }

    #[test]
    fn long_zero_address_resolves_by_numeric_id() {
        let entities = FakeEntities::default();
        entities.push(record(1003, 7, TimestampRange::open_ended(ts(0))));

        let resolver = EntityResolver::new(&entities);
        let address = EntityId::new(0, 0, 1003).to_long_zero_address();
        let resolved = resolver
            .resolve(&EntityIdentifier::EvmAddress(address), None)
            .unwrap();
        assert_eq!(resolved.id, EntityId::new(0, 0, 1003));
    }

    #[test]
    fn alias_assigned_later_is_invisible_at_earlier_timestamp() {
        let entities = FakeEntities::default();
        let alias = Bytes::from_static(b"\x02public-key");
        // No alias until timestamp 100, alias afterwards.
        entities.push(record(1004, 1, TimestampRange::new(ts(10), ts(100))));
        let mut with_alias = record(1004, 1, TimestampRange::open_ended(ts(100)));
        with_alias.alias = Some(alias.clone());
        entities.push(with_alias);

        let resolver = EntityResolver::new(&entities);
        let identifier = EntityIdentifier::Alias(alias);

        // Current lookup succeeds, historical one scoped before assignment
        // fails.
        assert!(resolver.resolve(&identifier, None).is_ok());
        assert!(matches!(
            resolver.resolve(&identifier, Some(ts(50))),
            Err(ResolveError::NotFound(_))
        ));
        assert!(resolver.resolve(&identifier, Some(ts(150))).is_ok());
    }
}
