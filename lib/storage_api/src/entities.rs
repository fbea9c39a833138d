use crate::RepositoryResult;
use alloy::primitives::Address;
use mirror_replay_types::{EntityId, EntityRecord, Timestamp};

/// Point-in-time reads over the entity table and its history projection.
///
/// Current lookups (`entity_by_*`) return the row as persisted right now,
/// deleted or not; visibility filtering is the resolver's job. Historical
/// lookups (`*_at`) return the projection whose effective range contains
/// `as_of`. An address or alias lookup scoped to `as_of` must only match if
/// that address/alias was already assigned to the entity at `as_of`; an
/// entity that gained its alias later is invisible under the old timestamp.
pub trait ReadEntities: Send + Sync {
    fn entity_by_id(&self, id: EntityId) -> RepositoryResult<Option<EntityRecord>>;

    fn entity_by_evm_address(&self, address: &Address) -> RepositoryResult<Option<EntityRecord>>;

    fn entity_by_alias(&self, alias: &[u8]) -> RepositoryResult<Option<EntityRecord>>;

    fn entity_by_id_at(
        &self,
        id: EntityId,
        as_of: Timestamp,
    ) -> RepositoryResult<Option<EntityRecord>>;

    fn entity_by_evm_address_at(
        &self,
        address: &Address,
        as_of: Timestamp,
    ) -> RepositoryResult<Option<EntityRecord>>;

    fn entity_by_alias_at(
        &self,
        alias: &[u8],
        as_of: Timestamp,
    ) -> RepositoryResult<Option<EntityRecord>>;
}

impl<T: ReadEntities + ?Sized> ReadEntities for std::sync::Arc<T> {
    fn entity_by_id(&self, id: EntityId) -> RepositoryResult<Option<EntityRecord>> {
        (**self).entity_by_id(id)
    }

    fn entity_by_evm_address(&self, address: &Address) -> RepositoryResult<Option<EntityRecord>> {
        (**self).entity_by_evm_address(address)
    }

    fn entity_by_alias(&self, alias: &[u8]) -> RepositoryResult<Option<EntityRecord>> {
        (**self).entity_by_alias(alias)
    }

    fn entity_by_id_at(
        &self,
        id: EntityId,
        as_of: Timestamp,
    ) -> RepositoryResult<Option<EntityRecord>> {
        (**self).entity_by_id_at(id, as_of)
    }

    fn entity_by_evm_address_at(
        &self,
        address: &Address,
        as_of: Timestamp,
    ) -> RepositoryResult<Option<EntityRecord>> {
        (**self).entity_by_evm_address_at(address, as_of)
    }

    fn entity_by_alias_at(
        &self,
        alias: &[u8],
        as_of: Timestamp,
    ) -> RepositoryResult<Option<EntityRecord>> {
        (**self).entity_by_alias_at(alias, as_of)
    }
}
