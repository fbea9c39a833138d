use crate::RepositoryResult;
use alloy::primitives::{B256, Bytes};
use mirror_replay_types::{EntityId, Timestamp};

/// Point-in-time reads over contract bytecode and storage. Both methods
/// return the most recent value with effective time <= `as_of`; pass
/// [`Timestamp::MAX`] for the current value.
pub trait ReadContracts: Send + Sync {
    fn runtime_bytecode_at(
        &self,
        contract: EntityId,
        as_of: Timestamp,
    ) -> RepositoryResult<Option<Bytes>>;

    fn storage_slot_at(
        &self,
        contract: EntityId,
        slot: B256,
        as_of: Timestamp,
    ) -> RepositoryResult<Option<B256>>;
}

impl<T: ReadContracts + ?Sized> ReadContracts for std::sync::Arc<T> {
    fn runtime_bytecode_at(
        &self,
        contract: EntityId,
        as_of: Timestamp,
    ) -> RepositoryResult<Option<Bytes>> {
        (**self).runtime_bytecode_at(contract, as_of)
    }

    fn storage_slot_at(
        &self,
        contract: EntityId,
        slot: B256,
        as_of: Timestamp,
    ) -> RepositoryResult<Option<B256>> {
        (**self).storage_slot_at(contract, slot, as_of)
    }
}
