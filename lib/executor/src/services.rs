use alloy::primitives::{Address, B256, Bytes};
use mirror_replay_resolver::{EntityResolver, ResolveError};
use mirror_replay_state::{
    KvSource, QueueBacking, ServiceRegistry, SingletonSource, StateBacking, StateId,
};
use mirror_replay_storage_api::{
    ReadContracts, ReadEntities, ReadFileData, ReadRecordFiles, ReadTokenRelationships,
};
use mirror_replay_system_files::SystemFileLoader;
use mirror_replay_types::{EntityId, EntityIdentifier, Timestamp};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const ACCOUNT_SERVICE: &str = "AccountService";
pub const CONTRACT_SERVICE: &str = "ContractService";
pub const TOKEN_SERVICE: &str = "TokenService";
pub const FILE_SERVICE: &str = "FileService";
pub const BLOCK_SERVICE: &str = "BlockService";

/// Accounts keyed by 20-byte EVM address.
pub const ACCOUNTS_STATE: StateId = 0;
/// Runtime bytecode keyed by 20-byte contract address.
pub const BYTECODE_STATE: StateId = 0;
/// Storage slots keyed by 20-byte address followed by a 32-byte slot.
pub const STORAGE_STATE: StateId = 1;
/// Relationships keyed by two concatenated long-zero addresses.
pub const TOKEN_RELATIONSHIPS_STATE: StateId = 0;
/// Encoded system file contents keyed by 8-byte big-endian file number.
pub const FILES_STATE: StateId = 0;
/// Pending file-append fragments; always seeded empty for replay.
pub const UPGRADE_QUEUE_STATE: StateId = 1;
/// Singleton holding the call's consensus timestamp in big-endian nanos.
pub const BLOCK_INFO_STATE: StateId = 0;

/// Which service set a call runs against. Legacy mode predates token
/// precompile support: the token service is not registered and the call
/// surface is restricted accordingly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutionMode {
    Full,
    Legacy,
}

/// Repository handles the executor materializes state from. All reads are
/// point-in-time; the handles themselves are long-lived and shared.
#[derive(Clone)]
pub struct Repositories {
    pub entities: Arc<dyn ReadEntities>,
    pub contracts: Arc<dyn ReadContracts>,
    pub tokens: Arc<dyn ReadTokenRelationships>,
    pub record_files: Arc<dyn ReadRecordFiles>,
}

/// Builds the backing registry for one call. Every source closes over the
/// call's timestamp, so a fresh registry is assembled per request and shared
/// by all of that request's containers.
pub(crate) fn state_registry(
    repositories: &Repositories,
    loader: &Arc<SystemFileLoader<Arc<dyn ReadFileData>>>,
    as_of: Option<Timestamp>,
    mode: ExecutionMode,
) -> ServiceRegistry {
    let effective = as_of.unwrap_or(Timestamp::MAX);
    let resolver = EntityResolver::new(repositories.entities.clone());

    let mut registry = ServiceRegistry::new();
    registry.add_service(
        ACCOUNT_SERVICE,
        BTreeMap::from([(
            ACCOUNTS_STATE,
            StateBacking::kv(AccountSource {
                resolver: resolver.clone(),
                as_of,
            }),
        )]),
    );
    registry.add_service(
        CONTRACT_SERVICE,
        BTreeMap::from([
            (
                BYTECODE_STATE,
                StateBacking::kv(BytecodeSource {
                    resolver: resolver.clone(),
                    contracts: repositories.contracts.clone(),
                    as_of,
                }),
            ),
            (
                STORAGE_STATE,
                StateBacking::kv(StorageSlotSource {
                    resolver,
                    contracts: repositories.contracts.clone(),
                    as_of,
                }),
            ),
        ]),
    );
    if mode == ExecutionMode::Full {
        registry.add_service(
            TOKEN_SERVICE,
            BTreeMap::from([(
                TOKEN_RELATIONSHIPS_STATE,
                StateBacking::kv(TokenRelationshipSource {
                    tokens: repositories.tokens.clone(),
                    as_of: effective,
                }),
            )]),
        );
    }
    registry.add_service(
        FILE_SERVICE,
        BTreeMap::from([
            (
                FILES_STATE,
                StateBacking::kv(SystemFileSource {
                    loader: loader.clone(),
                    as_of: effective,
                }),
            ),
            (UPGRADE_QUEUE_STATE, StateBacking::queue(QueueBacking::default())),
        ]),
    );
    registry.add_service(
        BLOCK_SERVICE,
        BTreeMap::from([(BLOCK_INFO_STATE, StateBacking::singleton(BlockTimeSource { as_of }))]),
    );
    registry
}

fn address_key(key: &[u8]) -> anyhow::Result<Address> {
    Address::try_from(key)
        .map_err(|_| anyhow::anyhow!("expected a 20-byte address key, got {} bytes", key.len()))
}

/// Resolves an address key to a numeric id without forcing alias-only
/// entities through the entity table when the id is already encoded.
fn entity_id_for(
    resolver: &EntityResolver<Arc<dyn ReadEntities>>,
    address: &Address,
    as_of: Option<Timestamp>,
) -> anyhow::Result<Option<EntityId>> {
    if let Some(id) = EntityId::from_long_zero_address(address) {
        return Ok(Some(id));
    }
    match resolver.resolve(&EntityIdentifier::EvmAddress(*address), as_of) {
        Ok(record) => Ok(Some(record.id)),
        Err(ResolveError::NotFound(_)) => Ok(None),
        Err(ResolveError::Repository(err)) => Err(err.into()),
    }
}

struct AccountSource {
    resolver: EntityResolver<Arc<dyn ReadEntities>>,
    as_of: Option<Timestamp>,
}

impl KvSource for AccountSource {
    fn fetch(&self, key: &[u8]) -> anyhow::Result<Option<Bytes>> {
        let address = address_key(key)?;
        let record = match self
            .resolver
            .resolve(&EntityIdentifier::from_address(address), self.as_of)
        {
            Ok(record) => record,
            Err(ResolveError::NotFound(_)) => return Ok(None),
            Err(ResolveError::Repository(err)) => return Err(err.into()),
        };
        let encoded = bincode::serde::encode_to_vec(&record, bincode::config::standard())?;
        Ok(Some(encoded.into()))
    }
}

struct BytecodeSource {
    resolver: EntityResolver<Arc<dyn ReadEntities>>,
    contracts: Arc<dyn ReadContracts>,
    as_of: Option<Timestamp>,
}

impl KvSource for BytecodeSource {
    fn fetch(&self, key: &[u8]) -> anyhow::Result<Option<Bytes>> {
        let address = address_key(key)?;
        let Some(contract) = entity_id_for(&self.resolver, &address, self.as_of)? else {
            return Ok(None);
        };
        let effective = self.as_of.unwrap_or(Timestamp::MAX);
        Ok(self.contracts.runtime_bytecode_at(contract, effective)?)
    }
}

struct StorageSlotSource {
    resolver: EntityResolver<Arc<dyn ReadEntities>>,
    contracts: Arc<dyn ReadContracts>,
    as_of: Option<Timestamp>,
}

impl KvSource for StorageSlotSource {
    fn fetch(&self, key: &[u8]) -> anyhow::Result<Option<Bytes>> {
        if key.len() != 52 {
            anyhow::bail!(
                "expected a 20-byte address followed by a 32-byte slot, got {} bytes",
                key.len()
            );
        }
        let address = address_key(&key[..20])?;
        let slot = B256::from_slice(&key[20..]);
        let Some(contract) = entity_id_for(&self.resolver, &address, self.as_of)? else {
            return Ok(None);
        };
        let effective = self.as_of.unwrap_or(Timestamp::MAX);
        let value = self.contracts.storage_slot_at(contract, slot, effective)?;
        Ok(value.map(|value| Bytes::copy_from_slice(value.as_slice())))
    }
}

struct TokenRelationshipSource {
    tokens: Arc<dyn ReadTokenRelationships>,
    as_of: Timestamp,
}

impl KvSource for TokenRelationshipSource {
    fn fetch(&self, key: &[u8]) -> anyhow::Result<Option<Bytes>> {
        if key.len() != 40 {
            anyhow::bail!(
                "expected two concatenated 20-byte addresses, got {} bytes",
                key.len()
            );
        }
        let account = address_key(&key[..20])?;
        let token = address_key(&key[20..])?;
        let (Some(account), Some(token)) = (
            EntityId::from_long_zero_address(&account),
            EntityId::from_long_zero_address(&token),
        ) else {
            anyhow::bail!("token relationship keys use long-zero encoded ids");
        };
        let Some(relationship) = self.tokens.token_relationship_at(account, token, self.as_of)?
        else {
            return Ok(None);
        };
        let encoded = bincode::serde::encode_to_vec(&relationship, bincode::config::standard())?;
        Ok(Some(encoded.into()))
    }
}

struct SystemFileSource {
    loader: Arc<SystemFileLoader<Arc<dyn ReadFileData>>>,
    as_of: Timestamp,
}

impl KvSource for SystemFileSource {
    fn fetch(&self, key: &[u8]) -> anyhow::Result<Option<Bytes>> {
        let num = u64::from_be_bytes(
            key.try_into()
                .map_err(|_| anyhow::anyhow!("expected an 8-byte file number key"))?,
        );
        let file = EntityId::new(0, 0, num);
        match self.loader.load(file, self.as_of)? {
            Some(snapshot) => Ok(Some(snapshot.contents.encode().into())),
            None => Ok(None),
        }
    }
}

struct BlockTimeSource {
    as_of: Option<Timestamp>,
}

impl SingletonSource for BlockTimeSource {
    fn fetch(&self) -> anyhow::Result<Option<Bytes>> {
        Ok(self
            .as_of
            .map(|timestamp| Bytes::copy_from_slice(&timestamp.as_nanos().to_be_bytes())))
    }
}
