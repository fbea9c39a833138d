use crate::{Timestamp, TimestampRange};
use alloy::primitives::{Address, Bytes};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Numeric ledger entity id in `shard.realm.num` form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId {
    pub shard: u32,
    pub realm: u64,
    pub num: u64,
}

impl EntityId {
    pub const fn new(shard: u32, realm: u64, num: u64) -> Self {
        Self { shard, realm, num }
    }

    /// Encodes the id as a 20-byte "long-zero" EVM address:
    /// 4 bytes shard, 8 bytes realm, 8 bytes num, all big-endian.
    pub fn to_long_zero_address(self) -> Address {
        let mut bytes = [0u8; 20];
        bytes[0..4].copy_from_slice(&self.shard.to_be_bytes());
        bytes[4..12].copy_from_slice(&self.realm.to_be_bytes());
        bytes[12..20].copy_from_slice(&self.num.to_be_bytes());
        Address::from(bytes)
    }

    /// Decodes a long-zero address back into a numeric id. Addresses whose
    /// shard/realm prefix is non-zero are genuine EVM aliases on a
    /// single-shard deployment and do not decode.
    pub fn from_long_zero_address(address: &Address) -> Option<Self> {
        let bytes = address.as_slice();
        let shard = u32::from_be_bytes(bytes[0..4].try_into().ok()?);
        let realm = u64::from_be_bytes(bytes[4..12].try_into().ok()?);
        let num = u64::from_be_bytes(bytes[12..20].try_into().ok()?);
        if shard != 0 || realm != 0 {
            return None;
        }
        Some(Self { shard, realm, num })
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.shard, self.realm, self.num)
    }
}

#[derive(Clone, Debug, thiserror::Error)]
#[error("invalid entity id `{0}`, expected `shard.realm.num`")]
pub struct EntityIdParseError(String);

impl FromStr for EntityId {
    type Err = EntityIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || EntityIdParseError(s.to_string());
        let mut parts = s.split('.');
        let shard = parts.next().and_then(|p| p.parse().ok()).ok_or_else(err)?;
        let realm = parts.next().and_then(|p| p.parse().ok()).ok_or_else(err)?;
        let num = parts.next().and_then(|p| p.parse().ok()).ok_or_else(err)?;
        if parts.next().is_some() {
            return Err(err());
        }
        Ok(Self { shard, realm, num })
    }
}

/// The forms in which a caller may reference an entity.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityIdentifier {
    Num(EntityId),
    EvmAddress(Address),
    Alias(Bytes),
}

impl EntityIdentifier {
    /// Long-zero addresses already encode a numeric id; canonicalize them so
    /// lookups can go straight by id.
    pub fn from_address(address: Address) -> Self {
        match EntityId::from_long_zero_address(&address) {
            Some(id) => Self::Num(id),
            None => Self::EvmAddress(address),
        }
    }
}

impl From<EntityId> for EntityIdentifier {
    fn from(id: EntityId) -> Self {
        Self::Num(id)
    }
}

impl fmt::Display for EntityIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(id) => write!(f, "{id}"),
            Self::EvmAddress(address) => write!(f, "{address}"),
            Self::Alias(alias) => write!(f, "alias:{alias}"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Account,
    Contract,
    Token,
    File,
    Topic,
}

/// Resolved identity/attributes of an entity at a point in time.
///
/// `timestamp_range` is the effective range of this projection: the record
/// reflects every mutation with effective time < `timestamp_range.end` and
/// none at or after it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: EntityId,
    pub kind: EntityKind,
    /// Balance in tinybars.
    pub balance: i64,
    pub key: Option<Bytes>,
    pub deleted: bool,
    pub expiration: Option<Timestamp>,
    pub evm_address: Option<Address>,
    pub alias: Option<Bytes>,
    pub created: Option<Timestamp>,
    pub timestamp_range: TimestampRange,
}
