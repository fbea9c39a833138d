use bincode::{Decode, Encode};
use mirror_replay_types::{EntityId, Timestamp};

/// The privileged configuration files this loader recognizes, keyed by their
/// well-known file entity numbers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SystemFileId {
    AddressBook,
    NodeDetails,
    FeeSchedules,
    ExchangeRates,
    NetworkProperties,
    ApiPermissions,
    ThrottleDefinitions,
}

impl SystemFileId {
    pub const fn file_num(self) -> u64 {
        match self {
            Self::AddressBook => 101,
            Self::NodeDetails => 102,
            Self::FeeSchedules => 111,
            Self::ExchangeRates => 112,
            Self::NetworkProperties => 121,
            Self::ApiPermissions => 122,
            Self::ThrottleDefinitions => 123,
        }
    }

    pub fn from_entity_id(id: EntityId) -> Option<Self> {
        if id.shard != 0 || id.realm != 0 {
            return None;
        }
        match id.num {
            101 => Some(Self::AddressBook),
            102 => Some(Self::NodeDetails),
            111 => Some(Self::FeeSchedules),
            112 => Some(Self::ExchangeRates),
            121 => Some(Self::NetworkProperties),
            122 => Some(Self::ApiPermissions),
            123 => Some(Self::ThrottleDefinitions),
            _ => None,
        }
    }

    pub fn entity_id(self) -> EntityId {
        EntityId::new(0, 0, self.file_num())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub struct ServiceEndpoint {
    pub ip: Vec<u8>,
    pub port: u32,
    pub domain: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub struct NodeAddress {
    pub node_id: u64,
    /// `num` of the node's 0.0.x operator account.
    pub account_num: u64,
    pub description: String,
    pub endpoints: Vec<ServiceEndpoint>,
}

/// Schema shared by the address book (101) and node details (102) files.
#[derive(Clone, Debug, Default, PartialEq, Eq, Encode, Decode)]
pub struct AddressBook {
    pub nodes: Vec<NodeAddress>,
}

#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub struct OperationFee {
    pub operation: String,
    pub base: u64,
    pub per_gas: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Encode, Decode)]
pub struct FeeSchedule {
    /// Seconds since epoch after which this schedule no longer applies.
    pub expiry_seconds: i64,
    pub prices: Vec<OperationFee>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Encode, Decode)]
pub struct FeeSchedules {
    pub current: FeeSchedule,
    pub next: FeeSchedule,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Encode, Decode)]
pub struct ExchangeRate {
    pub hbar_equivalent: i32,
    pub cent_equivalent: i32,
    pub expiration_seconds: i64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Encode, Decode)]
pub struct ExchangeRateSet {
    pub current: ExchangeRate,
    pub next: ExchangeRate,
}

impl ExchangeRateSet {
    /// Picks the rate applicable at `timestamp`: the current rate until its
    /// expiration, the next one afterwards.
    pub fn rate_at(&self, timestamp: Timestamp) -> &ExchangeRate {
        let expiration = Timestamp::from_seconds_nanos(self.current.expiration_seconds, 0);
        if timestamp < expiration {
            &self.current
        } else {
            &self.next
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub struct Setting {
    pub name: String,
    pub value: String,
}

/// String key/value settings (network properties file, 121).
#[derive(Clone, Debug, Default, PartialEq, Eq, Encode, Decode)]
pub struct NetworkProperties {
    pub settings: Vec<Setting>,
}

impl NetworkProperties {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.settings
            .iter()
            .find(|setting| setting.name == name)
            .map(|setting| setting.value.as_str())
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name)?.parse().ok()
    }

    pub fn get_u64(&self, name: &str) -> Option<u64> {
        self.get(name)?.parse().ok()
    }
}

/// HAPI permissions file (122): same wire shape as network properties.
#[derive(Clone, Debug, Default, PartialEq, Eq, Encode, Decode)]
pub struct ApiPermissions {
    pub settings: Vec<Setting>,
}

#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub struct ThrottleGroup {
    pub ops_per_sec: u64,
    pub operations: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub struct ThrottleBucket {
    pub name: String,
    pub burst_period_ms: u64,
    pub groups: Vec<ThrottleGroup>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Encode, Decode)]
pub struct ThrottleDefinitions {
    pub buckets: Vec<ThrottleBucket>,
}

impl ThrottleDefinitions {
    /// A decodable blob can still be unusable: every bucket must name at
    /// least one group and every group at least one operation.
    pub fn validate(&self) -> Result<(), SchemaError> {
        for bucket in &self.buckets {
            if bucket.groups.is_empty() {
                return Err(SchemaError::Invalid(format!(
                    "throttle bucket `{}` has no groups",
                    bucket.name
                )));
            }
            for group in &bucket.groups {
                if group.operations.is_empty() {
                    return Err(SchemaError::Invalid(format!(
                        "throttle bucket `{}` has a group with no operations",
                        bucket.name
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Decoded contents of one system file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SystemFileContents {
    AddressBook(AddressBook),
    NodeDetails(AddressBook),
    FeeSchedules(FeeSchedules),
    ExchangeRates(ExchangeRateSet),
    NetworkProperties(NetworkProperties),
    ApiPermissions(ApiPermissions),
    ThrottleDefinitions(ThrottleDefinitions),
}

impl SystemFileContents {
    /// Decodes `bytes` under the schema expected for `file`. Any failure,
    /// including trailing garbage or a schema-level validation error, counts
    /// as a corrupt snapshot.
    pub fn decode(file: SystemFileId, bytes: &[u8]) -> Result<Self, SchemaError> {
        let config = bincode::config::standard();
        let (contents, consumed) = match file {
            SystemFileId::AddressBook => {
                let (decoded, consumed) = bincode::decode_from_slice(bytes, config)?;
                (Self::AddressBook(decoded), consumed)
            }
            SystemFileId::NodeDetails => {
                let (decoded, consumed) = bincode::decode_from_slice(bytes, config)?;
                (Self::NodeDetails(decoded), consumed)
            }
            SystemFileId::FeeSchedules => {
                let (decoded, consumed) = bincode::decode_from_slice(bytes, config)?;
                (Self::FeeSchedules(decoded), consumed)
            }
            SystemFileId::ExchangeRates => {
                let (decoded, consumed) = bincode::decode_from_slice(bytes, config)?;
                (Self::ExchangeRates(decoded), consumed)
            }
            SystemFileId::NetworkProperties => {
                let (decoded, consumed) = bincode::decode_from_slice(bytes, config)?;
                (Self::NetworkProperties(decoded), consumed)
            }
            SystemFileId::ApiPermissions => {
                let (decoded, consumed) = bincode::decode_from_slice(bytes, config)?;
                (Self::ApiPermissions(decoded), consumed)
            }
            SystemFileId::ThrottleDefinitions => {
                let (decoded, consumed): (ThrottleDefinitions, usize) =
                    bincode::decode_from_slice(bytes, config)?;
                decoded.validate()?;
                (Self::ThrottleDefinitions(decoded), consumed)
            }
        };
        if consumed != bytes.len() {
            return Err(SchemaError::TrailingBytes {
                consumed,
                total: bytes.len(),
            });
        }
        Ok(contents)
    }

    pub fn encode(&self) -> Vec<u8> {
        let config = bincode::config::standard();
        let encoded = match self {
            Self::AddressBook(contents) | Self::NodeDetails(contents) => {
                bincode::encode_to_vec(contents, config)
            }
            Self::FeeSchedules(contents) => bincode::encode_to_vec(contents, config),
            Self::ExchangeRates(contents) => bincode::encode_to_vec(contents, config),
            Self::NetworkProperties(contents) => bincode::encode_to_vec(contents, config),
            Self::ApiPermissions(contents) => bincode::encode_to_vec(contents, config),
            Self::ThrottleDefinitions(contents) => bincode::encode_to_vec(contents, config),
        };
        encoded.expect("system file schemas encode infallibly")
    }
}

/// Why a raw snapshot failed to materialize under its expected schema.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error(transparent)]
    Malformed(#[from] bincode::error::DecodeError),
    #[error("trailing bytes after decoded contents ({consumed} of {total} consumed)")]
    TrailingBytes { consumed: usize, total: usize },
    #[error("decoded contents failed validation: {0}")]
    Invalid(String),
}
