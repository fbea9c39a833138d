use crate::schema::{
    AddressBook, ApiPermissions, ExchangeRate, ExchangeRateSet, FeeSchedule, FeeSchedules,
    NetworkProperties, OperationFee, Setting, SystemFileContents, SystemFileId, ThrottleBucket,
    ThrottleDefinitions, ThrottleGroup,
};

/// Fixed, schema-valid contents used when no decodable snapshot exists at or
/// before the requested timestamp. These mirror the values the network ships
/// with at genesis and are deliberately conservative.
pub fn genesis_default(file: SystemFileId) -> SystemFileContents {
    match file {
        SystemFileId::AddressBook => SystemFileContents::AddressBook(AddressBook::default()),
        SystemFileId::NodeDetails => SystemFileContents::NodeDetails(AddressBook::default()),
        SystemFileId::FeeSchedules => SystemFileContents::FeeSchedules(FeeSchedules {
            current: genesis_fee_schedule(),
            next: genesis_fee_schedule(),
        }),
        SystemFileId::ExchangeRates => SystemFileContents::ExchangeRates(ExchangeRateSet {
            current: GENESIS_EXCHANGE_RATE,
            next: GENESIS_EXCHANGE_RATE,
        }),
        SystemFileId::NetworkProperties => {
            SystemFileContents::NetworkProperties(NetworkProperties {
                settings: vec![Setting {
                    name: "contracts.maxGasPerSec".to_string(),
                    value: "15000000".to_string(),
                }],
            })
        }
        SystemFileId::ApiPermissions => {
            SystemFileContents::ApiPermissions(ApiPermissions { settings: vec![] })
        }
        SystemFileId::ThrottleDefinitions => {
            SystemFileContents::ThrottleDefinitions(ThrottleDefinitions {
                buckets: vec![ThrottleBucket {
                    name: "ThroughputLimits".to_string(),
                    burst_period_ms: 1_000,
                    groups: vec![ThrottleGroup {
                        ops_per_sec: 10_000,
                        operations: vec!["ContractCall".to_string()],
                    }],
                }],
            })
        }
    }
}

const GENESIS_EXCHANGE_RATE: ExchangeRate = ExchangeRate {
    hbar_equivalent: 1,
    cent_equivalent: 12,
    expiration_seconds: 4_102_444_800, // 2100-01-01T00:00:00Z
};

fn genesis_fee_schedule() -> FeeSchedule {
    FeeSchedule {
        expiry_seconds: 4_102_444_800,
        prices: vec![OperationFee {
            operation: "ContractCall".to_string(),
            base: 0,
            per_gas: 852_000,
        }],
    }
}
