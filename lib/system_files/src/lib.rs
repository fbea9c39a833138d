mod schema;
pub use schema::{
    AddressBook, ApiPermissions, ExchangeRate, ExchangeRateSet, FeeSchedule, FeeSchedules,
    NetworkProperties, NodeAddress, OperationFee, SchemaError, ServiceEndpoint, Setting,
    SystemFileContents, SystemFileId, ThrottleBucket, ThrottleDefinitions, ThrottleGroup,
};

mod genesis;
pub use genesis::genesis_default;

mod loader;
pub use loader::{MAX_DECODE_ATTEMPTS, SystemFileLoader, SystemFileSnapshot};

mod config;
pub use config::SystemFilesConfig;

mod metrics;
