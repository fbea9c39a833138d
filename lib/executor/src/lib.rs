mod config;
pub use config::ExecutorConfig;

mod engine;
pub use engine::{EngineCall, ExecutionEngine};

mod services;
pub use services::{
    ACCOUNT_SERVICE, ACCOUNTS_STATE, BLOCK_INFO_STATE, BLOCK_SERVICE, BYTECODE_STATE,
    CONTRACT_SERVICE, ExecutionMode, FILE_SERVICE, FILES_STATE, Repositories, STORAGE_STATE,
    TOKEN_RELATIONSHIPS_STATE, TOKEN_SERVICE, UPGRADE_QUEUE_STATE,
};

mod call;
pub use call::CallExecutor;

mod error;
pub use error::CallError;

mod metrics;
