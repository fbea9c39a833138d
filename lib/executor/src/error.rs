use mirror_replay_resolver::{BlockError, ResolveError};
use mirror_replay_state::StateError;
use mirror_replay_storage_api::RepositoryError;

#[derive(Debug, thiserror::Error)]
pub enum CallError {
    #[error(transparent)]
    UnknownBlock(BlockError),
    #[error(transparent)]
    UnresolvedEntity(ResolveError),
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
    #[error("transfer value {value} exceeds payer balance {balance}")]
    InsufficientBalance { value: i64, balance: i64 },
    #[error("gas limit {gas_limit} is below the intrinsic cost {intrinsic}")]
    GasLimitTooLow { gas_limit: u64, intrinsic: u64 },
    /// Execution failed for a reason no gas limit can fix; carries the revert
    /// reason or halt message verbatim.
    #[error("execution failed: {0}")]
    Execution(String),
    #[error("gas estimation did not converge within {0} probes")]
    GasSearchInconclusive(u32),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error("request cancelled")]
    Cancelled,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Backend failures inside a block lookup are infrastructure trouble, not an
/// unknown block; keep them apart so callers can tell the two cases apart.
impl From<BlockError> for CallError {
    fn from(err: BlockError) -> Self {
        match err {
            BlockError::Repository(err) => Self::Repository(err),
            other => Self::UnknownBlock(other),
        }
    }
}

impl From<ResolveError> for CallError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::Repository(err) => Self::Repository(err),
            other => Self::UnresolvedEntity(other),
        }
    }
}
