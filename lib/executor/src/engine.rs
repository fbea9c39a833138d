use alloy::primitives::Bytes;
use mirror_replay_state::StateContainer;
use mirror_replay_types::{EntityRecord, ExecutionOutcome};

/// One fully resolved execution request handed to the engine. The entity
/// lookups happened up front, so the engine never sees raw identifiers.
#[derive(Clone, Debug)]
pub struct EngineCall {
    pub sender: EntityRecord,
    /// `None` means contract deployment.
    pub target: Option<EntityRecord>,
    pub payload: Bytes,
    pub value: i64,
    pub gas_limit: u64,
}

/// Seam to the bytecode interpreter. Implementations read world state only
/// through the supplied container, which scopes every lookup to the call's
/// timestamp; anything they write stays inside the container.
pub trait ExecutionEngine: Send + Sync {
    fn execute(
        &self,
        state: &StateContainer,
        call: &EngineCall,
    ) -> anyhow::Result<ExecutionOutcome>;
}

impl<T: ExecutionEngine + ?Sized> ExecutionEngine for std::sync::Arc<T> {
    fn execute(
        &self,
        state: &StateContainer,
        call: &EngineCall,
    ) -> anyhow::Result<ExecutionOutcome> {
        (**self).execute(state, call)
    }
}
