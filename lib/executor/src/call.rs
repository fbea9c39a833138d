use crate::config::ExecutorConfig;
use crate::engine::{EngineCall, ExecutionEngine};
use crate::error::CallError;
use crate::metrics::EXECUTOR_METRICS;
use crate::services::{ExecutionMode, Repositories, state_registry};
use alloy::primitives::Bytes;
use mirror_replay_resolver::{BlockResolver, EntityResolver};
use mirror_replay_state::{ServiceRegistry, StateContainer};
use mirror_replay_storage_api::{ReadEntities, ReadFileData, ReadRecordFiles};
use mirror_replay_system_files::SystemFileLoader;
use mirror_replay_types::{
    BlockReference, CallRequest, CallResult, EntityKind, EntityRecord, ExecutionOutcome,
    HistoricalReference, Timestamp,
};
use std::sync::{Arc, RwLock};
use tokio_util::sync::CancellationToken;

/// Replays calls against point-in-time state and answers gas estimations by
/// binary-searching the lowest viable gas limit.
///
/// One executor is shared across all requests. The execution mode can be
/// swapped at runtime; a request reads the mode once up front, so an in-flight
/// call never observes a mode change.
pub struct CallExecutor {
    engine: Arc<dyn ExecutionEngine>,
    repositories: Repositories,
    loader: Arc<SystemFileLoader<Arc<dyn ReadFileData>>>,
    entity_resolver: EntityResolver<Arc<dyn ReadEntities>>,
    block_resolver: BlockResolver<Arc<dyn ReadRecordFiles>>,
    config: ExecutorConfig,
    mode: RwLock<ExecutionMode>,
}

/// Request after reference and entity resolution, ready for any number of
/// engine runs. All probes of one estimation share the registry; each probe
/// still gets its own container.
struct PreparedCall {
    registry: Arc<ServiceRegistry>,
    sender: EntityRecord,
    target: Option<EntityRecord>,
}

impl CallExecutor {
    pub fn new(
        engine: Arc<dyn ExecutionEngine>,
        repositories: Repositories,
        loader: Arc<SystemFileLoader<Arc<dyn ReadFileData>>>,
        config: ExecutorConfig,
        mode: ExecutionMode,
    ) -> Self {
        let entity_resolver = EntityResolver::new(repositories.entities.clone());
        let block_resolver = BlockResolver::new(repositories.record_files.clone());
        Self {
            engine,
            repositories,
            loader,
            entity_resolver,
            block_resolver,
            config,
            mode: RwLock::new(mode),
        }
    }

    pub fn mode(&self) -> ExecutionMode {
        *self.mode.read().expect("mode lock poisoned")
    }

    /// Takes effect for requests prepared after the call; in-flight requests
    /// keep the mode they started with.
    pub fn set_mode(&self, mode: ExecutionMode) {
        *self.mode.write().expect("mode lock poisoned") = mode;
    }

    /// Replays the call once. Reverts and halts are reported inside the
    /// [`CallResult`]; errors are reserved for requests that never reached
    /// the engine or broke below it.
    pub fn call(&self, request: &CallRequest) -> Result<CallResult, CallError> {
        EXECUTOR_METRICS.calls.inc();
        let prepared = self.prepare(request)?;
        let gas_limit = if request.gas_limit == 0 {
            self.config.default_call_gas
        } else {
            request.gas_limit.min(self.config.max_gas_cap)
        };
        if gas_limit < self.config.intrinsic_gas {
            return Err(CallError::GasLimitTooLow {
                gas_limit,
                intrinsic: self.config.intrinsic_gas,
            });
        }

        let outcome = self.run_probe(&prepared, request, gas_limit)?;
        Ok(match outcome {
            ExecutionOutcome::Success { gas_used, output } => {
                CallResult::successful(gas_used, output)
            }
            ExecutionOutcome::Revert { gas_used, output } => {
                let reason = revert_reason(&output);
                CallResult::failed(gas_used, output, reason)
            }
            ExecutionOutcome::Halt { reason, gas_used } => {
                CallResult::failed(gas_used, Bytes::new(), reason.to_string())
            }
        })
    }

    /// Binary-searches the lowest gas limit under which the call succeeds.
    ///
    /// Out-of-gas failures steer the search upwards; any other failure means
    /// no gas limit can help and terminates the request with that reason.
    /// Each probe runs on a fresh container, so no probe observes writes made
    /// by an earlier one.
    pub fn estimate_gas(
        &self,
        request: &CallRequest,
        cancel: &CancellationToken,
    ) -> Result<u64, CallError> {
        EXECUTOR_METRICS.estimations.inc();
        let prepared = self.prepare(request)?;

        let mut low = self.config.intrinsic_gas;
        let mut high = if request.gas_limit == 0 {
            self.config.max_gas_cap
        } else {
            request.gas_limit.min(self.config.max_gas_cap)
        };
        if high < low {
            return Err(CallError::GasLimitTooLow {
                gas_limit: high,
                intrinsic: low,
            });
        }

        let mut probes: u32 = 0;
        let mut succeeded = false;
        while high - low > self.config.estimation_tolerance {
            if probes >= self.config.max_search_iterations {
                return Err(CallError::GasSearchInconclusive(probes));
            }
            if cancel.is_cancelled() {
                return Err(CallError::Cancelled);
            }
            let mid = low + (high - low) / 2;
            probes += 1;
            match self.run_probe(&prepared, request, mid)? {
                ExecutionOutcome::Success { .. } => {
                    succeeded = true;
                    high = mid;
                }
                outcome if outcome.is_out_of_gas() => low = mid + 1,
                outcome => return Err(CallError::Execution(failure_reason(&outcome))),
            }
        }

        if !succeeded {
            // The search never probed `high` itself; confirm the call is
            // viable at all before reporting it.
            if cancel.is_cancelled() {
                return Err(CallError::Cancelled);
            }
            probes += 1;
            match self.run_probe(&prepared, request, high)? {
                ExecutionOutcome::Success { .. } => {}
                outcome if outcome.is_out_of_gas() => {
                    return Err(CallError::Execution(format!(
                        "out of gas with the maximum usable limit {high}"
                    )));
                }
                outcome => return Err(CallError::Execution(failure_reason(&outcome))),
            }
        }

        EXECUTOR_METRICS.estimation_probes.observe(probes.into());
        tracing::debug!(gas = high, probes, "gas estimation converged");
        Ok(high)
    }

    fn prepare(&self, request: &CallRequest) -> Result<PreparedCall, CallError> {
        let mode = self.mode();
        let as_of = self.resolve_reference(request.reference)?;

        let sender = self.entity_resolver.resolve(&request.from, as_of)?;
        let target = match &request.to {
            Some(identifier) => Some(self.entity_resolver.resolve(identifier, as_of)?),
            None => None,
        };

        if request.value < 0 {
            return Err(CallError::UnsupportedOperation(
                "transfer value must not be negative".to_string(),
            ));
        }
        if request.value > sender.balance {
            return Err(CallError::InsufficientBalance {
                value: request.value,
                balance: sender.balance,
            });
        }
        if mode == ExecutionMode::Legacy {
            match &target {
                None => {
                    return Err(CallError::UnsupportedOperation(
                        "contract deployment is unavailable in legacy mode".to_string(),
                    ));
                }
                Some(target) if request.value > 0 && target.kind != EntityKind::Contract => {
                    return Err(CallError::UnsupportedOperation(
                        "value transfers to non-contract targets are unavailable in legacy mode"
                            .to_string(),
                    ));
                }
                Some(_) => {}
            }
        }

        let registry = state_registry(&self.repositories, &self.loader, as_of, mode);
        Ok(PreparedCall {
            registry: Arc::new(registry),
            sender,
            target,
        })
    }

    fn resolve_reference(
        &self,
        reference: HistoricalReference,
    ) -> Result<Option<Timestamp>, CallError> {
        Ok(match reference {
            HistoricalReference::Latest => None,
            HistoricalReference::Block(number) => Some(
                self.block_resolver
                    .resolve(BlockReference::Number(number))?
                    .as_of(),
            ),
            HistoricalReference::At(timestamp) => Some(timestamp),
        })
    }

    fn run_probe(
        &self,
        prepared: &PreparedCall,
        request: &CallRequest,
        gas_limit: u64,
    ) -> Result<ExecutionOutcome, CallError> {
        let container = StateContainer::new(prepared.registry.clone());
        let call = EngineCall {
            sender: prepared.sender.clone(),
            target: prepared.target.clone(),
            payload: request.payload.clone(),
            value: request.value,
            gas_limit,
        };
        let latency = EXECUTOR_METRICS.execution_latency.start();
        let outcome = self.engine.execute(&container, &call)?;
        latency.observe();
        Ok(outcome)
    }
}

fn revert_reason(output: &Bytes) -> String {
    alloy::sol_types::decode_revert_reason(output)
        .unwrap_or_else(|| "execution reverted".to_string())
}

fn failure_reason(outcome: &ExecutionOutcome) -> String {
    match outcome {
        ExecutionOutcome::Revert { output, .. } => revert_reason(output),
        ExecutionOutcome::Halt { reason, .. } => reason.to_string(),
        ExecutionOutcome::Success { .. } => unreachable!("success is not a failure"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{ACCOUNT_SERVICE, ACCOUNTS_STATE};
    use alloy::primitives::{Address, B256};
    use alloy::sol_types::{Revert, SolError};
    use mirror_replay_storage_api::{
        FileContent, ReadContracts, ReadTokenRelationships, RepositoryError, RepositoryResult,
        TokenRelationship,
    };
    use mirror_replay_system_files::SystemFilesConfig;
    use mirror_replay_types::{
        EntityId, EntityIdentifier, HaltReason, RecordFile, TimestampRange,
    };
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TestEntities {
        records: Vec<EntityRecord>,
    }

    impl TestEntities {
        fn current(&self, matches: impl Fn(&EntityRecord) -> bool) -> Option<EntityRecord> {
            self.records
                .iter()
                .find(|record| matches(record) && record.timestamp_range.end == Timestamp::MAX)
                .cloned()
        }

        fn at(
            &self,
            as_of: Timestamp,
            matches: impl Fn(&EntityRecord) -> bool,
        ) -> Option<EntityRecord> {
            self.records
                .iter()
                .find(|record| matches(record) && record.timestamp_range.contains(as_of))
                .cloned()
        }
    }

    impl ReadEntities for TestEntities {
        fn entity_by_id(&self, id: EntityId) -> RepositoryResult<Option<EntityRecord>> {
            Ok(self.current(|record| record.id == id))
        }

        fn entity_by_evm_address(
            &self,
            address: &Address,
        ) -> RepositoryResult<Option<EntityRecord>> {
            Ok(self.current(|record| record.evm_address.as_ref() == Some(address)))
        }

        fn entity_by_alias(&self, alias: &[u8]) -> RepositoryResult<Option<EntityRecord>> {
            Ok(self.current(|record| record.alias.as_ref().is_some_and(|a| a.as_ref() == alias)))
        }

        fn entity_by_id_at(
            &self,
            id: EntityId,
            as_of: Timestamp,
        ) -> RepositoryResult<Option<EntityRecord>> {
            Ok(self.at(as_of, |record| record.id == id))
        }

        fn entity_by_evm_address_at(
            &self,
            address: &Address,
            as_of: Timestamp,
        ) -> RepositoryResult<Option<EntityRecord>> {
            Ok(self.at(as_of, |record| record.evm_address.as_ref() == Some(address)))
        }

        fn entity_by_alias_at(
            &self,
            alias: &[u8],
            as_of: Timestamp,
        ) -> RepositoryResult<Option<EntityRecord>> {
            Ok(self.at(as_of, |record| {
                record.alias.as_ref().is_some_and(|a| a.as_ref() == alias)
            }))
        }
    }

    /// Every lookup reports the backend as unreachable.
    struct FailingEntities;

    impl ReadEntities for FailingEntities {
        fn entity_by_id(&self, _id: EntityId) -> RepositoryResult<Option<EntityRecord>> {
            Err(RepositoryError::Backend(anyhow::anyhow!(
                "entity backend unavailable"
            )))
        }

        fn entity_by_evm_address(
            &self,
            _address: &Address,
        ) -> RepositoryResult<Option<EntityRecord>> {
            Err(RepositoryError::Backend(anyhow::anyhow!(
                "entity backend unavailable"
            )))
        }

        fn entity_by_alias(&self, _alias: &[u8]) -> RepositoryResult<Option<EntityRecord>> {
            Err(RepositoryError::Backend(anyhow::anyhow!(
                "entity backend unavailable"
            )))
        }

        fn entity_by_id_at(
            &self,
            _id: EntityId,
            _as_of: Timestamp,
        ) -> RepositoryResult<Option<EntityRecord>> {
            Err(RepositoryError::Backend(anyhow::anyhow!(
                "entity backend unavailable"
            )))
        }

        fn entity_by_evm_address_at(
            &self,
            _address: &Address,
            _as_of: Timestamp,
        ) -> RepositoryResult<Option<EntityRecord>> {
            Err(RepositoryError::Backend(anyhow::anyhow!(
                "entity backend unavailable"
            )))
        }

        fn entity_by_alias_at(
            &self,
            _alias: &[u8],
            _as_of: Timestamp,
        ) -> RepositoryResult<Option<EntityRecord>> {
            Err(RepositoryError::Backend(anyhow::anyhow!(
                "entity backend unavailable"
            )))
        }
    }

    struct EmptyContracts;

    impl ReadContracts for EmptyContracts {
        fn runtime_bytecode_at(
            &self,
            _contract: EntityId,
            _as_of: Timestamp,
        ) -> RepositoryResult<Option<Bytes>> {
            Ok(None)
        }

        fn storage_slot_at(
            &self,
            _contract: EntityId,
            _slot: B256,
            _as_of: Timestamp,
        ) -> RepositoryResult<Option<B256>> {
            Ok(None)
        }
    }

    struct EmptyTokens;

    impl ReadTokenRelationships for EmptyTokens {
        fn token_relationship_at(
            &self,
            _account: EntityId,
            _token: EntityId,
            _as_of: Timestamp,
        ) -> RepositoryResult<Option<TokenRelationship>> {
            Ok(None)
        }
    }

    struct TestRecordFiles {
        records: Vec<RecordFile>,
    }

    impl ReadRecordFiles for TestRecordFiles {
        fn earliest(&self) -> RepositoryResult<Option<RecordFile>> {
            Ok(self.records.iter().min_by_key(|record| record.index).copied())
        }

        fn latest(&self) -> RepositoryResult<Option<RecordFile>> {
            Ok(self.records.iter().max_by_key(|record| record.index).copied())
        }

        fn by_index(&self, index: u64) -> RepositoryResult<Option<RecordFile>> {
            Ok(self
                .records
                .iter()
                .find(|record| record.index == index)
                .copied())
        }
    }

    struct NoFileData;

    impl ReadFileData for NoFileData {
        fn file_content_at(
            &self,
            _file: EntityId,
            _as_of: Timestamp,
        ) -> RepositoryResult<Option<FileContent>> {
            Ok(None)
        }
    }

    /// Succeeds iff the gas limit covers `min_gas`; optionally reverts
    /// regardless of gas. Every probe's gas limit is recorded.
    struct FakeEngine {
        min_gas: u64,
        revert_output: Option<Bytes>,
        probes: Mutex<Vec<u64>>,
    }

    impl FakeEngine {
        fn succeeding(min_gas: u64) -> Self {
            Self {
                min_gas,
                revert_output: None,
                probes: Mutex::new(Vec::new()),
            }
        }

        fn reverting(output: Bytes) -> Self {
            Self {
                min_gas: 0,
                revert_output: Some(output),
                probes: Mutex::new(Vec::new()),
            }
        }

        fn probe_count(&self) -> usize {
            self.probes.lock().unwrap().len()
        }
    }

    impl ExecutionEngine for FakeEngine {
        fn execute(
            &self,
            _state: &StateContainer,
            call: &EngineCall,
        ) -> anyhow::Result<ExecutionOutcome> {
            self.probes.lock().unwrap().push(call.gas_limit);
            if let Some(output) = &self.revert_output {
                return Ok(ExecutionOutcome::Revert {
                    gas_used: call.gas_limit,
                    output: output.clone(),
                });
            }
            if call.gas_limit >= self.min_gas {
                Ok(ExecutionOutcome::Success {
                    gas_used: self.min_gas,
                    output: Bytes::from_static(b"ok"),
                })
            } else {
                Ok(ExecutionOutcome::Halt {
                    reason: HaltReason::OutOfGas,
                    gas_used: call.gas_limit,
                })
            }
        }
    }

    const MARKER: [u8; 20] = [0xaa; 20];

    /// Writes a marker into the account state and counts probes that saw a
    /// marker left behind by an earlier probe.
    struct IsolationEngine {
        min_gas: u64,
        runs: AtomicUsize,
        dirty_runs: AtomicUsize,
    }

    impl ExecutionEngine for IsolationEngine {
        fn execute(
            &self,
            state: &StateContainer,
            call: &EngineCall,
        ) -> anyhow::Result<ExecutionOutcome> {
            self.runs.fetch_add(1, Ordering::Relaxed);
            let mut view = state.writable_view(ACCOUNT_SERVICE)?;
            if view.kv_get(ACCOUNTS_STATE, &MARKER)?.is_some() {
                self.dirty_runs.fetch_add(1, Ordering::Relaxed);
            }
            view.kv_put(ACCOUNTS_STATE, &MARKER, Bytes::from_static(b"dirty"))?;
            view.commit()?;
            if call.gas_limit >= self.min_gas {
                Ok(ExecutionOutcome::Success {
                    gas_used: self.min_gas,
                    output: Bytes::new(),
                })
            } else {
                Ok(ExecutionOutcome::Halt {
                    reason: HaltReason::OutOfGas,
                    gas_used: call.gas_limit,
                })
            }
        }
    }

    const SENDER: EntityId = EntityId::new(0, 0, 1001);
    const CONTRACT: EntityId = EntityId::new(0, 0, 2002);

    fn account(id: EntityId, balance: i64) -> EntityRecord {
        EntityRecord {
            id,
            kind: EntityKind::Account,
            balance,
            key: None,
            deleted: false,
            expiration: None,
            evm_address: None,
            alias: None,
            created: Some(Timestamp::from_nanos(0)),
            timestamp_range: TimestampRange::open_ended(Timestamp::from_nanos(0)),
        }
    }

    fn contract(id: EntityId) -> EntityRecord {
        EntityRecord {
            kind: EntityKind::Contract,
            ..account(id, 0)
        }
    }

    fn executor_with(
        engine: Arc<dyn ExecutionEngine>,
        entities: Arc<dyn ReadEntities>,
        records: Vec<RecordFile>,
        config: ExecutorConfig,
        mode: ExecutionMode,
    ) -> CallExecutor {
        let files: Arc<dyn ReadFileData> = Arc::new(NoFileData);
        let repositories = Repositories {
            entities,
            contracts: Arc::new(EmptyContracts),
            tokens: Arc::new(EmptyTokens),
            record_files: Arc::new(TestRecordFiles { records }),
        };
        let loader = Arc::new(SystemFileLoader::new(files, SystemFilesConfig::default()));
        CallExecutor::new(engine, repositories, loader, config, mode)
    }

    fn executor(
        engine: Arc<dyn ExecutionEngine>,
        entities: Vec<EntityRecord>,
        records: Vec<RecordFile>,
        mode: ExecutionMode,
    ) -> CallExecutor {
        executor_with(
            engine,
            Arc::new(TestEntities { records: entities }),
            records,
            ExecutorConfig::default(),
            mode,
        )
    }

    fn request(to: Option<EntityId>, value: i64, gas_limit: u64) -> CallRequest {
        CallRequest {
            from: EntityIdentifier::Num(SENDER),
            to: to.map(EntityIdentifier::Num),
            payload: Bytes::from_static(b"\x01\x02"),
            value,
            gas_limit,
            reference: HistoricalReference::Latest,
        }
    }

    #[test]
    fn unknown_block_fails_before_any_execution() {
        let engine = Arc::new(FakeEngine::succeeding(50_000));
        let executor = executor(
            engine.clone(),
            vec![account(SENDER, 1_000_000), contract(CONTRACT)],
            vec![],
            ExecutionMode::Full,
        );
        let mut request = request(Some(CONTRACT), 0, 0);
        request.reference = HistoricalReference::Block(7);

        assert!(matches!(
            executor.call(&request),
            Err(CallError::UnknownBlock(_))
        ));
        assert_eq!(engine.probe_count(), 0);
    }

    #[test]
    fn unresolved_sender_is_reported() {
        let engine = Arc::new(FakeEngine::succeeding(50_000));
        let executor = executor(
            engine.clone(),
            vec![contract(CONTRACT)],
            vec![],
            ExecutionMode::Full,
        );

        assert!(matches!(
            executor.call(&request(Some(CONTRACT), 0, 0)),
            Err(CallError::UnresolvedEntity(_))
        ));
        assert_eq!(engine.probe_count(), 0);
    }

    #[test]
    fn legacy_mode_restricts_the_call_surface() {
        let engine = Arc::new(FakeEngine::succeeding(50_000));
        let executor = executor(
            engine.clone(),
            vec![account(SENDER, 1_000_000), account(EntityId::new(0, 0, 3003), 0)],
            vec![],
            ExecutionMode::Legacy,
        );

        // Deployment.
        assert!(matches!(
            executor.call(&request(None, 0, 0)),
            Err(CallError::UnsupportedOperation(_))
        ));
        // Value transfer to a plain account.
        assert!(matches!(
            executor.call(&request(Some(EntityId::new(0, 0, 3003)), 100, 0)),
            Err(CallError::UnsupportedOperation(_))
        ));
        assert_eq!(engine.probe_count(), 0);

        // Both are allowed once the mode is switched.
        executor.set_mode(ExecutionMode::Full);
        assert!(executor.call(&request(None, 0, 0)).is_ok());
        assert!(
            executor
                .call(&request(Some(EntityId::new(0, 0, 3003)), 100, 0))
                .is_ok()
        );
    }

    #[test]
    fn successful_call_reports_gas_and_output() {
        let executor = executor(
            Arc::new(FakeEngine::succeeding(50_000)),
            vec![account(SENDER, 1_000_000), contract(CONTRACT)],
            vec![],
            ExecutionMode::Full,
        );

        let result = executor.call(&request(Some(CONTRACT), 0, 100_000)).unwrap();
        assert!(result.success);
        assert_eq!(result.gas_used, 50_000);
        assert_eq!(result.output, Bytes::from_static(b"ok"));
        assert_eq!(result.error, None);
    }

    #[test]
    fn reverting_call_returns_a_failed_result() {
        // Raw revert data that is plain UTF-8 is carried through verbatim.
        let executor = executor(
            Arc::new(FakeEngine::reverting(Bytes::from_static(b"raw"))),
            vec![account(SENDER, 1_000_000), contract(CONTRACT)],
            vec![],
            ExecutionMode::Full,
        );

        let result = executor.call(&request(Some(CONTRACT), 0, 100_000)).unwrap();
        assert!(!result.success);
        assert_eq!(result.output, Bytes::from_static(b"raw"));
        assert_eq!(result.error.as_deref(), Some("raw"));
    }

    #[test]
    fn abi_encoded_revert_data_decodes_to_its_reason() {
        let output: Bytes = Revert::from("insufficient allowance").abi_encode().into();
        let executor = executor(
            Arc::new(FakeEngine::reverting(output)),
            vec![account(SENDER, 1_000_000), contract(CONTRACT)],
            vec![],
            ExecutionMode::Full,
        );

        let result = executor.call(&request(Some(CONTRACT), 0, 100_000)).unwrap();
        assert!(!result.success);
        assert!(
            result
                .error
                .as_deref()
                .is_some_and(|reason| reason.contains("insufficient allowance"))
        );
    }

    #[test]
    fn transfer_above_payer_balance_is_rejected() {
        let engine = Arc::new(FakeEngine::succeeding(50_000));
        let executor = executor(
            engine.clone(),
            vec![account(SENDER, 99), contract(CONTRACT)],
            vec![],
            ExecutionMode::Full,
        );

        assert!(matches!(
            executor.call(&request(Some(CONTRACT), 100, 0)),
            Err(CallError::InsufficientBalance {
                value: 100,
                balance: 99
            })
        ));
        assert_eq!(engine.probe_count(), 0);
    }

    #[test]
    fn gas_limit_below_intrinsic_cost_is_rejected() {
        let executor = executor(
            Arc::new(FakeEngine::succeeding(50_000)),
            vec![account(SENDER, 1_000_000), contract(CONTRACT)],
            vec![],
            ExecutionMode::Full,
        );

        assert!(matches!(
            executor.call(&request(Some(CONTRACT), 0, 1_000)),
            Err(CallError::GasLimitTooLow { .. })
        ));
    }

    #[test]
    fn estimation_converges_to_the_minimum_viable_gas() {
        let engine = Arc::new(FakeEngine::succeeding(90_000));
        let executor = executor(
            engine.clone(),
            vec![account(SENDER, 1_000_000), contract(CONTRACT)],
            vec![],
            ExecutionMode::Full,
        );

        let estimate = executor
            .estimate_gas(&request(Some(CONTRACT), 0, 0), &CancellationToken::new())
            .unwrap();
        assert_eq!(estimate, 90_000);
        // Bisection over the full cap, well inside the probe budget.
        assert!(engine.probe_count() <= 64);
    }

    #[test]
    fn estimation_of_a_reverting_call_fails_with_the_reason() {
        let engine = Arc::new(FakeEngine::reverting(Bytes::from_static(b"raw")));
        let executor = executor(
            engine.clone(),
            vec![account(SENDER, 1_000_000), contract(CONTRACT)],
            vec![],
            ExecutionMode::Full,
        );

        let err = executor
            .estimate_gas(&request(Some(CONTRACT), 0, 0), &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, CallError::Execution(_)));
        // A revert cannot be fixed by more gas, so the search stops at once.
        assert_eq!(engine.probe_count(), 1);
    }

    #[test]
    fn exhausted_probe_budget_is_inconclusive() {
        let engine = Arc::new(FakeEngine::succeeding(90_000));
        let config = ExecutorConfig {
            max_search_iterations: 2,
            ..ExecutorConfig::default()
        };
        let executor = executor_with(
            engine.clone(),
            Arc::new(TestEntities {
                records: vec![account(SENDER, 1_000_000), contract(CONTRACT)],
            }),
            vec![],
            config,
            ExecutionMode::Full,
        );

        // Two probes cannot bisect the full cap down to an exact answer.
        assert!(matches!(
            executor.estimate_gas(&request(Some(CONTRACT), 0, 0), &CancellationToken::new()),
            Err(CallError::GasSearchInconclusive(2))
        ));
        assert_eq!(engine.probe_count(), 2);
    }

    #[test]
    fn backend_failures_are_not_typed_as_resolution_errors() {
        let engine = Arc::new(FakeEngine::succeeding(50_000));
        let executor = executor_with(
            engine.clone(),
            Arc::new(FailingEntities),
            vec![],
            ExecutorConfig::default(),
            ExecutionMode::Full,
        );

        assert!(matches!(
            executor.call(&request(Some(CONTRACT), 0, 0)),
            Err(CallError::Repository(_))
        ));
        assert_eq!(engine.probe_count(), 0);
    }

    #[test]
    fn cancelled_estimation_runs_no_probes() {
        let engine = Arc::new(FakeEngine::succeeding(90_000));
        let executor = executor(
            engine.clone(),
            vec![account(SENDER, 1_000_000), contract(CONTRACT)],
            vec![],
            ExecutionMode::Full,
        );

        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(matches!(
            executor.estimate_gas(&request(Some(CONTRACT), 0, 0), &cancel),
            Err(CallError::Cancelled)
        ));
        assert_eq!(engine.probe_count(), 0);
    }

    #[test]
    fn estimation_probes_run_on_isolated_state() {
        let engine = Arc::new(IsolationEngine {
            min_gas: 90_000,
            runs: AtomicUsize::new(0),
            dirty_runs: AtomicUsize::new(0),
        });
        let executor = executor(
            engine.clone(),
            vec![account(SENDER, 1_000_000), contract(CONTRACT)],
            vec![],
            ExecutionMode::Full,
        );

        executor
            .estimate_gas(&request(Some(CONTRACT), 0, 0), &CancellationToken::new())
            .unwrap();
        assert!(engine.runs.load(Ordering::Relaxed) > 1);
        assert_eq!(engine.dirty_runs.load(Ordering::Relaxed), 0);
    }
}
