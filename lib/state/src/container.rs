use crate::backing::{KvSource, SingletonSource, StateBacking, StateId};
use crate::error::{StateError, StateResult};
use crate::metrics::STATE_METRICS;
use crate::registry::ServiceRegistry;
use alloy::primitives::Bytes;
use dashmap::DashMap;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Per-call snapshot of every registered service's states.
///
/// One container is assembled per call attempt (or per gas-estimation probe)
/// and discarded afterwards. Reads against key-value and singleton states go
/// through the backing source at most once per distinct key; the result is
/// cached for the remainder of the container's lifetime. Writes only ever
/// land in container-local layers; the registry's backing instances are
/// never touched.
pub struct StateContainer {
    registry: Arc<ServiceRegistry>,
    services: BTreeMap<String, BTreeMap<StateId, StateCell>>,
}

impl StateContainer {
    pub fn new(registry: Arc<ServiceRegistry>) -> Self {
        let services = registry
            .services()
            .map(|(name, states)| {
                let cells = states
                    .iter()
                    .map(|(id, backing)| (*id, StateCell::new(backing)))
                    .collect();
                (name.to_string(), cells)
            })
            .collect();
        Self { registry, services }
    }

    pub fn registry(&self) -> &Arc<ServiceRegistry> {
        &self.registry
    }

    pub fn readable_view<'a>(&'a self, service: &str) -> StateResult<ReadableView<'a>> {
        let (name, states) = self
            .services
            .get_key_value(service)
            .ok_or_else(|| StateError::UnknownService(service.to_string()))?;
        Ok(ReadableView { service: name, states })
    }

    pub fn writable_view<'a>(&'a self, service: &str) -> StateResult<WritableView<'a>> {
        let (name, states) = self
            .services
            .get_key_value(service)
            .ok_or_else(|| StateError::UnknownService(service.to_string()))?;
        Ok(WritableView {
            service: name,
            states,
            kv_overlays: HashMap::new(),
            singleton_overlays: HashMap::new(),
            queue_snapshots: HashMap::new(),
        })
    }
}

impl PartialEq for StateContainer {
    /// Two containers are equal iff they were built over the same services
    /// with the same backing instances. Used for verification, not for
    /// production correctness.
    fn eq(&self, other: &Self) -> bool {
        self.registry == other.registry
    }
}

impl Eq for StateContainer {}

impl std::fmt::Debug for StateContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateContainer")
            .field("registry", &self.registry)
            .finish()
    }
}

enum StateCell {
    Kv(KvCell),
    Singleton(SingletonCell),
    Queue(QueueCell),
}

impl StateCell {
    fn new(backing: &StateBacking) -> Self {
        match backing {
            StateBacking::Kv(source) => Self::Kv(KvCell {
                source: source.clone(),
                cache: DashMap::new(),
                committed: DashMap::new(),
            }),
            StateBacking::Singleton(source) => Self::Singleton(SingletonCell {
                source: source.clone(),
                slots: Mutex::default(),
            }),
            StateBacking::Queue(backing) => Self::Queue(QueueCell {
                committed: Mutex::new(backing.snapshot()),
            }),
        }
    }

    fn shape(&self) -> &'static str {
        match self {
            Self::Kv(_) => "key-value",
            Self::Singleton(_) => "singleton",
            Self::Queue(_) => "queue",
        }
    }
}

struct KvCell {
    source: Arc<dyn KvSource>,
    /// Lazily fetched base values; a key is fetched from the source at most
    /// once per container lifetime (a benign double fetch under a race
    /// computes the same value).
    cache: DashMap<Vec<u8>, Option<Bytes>>,
    /// Writes promoted from committed writable views. Shadows `cache`.
    committed: DashMap<Vec<u8>, Option<Bytes>>,
}

impl KvCell {
    fn get(&self, key: &[u8]) -> StateResult<Option<Bytes>> {
        if let Some(value) = self.committed.get(key) {
            return Ok(value.clone());
        }
        if let Some(value) = self.cache.get(key) {
            STATE_METRICS.kv_cache_hits.inc();
            return Ok(value.clone());
        }
        let latency = STATE_METRICS.kv_fetch_latency.start();
        let fetched = self.source.fetch(key)?;
        latency.observe();
        STATE_METRICS.kv_fetches.inc();
        self.cache.insert(key.to_vec(), fetched.clone());
        Ok(fetched)
    }
}

struct SingletonCell {
    source: Arc<dyn SingletonSource>,
    slots: Mutex<SingletonSlots>,
}

#[derive(Default)]
struct SingletonSlots {
    cache: Option<Option<Bytes>>,
    committed: Option<Option<Bytes>>,
}

impl SingletonCell {
    fn get(&self) -> StateResult<Option<Bytes>> {
        let mut slots = self.slots.lock().expect("singleton cell lock poisoned");
        if let Some(value) = &slots.committed {
            return Ok(value.clone());
        }
        if let Some(value) = &slots.cache {
            return Ok(value.clone());
        }
        let fetched = self.source.fetch()?;
        slots.cache = Some(fetched.clone());
        Ok(fetched)
    }

    fn promote(&self, value: Option<Bytes>) {
        let mut slots = self.slots.lock().expect("singleton cell lock poisoned");
        slots.committed = Some(value);
    }
}

struct QueueCell {
    committed: Mutex<VecDeque<Bytes>>,
}

/// Read-only access to one service's states.
pub struct ReadableView<'a> {
    service: &'a str,
    states: &'a BTreeMap<StateId, StateCell>,
}

impl<'a> ReadableView<'a> {
    fn cell(&self, id: StateId) -> StateResult<&'a StateCell> {
        self.states
            .get(&id)
            .ok_or_else(|| StateError::UnknownState(self.service.to_string(), id))
    }

    fn wrong_shape(&self, id: StateId, actual: &'static str, requested: &'static str) -> StateError {
        StateError::WrongShape {
            service: self.service.to_string(),
            id,
            actual,
            requested,
        }
    }

    pub fn kv(&self, id: StateId) -> StateResult<ReadableKv<'a>> {
        match self.cell(id)? {
            StateCell::Kv(cell) => Ok(ReadableKv { cell }),
            other => Err(self.wrong_shape(id, other.shape(), "key-value")),
        }
    }

    pub fn singleton(&self, id: StateId) -> StateResult<ReadableSingleton<'a>> {
        match self.cell(id)? {
            StateCell::Singleton(cell) => Ok(ReadableSingleton { cell }),
            other => Err(self.wrong_shape(id, other.shape(), "singleton")),
        }
    }

    pub fn queue(&self, id: StateId) -> StateResult<ReadableQueue<'a>> {
        match self.cell(id)? {
            StateCell::Queue(cell) => Ok(ReadableQueue { cell }),
            other => Err(self.wrong_shape(id, other.shape(), "queue")),
        }
    }
}

pub struct ReadableKv<'a> {
    cell: &'a KvCell,
}

impl ReadableKv<'_> {
    pub fn get(&self, key: &[u8]) -> StateResult<Option<Bytes>> {
        self.cell.get(key)
    }

    pub fn contains(&self, key: &[u8]) -> StateResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}

pub struct ReadableSingleton<'a> {
    cell: &'a SingletonCell,
}

impl ReadableSingleton<'_> {
    pub fn get(&self) -> StateResult<Option<Bytes>> {
        self.cell.get()
    }
}

pub struct ReadableQueue<'a> {
    cell: &'a QueueCell,
}

impl ReadableQueue<'_> {
    pub fn peek(&self) -> Option<Bytes> {
        self.cell
            .committed
            .lock()
            .expect("queue cell lock poisoned")
            .front()
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.cell
            .committed
            .lock()
            .expect("queue cell lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Write access layered over one service's readable states.
///
/// All mutations accumulate in view-local overlays; reads go through the
/// overlay first, then fall back to the readable layer. Nothing becomes
/// visible outside this view until [`WritableView::commit`] promotes the
/// overlays into the container-local committed layer. Dropping the view
/// without committing discards every pending write.
pub struct WritableView<'a> {
    service: &'a str,
    states: &'a BTreeMap<StateId, StateCell>,
    kv_overlays: HashMap<StateId, HashMap<Vec<u8>, Option<Bytes>>>,
    singleton_overlays: HashMap<StateId, Option<Bytes>>,
    queue_snapshots: HashMap<StateId, VecDeque<Bytes>>,
}

impl WritableView<'_> {
    fn kv_cell(&self, id: StateId) -> StateResult<&KvCell> {
        match self.states.get(&id) {
            Some(StateCell::Kv(cell)) => Ok(cell),
            Some(other) => Err(StateError::WrongShape {
                service: self.service.to_string(),
                id,
                actual: other.shape(),
                requested: "key-value",
            }),
            None => Err(StateError::UnknownState(self.service.to_string(), id)),
        }
    }

    fn singleton_cell(&self, id: StateId) -> StateResult<&SingletonCell> {
        match self.states.get(&id) {
            Some(StateCell::Singleton(cell)) => Ok(cell),
            Some(other) => Err(StateError::WrongShape {
                service: self.service.to_string(),
                id,
                actual: other.shape(),
                requested: "singleton",
            }),
            None => Err(StateError::UnknownState(self.service.to_string(), id)),
        }
    }

    fn queue_cell(&self, id: StateId) -> StateResult<&QueueCell> {
        match self.states.get(&id) {
            Some(StateCell::Queue(cell)) => Ok(cell),
            Some(other) => Err(StateError::WrongShape {
                service: self.service.to_string(),
                id,
                actual: other.shape(),
                requested: "queue",
            }),
            None => Err(StateError::UnknownState(self.service.to_string(), id)),
        }
    }

    /// Read-through-write: pending overlay first, then the readable layer.
    pub fn kv_get(&self, id: StateId, key: &[u8]) -> StateResult<Option<Bytes>> {
        let cell = self.kv_cell(id)?;
        if let Some(overlay) = self.kv_overlays.get(&id)
            && let Some(pending) = overlay.get(key)
        {
            return Ok(pending.clone());
        }
        cell.get(key)
    }

    pub fn kv_put(&mut self, id: StateId, key: &[u8], value: Bytes) -> StateResult<()> {
        self.kv_cell(id)?;
        self.kv_overlays
            .entry(id)
            .or_default()
            .insert(key.to_vec(), Some(value));
        Ok(())
    }

    /// Records a deletion tombstone; the underlying value stays intact.
    pub fn kv_remove(&mut self, id: StateId, key: &[u8]) -> StateResult<()> {
        self.kv_cell(id)?;
        self.kv_overlays
            .entry(id)
            .or_default()
            .insert(key.to_vec(), None);
        Ok(())
    }

    pub fn singleton_get(&self, id: StateId) -> StateResult<Option<Bytes>> {
        let cell = self.singleton_cell(id)?;
        if let Some(pending) = self.singleton_overlays.get(&id) {
            return Ok(pending.clone());
        }
        cell.get()
    }

    pub fn singleton_put(&mut self, id: StateId, value: Bytes) -> StateResult<()> {
        self.singleton_cell(id)?;
        self.singleton_overlays.insert(id, Some(value));
        Ok(())
    }

    pub fn queue_peek(&self, id: StateId) -> StateResult<Option<Bytes>> {
        let cell = self.queue_cell(id)?;
        if let Some(snapshot) = self.queue_snapshots.get(&id) {
            return Ok(snapshot.front().cloned());
        }
        Ok(cell
            .committed
            .lock()
            .expect("queue cell lock poisoned")
            .front()
            .cloned())
    }

    pub fn queue_poll(&mut self, id: StateId) -> StateResult<Option<Bytes>> {
        Ok(self.queue_snapshot_mut(id)?.pop_front())
    }

    pub fn queue_push(&mut self, id: StateId, value: Bytes) -> StateResult<()> {
        self.queue_snapshot_mut(id)?.push_back(value);
        Ok(())
    }

    fn queue_snapshot_mut(&mut self, id: StateId) -> StateResult<&mut VecDeque<Bytes>> {
        let cell = self.queue_cell(id)?;
        if !self.queue_snapshots.contains_key(&id) {
            let snapshot = cell
                .committed
                .lock()
                .expect("queue cell lock poisoned")
                .clone();
            self.queue_snapshots.insert(id, snapshot);
        }
        Ok(self
            .queue_snapshots
            .get_mut(&id)
            .expect("snapshot inserted above"))
    }

    /// Promotes every pending write into the container-local committed
    /// layer, making them visible to subsequent views of the same container.
    /// The registry's backing instances remain untouched.
    pub fn commit(mut self) -> StateResult<()> {
        let kv_overlays = std::mem::take(&mut self.kv_overlays);
        let singleton_overlays = std::mem::take(&mut self.singleton_overlays);
        let queue_snapshots = std::mem::take(&mut self.queue_snapshots);

        for (id, overlay) in kv_overlays {
            let cell = self.kv_cell(id)?;
            for (key, value) in overlay {
                cell.committed.insert(key, value);
            }
        }
        for (id, value) in singleton_overlays {
            self.singleton_cell(id)?.promote(value);
        }
        for (id, snapshot) in queue_snapshots {
            let cell = self.queue_cell(id)?;
            *cell.committed.lock().expect("queue cell lock poisoned") = snapshot;
        }
        Ok(())
    }
}
