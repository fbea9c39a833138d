use alloy::primitives::Bytes;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

/// Small integer identifying one state within a service namespace.
pub type StateId = u16;

/// Backing source for a key-value shaped state. Implementations typically
/// close over a repository handle and an as-of timestamp, so the first read
/// of a key triggers a point-in-time relational lookup.
pub trait KvSource: Send + Sync {
    fn fetch(&self, key: &[u8]) -> anyhow::Result<Option<Bytes>>;
}

/// Backing source for a singleton-cell shaped state.
pub trait SingletonSource: Send + Sync {
    fn fetch(&self) -> anyhow::Result<Option<Bytes>>;
}

/// Seed contents for a queue-shaped state. Containers copy the seed on
/// construction; the registry instance itself is never mutated.
#[derive(Debug, Default)]
pub struct QueueBacking {
    items: VecDeque<Bytes>,
}

impl QueueBacking {
    pub fn new(items: impl IntoIterator<Item = Bytes>) -> Self {
        Self {
            items: items.into_iter().collect(),
        }
    }

    pub(crate) fn snapshot(&self) -> VecDeque<Bytes> {
        self.items.clone()
    }
}

/// One registered backing instance: exactly one of the three state shapes.
#[derive(Clone)]
pub enum StateBacking {
    Kv(Arc<dyn KvSource>),
    Singleton(Arc<dyn SingletonSource>),
    Queue(Arc<QueueBacking>),
}

impl StateBacking {
    pub fn kv(source: impl KvSource + 'static) -> Self {
        Self::Kv(Arc::new(source))
    }

    pub fn singleton(source: impl SingletonSource + 'static) -> Self {
        Self::Singleton(Arc::new(source))
    }

    pub fn queue(backing: QueueBacking) -> Self {
        Self::Queue(Arc::new(backing))
    }

    pub fn shape(&self) -> &'static str {
        match self {
            Self::Kv(_) => "key-value",
            Self::Singleton(_) => "singleton",
            Self::Queue(_) => "queue",
        }
    }

    /// Identity comparison: two backings are the same iff they are the same
    /// registered instance, not merely equal in content.
    pub fn same_instance(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Kv(a), Self::Kv(b)) => std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b)),
            (Self::Singleton(a), Self::Singleton(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            (Self::Queue(a), Self::Queue(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for StateBacking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StateBacking").field(&self.shape()).finish()
    }
}
