mod backing;
pub use backing::{KvSource, QueueBacking, SingletonSource, StateBacking, StateId};

mod registry;
pub use registry::ServiceRegistry;

mod container;
pub use container::{
    ReadableKv, ReadableQueue, ReadableSingleton, ReadableView, StateContainer, WritableView,
};

mod error;
pub use error::{StateError, StateResult};

mod metrics;
