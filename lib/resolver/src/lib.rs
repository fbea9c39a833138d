mod entity;
pub use entity::{EntityResolver, ResolveError};

mod block;
pub use block::{BlockError, BlockResolver};
