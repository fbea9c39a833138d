use smart_config::metadata::TimeUnit;
use smart_config::{DescribeConfig, DeserializeConfig};
use std::time::Duration;

#[derive(Clone, Debug, DescribeConfig, DeserializeConfig)]
#[config(derive(Default))]
pub struct SystemFilesConfig {
    /// How long a materialized snapshot is advertised as fresh. Only feeds
    /// the expiration metadata on snapshots; cache entries themselves are
    /// keyed by query and never invalidated by time.
    #[config(default_t = 2 * TimeUnit::Hours)]
    pub cache_ttl: Duration,
}
