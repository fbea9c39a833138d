use vise::{Buckets, Counter, Histogram, Metrics};

const ATTEMPTS: Buckets = Buckets::linear(1.0..=10.0, 1.0);

#[derive(Debug, Metrics)]
#[metrics(prefix = "system_files")]
pub(crate) struct SystemFilesMetrics {
    pub cache_hits: Counter,
    pub cache_misses: Counter,
    /// Fetch/decode attempts needed to materialize a snapshot.
    #[metrics(buckets = ATTEMPTS)]
    pub decode_attempts: Histogram<u64>,
    /// Loads that fell back to the genesis default.
    pub genesis_fallbacks: Counter,
}

#[vise::register]
pub(crate) static SYSTEM_FILES_METRICS: vise::Global<SystemFilesMetrics> = vise::Global::new();
