use std::time::Duration;
use vise::{Buckets, Counter, Histogram, Metrics, Unit};

const LATENCIES_FAST: Buckets = Buckets::exponential(0.0000001..=1.0, 2.0);

#[derive(Debug, Metrics)]
#[metrics(prefix = "state_container")]
pub(crate) struct StateMetrics {
    /// Lazy reads answered from the per-container cache.
    pub kv_cache_hits: Counter,
    /// Lazy reads that went through to the backing source.
    pub kv_fetches: Counter,
    #[metrics(unit = Unit::Seconds, buckets = LATENCIES_FAST)]
    pub kv_fetch_latency: Histogram<Duration>,
}

#[vise::register]
pub(crate) static STATE_METRICS: vise::Global<StateMetrics> = vise::Global::new();
