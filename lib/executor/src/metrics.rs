use std::time::Duration;
use vise::{Buckets, Counter, Histogram, Metrics, Unit};

const LATENCIES: Buckets = Buckets::exponential(0.0001..=10.0, 4.0);
const PROBES: Buckets = Buckets::exponential(1.0..=64.0, 2.0);

#[derive(Debug, Metrics)]
#[metrics(prefix = "executor")]
pub(crate) struct ExecutorMetrics {
    pub calls: Counter,
    pub estimations: Counter,
    /// Engine runs needed for one gas estimation.
    #[metrics(buckets = PROBES)]
    pub estimation_probes: Histogram<u64>,
    #[metrics(unit = Unit::Seconds, buckets = LATENCIES)]
    pub execution_latency: Histogram<Duration>,
}

#[vise::register]
pub(crate) static EXECUTOR_METRICS: vise::Global<ExecutorMetrics> = vise::Global::new();
