use smart_config::{DescribeConfig, DeserializeConfig};

#[derive(Clone, Debug, DescribeConfig, DeserializeConfig)]
#[config(derive(Default))]
pub struct ExecutorConfig {
    /// Hard upper bound on the gas limit of any execution, including
    /// gas-estimation probes.
    #[config(default_t = 15_000_000)]
    pub max_gas_cap: u64,
    /// Cost charged before a single instruction runs; lower bound of the
    /// estimation search.
    #[config(default_t = 21_000)]
    pub intrinsic_gas: u64,
    /// Gas limit applied to plain calls that do not carry one.
    #[config(default_t = 10_000_000)]
    pub default_call_gas: u64,
    /// The estimation search stops once `high - low` is within this many gas
    /// units. Zero means converge to the exact minimum.
    #[config(default_t = 0)]
    pub estimation_tolerance: u64,
    /// Probe budget for one estimation; exceeded means the request fails
    /// rather than spinning.
    #[config(default_t = 64)]
    pub max_search_iterations: u32,
}
