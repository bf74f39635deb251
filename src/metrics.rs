use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, Histogram, register_counter, register_gauge, register_histogram};


lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("hotpot_cook_requests_total", "Total number of cook requests").unwrap();
    pub static ref CACHE_HITS: Counter =
        register_counter!("hotpot_cache_hits_total", "Total cache hits").unwrap();
    pub static ref CACHE_MISSES: Counter =
        register_counter!("hotpot_cache_misses_total", "Total cache misses").unwrap();
    pub static ref GENERATION_FAILURES: Counter = register_counter!(
        "hotpot_generation_failures_total",
        "Generation calls that errored or returned no content"
    )
    .unwrap();
    pub static ref SOFT_FAILURES: Counter = register_counter!(
        "hotpot_soft_failures_total",
        "Replies that could not be parsed and were replaced by the placeholder dish"
    )
    .unwrap();
    pub static ref DEGRADED_KEYS: Counter = register_counter!(
        "hotpot_degraded_keys_total",
        "Keys built from recipe lineage that could not be canonically ordered"
    )
    .unwrap();
    pub static ref REQUEST_LATENCY: Histogram = register_histogram!(
        "hotpot_cook_latency_seconds",
        "Cook latency in seconds"
    )
    .unwrap();
    pub static ref CACHE_SIZE: Gauge =
        register_gauge!("hotpot_cache_size", "Current number of dishes in cache").unwrap();
}
