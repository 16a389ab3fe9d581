//! Data models and structures for the speed-test publisher

pub mod config;
pub mod metrics;

// Re-export main model types
pub use config::Config;
pub use metrics::{PingStatistics, RunResult, ThroughputSample, ThroughputSeries};
