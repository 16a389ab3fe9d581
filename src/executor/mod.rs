//! Measurement execution engine
//!
//! This module contains the samplers that drive the network collaborators:
//! - Ping sampling with a bounded retry policy per sample
//! - Throughput sampling over the size ladder with pacing between transfers

pub mod ping;
pub mod throughput;

pub use ping::{PingSampler, ProbeRetryPolicy};
pub use throughput::ThroughputSampler;

use crate::{
    defaults::{DEFAULT_PING_RETRY_DELAY, SIZE_LADDER},
    models::Config,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Sampling parameters shared by both samplers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplerSettings {
    /// Host the latency probe targets
    pub ping_host: String,
    /// Number of latency samples to collect
    pub ping_count: u32,
    /// Retry policy applied to each latency sample
    pub retry_policy: ProbeRetryPolicy,
    /// Pause after every completed transfer
    pub pacing: Duration,
    /// Transfer sizes in bytes, smallest first
    pub size_ladder: Vec<u64>,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for SamplerSettings {
    fn from(config: &Config) -> Self {
        Self {
            ping_host: config.ping_host.clone(),
            ping_count: config.ping_count,
            retry_policy: ProbeRetryPolicy::new(config.ping_max_attempts, DEFAULT_PING_RETRY_DELAY),
            pacing: config.pacing(),
            size_ladder: SIZE_LADDER.to_vec(),
        }
    }
}
