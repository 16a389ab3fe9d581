//! Latency sampling with per-sample retries

use super::SamplerSettings;
use crate::{
    client::LatencyProbe,
    defaults::{DEFAULT_PING_MAX_ATTEMPTS, DEFAULT_PING_RETRY_DELAY},
    error::{AppError, Result},
    logging::MeasurementLogger,
    models::{Config, PingStatistics},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// How often a single latency sample is retried before giving up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeRetryPolicy {
    /// Attempts per sample, 0 retries forever
    pub max_attempts: u32,
    /// Pause between attempts
    pub retry_delay: Duration,
}

impl ProbeRetryPolicy {
    pub fn new(max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            max_attempts,
            retry_delay,
        }
    }

    /// Retry until the probe answers
    pub fn unbounded(retry_delay: Duration) -> Self {
        Self::new(0, retry_delay)
    }

    pub fn is_unbounded(&self) -> bool {
        self.max_attempts == 0
    }

    /// Whether `attempts` failed attempts exhaust the policy
    pub fn is_exhausted(&self, attempts: u32) -> bool {
        !self.is_unbounded() && attempts >= self.max_attempts
    }
}

impl Default for ProbeRetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_PING_MAX_ATTEMPTS, DEFAULT_PING_RETRY_DELAY)
    }
}

/// Collects latency samples and derives median and jitter
pub struct PingSampler {
    probe: Arc<dyn LatencyProbe>,
    host: String,
    count: u32,
    policy: ProbeRetryPolicy,
    logger: MeasurementLogger,
}

impl PingSampler {
    pub fn new(
        probe: Arc<dyn LatencyProbe>,
        host: impl Into<String>,
        count: u32,
        policy: ProbeRetryPolicy,
    ) -> Self {
        Self {
            probe,
            host: host.into(),
            count,
            policy,
            logger: MeasurementLogger::new(&Config::default()),
        }
    }

    /// Create a sampler from shared sampler settings
    pub fn from_settings(probe: Arc<dyn LatencyProbe>, settings: &SamplerSettings) -> Self {
        Self::new(probe, settings.ping_host.clone(), settings.ping_count, settings.retry_policy)
    }

    pub fn with_logger(mut self, logger: MeasurementLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Probe until one usable value arrives.
    ///
    /// Returns the latency and the number of attempts that produced nothing.
    /// A missing, non-positive or non-finite value counts as no answer.
    pub async fn sample_once(&self) -> Result<(f64, u32)> {
        let mut attempts: u32 = 0;
        loop {
            if let Some(latency) = self.probe.probe_latency(&self.host).await? {
                if latency.is_finite() && latency > 0.0 {
                    return Ok((latency, attempts));
                }
            }

            attempts += 1;
            self.logger.log_probe_miss(&self.host, attempts).await;

            if self.policy.is_exhausted(attempts) {
                return Err(AppError::probe_timeout(format!(
                    "{} gave no latency value after {} attempts",
                    self.host, attempts
                )));
            }

            if !self.policy.retry_delay.is_zero() {
                tokio::time::sleep(self.policy.retry_delay).await;
            }
        }
    }

    /// Collect `count` samples in order
    pub async fn collect(&self) -> Result<(Vec<f64>, u32)> {
        let mut samples = Vec::with_capacity(self.count as usize);
        let mut failed_attempts: u32 = 0;

        for index in 0..self.count as usize {
            let (latency, misses) = self.sample_once().await?;
            self.logger.log_ping_sample(index, latency).await;
            samples.push(latency);
            failed_attempts = failed_attempts.saturating_add(misses);
        }

        Ok((samples, failed_attempts))
    }

    /// Collect samples and derive median and jitter
    pub async fn run(&self) -> Result<PingStatistics> {
        let (samples, failed_attempts) = self.collect().await?;
        PingStatistics::from_samples(samples, failed_attempts)
    }
}
