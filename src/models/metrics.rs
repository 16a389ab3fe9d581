//! Sample and result data models

use crate::{
    defaults,
    stats,
    types::{Direction, Result, TransferStatus},
};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Ping samples of one run with their derived statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingStatistics {
    /// Round-trip times in milliseconds, in collection order
    pub samples: Vec<f64>,
    /// Median round-trip time
    pub median_ms: f64,
    /// Mean absolute difference between consecutive samples
    pub jitter_ms: f64,
    /// Probe attempts that returned no value
    pub failed_attempts: u32,
}

impl PingStatistics {
    /// Derive median and jitter from collected samples
    pub fn from_samples(samples: Vec<f64>, failed_attempts: u32) -> Result<Self> {
        let jitter_ms = stats::jitter(&samples)?;
        let median_ms = stats::median(&samples)?;

        Ok(Self {
            samples,
            median_ms,
            jitter_ms,
            failed_attempts,
        })
    }
}

/// One timed throughput transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThroughputSample {
    pub direction: Direction,
    /// Payload size of the tier this transfer belongs to
    pub size_bytes: u64,
    /// Time between request start and completion, pacing excluded
    pub elapsed: Duration,
    /// Throughput score, `0.0` when the connection failed
    pub score: f64,
    pub status: TransferStatus,
}

impl ThroughputSample {
    /// Build a sample from a completed transfer
    pub fn completed(direction: Direction, size_bytes: u64, elapsed: Duration) -> Result<Self> {
        Ok(Self {
            direction,
            size_bytes,
            elapsed,
            score: stats::throughput_score(size_bytes, elapsed)?,
            status: TransferStatus::Completed,
        })
    }

    /// Build the zero sample recorded for a connection-level failure
    pub fn connection_failed(direction: Direction, size_bytes: u64, elapsed: Duration) -> Self {
        Self {
            direction,
            size_bytes,
            elapsed,
            score: 0.0,
            status: TransferStatus::ConnectionFailed,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.status, TransferStatus::Completed)
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }
}

/// All transfers of one direction, in execution order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThroughputSeries {
    pub direction: Direction,
    pub samples: Vec<ThroughputSample>,
}

impl ThroughputSeries {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            samples: Vec::new(),
        }
    }

    pub fn push(&mut self, sample: ThroughputSample) {
        self.samples.push(sample);
    }

    /// Flat score sequence, zeros included
    pub fn scores(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.score).collect()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of transfers recorded as zero after a connection failure
    pub fn failed_count(&self) -> usize {
        self.samples.iter().filter(|s| !s.is_completed()).count()
    }

    /// Percentile of the score sequence
    pub fn percentile(&self, p: u32) -> Result<f64> {
        stats::percentile(&self.scores(), p as f64)
    }
}

/// Aggregate of one run; serializes to the attributes payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub median_ping: f64,
    pub ping_jitter: f64,
    pub download_mbps: f64,
    pub upload_mbps: f64,
    #[serde(skip, default = "Local::now")]
    pub captured_at: DateTime<Local>,
}

impl RunResult {
    pub fn new(median_ping: f64, ping_jitter: f64, download_mbps: f64, upload_mbps: f64) -> Self {
        Self {
            median_ping,
            ping_jitter,
            download_mbps,
            upload_mbps,
            captured_at: Local::now(),
        }
    }

    /// Set the capture time explicitly
    pub fn with_captured_at(mut self, captured_at: DateTime<Local>) -> Self {
        self.captured_at = captured_at;
        self
    }

    /// JSON object `{median_ping, ping_jitter, download_mbps, upload_mbps}`
    pub fn attributes_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Capture time as `YYYY-MM-DD HH:MM:SS` in local time
    pub fn timestamp_string(&self) -> String {
        self.captured_at.format(defaults::TIMESTAMP_FORMAT).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AppError;
    use chrono::TimeZone;

    #[test]
    fn test_ping_statistics() {
        let stats = PingStatistics::from_samples(vec![10.0, 12.0, 11.0], 2).unwrap();
        assert_eq!(stats.median_ms, 11.0);
        assert_eq!(stats.jitter_ms, 1.5);
        assert_eq!(stats.failed_attempts, 2);
    }

    #[test]
    fn test_ping_statistics_needs_two_samples() {
        let result = PingStatistics::from_samples(vec![10.0], 0);
        assert!(matches!(result, Err(AppError::InsufficientSamples(_))));
    }

    #[test]
    fn test_throughput_sample_score() {
        let sample =
            ThroughputSample::completed(Direction::Download, 1_000_000, Duration::from_millis(500))
                .unwrap();
        assert_eq!(sample.score, 20.0);
        assert!(sample.is_completed());
        assert_eq!(sample.elapsed_ms(), 500.0);

        let three_ms = Duration::from_millis(3);
        let failed = ThroughputSample::connection_failed(Direction::Upload, 100_000, three_ms);
        assert_eq!(failed.score, 0.0);
        assert!(!failed.is_completed());
    }

    #[test]
    fn test_series_scores_keep_order_and_zeros() {
        let mut series = ThroughputSeries::new(Direction::Download);
        let second = Duration::from_secs(1);
        series.push(ThroughputSample::completed(Direction::Download, 100_000, second).unwrap());
        let zero = Duration::ZERO;
        series.push(ThroughputSample::connection_failed(Direction::Download, 100_000, zero));
        series.push(ThroughputSample::completed(Direction::Download, 1_000_000, second).unwrap());

        assert_eq!(series.scores(), vec![1.0, 0.0, 10.0]);
        assert_eq!(series.failed_count(), 1);
        assert_eq!(series.len(), 3);
    }

    #[test]
    fn test_run_result_payloads() {
        let captured = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        let result = RunResult::new(12.5, 1.5, 95.25, 20.0).with_captured_at(captured);

        assert_eq!(result.timestamp_string(), "2024-03-09 07:05:01");

        let json: serde_json::Value =
            serde_json::from_str(&result.attributes_json().unwrap()).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), 4);
        assert_eq!(object["median_ping"], 12.5);
        assert_eq!(object["ping_jitter"], 1.5);
        assert_eq!(object["download_mbps"], 95.25);
        assert_eq!(object["upload_mbps"], 20.0);
    }
}
