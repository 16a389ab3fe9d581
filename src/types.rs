//! Type definitions shared across the measurement pipeline

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// Direction of a throughput transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Fetch bytes from the speed-test endpoint
    Download,
    /// Send bytes to the speed-test endpoint
    Upload,
}

impl Direction {
    /// Lowercase name used in logs and environment variable prefixes
    pub fn name(&self) -> &'static str {
        match self {
            Direction::Download => "download",
            Direction::Upload => "upload",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of a single throughput transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferStatus {
    /// Transfer completed and was timed
    Completed,
    /// Connection-level failure, recorded as a zero score
    ConnectionFailed,
}

/// What the primary topic carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimaryPayload {
    /// Human-readable capture time
    #[default]
    Timestamp,
    /// The same JSON object as the attributes topic
    Json,
}

impl FromStr for PrimaryPayload {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "timestamp" => Ok(PrimaryPayload::Timestamp),
            "json" => Ok(PrimaryPayload::Json),
            other => Err(AppError::config(format!(
                "PRIMARY_PAYLOAD must be 'timestamp' or 'json', got: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for PrimaryPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimaryPayload::Timestamp => f.write_str("timestamp"),
            PrimaryPayload::Json => f.write_str("json"),
        }
    }
}

/// Per-stage repeat counts, positionally paired with the size ladder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IterationPlan(Vec<u32>);

impl IterationPlan {
    pub fn new(counts: Vec<u32>) -> Self {
        Self(counts)
    }

    pub fn counts(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of transfers the plan performs across all tiers
    pub fn total_transfers(&self) -> usize {
        self.0.iter().map(|&count| count as usize).sum()
    }

    /// Pair every repeat count with its ladder tier.
    ///
    /// A plan longer than the ladder is rejected rather than truncated.
    pub fn tiers(&self, ladder: &[u64]) -> Result<Vec<(u64, u32)>> {
        if self.0.len() > ladder.len() {
            return Err(AppError::config(format!(
                "Iteration plan has {} entries but the size ladder only has {} tiers",
                self.0.len(),
                ladder.len()
            )));
        }

        Ok(ladder.iter().copied().zip(self.0.iter().copied()).collect())
    }
}

impl FromStr for IterationPlan {
    type Err = AppError;

    /// Parse a comma-separated list such as `10,8,6,4,2`
    fn from_str(s: &str) -> Result<Self> {
        if s.trim().is_empty() {
            return Err(AppError::config("Iteration plan cannot be empty"));
        }

        let counts = s
            .split(',')
            .map(|part| {
                let part = part.trim();
                part.parse::<u32>().map_err(|e| {
                    AppError::config(format!("Invalid iteration count '{}': {}", part, e))
                })
            })
            .collect::<Result<Vec<u32>>>()?;

        Ok(Self(counts))
    }
}

impl fmt::Display for IterationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<String> = self.0.iter().map(|c| c.to_string()).collect();
        f.write_str(&joined.join(","))
    }
}

impl From<&[u32]> for IterationPlan {
    fn from(counts: &[u32]) -> Self {
        Self(counts.to_vec())
    }
}
