//! Throughput sampling over the size ladder

use super::SamplerSettings;
use crate::{
    client::SpeedTestTransport,
    defaults::{DEFAULT_PACING, SIZE_LADDER},
    error::{AppError, Result},
    logging::{ErrorEventLogger, MeasurementLogger},
    models::{Config, ThroughputSample, ThroughputSeries},
    types::{Direction, IterationPlan},
};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Times transfers against the speed-test transport
pub struct ThroughputSampler {
    transport: Arc<dyn SpeedTestTransport>,
    pacing: Duration,
    ladder: Vec<u64>,
    logger: MeasurementLogger,
    error_logger: ErrorEventLogger,
}

impl ThroughputSampler {
    pub fn new(transport: Arc<dyn SpeedTestTransport>) -> Self {
        let config = Config::default();
        Self {
            transport,
            pacing: DEFAULT_PACING,
            ladder: SIZE_LADDER.to_vec(),
            logger: MeasurementLogger::new(&config),
            error_logger: ErrorEventLogger::new(&config),
        }
    }

    /// Create a sampler from shared sampler settings
    pub fn from_settings(
        transport: Arc<dyn SpeedTestTransport>,
        settings: &SamplerSettings,
    ) -> Self {
        Self::new(transport)
            .with_pacing(settings.pacing)
            .with_ladder(settings.size_ladder.clone())
    }

    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_ladder(mut self, ladder: Vec<u64>) -> Self {
        self.ladder = ladder;
        self
    }

    pub fn with_loggers(
        mut self,
        logger: MeasurementLogger,
        error_logger: ErrorEventLogger,
    ) -> Self {
        self.logger = logger;
        self.error_logger = error_logger;
        self
    }

    pub fn ladder(&self) -> &[u64] {
        &self.ladder
    }

    /// Time one download of `size_bytes`
    pub async fn download(&self, size_bytes: u64) -> Result<ThroughputSample> {
        self.transfer(Direction::Download, size_bytes).await
    }

    /// Time one upload of `size_bytes`
    pub async fn upload(&self, size_bytes: u64) -> Result<ThroughputSample> {
        self.transfer(Direction::Upload, size_bytes).await
    }

    /// Time one transfer.
    ///
    /// A connection-level failure yields a zero sample and skips pacing.
    /// Any other failure is returned. Pacing is never part of the timing.
    pub async fn transfer(
        &self,
        direction: Direction,
        size_bytes: u64,
    ) -> Result<ThroughputSample> {
        // Allocated before the clock starts; the transport only clones the handle
        let payload = match direction {
            Direction::Upload => {
                let len = usize::try_from(size_bytes).map_err(|_| {
                    AppError::invalid_input(format!(
                        "Upload size {} does not fit in memory",
                        size_bytes
                    ))
                })?;
                Bytes::from(vec![0u8; len])
            }
            Direction::Download => Bytes::new(),
        };

        let start = Instant::now();
        let outcome = match direction {
            Direction::Download => self.transport.fetch_bytes(size_bytes).await.map(|_| ()),
            Direction::Upload => self.transport.send_bytes(payload).await,
        };
        let elapsed = start.elapsed();

        match outcome {
            Ok(()) => {
                let sample = ThroughputSample::completed(direction, size_bytes, elapsed)?;
                self.logger.log_transfer(&sample).await;
                if !self.pacing.is_zero() {
                    sleep(self.pacing).await;
                }
                Ok(sample)
            }
            Err(error) if error.is_recoverable() => {
                let sample = ThroughputSample::connection_failed(direction, size_bytes, elapsed);
                self.error_logger.log_zero_sample(&error, &sample).await;
                Ok(sample)
            }
            Err(error) => Err(error),
        }
    }

    /// Run every tier of `plan` in ladder order.
    ///
    /// The plan is checked against the ladder before any transfer starts.
    pub async fn run_plan(
        &self,
        direction: Direction,
        plan: &IterationPlan,
    ) -> Result<ThroughputSeries> {
        let tiers = plan.tiers(&self.ladder)?;
        let mut series = ThroughputSeries::new(direction);

        for (size_bytes, count) in tiers {
            for _ in 0..count {
                let sample = self.transfer(direction, size_bytes).await?;
                series.push(sample);
            }
        }

        self.logger.log_series(&series).await;
        Ok(series)
    }
}
