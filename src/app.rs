//! Run orchestration
//!
//! One run walks `START -> PING -> DOWNLOAD -> UPLOAD -> PUBLISH -> DONE`.
//! Every stage finishes before the next begins and the first fatal error
//! aborts the run.

use crate::{
    client::{HttpSpeedClient, LatencyProbe, SpeedTestTransport, TcpLatencyProbe},
    error::Result,
    executor::{PingSampler, SamplerSettings, ThroughputSampler},
    logging::{ErrorEventLogger, MeasurementLogger},
    models::{Config, PingStatistics, RunResult, ThroughputSeries},
    publisher::{MqttPublisher, TelemetryMessage, TelemetryPublisher, TelemetrySink},
    types::Direction,
};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Pipeline stage of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum RunStage {
    Start,
    Ping,
    Download,
    Upload,
    Publish,
    Done,
}

impl RunStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStage::Start => "START",
            RunStage::Ping => "PING",
            RunStage::Download => "DOWNLOAD",
            RunStage::Upload => "UPLOAD",
            RunStage::Publish => "PUBLISH",
            RunStage::Done => "DONE",
        }
    }

    /// The stage that follows, `None` after `Done`
    pub fn next(&self) -> Option<RunStage> {
        match self {
            RunStage::Start => Some(RunStage::Ping),
            RunStage::Ping => Some(RunStage::Download),
            RunStage::Download => Some(RunStage::Upload),
            RunStage::Upload => Some(RunStage::Publish),
            RunStage::Publish => Some(RunStage::Done),
            RunStage::Done => None,
        }
    }
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a completed run produced
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub ping: PingStatistics,
    pub download: ThroughputSeries,
    pub upload: ThroughputSeries,
    pub result: RunResult,
    pub messages: Vec<TelemetryMessage>,
    pub duration: Duration,
}

/// Main application struct that coordinates all components
pub struct App {
    config: Config,
    probe: Arc<dyn LatencyProbe>,
    transport: Arc<dyn SpeedTestTransport>,
    sink: Arc<dyn TelemetrySink>,
    logger: MeasurementLogger,
    error_logger: ErrorEventLogger,
    stage: RunStage,
    stage_started: Instant,
}

impl App {
    /// Create an application from explicit collaborators
    pub fn new(
        config: Config,
        probe: Arc<dyn LatencyProbe>,
        transport: Arc<dyn SpeedTestTransport>,
        sink: Arc<dyn TelemetrySink>,
    ) -> Self {
        let logger = MeasurementLogger::new(&config);
        let error_logger = ErrorEventLogger::new(&config);
        Self {
            config,
            probe,
            transport,
            sink,
            logger,
            error_logger,
            stage: RunStage::Start,
            stage_started: Instant::now(),
        }
    }

    /// Create an application talking to the real network
    pub fn from_config(config: Config) -> Result<Self> {
        config.validate()?;
        let transport = HttpSpeedClient::from_config(&config)?;
        let sink = MqttPublisher::from_config(&config);
        Ok(Self::new(
            config,
            Arc::new(TcpLatencyProbe::default()),
            Arc::new(transport),
            Arc::new(sink),
        ))
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

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Stage the run is in, or failed in
    pub fn stage(&self) -> RunStage {
        self.stage
    }

    /// Run every stage and return the published result
    pub async fn run(&mut self) -> Result<RunResult> {
        Ok(self.execute().await?.result)
    }

    /// Run every stage and return all intermediate data
    pub async fn execute(&mut self) -> Result<RunReport> {
        let started = Instant::now();
        self.stage = RunStage::Start;
        self.stage_started = started;

        match self.run_stages().await {
            Ok(mut report) => {
                report.duration = started.elapsed();
                Ok(report)
            }
            Err(error) => {
                let context = format!("Run failed during {}", self.stage);
                self.error_logger.log_error(&error, Some(&context)).await;
                Err(error)
            }
        }
    }

    async fn run_stages(&mut self) -> Result<RunReport> {
        self.logger.log_stage_start(RunStage::Start.as_str()).await;
        self.config.validate()?;
        let settings = SamplerSettings::from(&self.config);

        self.advance().await;
        let ping = PingSampler::from_settings(self.probe.clone(), &settings)
            .with_logger(self.logger.clone())
            .run()
            .await?;
        self.logger.log_ping(&ping).await;

        let throughput = ThroughputSampler::from_settings(self.transport.clone(), &settings)
            .with_loggers(self.logger.clone(), self.error_logger.clone());

        self.advance().await;
        let download = throughput
            .run_plan(Direction::Download, &self.config.download_iterations)
            .await?;

        self.advance().await;
        let upload = throughput
            .run_plan(Direction::Upload, &self.config.upload_iterations)
            .await?;

        let result = RunResult::new(
            ping.median_ms,
            ping.jitter_ms,
            download.percentile(self.config.percentile)?,
            upload.percentile(self.config.percentile)?,
        );
        self.logger.log_result(&result).await;

        self.advance().await;
        let messages = TelemetryPublisher::new(self.sink.clone(), &self.config)
            .with_logger(self.logger.clone())
            .publish(&result)
            .await?;

        self.advance().await;

        Ok(RunReport {
            ping,
            download,
            upload,
            result,
            messages,
            duration: Duration::ZERO,
        })
    }

    /// Close the current stage and enter the next one
    async fn advance(&mut self) {
        let Some(next) = self.stage.next() else {
            return;
        };

        self.logger
            .log_stage_complete(self.stage.as_str(), self.stage_started.elapsed())
            .await;
        self.stage = next;
        self.stage_started = Instant::now();
        if next != RunStage::Done {
            self.logger.log_stage_start(next.as_str()).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::AppError,
        publisher::PublishOptions,
        types::IterationPlan,
    };
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FixedProbe(f64);

    #[async_trait]
    impl LatencyProbe for FixedProbe {
        async fn probe_latency(&self, _host: &str) -> Result<Option<f64>> {
            Ok(Some(self.0))
        }
    }

    /// Records every transport call; fails downloads when asked to
    #[derive(Default)]
    struct RecordingTransport {
        calls: Mutex<Vec<(Direction, u64)>>,
        fail_downloads: bool,
    }

    #[async_trait]
    impl SpeedTestTransport for RecordingTransport {
        async fn fetch_bytes(&self, size_bytes: u64) -> Result<u64> {
            self.calls.lock().unwrap().push((Direction::Download, size_bytes));
            if self.fail_downloads {
                return Err(AppError::http_request("HTTP 500"));
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok(size_bytes)
        }

        async fn send_bytes(&self, payload: bytes::Bytes) -> Result<()> {
            self.calls.lock().unwrap().push((Direction::Upload, payload.len() as u64));
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        topics: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TelemetrySink for RecordingSink {
        async fn publish(
            &self,
            topic: &str,
            _payload: &str,
            _options: PublishOptions,
        ) -> Result<()> {
            self.topics.lock().unwrap().push(topic.to_string());
            Ok(())
        }
    }

    fn small_config() -> Config {
        Config {
            ping_count: 3,
            percentile: 50,
            download_iterations: IterationPlan::new(vec![2]),
            upload_iterations: IterationPlan::new(vec![1, 1]),
            pacing_seconds: 0,
            ..Default::default()
        }
    }

    #[test]
    fn test_stage_order() {
        let mut stages = vec![RunStage::Start];
        while let Some(next) = stages.last().and_then(|stage| stage.next()) {
            stages.push(next);
        }
        assert_eq!(
            stages,
            vec![
                RunStage::Start,
                RunStage::Ping,
                RunStage::Download,
                RunStage::Upload,
                RunStage::Publish,
                RunStage::Done,
            ]
        );
        assert_eq!(RunStage::Publish.to_string(), "PUBLISH");
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_reaches_done() {
        let transport = Arc::new(RecordingTransport::default());
        let sink = Arc::new(RecordingSink::default());
        let mut app = App::new(
            small_config(),
            Arc::new(FixedProbe(12.0)),
            transport.clone(),
            sink.clone(),
        );

        let report = app.execute().await.unwrap();

        assert_eq!(app.stage(), RunStage::Done);
        assert_eq!(report.ping.samples.len(), 3);
        assert_eq!(report.result.median_ping, 12.0);
        assert_eq!(report.result.ping_jitter, 0.0);
        assert_eq!(report.download.len(), 2);
        assert_eq!(report.upload.len(), 2);
        // 100 kB in 10ms and 100 kB in 20ms
        assert!((report.result.download_mbps - 100.0).abs() < 1e-9);
        assert_eq!(
            transport.calls.lock().unwrap().clone(),
            vec![
                (Direction::Download, 100_000),
                (Direction::Download, 100_000),
                (Direction::Upload, 100_000),
                (Direction::Upload, 1_000_000),
            ]
        );
        assert_eq!(
            sink.topics.lock().unwrap().clone(),
            vec!["speedtest".to_string(), "speedtest/attributes".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_download_error_skips_publish() {
        let transport = Arc::new(RecordingTransport {
            fail_downloads: true,
            ..Default::default()
        });
        let sink = Arc::new(RecordingSink::default());
        let mut app = App::new(
            small_config(),
            Arc::new(FixedProbe(12.0)),
            transport.clone(),
            sink.clone(),
        );

        let error = app.run().await.unwrap_err();

        assert!(matches!(error, AppError::HttpRequest(_)));
        assert_eq!(app.stage(), RunStage::Download);
        assert_eq!(transport.calls.lock().unwrap().len(), 1);
        assert!(sink.topics.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_config_fails_before_network() {
        let transport = Arc::new(RecordingTransport::default());
        let config = Config {
            download_iterations: IterationPlan::new(vec![1; 10]),
            ..small_config()
        };
        let mut app = App::new(
            config,
            Arc::new(FixedProbe(1.0)),
            transport.clone(),
            Arc::new(RecordingSink::default()),
        );

        let error = app.run().await.unwrap_err();

        assert!(matches!(error, AppError::Config(_)));
        assert_eq!(app.stage(), RunStage::Start);
        assert!(transport.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_from_config_rejects_invalid_config() {
        let config = Config {
            ping_count: 1,
            ..Default::default()
        };
        assert!(matches!(App::from_config(config), Err(AppError::Config(_))));
    }
}
