//! Structured logging for measurement runs
//!
//! This module provides:
//! - Structured log entries with levels, fields and a per-run session id
//! - Console and JSON output formats
//! - A measurement logger for ping attempts, transfers and stage timings
//! - An error event logger for fatal errors and zero-sample recoveries

use crate::error::{AppError, Result};
use crate::models::{Config, PingStatistics, RunResult, ThroughputSample, ThroughputSeries};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Log level enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl LogLevel {
    /// Get log level name as string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    /// Get ANSI color code for console output
    pub fn color_code(&self) -> &'static str {
        match self {
            LogLevel::Trace => "\x1b[37m",
            LogLevel::Debug => "\x1b[36m",
            LogLevel::Info => "\x1b[32m",
            LogLevel::Warn => "\x1b[33m",
            LogLevel::Error => "\x1b[31m",
        }
    }

    /// Reset ANSI color code
    pub fn reset_code() -> &'static str {
        "\x1b[0m"
    }
}

/// Log entry structure for structured logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    /// Logger name/component
    pub logger: String,
    /// Additional structured fields
    pub fields: HashMap<String, serde_json::Value>,
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogFormat {
    /// Human-readable console format
    Console,
    /// JSON format for log aggregators
    Json,
}

/// Shared logging context
#[derive(Debug, Default)]
struct LogContext {
    /// Correlates every entry of one run
    session_id: Option<String>,
}

/// Logger implementation with multiple output formats
#[derive(Clone)]
pub struct Logger {
    min_level: LogLevel,
    use_color: bool,
    format: LogFormat,
    name: String,
    context: Arc<RwLock<LogContext>>,
}

impl Logger {
    /// Create a new logger
    pub fn new(name: String) -> Self {
        Self {
            min_level: LogLevel::Info,
            use_color: true,
            format: LogFormat::Console,
            name,
            context: Arc::new(RwLock::new(LogContext::default())),
        }
    }

    /// Create a logger with specific configuration.
    ///
    /// Measurement values are always logged at Info, so Info is the floor.
    /// `--verbose` adds per-transfer and per-stage detail, `--debug` adds
    /// every ping sample and switches to JSON.
    pub fn with_config(name: String, config: &Config) -> Self {
        let mut logger = Self::new(name);
        if config.debug {
            logger.set_level(LogLevel::Trace);
            logger.format = LogFormat::Json;
        } else if config.verbose {
            logger.set_level(LogLevel::Debug);
        }
        logger.set_color(config.enable_color);
        logger
    }

    /// Set minimum log level
    pub fn set_level(&mut self, level: LogLevel) {
        self.min_level = level;
    }

    /// Enable or disable colored output
    pub fn set_color(&mut self, use_color: bool) {
        self.use_color = use_color;
    }

    /// Set session correlation ID
    pub async fn set_session_id(&self, session_id: String) {
        let mut context = self.context.write().await;
        context.session_id = Some(session_id);
    }

    /// Create a log entry builder
    pub fn log(&self, level: LogLevel, message: &str) -> LogEntryBuilder<'_> {
        LogEntryBuilder::new(self, level, message.to_string())
    }

    pub fn trace(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Trace, message)
    }

    pub fn debug(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Debug, message)
    }

    pub fn info(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Info, message)
    }

    pub fn warn(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Warn, message)
    }

    pub fn error(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Error, message)
    }

    /// Check if a log level would be output
    pub fn would_log(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    /// Write log entry to output
    async fn write_entry(&self, mut entry: LogEntry) {
        if entry.level < self.min_level {
            return;
        }

        let context = self.context.read().await;
        if let Some(session_id) = &context.session_id {
            entry
                .fields
                .insert("session_id".to_string(), serde_json::Value::String(session_id.clone()));
        }
        drop(context);

        let output = self.format_entry(&entry);

        // Warnings and errors go to stderr
        if entry.level >= LogLevel::Warn {
            let _ = writeln!(io::stderr(), "{}", output);
        } else {
            let _ = writeln!(io::stdout(), "{}", output);
        }
    }

    fn format_entry(&self, entry: &LogEntry) -> String {
        match self.format {
            LogFormat::Console => self.format_console(entry),
            LogFormat::Json => self.format_json(entry),
        }
    }

    /// Format log entry for console output
    fn format_console(&self, entry: &LogEntry) -> String {
        let timestamp = entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f");
        let level_str = entry.level.as_str();

        let formatted_level = if self.use_color {
            format!("{}{:>5}{}", entry.level.color_code(), level_str, LogLevel::reset_code())
        } else {
            format!("{:>5}", level_str)
        };

        let mut output = format!(
            "{} {} [{}] {}",
            timestamp, formatted_level, entry.logger, entry.message
        );

        // session_id is noise on a terminal
        let mut fields: Vec<String> = entry
            .fields
            .iter()
            .filter(|(k, _)| k.as_str() != "session_id")
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        if !fields.is_empty() {
            fields.sort();
            output.push_str(&format!(" {{{}}}", fields.join(", ")));
        }

        output
    }

    /// Format log entry as JSON
    fn format_json(&self, entry: &LogEntry) -> String {
        match serde_json::to_string(entry) {
            Ok(json) => json,
            Err(_) => format!(
                "{{\"error\": \"Failed to serialize log entry\", \"message\": \"{}\"}}",
                entry.message
            ),
        }
    }
}

/// Builder pattern for creating log entries
pub struct LogEntryBuilder<'a> {
    logger: &'a Logger,
    entry: LogEntry,
}

impl<'a> LogEntryBuilder<'a> {
    fn new(logger: &'a Logger, level: LogLevel, message: String) -> Self {
        Self {
            logger,
            entry: LogEntry {
                timestamp: Utc::now(),
                level,
                message,
                logger: logger.name.clone(),
                fields: HashMap::new(),
            },
        }
    }

    /// Add a structured field
    pub fn field<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.entry.fields.insert(key.to_string(), json_value);
        }
        self
    }

    /// Add the fields of one throughput transfer
    pub fn transfer(self, sample: &ThroughputSample) -> Self {
        self.field("direction", sample.direction)
            .field("size_bytes", sample.size_bytes)
            .field("elapsed_ms", sample.elapsed_ms())
            .field("score", sample.score)
            .field("status", sample.status)
    }

    /// Add error information
    pub fn error_info(self, error: &AppError) -> Self {
        self.field("error_category", error.category())
            .field("error_recoverable", error.is_recoverable())
            .field("error_exit_code", error.exit_code())
    }

    /// Finalize and write the log entry
    pub async fn log(self) {
        self.logger.write_entry(self.entry).await;
    }

    #[cfg(test)]
    fn into_entry(self) -> LogEntry {
        self.entry
    }
}

/// Logger for measurement progress and results
#[derive(Clone)]
pub struct MeasurementLogger {
    logger: Logger,
}

impl MeasurementLogger {
    /// Create a new measurement logger
    pub fn new(config: &Config) -> Self {
        Self {
            logger: Logger::with_config("MEASURE".to_string(), config),
        }
    }

    /// Wrap an existing logger
    pub fn from_logger(logger: Logger) -> Self {
        Self { logger }
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Log the start of a pipeline stage
    pub async fn log_stage_start(&self, stage: &str) {
        self.logger.debug(&format!("Stage {} started", stage))
            .field("stage", stage)
            .log()
            .await;
    }

    /// Log the completion of a pipeline stage
    pub async fn log_stage_complete(&self, stage: &str, duration: Duration) {
        self.logger.debug(&format!("Stage {} finished in {:.1}s", stage, duration.as_secs_f64()))
            .field("stage", stage)
            .field("duration_ms", duration.as_secs_f64() * 1000.0)
            .log()
            .await;
    }

    /// Log a probe attempt that returned no value
    pub async fn log_probe_miss(&self, host: &str, attempt: u32) {
        self.logger.debug(&format!("No latency value from {} (attempt {})", host, attempt))
            .field("host", host)
            .field("attempt", attempt)
            .log()
            .await;
    }

    /// Log one accepted ping sample
    pub async fn log_ping_sample(&self, index: usize, latency_ms: f64) {
        if !self.logger.would_log(LogLevel::Trace) {
            return;
        }
        self.logger.trace(&format!("Ping {} = {:.3}ms", index + 1, latency_ms))
            .field("index", index)
            .field("latency_ms", latency_ms)
            .log()
            .await;
    }

    /// Log derived ping statistics
    pub async fn log_ping(&self, stats: &PingStatistics) {
        self.logger.info(&format!("Ping {}", stats.median_ms))
            .field("samples", stats.samples.len())
            .field("failed_attempts", stats.failed_attempts)
            .log()
            .await;
        self.logger.info(&format!("Jitter {}", stats.jitter_ms)).log().await;
    }

    /// Log one timed transfer
    pub async fn log_transfer(&self, sample: &ThroughputSample) {
        let message = format!(
            "{} {} bytes in {:.1}ms -> {:.3}",
            sample.direction,
            sample.size_bytes,
            sample.elapsed_ms(),
            sample.score
        );
        self.logger.debug(&message).transfer(sample).log().await;
    }

    /// Log the raw score sequence of a direction
    pub async fn log_series(&self, series: &ThroughputSeries) {
        let label = match series.direction {
            crate::types::Direction::Download => "Download",
            crate::types::Direction::Upload => "Upload",
        };
        self.logger.info(&format!("{} {:?}", label, series.scores()))
            .field("samples", series.len())
            .field("failed", series.failed_count())
            .log()
            .await;
    }

    /// Log the final values of a run
    pub async fn log_result(&self, result: &RunResult) {
        self.logger.info(&format!("Download Percentile {}", result.download_mbps)).log().await;
        self.logger.info(&format!("Upload Percentile {}", result.upload_mbps)).log().await;
    }

    /// Log a telemetry publish
    pub async fn log_publish(&self, topic: &str, payload: &str) {
        self.logger.info(&format!("MQTT {} payload {}", topic, payload))
            .field("topic", topic)
            .log()
            .await;
    }
}

/// Error event logger with enhanced context
#[derive(Clone)]
pub struct ErrorEventLogger {
    logger: Logger,
}

impl ErrorEventLogger {
    /// Create a new error event logger
    pub fn new(config: &Config) -> Self {
        Self {
            logger: Logger::with_config("ERR".to_string(), config),
        }
    }

    /// Log an application error with full context
    pub async fn log_error(&self, error: &AppError, context: Option<&str>) {
        let message = match context {
            Some(ctx) => format!("{}: {}", ctx, error),
            None => error.to_string(),
        };

        let mut builder = self.logger.error(&message).error_info(error);
        if let Some(ctx) = context {
            builder = builder.field("context", ctx);
        }
        builder.log().await;
    }

    /// Log a failed transfer recorded as a zero sample
    pub async fn log_zero_sample(&self, error: &AppError, sample: &ThroughputSample) {
        let message = format!(
            "{} of {} bytes failed, recording 0: {}",
            sample.direction, sample.size_bytes, error
        );
        self.logger.warn(&message)
            .error_info(error)
            .transfer(sample)
            .log()
            .await;
    }
}

/// Creates loggers that share one session id
pub struct LoggerFactory {
    config: Config,
    session_id: String,
}

impl LoggerFactory {
    /// Create a new logger factory
    pub fn new(config: Config) -> Self {
        Self {
            config,
            session_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create a logger with a specific name
    pub async fn create_logger(&self, name: &str) -> Logger {
        let logger = Logger::with_config(name.to_string(), &self.config);
        logger.set_session_id(self.session_id.clone()).await;
        logger
    }

    /// Create a measurement logger
    pub async fn create_measurement_logger(&self) -> MeasurementLogger {
        MeasurementLogger::from_logger(self.create_logger("MEASURE").await)
    }

    /// Create an error event logger
    pub async fn create_error_logger(&self) -> ErrorEventLogger {
        ErrorEventLogger {
            logger: self.create_logger("ERR").await,
        }
    }

    /// Get session ID
    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}
