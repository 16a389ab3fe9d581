//! Speedtest Publisher
//!
//! Measures ping latency, jitter and download/upload throughput against a
//! speed-test endpoint and publishes one aggregated result per run to an
//! MQTT broker, typically for a home-automation dashboard.

pub mod app;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod models;
pub mod output;
pub mod publisher;
pub mod stats;
pub mod types;

// Re-export commonly used types
pub use app::{App, RunReport, RunStage};
pub use client::{HttpSpeedClient, LatencyProbe, SpeedTestTransport, TcpLatencyProbe};
pub use error::{AppError, Result};
pub use executor::{PingSampler, ProbeRetryPolicy, SamplerSettings, ThroughputSampler};
pub use models::{Config, PingStatistics, RunResult, ThroughputSample, ThroughputSeries};
pub use publisher::{
    MqttPublisher, PublishOptions, TelemetryMessage, TelemetryPublisher, TelemetrySink,
};
pub use types::{Direction, IterationPlan, PrimaryPayload};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");

/// Default configuration values and fixed measurement constants
pub mod defaults {
    use std::time::Duration;

    /// Byte-count tiers exercised by the iteration plans, in plan order
    pub const SIZE_LADDER: [u64; 9] = [
        100_000,
        1_000_000,
        10_000_000,
        25_000_000,
        50_000_000,
        100_000_000,
        250_000_000,
        500_000_000,
        1_000_000_000,
    ];

    /// Divisor applied to bytes per second to get the throughput score
    pub const SCORE_DIVISOR: f64 = 100_000.0;

    pub const DEFAULT_PING_COUNT: u32 = 20;
    pub const DEFAULT_PING_HOST: &str = "cloudflare.com";
    pub const DEFAULT_PING_PORT: u16 = 443;
    pub const DEFAULT_PING_MAX_ATTEMPTS: u32 = 50;
    pub const DEFAULT_PING_RETRY_DELAY: Duration = Duration::from_millis(100);
    pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(4);
    pub const DEFAULT_PERCENTILE: u32 = 90;
    pub const DEFAULT_DOWNLOAD_ITERATIONS: &[u32] = &[10, 8, 6, 4, 2];
    pub const DEFAULT_UPLOAD_ITERATIONS: &[u32] = &[8, 6, 4, 2];
    pub const DEFAULT_SPEEDTEST_URL: &str = "https://speed.cloudflare.com";
    pub const DEFAULT_PACING: Duration = Duration::from_secs(5);
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
    pub const DEFAULT_TRANSPORT_RETRIES: u32 = 3;
    pub const DEFAULT_MQTT_SERVER: &str = "localhost";
    pub const DEFAULT_MQTT_PORT: u16 = 1883;
    pub const DEFAULT_MQTT_TOPIC: &str = "speedtest";
    pub const DEFAULT_MQTT_KEEP_ALIVE: Duration = Duration::from_secs(60);
    pub const DEFAULT_ENABLE_COLOR: bool = true;

    /// Suffix of the topic carrying the JSON attributes payload
    pub const ATTRIBUTES_SUFFIX: &str = "attributes";

    /// Local timestamp layout published on the primary topic
    pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
}
