//! Configuration data model and validation

use crate::{
    defaults,
    stats::percentile_rank,
    types::{AppError, Direction, IterationPlan, PrimaryPayload, Result},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Main application configuration, read once at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// MQTT broker host
    #[serde(default = "default_mqtt_server")]
    pub mqtt_server: String,

    /// MQTT broker port
    #[serde(default = "default_mqtt_port")]
    pub mqtt_port: u16,

    /// MQTT username, only used together with a password
    #[serde(default)]
    pub mqtt_username: Option<String>,

    /// MQTT password, only used together with a username
    #[serde(default, skip_serializing)]
    pub mqtt_password: Option<String>,

    /// Primary topic; attributes are published to `<topic>/attributes`
    #[serde(default = "default_mqtt_topic")]
    pub mqtt_topic: String,

    /// What the primary topic carries
    #[serde(default)]
    pub primary_payload: PrimaryPayload,

    /// Number of successful ping samples per run
    #[serde(default = "default_ping_count")]
    pub ping_count: u32,

    /// Host the latency probe targets
    #[serde(default = "default_ping_host")]
    pub ping_host: String,

    /// Probe attempts per ping sample, 0 retries until a value arrives
    #[serde(default = "default_ping_max_attempts")]
    pub ping_max_attempts: u32,

    /// Percentile reported for both throughput directions
    #[serde(default = "default_percentile")]
    pub percentile: u32,

    /// Download repeat counts per size tier
    #[serde(default = "default_download_iterations")]
    pub download_iterations: IterationPlan,

    /// Upload repeat counts per size tier
    #[serde(default = "default_upload_iterations")]
    pub upload_iterations: IterationPlan,

    /// Speed-test base URL
    #[serde(default = "default_speedtest_url")]
    pub speedtest_url: String,

    /// Sleep after each transfer
    #[serde(default = "default_pacing_secs")]
    pub pacing_seconds: u64,

    /// Connect and idle-read timeout for speed-test transfers, also bounds MQTT publishes
    #[serde(default = "default_timeout_secs")]
    pub timeout_seconds: u64,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,

    /// Enable debug output
    #[serde(default)]
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mqtt_server: default_mqtt_server(),
            mqtt_port: default_mqtt_port(),
            mqtt_username: None,
            mqtt_password: None,
            mqtt_topic: default_mqtt_topic(),
            primary_payload: PrimaryPayload::default(),
            ping_count: default_ping_count(),
            ping_host: default_ping_host(),
            ping_max_attempts: default_ping_max_attempts(),
            percentile: default_percentile(),
            download_iterations: default_download_iterations(),
            upload_iterations: default_upload_iterations(),
            speedtest_url: default_speedtest_url(),
            pacing_seconds: default_pacing_secs(),
            timeout_seconds: default_timeout_secs(),
            enable_color: default_enable_color(),
            verbose: false,
            debug: false,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Get the pacing interval as Duration
    pub fn pacing(&self) -> Duration {
        Duration::from_secs(self.pacing_seconds)
    }

    /// Credentials, only when both username and password are set
    pub fn mqtt_credentials(&self) -> Option<(&str, &str)> {
        match (self.mqtt_username.as_deref(), self.mqtt_password.as_deref()) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => Some((user, pass)),
            _ => None,
        }
    }

    /// Topic carrying the JSON attributes object
    pub fn attributes_topic(&self) -> String {
        format!("{}/{}", self.mqtt_topic, defaults::ATTRIBUTES_SUFFIX)
    }

    /// Iteration plan for a direction
    pub fn plan(&self, direction: Direction) -> &IterationPlan {
        match direction {
            Direction::Download => &self.download_iterations,
            Direction::Upload => &self.upload_iterations,
        }
    }

    /// Validate the configuration; every failure is a configuration error
    /// raised before any network activity
    pub fn validate(&self) -> Result<()> {
        if self.mqtt_server.trim().is_empty() {
            return Err(AppError::config("MQTT server cannot be empty"));
        }

        if self.mqtt_port == 0 {
            return Err(AppError::config("MQTT port must be greater than 0"));
        }

        if self.mqtt_topic.is_empty() {
            return Err(AppError::config("MQTT topic cannot be empty"));
        }

        if self.mqtt_topic.contains(['+', '#']) {
            return Err(AppError::config(format!(
                "MQTT topic cannot contain wildcards: {}",
                self.mqtt_topic
            )));
        }

        if self.ping_count < 2 {
            return Err(AppError::config(format!(
                "Ping count must be at least 2 to compute jitter, got: {}",
                self.ping_count
            )));
        }

        if self.ping_host.trim().is_empty() {
            return Err(AppError::config("Ping host cannot be empty"));
        }

        if self.percentile > 100 {
            return Err(AppError::config(format!(
                "Percentile must be between 0 and 100, got: {}",
                self.percentile
            )));
        }

        for direction in [Direction::Download, Direction::Upload] {
            self.validate_plan(direction)?;
        }

        match url::Url::parse(&self.speedtest_url) {
            Ok(parsed) => {
                if parsed.scheme() != "https" && parsed.scheme() != "http" {
                    return Err(AppError::config(format!(
                        "Speed-test URL must use http or https: {}",
                        self.speedtest_url
                    )));
                }
                if parsed.host_str().is_none() {
                    return Err(AppError::config(format!(
                        "Speed-test URL must have a host: {}",
                        self.speedtest_url
                    )));
                }
            }
            Err(e) => {
                return Err(AppError::config(format!(
                    "Invalid speed-test URL '{}': {}",
                    self.speedtest_url, e
                )));
            }
        }

        if self.timeout_seconds == 0 {
            return Err(AppError::config("Timeout must be greater than 0"));
        }

        Ok(())
    }

    fn validate_plan(&self, direction: Direction) -> Result<()> {
        let plan = self.plan(direction);
        let name = format!("{}_ITERATIONS", direction.name().to_uppercase());

        if plan.is_empty() {
            return Err(AppError::config(format!("{} cannot be empty", name)));
        }

        plan.tiers(&defaults::SIZE_LADDER)
            .map_err(|e| AppError::config(format!("{}: {}", name, e)))?;

        // The percentile index must exist for the number of samples the plan yields
        percentile_rank(plan.total_transfers(), self.percentile as f64).map_err(|e| {
            AppError::config(format!(
                "PERCENTILE {} cannot be taken over the {} samples of {} ({})",
                self.percentile,
                plan.total_transfers(),
                name,
                e
            ))
        })?;

        Ok(())
    }

    /// Merge process environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        self.merge_from_lookup(|key| std::env::var(key).ok())
    }

    /// Merge values from an arbitrary key lookup into this configuration
    pub fn merge_from_lookup<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(server) = lookup("MQTT_SERVER") {
            self.mqtt_server = server.trim().to_string();
        }

        if let Some(port) = lookup("MQTT_SERVER_PORT") {
            self.mqtt_port = parse_var("MQTT_SERVER_PORT", &port)?;
        }

        if let Some(username) = lookup("MQTT_USERNAME") {
            self.mqtt_username = Some(username).filter(|s| !s.is_empty());
        }

        if let Some(password) = lookup("MQTT_PASSWORD") {
            self.mqtt_password = Some(password).filter(|s| !s.is_empty());
        }

        if let Some(topic) = lookup("MQTT_TOPIC") {
            self.mqtt_topic = topic.trim().to_string();
        }

        if let Some(payload) = lookup("PRIMARY_PAYLOAD") {
            self.primary_payload = payload.parse()?;
        }

        if let Some(ping_count) = lookup("PING_COUNT") {
            self.ping_count = parse_var("PING_COUNT", &ping_count)?;
        }

        if let Some(host) = lookup("PING_HOST") {
            self.ping_host = host.trim().to_string();
        }

        if let Some(attempts) = lookup("PING_MAX_ATTEMPTS") {
            self.ping_max_attempts = parse_var("PING_MAX_ATTEMPTS", &attempts)?;
        }

        if let Some(percentile) = lookup("PERCENTILE") {
            self.percentile = parse_var("PERCENTILE", &percentile)?;
        }

        if let Some(plan) = lookup("DOWNLOAD_ITERATIONS") {
            self.download_iterations = parse_var("DOWNLOAD_ITERATIONS", &plan)?;
        }

        if let Some(plan) = lookup("UPLOAD_ITERATIONS") {
            self.upload_iterations = parse_var("UPLOAD_ITERATIONS", &plan)?;
        }

        if let Some(url) = lookup("SPEEDTEST_URL") {
            self.speedtest_url = url.trim().trim_end_matches('/').to_string();
        }

        if let Some(pacing) = lookup("PACING_SECONDS") {
            self.pacing_seconds = parse_var("PACING_SECONDS", &pacing)?;
        }

        if let Some(timeout) = lookup("TIMEOUT_SECONDS") {
            self.timeout_seconds = parse_var("TIMEOUT_SECONDS", &timeout)?;
        }

        if let Some(enable_color) = lookup("ENABLE_COLOR") {
            self.enable_color = parse_var("ENABLE_COLOR", &enable_color)?;
        }

        Ok(())
    }
}

/// Parse one variable, naming it in the error
fn parse_var<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))
}

fn default_mqtt_server() -> String {
    defaults::DEFAULT_MQTT_SERVER.to_string()
}

fn default_mqtt_port() -> u16 {
    defaults::DEFAULT_MQTT_PORT
}

fn default_mqtt_topic() -> String {
    defaults::DEFAULT_MQTT_TOPIC.to_string()
}

fn default_ping_count() -> u32 {
    defaults::DEFAULT_PING_COUNT
}

fn default_ping_host() -> String {
    defaults::DEFAULT_PING_HOST.to_string()
}

fn default_ping_max_attempts() -> u32 {
    defaults::DEFAULT_PING_MAX_ATTEMPTS
}

fn default_percentile() -> u32 {
    defaults::DEFAULT_PERCENTILE
}

fn default_download_iterations() -> IterationPlan {
    IterationPlan::from(defaults::DEFAULT_DOWNLOAD_ITERATIONS)
}

fn default_upload_iterations() -> IterationPlan {
    IterationPlan::from(defaults::DEFAULT_UPLOAD_ITERATIONS)
}

fn default_speedtest_url() -> String {
    defaults::DEFAULT_SPEEDTEST_URL.to_string()
}

fn default_pacing_secs() -> u64 {
    defaults::DEFAULT_PACING.as_secs()
}

fn default_timeout_secs() -> u64 {
    defaults::DEFAULT_TIMEOUT.as_secs()
}

fn default_enable_color() -> bool {
    defaults::DEFAULT_ENABLE_COLOR
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert_eq!(config.ping_count, 20);
        assert_eq!(config.percentile, 90);
        assert_eq!(config.download_iterations.counts(), &[10, 8, 6, 4, 2]);
        assert_eq!(config.upload_iterations.counts(), &[8, 6, 4, 2]);
        assert_eq!(config.mqtt_port, 1883);
        assert_eq!(config.pacing(), Duration::from_secs(5));
        assert_eq!(config.attributes_topic(), "speedtest/attributes");
        assert!(config.mqtt_credentials().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_merge_from_lookup() {
        let mut config = Config::default();
        config.merge_from_lookup(lookup_from(&[
            ("MQTT_SERVER", "broker.lan"),
            ("MQTT_SERVER_PORT", "8883"),
            ("MQTT_USERNAME", "ha"),
            ("MQTT_PASSWORD", "secret"),
            ("PING_COUNT", "5"),
            ("PERCENTILE", "50"),
            ("DOWNLOAD_ITERATIONS", "3,2"),
            ("UPLOAD_ITERATIONS", "1"),
            ("PRIMARY_PAYLOAD", "json"),
            ("SPEEDTEST_URL", "https://speed.example.com/"),
        ])).unwrap();

        assert_eq!(config.mqtt_server, "broker.lan");
        assert_eq!(config.mqtt_port, 8883);
        assert_eq!(config.mqtt_credentials(), Some(("ha", "secret")));
        assert_eq!(config.ping_count, 5);
        assert_eq!(config.percentile, 50);
        assert_eq!(config.download_iterations.counts(), &[3, 2]);
        assert_eq!(config.upload_iterations.counts(), &[1]);
        assert_eq!(config.primary_payload, PrimaryPayload::Json);
        assert_eq!(config.speedtest_url, "https://speed.example.com");
    }

    #[test]
    fn test_credentials_need_both_parts() {
        let mut config = Config::default();
        config.merge_from_lookup(lookup_from(&[("MQTT_USERNAME", "ha")])).unwrap();
        assert!(config.mqtt_credentials().is_none());

        config.merge_from_lookup(lookup_from(&[("MQTT_PASSWORD", "")])).unwrap();
        assert!(config.mqtt_credentials().is_none());
    }

    #[test]
    fn test_non_numeric_values_rejected() {
        for (key, value) in [
            ("PING_COUNT", "twenty"),
            ("PERCENTILE", "ninety"),
            ("MQTT_SERVER_PORT", "port"),
            ("DOWNLOAD_ITERATIONS", "10,eight"),
            ("UPLOAD_ITERATIONS", ""),
            ("PACING_SECONDS", "-1"),
            ("ENABLE_COLOR", "maybe"),
        ] {
            let mut config = Config::default();
            let result = config.merge_from_lookup(lookup_from(&[(key, value)]));
            assert!(
                matches!(result, Err(AppError::Config(_))),
                "{} = {:?} should fail",
                key,
                value
            );
        }
    }

    #[test]
    fn test_plan_longer_than_ladder_is_invalid() {
        let mut config = Config::default();
        config.download_iterations = IterationPlan::new(vec![1; defaults::SIZE_LADDER.len() + 1]);

        let error = config.validate().unwrap_err();
        assert!(matches!(error, AppError::Config(_)));
        assert!(error.to_string().contains("DOWNLOAD_ITERATIONS"));
    }

    #[test]
    fn test_unusable_percentile_is_invalid() {
        let mut config = Config::default();
        config.percentile = 100;
        assert!(matches!(config.validate(), Err(AppError::Config(_))));

        // one upload sample at p50 has a fractional rank below the first element
        let mut config = Config::default();
        config.upload_iterations = IterationPlan::new(vec![1]);
        config.percentile = 50;
        assert!(matches!(config.validate(), Err(AppError::Config(_))));

        let mut config = Config::default();
        config.percentile = 101;
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_zero_transfer_plan_is_invalid() {
        let mut config = Config::default();
        config.upload_iterations = IterationPlan::new(vec![0, 0]);
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_other_validation_rules() {
        let mut config = Config::default();
        config.ping_count = 1;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.mqtt_topic = "speedtest/#".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.speedtest_url = "ftp://speed.example.com".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.speedtest_url = "not a url".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.timeout_seconds = 0;
        assert!(config.validate().is_err());
    }
}
