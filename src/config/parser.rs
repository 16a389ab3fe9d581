//! Configuration parsing from CLI arguments and environment variables

use crate::{
    cli::Cli,
    config::env::{EnvManager, ENV_FILE},
    error::Result,
    models::Config,
};
use std::path::{Path, PathBuf};

/// Configuration parser that layers defaults, .env, environment and CLI
pub struct ConfigParser {
    cli: Cli,
    env_file: PathBuf,
}

impl ConfigParser {
    /// Create a new configuration parser with CLI arguments
    pub fn new(cli: Cli) -> Self {
        Self {
            cli,
            env_file: PathBuf::from(ENV_FILE),
        }
    }

    /// Read the environment file from `path` instead of `./.env`
    pub fn with_env_file(mut self, path: impl AsRef<Path>) -> Self {
        self.env_file = path.as_ref().to_path_buf();
        self
    }

    /// Parse and build the complete configuration
    pub fn parse(&self) -> Result<Config> {
        self.parse_with_lookup(|key| std::env::var(key).ok())
    }

    /// Parse with `lookup` standing in for the process environment
    pub fn parse_with_lookup<F>(&self, lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file_values =
            EnvManager::read_env_file(&self.env_file, self.cli.debug)?.unwrap_or_default();

        let mut config = Config::default();
        config.merge_from_lookup(|key| lookup(key).or_else(|| file_values.get(key).cloned()))?;

        self.apply_cli_overrides(&mut config);
        config.validate()?;

        Ok(config)
    }

    /// Apply CLI argument overrides to configuration
    fn apply_cli_overrides(&self, config: &mut Config) {
        if let Some(timeout) = self.cli.timeout {
            config.timeout_seconds = timeout;
        }

        if let Some(color) = self.cli.color_override() {
            config.enable_color = color;
        }

        // CLI-only flags
        config.verbose = self.cli.verbose;
        config.debug = self.cli.debug;

        if config.debug {
            println!(
                "Applied CLI overrides: timeout={}s, enable_color={}",
                config.timeout_seconds, config.enable_color
            );
        }
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<Config> {
    ConfigParser::new(cli).parse()
}

/// Display configuration summary for dry runs and debug output
pub fn display_config_summary(config: &Config) -> String {
    let mut summary = Vec::new();

    summary.push(format!("MQTT Broker: {}:{}", config.mqtt_server, config.mqtt_port));
    summary.push(format!(
        "MQTT Auth: {}",
        if config.mqtt_credentials().is_some() { "enabled" } else { "disabled" }
    ));
    summary.push(format!("MQTT Topics: {}, {}", config.mqtt_topic, config.attributes_topic()));
    summary.push(format!("Primary Payload: {}", config.primary_payload));
    summary.push(format!("Ping: {} samples to {}", config.ping_count, config.ping_host));
    summary.push(format!(
        "Ping Attempts: {}",
        if config.ping_max_attempts == 0 {
            "unbounded".to_string()
        } else {
            config.ping_max_attempts.to_string()
        }
    ));
    summary.push(format!("Percentile: {}", config.percentile));
    summary.push(format!("Download Plan: {}", config.download_iterations));
    summary.push(format!("Upload Plan: {}", config.upload_iterations));
    summary.push(format!("Speed-test URL: {}", config.speedtest_url));
    summary.push(format!("Pacing: {}s", config.pacing_seconds));
    summary.push(format!("Timeout: {}s", config.timeout_seconds));
    summary.push(format!("Color Output: {}", config.enable_color));

    summary.join("\n")
}
