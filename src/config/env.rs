//! Environment variable handling and .env file management

use crate::error::Result;
use std::collections::HashMap;
use std::path::Path;

/// Default location of the optional environment file
pub const ENV_FILE: &str = ".env";

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Read `path` as a .env file without touching the process environment.
    ///
    /// Returns `None` when the file does not exist.
    pub fn read_env_file(path: &Path, debug: bool) -> Result<Option<HashMap<String, String>>> {
        if !path.exists() {
            if debug {
                println!(
                    "No {} file found, using defaults and process environment",
                    path.display()
                );
            }
            return Ok(None);
        }

        let mut values = HashMap::new();
        for item in dotenv::from_path_iter(path)? {
            let (key, value) = item?;
            values.insert(key, value);
        }

        if debug {
            println!("Loaded {} values from {}", values.len(), path.display());
        }

        Ok(Some(values))
    }

    /// Get list of all supported environment variables with descriptions
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("MQTT_SERVER", "MQTT broker host", "localhost"),
            ("MQTT_SERVER_PORT", "MQTT broker port", "1883"),
            ("MQTT_USERNAME", "Broker username, used only with MQTT_PASSWORD", "speedtest"),
            ("MQTT_PASSWORD", "Broker password, used only with MQTT_USERNAME", "secret"),
            ("MQTT_TOPIC", "Primary topic; attributes go to <topic>/attributes", "speedtest"),
            ("PRIMARY_PAYLOAD", "Primary topic payload: timestamp or json", "timestamp"),
            ("PING_COUNT", "Number of latency samples (at least 2)", "20"),
            ("PING_HOST", "Host the latency probe connects to", "cloudflare.com"),
            ("PING_MAX_ATTEMPTS", "Attempts per latency sample, 0 retries forever", "50"),
            ("PERCENTILE", "Percentile reported for download and upload (0-100)", "90"),
            ("DOWNLOAD_ITERATIONS", "Downloads per size tier, comma-separated", "10,8,6,4,2"),
            ("UPLOAD_ITERATIONS", "Uploads per size tier, comma-separated", "8,6,4,2"),
            ("SPEEDTEST_URL", "Speed-test endpoint base URL", "https://speed.cloudflare.com"),
            ("PACING_SECONDS", "Pause after each completed transfer", "5"),
            ("TIMEOUT_SECONDS", "Speed-test connect and idle-read timeout in seconds", "60"),
            ("ENABLE_COLOR", "Enable colored output", "true"),
        ]
    }

    /// Display environment variable help
    pub fn display_env_help() -> String {
        let mut help = String::new();
        help.push_str("Supported Environment Variables:\n\n");

        for (var, description, example) in Self::get_supported_env_vars() {
            help.push_str(&format!("  {:<20} {}\n", var, description));
            help.push_str(&format!("  {:<20} Example: {}\n\n", "", example));
        }

        help.push_str("Configuration Priority (highest to lowest):\n");
        help.push_str("  1. Command-line arguments\n");
        help.push_str("  2. Environment variables\n");
        help.push_str("  3. .env file values\n");
        help.push_str("  4. Default values\n");

        help
    }
}
