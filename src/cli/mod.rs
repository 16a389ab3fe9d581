//! Command-line interface
//!
//! Every flag is optional; without flags the binary behaves like the
//! environment-configured batch job.

use clap::Parser;

/// Speed-test publisher - measures ping, jitter and throughput and publishes the results over MQTT
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "speedtest-publisher")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Connect and idle-read timeout in seconds (overrides TIMEOUT_SECONDS)
    #[arg(short, long, value_parser = parse_duration)]
    pub timeout: Option<u64>,

    /// Force colored output
    #[arg(long, conflicts_with = "no_color")]
    pub color: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Print the run summary table after publishing
    #[arg(long)]
    pub verbose: bool,

    /// Enable debug output (JSON logs, stage timings)
    #[arg(long)]
    pub debug: bool,

    /// Validate the configuration and print it without touching the network
    #[arg(long)]
    pub dry_run: bool,

    /// List the supported environment variables and exit
    #[arg(long)]
    pub help_env: bool,
}

impl Cli {
    /// Check if colors should be enabled, `None` when the configuration decides
    pub fn color_override(&self) -> Option<bool> {
        if self.color {
            Some(true)
        } else if self.no_color || !supports_color() {
            Some(false)
        } else {
            None
        }
    }

    /// Get configuration summary for display
    pub fn get_config_summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("Command line:\n");
        if let Some(timeout) = self.timeout {
            summary.push_str(&format!("  Timeout override: {}s\n", timeout));
        }
        summary.push_str(&format!("  Colored output: {:?}\n", self.color_override()));
        summary.push_str(&format!("  Verbose mode: {}\n", self.verbose));
        summary.push_str(&format!("  Debug mode: {}\n", self.debug));
        summary.push_str(&format!("  Dry run: {}\n", self.dry_run));

        summary
    }
}

/// Parse duration from seconds string
fn parse_duration(s: &str) -> Result<u64, String> {
    if s.starts_with('+') || s.starts_with("0x") || s.starts_with("0X") {
        return Err(format!("Invalid duration: {}", s));
    }

    s.parse::<u64>()
        .map_err(|_| format!("Invalid duration: {}", s))
        .and_then(|secs| {
            if secs == 0 {
                Err("Duration must be greater than 0".to_string())
            } else if secs > 600 {
                Err("Duration cannot exceed 600 seconds".to_string())
            } else {
                Ok(secs)
            }
        })
}

/// Check if the terminal supports color output
fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    // https://no-color.org
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_defaults() {
        let cli = Cli::parse_from(["speedtest-publisher"]);
        assert_eq!(cli.timeout, None);
        assert!(!cli.verbose);
        assert!(!cli.debug);
        assert!(!cli.dry_run);
        assert!(!cli.help_env);
        assert!(!cli.color);
        assert!(!cli.no_color);
    }

    #[test]
    fn test_cli_parsing_all_options() {
        let cli = Cli::parse_from([
            "speedtest-publisher",
            "--timeout",
            "30",
            "--no-color",
            "--verbose",
            "--debug",
            "--dry-run",
            "--help-env",
        ]);

        assert_eq!(cli.timeout, Some(30));
        assert!(cli.no_color);
        assert!(cli.verbose);
        assert!(cli.debug);
        assert!(cli.dry_run);
        assert!(cli.help_env);
        assert_eq!(cli.color_override(), Some(false));
    }

    #[test]
    fn test_color_flags_conflict() {
        let result = Cli::try_parse_from(["speedtest-publisher", "--color", "--no-color"]);
        assert!(result.is_err());

        let cli = Cli::parse_from(["speedtest-publisher", "--color"]);
        assert_eq!(cli.color_override(), Some(true));
    }

    #[test]
    fn test_duration_parsing() {
        assert_eq!(parse_duration("5"), Ok(5));
        assert_eq!(parse_duration("600"), Ok(600));
        assert!(parse_duration("0").is_err());
        assert!(parse_duration("601").is_err());
        assert!(parse_duration("+5").is_err());
        assert!(parse_duration("0x10").is_err());
        assert!(parse_duration("abc").is_err());
        assert!(parse_duration("-1").is_err());
    }

    #[test]
    fn test_invalid_timeout_rejected_by_parser() {
        let result = Cli::try_parse_from(["speedtest-publisher", "--timeout", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_summary() {
        let cli = Cli::parse_from(["speedtest-publisher", "--timeout", "12", "--dry-run"]);
        let summary = cli.get_config_summary();

        assert!(summary.contains("Timeout override: 12s"));
        assert!(summary.contains("Dry run: true"));
    }
}
