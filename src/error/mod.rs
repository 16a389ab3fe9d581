//! Error handling for the speed-test publisher

use thiserror::Error;

/// Error taxonomy for a measurement run
#[derive(Error, Debug)]
pub enum AppError {
    /// Invalid or unusable configuration, raised before any network activity
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input handed to a statistics function
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Not enough samples to derive a statistic
    #[error("Insufficient samples: {0}")]
    InsufficientSamples(String),

    /// Latency probe gave up after exhausting its attempts
    #[error("Probe timeout: {0}")]
    ProbeTimeout(String),

    /// Connection-level transport failure (unreachable host, reset, DNS failure)
    #[error("Connection failure: {0}")]
    Connection(String),

    /// HTTP request errors that are not connection-level (bad status, bad body)
    #[error("HTTP request error: {0}")]
    HttpRequest(String),

    /// Timeout errors outside the connect phase
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Telemetry sink unreachable or rejected the publish
    #[error("Publish error: {0}")]
    Publish(String),

    /// Parsing errors (URLs, JSON, numbers)
    #[error("Parsing error: {0}")]
    Parse(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new invalid input error
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a new insufficient samples error
    pub fn insufficient_samples<S: Into<String>>(message: S) -> Self {
        Self::InsufficientSamples(message.into())
    }

    /// Create a new probe timeout error
    pub fn probe_timeout<S: Into<String>>(message: S) -> Self {
        Self::ProbeTimeout(message.into())
    }

    /// Create a new connection failure
    pub fn connection<S: Into<String>>(message: S) -> Self {
        Self::Connection(message.into())
    }

    /// Create a new HTTP request error
    pub fn http_request<S: Into<String>>(message: S) -> Self {
        Self::HttpRequest(message.into())
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout(message.into())
    }

    /// Create a new publish error
    pub fn publish<S: Into<String>>(message: S) -> Self {
        Self::Publish(message.into())
    }

    /// Create a new parsing error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse(message.into())
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG",
            Self::InvalidInput(_) => "INPUT",
            Self::InsufficientSamples(_) => "SAMPLES",
            Self::ProbeTimeout(_) => "PROBE",
            Self::Connection(_) => "CONNECTION",
            Self::HttpRequest(_) => "HTTP",
            Self::Timeout(_) => "TIMEOUT",
            Self::Publish(_) => "PUBLISH",
            Self::Parse(_) => "PARSE",
            Self::Io(_) => "IO",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Whether a throughput transfer failing with this error is recorded as a
    /// zero sample instead of aborting the run
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Get user-friendly error message with suggestions
    pub fn user_friendly_message(&self) -> String {
        let (summary, suggestion) = match self {
            Self::Config(msg) => (
                format!("Configuration problem: {}", msg),
                "Check your .env file and environment variables (see --help-env).",
            ),
            Self::InvalidInput(msg) => (
                format!("Invalid statistics input: {}", msg),
                "Check PERCENTILE against the number of planned transfers.",
            ),
            Self::InsufficientSamples(msg) => (
                format!("Not enough samples: {}", msg),
                "PING_COUNT must be at least 2.",
            ),
            Self::ProbeTimeout(msg) => (
                format!("Latency probe gave up: {}", msg),
                "Check connectivity to the ping host or raise PING_MAX_ATTEMPTS \
                 (0 retries forever).",
            ),
            Self::Connection(msg) => (
                format!("Connection failed: {}", msg),
                "Check your internet connection and try again.",
            ),
            Self::HttpRequest(msg) => (
                format!("HTTP request failed: {}", msg),
                "The speed-test endpoint may be rate limiting or returning errors. \
                 Try again later.",
            ),
            Self::Timeout(msg) => (
                format!("Request timed out: {}", msg),
                "The speed-test endpoint stopped sending data. \
                 Increase TIMEOUT_SECONDS if the link stalls briefly.",
            ),
            Self::Publish(msg) => (
                format!("Publishing results failed: {}", msg),
                "Check MQTT_SERVER, MQTT_SERVER_PORT and the broker credentials.",
            ),
            Self::Parse(msg) => (
                format!("Failed to parse data: {}", msg),
                "Check the format of your configuration values.",
            ),
            Self::Io(msg) => (
                format!("I/O operation failed: {}", msg),
                "Check file permissions and network sockets.",
            ),
            Self::Internal(msg) => {
                return format!(
                    "Internal error: {}\n\nThis is likely a bug. \
                     Please report this issue with the error details.",
                    msg
                );
            }
        };

        format!("{}\n\nSuggestion: {}", summary, suggestion)
    }

    /// Get exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::InvalidInput(_) | Self::Parse(_) => 1,
            Self::Connection(_) | Self::HttpRequest(_) | Self::Timeout(_) => 2,
            Self::ProbeTimeout(_) => 3,
            Self::Publish(_) => 4,
            Self::Io(_) => 5,
            Self::InsufficientSamples(_) => 6,
            Self::Internal(_) => 99,
        }
    }

    /// Format error for console display with color coding
    pub fn format_for_console(&self, use_color: bool) -> String {
        let category = self.category();
        let message = self.to_string();

        if use_color {
            use colored::Colorize;
            match self {
                Self::Config(_) | Self::InvalidInput(_) | Self::Parse(_) => {
                    format!("[{}] {}", category.red().bold(), message.red())
                }
                Self::Connection(_)
                | Self::HttpRequest(_)
                | Self::Timeout(_)
                | Self::ProbeTimeout(_) => {
                    format!("[{}] {}", category.yellow().bold(), message.yellow())
                }
                Self::Publish(_) => {
                    format!("[{}] {}", category.magenta().bold(), message.magenta())
                }
                Self::Io(_) | Self::InsufficientSamples(_) => {
                    format!("[{}] {}", category.cyan().bold(), message.cyan())
                }
                Self::Internal(_) => {
                    format!("[{}] {}", category.bright_red().bold(), message.bright_red())
                }
            }
        } else {
            format!("[{}] {}", category, message)
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(error: url::ParseError) -> Self {
        Self::parse(format!("URL parse error: {}", error))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::parse(format!("JSON error: {}", error))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        // Connect timeouts count as connection-level, read timeouts do not
        if error.is_connect() {
            Self::connection(error.to_string())
        } else if error.is_timeout() {
            Self::timeout(error.to_string())
        } else if error.is_request() {
            Self::connection(error.to_string())
        } else {
            Self::http_request(error.to_string())
        }
    }
}

impl From<rumqttc::ClientError> for AppError {
    fn from(error: rumqttc::ClientError) -> Self {
        Self::publish(error.to_string())
    }
}

impl From<rumqttc::ConnectionError> for AppError {
    fn from(error: rumqttc::ConnectionError) -> Self {
        Self::publish(error.to_string())
    }
}

impl From<dotenv::Error> for AppError {
    fn from(error: dotenv::Error) -> Self {
        Self::config(format!("Environment file error: {}", error))
    }
}

impl From<std::num::ParseIntError> for AppError {
    fn from(error: std::num::ParseIntError) -> Self {
        Self::parse(format!("Integer parse error: {}", error))
    }
}

impl From<std::str::ParseBoolError> for AppError {
    fn from(error: std::str::ParseBoolError) -> Self {
        Self::parse(format!("Boolean parse error: {}", error))
    }
}

/// Custom Result type for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Error reporter for user-facing error output
pub struct ErrorReporter {
    pub use_color: bool,
    pub verbose: bool,
}

impl ErrorReporter {
    /// Create a new error reporter
    pub fn new(use_color: bool, verbose: bool) -> Self {
        Self { use_color, verbose }
    }

    /// Report an error to the user
    pub fn report_error(&self, error: &AppError) {
        eprintln!("{}", self.render(error));
    }

    /// Render the report without printing it
    pub fn render(&self, error: &AppError) -> String {
        let mut output = error.format_for_console(self.use_color);
        if self.verbose {
            output.push_str("\n\n");
            output.push_str(&error.user_friendly_message());
        }
        output
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}
