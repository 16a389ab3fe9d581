//! Output formatting for run summaries
//!
//! Verbose runs print a summary table after publishing; plain and colored
//! renderings share the same layout.

mod colored;
mod formatter;

pub use self::colored::{ColoredFormatter, LatencyLevel};
pub use formatter::{PlainFormatter, TierRow};

use crate::{app::RunReport, error::Result};

/// Renders a finished run for the console
pub trait OutputFormatter: Send + Sync {
    /// Title block
    fn format_header(&self, title: &str) -> Result<String>;

    /// The four published values
    fn format_result_table(&self, report: &RunReport, percentile: u32) -> Result<String>;

    /// Per-tier breakdown of both throughput series
    fn format_tier_table(&self, report: &RunReport) -> Result<String>;

    /// One-line summary of sample counts and run duration
    fn format_footer(&self, report: &RunReport) -> Result<String>;
}

/// Output formatting factory for creating appropriate formatters
pub struct OutputFormatterFactory;

impl OutputFormatterFactory {
    /// Create a formatter based on color support and preferences
    pub fn create_formatter(enable_color: bool) -> Box<dyn OutputFormatter> {
        if enable_color {
            Box::new(ColoredFormatter::new())
        } else {
            Box::new(PlainFormatter::new())
        }
    }
}

/// Render the full summary of a run
pub fn render_summary(
    formatter: &dyn OutputFormatter,
    report: &RunReport,
    percentile: u32,
) -> Result<String> {
    let mut output = String::new();
    output.push_str(&formatter.format_header("Speed Test Results")?);
    output.push_str("\n\n");
    output.push_str(&formatter.format_result_table(report, percentile)?);
    output.push_str("\n\n");
    output.push_str(&formatter.format_tier_table(report)?);
    output.push_str("\n\n");
    output.push_str(&formatter.format_footer(report)?);
    Ok(output)
}
