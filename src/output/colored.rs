//! Colored summary formatter

use super::{
    formatter::{PlainFormatter, TierRow},
    OutputFormatter,
};
use crate::{app::RunReport, error::Result};
use colored::*;
use std::fmt::Write as _;

/// Latency classification for color coding
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LatencyLevel {
    Excellent, // < 20ms
    Good,      // 20-50ms
    Fair,      // 50-100ms
    Poor,      // >= 100ms
}

impl LatencyLevel {
    pub fn from_latency(ms: f64) -> Self {
        if ms < 20.0 {
            Self::Excellent
        } else if ms < 50.0 {
            Self::Good
        } else if ms < 100.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Self::Excellent => Color::Green,
            Self::Good => Color::Cyan,
            Self::Fair => Color::Yellow,
            Self::Poor => Color::Red,
        }
    }
}

/// Formatter using ANSI colors
#[derive(Debug, Clone, Default)]
pub struct ColoredFormatter;

impl ColoredFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl OutputFormatter for ColoredFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        Ok(format!(
            "{}\n{}",
            title.bold().cyan(),
            "=".repeat(title.len()).cyan()
        ))
    }

    fn format_result_table(&self, report: &RunReport, percentile: u32) -> Result<String> {
        let latency_color = LatencyLevel::from_latency(report.result.median_ping).color();
        let mut output = String::new();
        let _ = writeln!(output, "{:<18} {:>14}", "Metric".bold(), "Value".bold());
        let _ = writeln!(output, "{}", "-".repeat(33).dimmed());

        let rows = PlainFormatter::result_rows(report, percentile);
        for (index, (metric, value)) in rows.into_iter().enumerate() {
            let value = if index < 2 {
                format!("{:>14}", value).color(latency_color)
            } else {
                format!("{:>14}", value).green()
            };
            let _ = writeln!(output, "{:<18} {}", metric, value);
        }

        Ok(output.trim_end().to_string())
    }

    fn format_tier_table(&self, report: &RunReport) -> Result<String> {
        let mut output = String::new();
        let _ = writeln!(
            output,
            "{}",
            format!(
                "{:<10} {:>12} {:>10} {:>8} {:>12} {:>12}",
                "Direction", "Bytes", "Transfers", "Failed", "Median", "Best"
            )
            .bold()
        );
        let _ = writeln!(output, "{}", "-".repeat(69).dimmed());

        for series in [&report.download, &report.upload] {
            for row in TierRow::from_series(series) {
                let failed = format!("{:>8}", row.failed);
                let failed = if row.failed > 0 { failed.red() } else { failed.normal() };
                let _ = writeln!(
                    output,
                    "{:<10} {:>12} {:>10} {} {:>12.3} {:>12.3}",
                    series.direction,
                    row.size_bytes,
                    row.transfers,
                    failed,
                    row.median_score,
                    row.best_score
                );
            }
        }

        Ok(output.trim_end().to_string())
    }

    fn format_footer(&self, report: &RunReport) -> Result<String> {
        Ok(PlainFormatter::footer_text(report).dimmed().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::test_support::sample_report;

    #[test]
    fn test_latency_levels() {
        assert_eq!(LatencyLevel::from_latency(5.0), LatencyLevel::Excellent);
        assert_eq!(LatencyLevel::from_latency(20.0), LatencyLevel::Good);
        assert_eq!(LatencyLevel::from_latency(75.0), LatencyLevel::Fair);
        assert_eq!(LatencyLevel::from_latency(250.0), LatencyLevel::Poor);
        assert_eq!(LatencyLevel::Poor.color(), Color::Red);
    }

    #[test]
    fn test_colored_output_keeps_content() {
        let formatter = ColoredFormatter::new();
        let report = sample_report();

        let table = formatter.format_result_table(&report, 90).unwrap();
        let tiers = formatter.format_tier_table(&report).unwrap();

        assert!(table.contains("11.000 ms"));
        assert!(table.contains("Upload (p90)"));
        assert!(tiers.contains("1000000"));
    }
}
