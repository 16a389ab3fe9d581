//! Plain text summary formatter

use super::OutputFormatter;
use crate::{
    app::RunReport,
    error::Result,
    models::ThroughputSeries,
    stats,
};
use std::fmt::Write as _;

/// Aggregated view of one size tier of a throughput series
#[derive(Debug, Clone, PartialEq)]
pub struct TierRow {
    pub size_bytes: u64,
    pub transfers: usize,
    pub failed: usize,
    pub median_score: f64,
    pub best_score: f64,
}

impl TierRow {
    /// Group a series by tier, in execution order
    pub fn from_series(series: &ThroughputSeries) -> Vec<TierRow> {
        let mut rows: Vec<(u64, Vec<f64>, usize)> = Vec::new();
        for sample in &series.samples {
            match rows.last_mut() {
                Some((size, scores, failed)) if *size == sample.size_bytes => {
                    scores.push(sample.score);
                    if !sample.is_completed() {
                        *failed += 1;
                    }
                }
                _ => rows.push((
                    sample.size_bytes,
                    vec![sample.score],
                    usize::from(!sample.is_completed()),
                )),
            }
        }

        rows.into_iter()
            .map(|(size_bytes, scores, failed)| TierRow {
                size_bytes,
                transfers: scores.len(),
                failed,
                median_score: stats::median(&scores).unwrap_or(0.0),
                best_score: scores.iter().copied().fold(0.0, f64::max),
            })
            .collect()
    }
}

/// Plain formatter without ANSI escapes
#[derive(Debug, Clone, Default)]
pub struct PlainFormatter;

impl PlainFormatter {
    pub fn new() -> Self {
        Self
    }

    pub(crate) fn result_rows(report: &RunReport, percentile: u32) -> Vec<(String, String)> {
        vec![
            ("Median ping".to_string(), format!("{:.3} ms", report.result.median_ping)),
            ("Ping jitter".to_string(), format!("{:.3} ms", report.result.ping_jitter)),
            (format!("Download (p{})", percentile), format!("{:.3}", report.result.download_mbps)),
            (format!("Upload (p{})", percentile), format!("{:.3}", report.result.upload_mbps)),
        ]
    }

    pub(crate) fn footer_text(report: &RunReport) -> String {
        format!(
            "Samples: ping {} ({} retried), download {} ({} failed), upload {} ({} failed) \
             | Duration: {:.1}s",
            report.ping.samples.len(),
            report.ping.failed_attempts,
            report.download.len(),
            report.download.failed_count(),
            report.upload.len(),
            report.upload.failed_count(),
            report.duration.as_secs_f64()
        )
    }
}

impl OutputFormatter for PlainFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        Ok(format!("{}\n{}", title, "=".repeat(title.len())))
    }

    fn format_result_table(&self, report: &RunReport, percentile: u32) -> Result<String> {
        let mut output = String::new();
        let _ = writeln!(output, "{:<18} {:>14}", "Metric", "Value");
        let _ = writeln!(output, "{}", "-".repeat(33));
        for (metric, value) in Self::result_rows(report, percentile) {
            let _ = writeln!(output, "{:<18} {:>14}", metric, value);
        }
        Ok(output.trim_end().to_string())
    }

    fn format_tier_table(&self, report: &RunReport) -> Result<String> {
        let mut output = String::new();
        let _ = writeln!(
            output,
            "{:<10} {:>12} {:>10} {:>8} {:>12} {:>12}",
            "Direction", "Bytes", "Transfers", "Failed", "Median", "Best"
        );
        let _ = writeln!(output, "{}", "-".repeat(69));

        for series in [&report.download, &report.upload] {
            for row in TierRow::from_series(series) {
                let _ = writeln!(
                    output,
                    "{:<10} {:>12} {:>10} {:>8} {:>12.3} {:>12.3}",
                    series.direction,
                    row.size_bytes,
                    row.transfers,
                    row.failed,
                    row.median_score,
                    row.best_score
                );
            }
        }

        Ok(output.trim_end().to_string())
    }

    fn format_footer(&self, report: &RunReport) -> Result<String> {
        Ok(Self::footer_text(report))
    }
}
