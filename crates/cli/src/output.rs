//! Terminal rendering of command results.

use benchwatch_core::regression::DetectionReport;
use benchwatch_core::{DetectorConfig, HistoryStore};
use chrono::DateTime;
use colored::Colorize;
use serde::Serialize;
use std::fmt::Write;

/// Render an epoch-millisecond date as UTC, falling back to the raw number.
pub fn format_date(epoch_ms: i64) -> String {
    DateTime::from_timestamp_millis(epoch_ms)
        .map(|date| date.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| epoch_ms.to_string())
}

/// Human-readable detection summary.
pub fn render_report(report: &DetectionReport, config: &DetectorConfig) -> String {
    let mut out = String::new();

    for alert in &report.alerts {
        let label = if alert.is_failure(config) {
            "REGRESSION".red().bold()
        } else {
            "REGRESSION (below fail ratio)".yellow().bold()
        };
        let _ = writeln!(out, "{label} {alert} [{:+.1}%]", alert.change_percent());
    }
    for skipped in &report.skipped {
        let _ = writeln!(out, "{} {}: {}", "skipped".dimmed(), skipped.name, skipped.reason);
    }

    if report.has_regressions() {
        let _ = writeln!(
            out,
            "{} regression(s) above {:.2}x threshold",
            report.alerts.len(),
            config.threshold_ratio
        );
    } else {
        let _ = writeln!(out, "{}", "No regressions detected".green());
    }
    out
}

/// One point of a benchmark series, as printed with `--json`.
#[derive(Debug, Serialize)]
pub struct SeriesPoint {
    /// Epoch milliseconds.
    pub date: i64,
    /// Measured value.
    pub value: f64,
}

/// Tab-separated series listing.
pub fn render_series(points: &[SeriesPoint], unit: &str) -> String {
    let mut out = String::new();
    for point in points {
        let _ = writeln!(out, "{}\t{} {}", format_date(point.date), point.value, unit);
    }
    out
}

/// Overview of the ledger.
pub fn render_status(store: &HistoryStore, detailed: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", "Repository:".bold(), store.repo_url());
    let _ = writeln!(out, "{} {}", "Last update:".bold(), format_date(store.last_update()));
    let _ = writeln!(out, "{} {}", "Entries:".bold(), store.len());

    for tool in store.tools() {
        let entries = store.entries_for(tool);
        let _ = write!(out, "\n{} ({} entries", tool.cyan().bold(), entries.len());
        match store.latest(tool) {
            Some(latest) => {
                let _ = writeln!(
                    out,
                    ", latest {} at {})",
                    latest.commit().short_id(),
                    format_date(latest.date())
                );
            }
            None => {
                let _ = writeln!(out, ")");
            }
        }

        if detailed {
            for name in store.benchmark_names(tool) {
                let points = store.series_for(tool, name).count();
                let _ = writeln!(out, "  {name} ({points} points)");
            }
        }
    }
    out
}
