//! JSON output formatter for machine processing
//!
//! This module provides:
//! - JSON serialization of shade reports
//! - Structured per-input entry statistics

use crate::domain::{ArtifactSummary, ShadeReport};
use crate::output::{OutputFormatter, Verbosity};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

/// JSON formatter for machine-readable output
pub struct JsonFormatter {
    /// Verbosity level affects detail in output
    verbosity: Verbosity,
}

impl JsonFormatter {
    /// Create a new JSON formatter
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }
}

/// JSON representation of the full report
#[derive(Serialize)]
struct JsonOutput<'a> {
    /// Output jar path
    output: String,
    /// Whether this was a dry-run
    dry_run: bool,
    /// Completion time (RFC 3339)
    finished_at: String,
    /// Summary statistics
    summary: JsonSummary,
    /// Per-input results (omitted in quiet mode)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    artifacts: Vec<&'a ArtifactSummary>,
    /// Declarations that were not bundled
    #[serde(skip_serializing_if = "Vec::is_empty")]
    skipped: Vec<&'a str>,
    /// Matches per exclusion pattern (verbose only)
    #[serde(skip_serializing_if = "Option::is_none")]
    exclusions: Option<&'a BTreeMap<String, usize>>,
}

/// JSON representation of summary statistics
#[derive(Serialize)]
struct JsonSummary {
    entries: usize,
    dependencies: usize,
    relocated: usize,
    excluded: usize,
    duplicates: usize,
    dropped: usize,
}

impl JsonSummary {
    fn from_report(report: &ShadeReport) -> Self {
        Self {
            entries: report.entries_written,
            dependencies: report.dependencies().count(),
            relocated: report.total_relocated(),
            excluded: report.total_excluded(),
            duplicates: report.total_duplicates(),
            dropped: report.total_dropped(),
        }
    }
}

fn write_json<T: Serialize>(value: &T, writer: &mut dyn Write) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(std::io::Error::other)?;
    writeln!(writer, "{}", json)
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, report: &ShadeReport, writer: &mut dyn Write) -> std::io::Result<()> {
        let artifacts = if self.verbosity == Verbosity::Quiet {
            Vec::new()
        } else {
            report.artifacts.iter().collect()
        };
        let exclusions = (self.verbosity == Verbosity::Verbose).then_some(&report.exclusions);

        let output = JsonOutput {
            output: report.output.display().to_string(),
            dry_run: report.dry_run,
            finished_at: report.finished_at.to_rfc3339(),
            summary: JsonSummary::from_report(report),
            artifacts,
            skipped: report.skipped.iter().map(String::as_str).collect(),
            exclusions,
        };

        write_json(&output, writer)
    }

    fn format_summary(&self, report: &ShadeReport, writer: &mut dyn Write) -> std::io::Result<()> {
        write_json(&JsonSummary::from_report(report), writer)
    }

    fn format_artifact(
        &self,
        artifact: &ArtifactSummary,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        write_json(artifact, writer)
    }
}
