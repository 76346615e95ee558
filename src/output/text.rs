//! Text output formatter for human-readable display
//!
//! This module provides:
//! - Per-input entry statistics with colors
//! - Exclusion pattern tallies
//! - Summary with totals and the output location

use crate::domain::{ArtifactSummary, ShadeReport};
use crate::output::{OutputFormatter, Verbosity};
use colored::Colorize;
use std::io::Write;

/// Minimum width of the label column
const MIN_LABEL_WIDTH: usize = 20;

/// Text formatter for human-readable output
pub struct TextFormatter {
    /// Verbosity level
    verbosity: Verbosity,
    /// Whether this is a dry-run
    dry_run: bool,
    /// Whether to use colors
    color: bool,
}

impl TextFormatter {
    /// Create a new text formatter
    pub fn new(verbosity: Verbosity, dry_run: bool) -> Self {
        Self {
            verbosity,
            dry_run,
            color: true,
        }
    }

    /// Create a new text formatter with color option
    pub fn with_color(verbosity: Verbosity, dry_run: bool, color: bool) -> Self {
        Self {
            verbosity,
            dry_run,
            color,
        }
    }

    /// Get the dry-run prefix if applicable
    fn dry_run_prefix(&self) -> String {
        if self.dry_run {
            if self.color {
                format!("{} ", "(dry-run)".cyan())
            } else {
                "(dry-run) ".to_string()
            }
        } else {
            String::new()
        }
    }

    fn label_width(report: &ShadeReport) -> usize {
        report
            .artifacts
            .iter()
            .map(|a| display_label(a).len())
            .max()
            .unwrap_or(0)
            .max(MIN_LABEL_WIDTH)
    }

    /// Comma separated non-zero counters of an input
    fn counters(&self, artifact: &ArtifactSummary) -> String {
        let mut parts = vec![format!("{} kept", artifact.kept)];
        if artifact.relocated > 0 {
            let text = format!("{} relocated", artifact.relocated);
            parts.push(if self.color {
                text.green().to_string()
            } else {
                text
            });
        }
        let quiet_counters = [
            (artifact.excluded, "excluded"),
            (artifact.duplicates, "duplicate"),
            (artifact.services_merged, "service merged"),
            (artifact.dropped, "dropped"),
        ];
        for (count, label) in quiet_counters {
            if count > 0 {
                let text = format!("{} {}", count, label);
                parts.push(if self.color {
                    text.dimmed().to_string()
                } else {
                    text
                });
            }
        }
        parts.join(", ")
    }

    fn format_artifact_line(
        &self,
        artifact: &ArtifactSummary,
        width: usize,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let label = format!("{:width$}", display_label(artifact), width = width);
        if self.color && artifact.primary {
            writeln!(writer, "  {} {}", label.bold(), self.counters(artifact))?;
        } else {
            writeln!(writer, "  {} {}", label, self.counters(artifact))?;
        }

        if self.verbosity == Verbosity::Verbose {
            if let Some(requested_by) = &artifact.requested_by {
                let via = format!("via {}", requested_by);
                if self.color {
                    writeln!(writer, "    {}", via.dimmed())?;
                } else {
                    writeln!(writer, "    {}", via)?;
                }
            }
        }
        Ok(())
    }

    fn format_exclusions(&self, report: &ShadeReport, writer: &mut dyn Write) -> std::io::Result<()> {
        if report.exclusions.is_empty() {
            return Ok(());
        }
        if self.color {
            writeln!(writer, "{}:", "Exclusions".bold())?;
        } else {
            writeln!(writer, "Exclusions:")?;
        }
        for (pattern, count) in &report.exclusions {
            let matched = format!("{} matched", count);
            if self.color && *count == 0 {
                writeln!(writer, "  {} {}", pattern, matched.dimmed())?;
            } else {
                writeln!(writer, "  {} {}", pattern, matched)?;
            }
        }
        writeln!(writer)
    }
}

/// Label with a marker for the primary input
fn display_label(artifact: &ArtifactSummary) -> String {
    if artifact.primary {
        format!("{} (primary)", artifact.label)
    } else {
        artifact.label.clone()
    }
}

impl OutputFormatter for TextFormatter {
    fn format(&self, report: &ShadeReport, writer: &mut dyn Write) -> std::io::Result<()> {
        // In quiet mode, only show summary
        if self.verbosity == Verbosity::Quiet {
            return self.format_summary(report, writer);
        }

        let prefix = self.dry_run_prefix();
        let output = report.output.display().to_string();
        if self.color {
            writeln!(writer, "{}{}", prefix, output.bold())?;
        } else {
            writeln!(writer, "{}{}", prefix, output)?;
        }

        let width = Self::label_width(report);
        for artifact in &report.artifacts {
            self.format_artifact_line(artifact, width, writer)?;
        }
        writeln!(writer)?;

        if self.verbosity == Verbosity::Verbose {
            self.format_exclusions(report, writer)?;
        }

        self.format_summary(report, writer)
    }

    fn format_summary(&self, report: &ShadeReport, writer: &mut dyn Write) -> std::io::Result<()> {
        let prefix = self.dry_run_prefix();
        let verb = if report.dry_run { "would be written to" } else { "written to" };

        if self.verbosity == Verbosity::Quiet {
            // Minimal output
            if self.color {
                writeln!(
                    writer,
                    "{}{} entries {} {}",
                    prefix,
                    report.entries_written.to_string().green(),
                    verb,
                    report.output.display()
                )?;
            } else {
                writeln!(
                    writer,
                    "{}{} entries {} {}",
                    prefix,
                    report.entries_written,
                    verb,
                    report.output.display()
                )?;
            }
            return Ok(());
        }

        let dependencies = report.dependencies().count();
        if self.color {
            writeln!(writer, "{}{}:", prefix, "Summary".bold())?;
            writeln!(
                writer,
                "  {} entries {} {}",
                report.entries_written.to_string().green(),
                verb,
                report.output.display()
            )?;
            writeln!(
                writer,
                "  {} dependency jar(s), {} entries relocated",
                dependencies.to_string().cyan(),
                report.total_relocated().to_string().green()
            )?;
            writeln!(
                writer,
                "  {}",
                format!(
                    "{} excluded, {} duplicate(s), {} dropped",
                    report.total_excluded(),
                    report.total_duplicates(),
                    report.total_dropped()
                )
                .dimmed()
            )?;
        } else {
            writeln!(writer, "{}Summary:", prefix)?;
            writeln!(
                writer,
                "  {} entries {} {}",
                report.entries_written,
                verb,
                report.output.display()
            )?;
            writeln!(
                writer,
                "  {} dependency jar(s), {} entries relocated",
                dependencies,
                report.total_relocated()
            )?;
            writeln!(
                writer,
                "  {} excluded, {} duplicate(s), {} dropped",
                report.total_excluded(),
                report.total_duplicates(),
                report.total_dropped()
            )?;
        }

        if !report.skipped.is_empty() {
            if self.verbosity == Verbosity::Verbose {
                writeln!(writer, "  Not bundled:")?;
                for label in &report.skipped {
                    writeln!(writer, "    {}", label)?;
                }
            } else {
                writeln!(writer, "  {} declaration(s) not bundled", report.skipped.len())?;
            }
        }

        Ok(())
    }

    fn format_artifact(
        &self,
        artifact: &ArtifactSummary,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let width = display_label(artifact).len();
        self.format_artifact_line(artifact, width, writer)
    }
}
