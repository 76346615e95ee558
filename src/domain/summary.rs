//! Shade run summary types
//!
//! Provides structures for tracking merge results per input artifact and overall.

use super::EntryOutcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Merge statistics for a single input archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSummary {
    /// Origin label (coordinate or path)
    pub label: String,
    /// Location of the archive or class directory
    pub path: PathBuf,
    /// Whether this is the primary input
    pub primary: bool,
    /// Declaration that pulled this artifact in (dependencies only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_by: Option<String>,
    pub kept: usize,
    pub relocated: usize,
    pub excluded: usize,
    pub duplicates: usize,
    pub services_merged: usize,
    pub dropped: usize,
}

impl ArtifactSummary {
    /// Creates an empty summary
    pub fn new(label: impl Into<String>, path: impl Into<PathBuf>, primary: bool) -> Self {
        Self {
            label: label.into(),
            path: path.into(),
            primary,
            requested_by: None,
            kept: 0,
            relocated: 0,
            excluded: 0,
            duplicates: 0,
            services_merged: 0,
            dropped: 0,
        }
    }

    /// Sets the requesting declaration (builder pattern)
    pub fn with_requested_by(mut self, requested_by: impl Into<String>) -> Self {
        self.requested_by = Some(requested_by.into());
        self
    }

    /// Records one entry outcome
    pub fn record(&mut self, outcome: &EntryOutcome) {
        match outcome {
            EntryOutcome::Kept => self.kept += 1,
            EntryOutcome::Relocated { .. } => self.relocated += 1,
            EntryOutcome::Excluded { .. } => self.excluded += 1,
            EntryOutcome::Duplicate => self.duplicates += 1,
            EntryOutcome::ServiceMerged => self.services_merged += 1,
            EntryOutcome::Dropped { .. } => self.dropped += 1,
        }
    }

    /// Total number of entries read from this input
    pub fn total(&self) -> usize {
        self.kept
            + self.relocated
            + self.excluded
            + self.duplicates
            + self.services_merged
            + self.dropped
    }
}

/// Overall report of a shade run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadeReport {
    /// Output jar path
    pub output: PathBuf,
    /// Whether this was a dry run (nothing written)
    pub dry_run: bool,
    /// Per-input statistics, primary first
    pub artifacts: Vec<ArtifactSummary>,
    /// Declarations that were not bundled (compile-only)
    pub skipped: Vec<String>,
    /// Number of entries in the output jar
    pub entries_written: usize,
    /// Number of times each exclusion pattern dropped an entry
    pub exclusions: BTreeMap<String, usize>,
    /// Completion time
    pub finished_at: DateTime<Utc>,
}

impl ShadeReport {
    /// Creates an empty report
    pub fn new(output: impl Into<PathBuf>, dry_run: bool) -> Self {
        Self {
            output: output.into(),
            dry_run,
            artifacts: Vec::new(),
            skipped: Vec::new(),
            entries_written: 0,
            exclusions: BTreeMap::new(),
            finished_at: Utc::now(),
        }
    }

    /// Dependency artifacts (everything except the primary input)
    pub fn dependencies(&self) -> impl Iterator<Item = &ArtifactSummary> {
        self.artifacts.iter().filter(|a| !a.primary)
    }

    /// Total number of relocated entries
    pub fn total_relocated(&self) -> usize {
        self.artifacts.iter().map(|a| a.relocated).sum()
    }

    /// Total number of excluded entries
    pub fn total_excluded(&self) -> usize {
        self.artifacts.iter().map(|a| a.excluded).sum()
    }

    /// Total number of identical duplicates dropped
    pub fn total_duplicates(&self) -> usize {
        self.artifacts.iter().map(|a| a.duplicates).sum()
    }

    /// Total number of entries dropped by built-in rules
    pub fn total_dropped(&self) -> usize {
        self.artifacts.iter().map(|a| a.dropped).sum()
    }
}
