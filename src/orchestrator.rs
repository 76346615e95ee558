//! Shade orchestrator for coordinating the entire merge workflow
//!
//! This module provides:
//! - Workflow coordination: resolve → read → check → merge → write
//! - Dry-run mode support (everything except the final write)
//! - Progress display while downloading and merging

use crate::archive::{read_input, read_jar, write_jar};
use crate::config::ShadePlan;
use crate::domain::{ResolvedArtifact, ShadeReport};
use crate::error::AppError;
use crate::progress::Progress;
use crate::resolver::{create_repositories, ArtifactStore, DependencyResolver, Resolution};
use crate::shade::Merger;
use tracing::{debug, info};

/// Orchestrator for coordinating the shade workflow
pub struct Orchestrator {
    /// Validated job description
    plan: ShadePlan,
}

impl Orchestrator {
    /// Create a new orchestrator for a plan
    pub fn new(plan: ShadePlan) -> Self {
        Self { plan }
    }

    /// The plan this orchestrator runs
    pub fn plan(&self) -> &ShadePlan {
        &self.plan
    }

    /// Run the shade workflow without progress display
    pub async fn run(&self) -> Result<ShadeReport, AppError> {
        self.run_with_progress(false).await
    }

    /// Run the shade workflow with optional progress display
    pub async fn run_with_progress(&self, show_progress: bool) -> Result<ShadeReport, AppError> {
        let mut progress = Progress::new(show_progress);

        // Step 1: Resolve dependencies to files on disk
        progress.resolving();
        let resolution = self.resolve().await?;
        progress.clear();

        // Step 2: Read the primary input and check it against the relocations
        let primary = read_input(&self.plan.input, &primary_label(&self.plan))?;
        self.plan.relocator.check_collisions(&primary)?;

        // Step 3: Merge everything
        let mut merger = Merger::new(self.plan.relocator.clone(), self.plan.merge.clone());
        merger.add_primary(primary)?;

        progress.merging(resolution.artifacts.len());
        for artifact in &resolution.artifacts {
            progress.jar(&artifact.label());
            self.merge_artifact(&mut merger, artifact)?;
        }
        progress.clear();

        let merged = merger.finish();

        // Step 4: Write the jar unless dry-run
        if self.plan.dry_run {
            debug!(
                "Dry run: {} entries not written to {}",
                merged.entries.len(),
                self.plan.output.display()
            );
        } else {
            write_jar(&self.plan.output, &merged.entries)?;
            info!(
                "Wrote {} entries to {}",
                merged.entries.len(),
                self.plan.output.display()
            );
        }

        let mut report = ShadeReport::new(&self.plan.output, self.plan.dry_run);
        report.entries_written = merged.entries.len();
        report.artifacts = merged.artifacts;
        report.exclusions = merged.exclusions;
        report.skipped = resolution.skipped;
        Ok(report)
    }

    async fn resolve(&self) -> Result<Resolution, AppError> {
        let repositories = create_repositories(&self.plan.repositories, self.plan.offline)?;
        let store = ArtifactStore::new(&self.plan.cache_dir, repositories);
        let resolution = DependencyResolver::new(store)
            .resolve(&self.plan.dependencies)
            .await?;
        Ok(resolution)
    }

    fn merge_artifact(
        &self,
        merger: &mut Merger,
        artifact: &ResolvedArtifact,
    ) -> Result<(), AppError> {
        let label = artifact.label();
        debug!("Merging {} from {}", label, artifact.path.display());
        let archive = read_jar(&artifact.path, &label)?;
        merger.add_dependency(archive, Some(&artifact.requested_by))
    }
}

/// Label of the primary input: its file or directory name
fn primary_label(plan: &ShadePlan) -> String {
    plan.input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| plan.input.display().to_string())
}
