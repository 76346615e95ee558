//! Merge engine assembling the output entries
//!
//! Entries are processed in input order (primary first). For every entry:
//! built-in drop rules, exclusion on the original path, target release
//! check, relocation, exclusion on the relocated path, then de-duplication
//! or conflict detection against what is already staged.

use super::manifest::build_manifest;
use super::Relocator;
use crate::archive::{is_safe_entry_path, Archive, ArchiveEntry, MANIFEST_PATH};
use crate::classfile::{self, MAJOR_VERSION_OFFSET};
use crate::domain::{ArtifactSummary, DropReason, EntryOutcome, ExclusionSet};
use crate::error::{AppError, ArchiveError, MergeError};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Merge behaviour switches
#[derive(Debug, Clone, Default)]
pub struct MergeOptions {
    /// Entry path globs left out of the output
    pub exclusions: ExclusionSet,
    /// Concatenate same-named `META-INF/services/` files instead of failing
    pub merge_service_files: bool,
    /// Rewrite references in primary classes as well (their paths never move)
    pub relocate_primary: bool,
    /// Highest allowed Java release for dependency classes
    pub target_release: Option<u16>,
    /// Main attributes added to the output manifest
    pub manifest_attributes: BTreeMap<String, String>,
}

/// An entry staged for output
#[derive(Debug)]
struct Staged {
    data: Vec<u8>,
    origin: String,
}

/// Everything the writer and the report need after merging
#[derive(Debug)]
pub struct MergeOutput {
    /// Output entries, manifest first, then in path order
    pub entries: Vec<ArchiveEntry>,
    /// Per-input statistics in input order
    pub artifacts: Vec<ArtifactSummary>,
    /// How many entries each exclusion pattern removed
    pub exclusions: BTreeMap<String, usize>,
}

/// Accumulates input archives into one set of output entries
pub struct Merger {
    relocator: Relocator,
    options: MergeOptions,
    staged: BTreeMap<String, Staged>,
    artifacts: Vec<ArtifactSummary>,
    exclusions: BTreeMap<String, usize>,
}

impl Merger {
    /// Create a merger
    pub fn new(relocator: Relocator, options: MergeOptions) -> Self {
        let exclusions = options
            .exclusions
            .patterns()
            .iter()
            .map(|p| (p.clone(), 0))
            .collect();
        Self {
            relocator,
            options,
            staged: BTreeMap::new(),
            artifacts: Vec::new(),
            exclusions,
        }
    }

    /// Add the first-party classes. Their paths are never relocated.
    pub fn add_primary(&mut self, archive: Archive) -> Result<(), AppError> {
        self.add(archive, true, None)
    }

    /// Add a dependency archive
    pub fn add_dependency(
        &mut self,
        archive: Archive,
        requested_by: Option<&str>,
    ) -> Result<(), AppError> {
        self.add(archive, false, requested_by)
    }

    fn add(
        &mut self,
        archive: Archive,
        primary: bool,
        requested_by: Option<&str>,
    ) -> Result<(), AppError> {
        let Archive {
            label,
            path,
            entries,
        } = archive;

        let mut summary = ArtifactSummary::new(label.as_str(), path, primary);
        if let Some(requester) = requested_by.filter(|r| *r != label) {
            summary = summary.with_requested_by(requester);
        }

        for entry in entries {
            let outcome = self.process(entry, &label, primary)?;
            summary.record(&outcome);
        }

        debug!(
            "{}: {} kept, {} relocated, {} excluded, {} duplicates, {} dropped",
            label,
            summary.kept,
            summary.relocated,
            summary.excluded,
            summary.duplicates,
            summary.dropped
        );
        self.artifacts.push(summary);
        Ok(())
    }

    fn process(
        &mut self,
        entry: ArchiveEntry,
        origin: &str,
        primary: bool,
    ) -> Result<EntryOutcome, AppError> {
        if !is_safe_entry_path(&entry.path) {
            warn!("Skipping unsafe entry '{}' in {}", entry.path, origin);
            return Ok(dropped(DropReason::UnsafePath));
        }
        if !primary {
            if entry.path == MANIFEST_PATH {
                return Ok(dropped(DropReason::DependencyManifest));
            }
            if entry.is_module_descriptor() {
                return Ok(dropped(DropReason::ModuleDescriptor));
            }
        }

        if let Some(outcome) = self.exclude(&entry.path) {
            return Ok(outcome);
        }

        if !primary {
            self.check_release(&entry, origin)?;
        }

        let (entry, outcome) = if !primary {
            self.relocator.relocate_entry(entry, origin, true)?
        } else if self.options.relocate_primary {
            self.relocator.relocate_entry(entry, origin, false)?
        } else {
            (entry, EntryOutcome::Kept)
        };

        if matches!(outcome, EntryOutcome::Relocated { path_moved: true, .. }) {
            if let Some(excluded) = self.exclude(&entry.path) {
                return Ok(excluded);
            }
        }

        Ok(self.stage(entry, origin, outcome)?)
    }

    /// Tally and report an exclusion match
    fn exclude(&mut self, path: &str) -> Option<EntryOutcome> {
        let pattern = self.options.exclusions.matching_pattern(path)?.to_string();
        *self.exclusions.entry(pattern.clone()).or_insert(0) += 1;
        Some(EntryOutcome::Excluded { pattern })
    }

    fn check_release(&self, entry: &ArchiveEntry, origin: &str) -> Result<(), ArchiveError> {
        let Some(release) = self.options.target_release else {
            return Ok(());
        };
        // Multi-release jars keep newer classes under META-INF/versions/
        if !entry.is_class() || entry.path.starts_with("META-INF/versions/") {
            return Ok(());
        }
        let major = classfile::major_version(&entry.data)
            .map_err(|e| ArchiveError::malformed_class(&entry.path, origin, e))?;
        if major > release + MAJOR_VERSION_OFFSET {
            return Err(ArchiveError::UnsupportedClassVersion {
                entry: entry.path.clone(),
                origin: origin.to_string(),
                major,
                release,
            });
        }
        Ok(())
    }

    fn stage(
        &mut self,
        entry: ArchiveEntry,
        origin: &str,
        outcome: EntryOutcome,
    ) -> Result<EntryOutcome, MergeError> {
        let merge_services = self.options.merge_service_files && entry.is_service_file();
        match self.staged.get_mut(&entry.path) {
            None => {
                self.staged.insert(
                    entry.path,
                    Staged {
                        data: entry.data,
                        origin: origin.to_string(),
                    },
                );
                Ok(outcome)
            }
            Some(existing) if existing.data == entry.data => Ok(EntryOutcome::Duplicate),
            Some(existing) if merge_services => {
                existing.data = merge_service_lines(&existing.data, &entry.data);
                Ok(EntryOutcome::ServiceMerged)
            }
            Some(existing) => Err(MergeError::conflict(
                entry.path,
                existing.origin.clone(),
                origin,
            )),
        }
    }

    /// Finish merging and produce the output entries
    pub fn finish(mut self) -> MergeOutput {
        let existing = self.staged.remove(MANIFEST_PATH);
        let manifest = build_manifest(
            existing.as_ref().map(|s| s.data.as_slice()),
            &self.options.manifest_attributes,
        );

        let mut entries = Vec::with_capacity(self.staged.len() + 1);
        entries.push(ArchiveEntry::new(MANIFEST_PATH, manifest));
        entries.extend(
            self.staged
                .into_iter()
                .map(|(path, staged)| ArchiveEntry::new(path, staged.data)),
        );

        MergeOutput {
            entries,
            artifacts: self.artifacts,
            exclusions: self.exclusions,
        }
    }
}

fn dropped(reason: DropReason) -> EntryOutcome {
    EntryOutcome::Dropped { reason }
}

/// Union of provider lines, first occurrence order, comments removed
fn merge_service_lines(existing: &[u8], incoming: &[u8]) -> Vec<u8> {
    let mut providers: Vec<String> = Vec::new();
    for data in [existing, incoming] {
        for line in String::from_utf8_lossy(data).lines() {
            let provider = line.split('#').next().unwrap_or("").trim();
            if !provider.is_empty() && !providers.iter().any(|p| p == provider) {
                providers.push(provider.to_string());
            }
        }
    }

    let mut out = providers.join("\n");
    out.push('\n');
    out.into_bytes()
}
