//! What happened to each input entry during a merge

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why an entry was dropped without being written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// A dependency's `META-INF/MANIFEST.MF`
    DependencyManifest,
    /// A dependency's `module-info.class`
    ModuleDescriptor,
    /// Path is not a safe relative entry name
    UnsafePath,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::DependencyManifest => write!(f, "dependency manifest"),
            DropReason::ModuleDescriptor => write!(f, "module descriptor"),
            DropReason::UnsafePath => write!(f, "unsafe path"),
        }
    }
}

/// Disposition of a single input entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntryOutcome {
    /// Written unchanged
    Kept,
    /// Written with a relocated path and/or rewritten references
    Relocated {
        path_moved: bool,
        content_rewritten: bool,
    },
    /// Matched an exclusion pattern
    Excluded { pattern: String },
    /// Another input already provided identical bytes at the same path
    Duplicate,
    /// Folded into a merged service file
    ServiceMerged,
    /// Dropped by a built-in merge rule
    Dropped { reason: DropReason },
}

impl EntryOutcome {
    /// Returns true if this entry's bytes end up in the output
    pub fn is_written(&self) -> bool {
        matches!(self, EntryOutcome::Kept | EntryOutcome::Relocated { .. })
    }
}

impl fmt::Display for EntryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryOutcome::Kept => write!(f, "kept"),
            EntryOutcome::Relocated { .. } => write!(f, "relocated"),
            EntryOutcome::Excluded { pattern } => write!(f, "excluded by {}", pattern),
            EntryOutcome::Duplicate => write!(f, "duplicate"),
            EntryOutcome::ServiceMerged => write!(f, "service merged"),
            EntryOutcome::Dropped { reason } => write!(f, "dropped ({})", reason),
        }
    }
}
