//! Core domain models for jarshade
//!
//! This module contains the fundamental types used throughout the application:
//! - Maven coordinates and dependency declarations
//! - Relocation rules and exclusion patterns
//! - Per-entry merge outcomes
//! - Summary and report structures

mod coordinate;
mod dependency;
mod exclusion;
mod outcome;
mod relocation;
mod summary;

pub use coordinate::Coordinate;
pub use dependency::{
    DependencyDeclaration, DependencyScope, DependencySource, ModuleExclusion, ResolvedArtifact,
};
pub use exclusion::ExclusionSet;
pub use outcome::{DropReason, EntryOutcome};
pub use relocation::{is_package_name, RelocationRule};
pub use summary::{ArtifactSummary, ShadeReport};
