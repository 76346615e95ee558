//! Relocation and merging of jar contents
//!
//! This module provides:
//! - Relocator: moves package namespaces in entry paths and class constants
//! - Merger: combines the primary input with dependency archives
//! - Manifest handling for the output jar

mod manifest;
mod merger;
mod relocator;

pub use manifest::{build_manifest, Manifest};
pub use merger::{MergeOptions, MergeOutput, Merger};
pub use relocator::Relocator;
