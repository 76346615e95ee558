//! jarshade - Shadow jar builder library
//!
//! This library provides the core functionality for merging a project's
//! compiled classes with its dependency jars into a single artifact:
//! - Maven dependency resolution (remote and local repositories)
//! - Package relocation of entry paths and class file references
//! - Exclusion of metadata entries and detection of merge conflicts
//! - Deterministic jar output

pub mod archive;
pub mod classfile;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod orchestrator;
pub mod output;
pub mod progress;
pub mod resolver;
pub mod shade;
