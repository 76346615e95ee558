//! Archive input and output
//!
//! This module provides:
//! - In-memory archive entries with their origin
//! - Reading jars and compiled class directories
//! - Deterministic jar writing

mod reader;
mod writer;

pub use reader::{read_directory, read_input, read_jar};
pub use writer::{write_jar, JarWriter};

use std::path::PathBuf;

/// Jar manifest location
pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";

/// Directory holding `ServiceLoader` provider files
pub const SERVICES_DIR: &str = "META-INF/services/";

/// A single file entry of an archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// `/`-separated relative path
    pub path: String,
    /// Uncompressed content
    pub data: Vec<u8>,
}

impl ArchiveEntry {
    /// Creates a new entry
    pub fn new(path: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            data: data.into(),
        }
    }

    /// Returns true for compiled classes
    pub fn is_class(&self) -> bool {
        self.path.ends_with(".class")
    }

    /// Returns true for `module-info.class`, including multi-release copies
    pub fn is_module_descriptor(&self) -> bool {
        self.path == "module-info.class"
            || (self.path.starts_with("META-INF/versions/")
                && self.path.ends_with("/module-info.class"))
    }

    /// Returns true for `META-INF/services/` provider files
    pub fn is_service_file(&self) -> bool {
        self.path
            .strip_prefix(SERVICES_DIR)
            .is_some_and(|name| !name.is_empty() && !name.contains('/'))
    }
}

/// The entries of one input archive
#[derive(Debug, Clone)]
pub struct Archive {
    /// Origin label used in reports and conflict errors
    pub label: String,
    /// Where the archive was read from
    pub path: PathBuf,
    /// File entries in archive order
    pub entries: Vec<ArchiveEntry>,
}

impl Archive {
    /// Creates an archive from entries
    pub fn new(label: impl Into<String>, path: impl Into<PathBuf>, entries: Vec<ArchiveEntry>) -> Self {
        Self {
            label: label.into(),
            path: path.into(),
            entries,
        }
    }

    /// Number of file entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up an entry by path
    pub fn get(&self, path: &str) -> Option<&ArchiveEntry> {
        self.entries.iter().find(|e| e.path == path)
    }
}

/// Returns true if an entry name is a safe relative path
pub fn is_safe_entry_path(path: &str) -> bool {
    !path.is_empty()
        && !path.starts_with('/')
        && !path.contains('\\')
        && !path.split('/').any(|segment| segment == "..")
}
