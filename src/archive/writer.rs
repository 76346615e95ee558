//! Deterministic jar writing
//!
//! The manifest is written first, everything else in path order, all with a
//! fixed timestamp so identical inputs produce identical bytes.

use super::{ArchiveEntry, MANIFEST_PATH};
use crate::error::ArchiveError;
use std::fs::{self, File};
use std::io::{BufWriter, Seek, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Jar writer configuration
#[derive(Debug, Clone)]
pub struct JarWriter {
    compression: CompressionMethod,
    timestamp: DateTime,
}

impl JarWriter {
    /// Deflate-compressed entries stamped 1980-02-01 00:00
    pub fn new() -> Self {
        Self {
            compression: CompressionMethod::Deflated,
            timestamp: DateTime::from_date_and_time(1980, 2, 1, 0, 0, 0).unwrap_or_default(),
        }
    }

    /// Store entries without compression (builder pattern)
    pub fn stored(mut self) -> Self {
        self.compression = CompressionMethod::Stored;
        self
    }

    /// Write `entries` to `path`, replacing any existing file.
    ///
    /// Data goes to a temporary sibling first and is renamed into place, so a
    /// failure never leaves a partial jar at `path`.
    pub fn write(&self, path: &Path, entries: &[ArchiveEntry]) -> Result<(), ArchiveError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ArchiveError::write_error(path, e))?;
        }

        let tmp = temp_path(path);
        let file = File::create(&tmp).map_err(|e| ArchiveError::write_error(&tmp, e))?;
        let result = self
            .write_to(BufWriter::new(file), entries)
            .and_then(|mut writer| writer.flush().map_err(|e| e.to_string()));

        if let Err(message) = result {
            let _ = fs::remove_file(&tmp);
            return Err(ArchiveError::write_error(path, message));
        }

        fs::rename(&tmp, path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            ArchiveError::write_error(path, e)
        })?;

        debug!("Wrote {} entries to {}", entries.len(), path.display());
        Ok(())
    }

    /// Write `entries` into any seekable sink and return it
    pub fn write_to<W: Write + Seek>(&self, sink: W, entries: &[ArchiveEntry]) -> Result<W, String> {
        let options = SimpleFileOptions::default()
            .compression_method(self.compression)
            .last_modified_time(self.timestamp)
            .unix_permissions(0o644);

        let mut ordered: Vec<&ArchiveEntry> = entries.iter().collect();
        ordered.sort_by(|a, b| entry_order(&a.path, &b.path));

        let mut zip = ZipWriter::new(sink);
        for entry in ordered {
            zip.start_file(entry.path.as_str(), options)
                .map_err(|e| format!("{}: {}", entry.path, e))?;
            zip.write_all(&entry.data)
                .map_err(|e| format!("{}: {}", entry.path, e))?;
        }
        zip.finish().map_err(|e| e.to_string())
    }
}

impl Default for JarWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Write `entries` to `path` with the default writer
pub fn write_jar(path: &Path, entries: &[ArchiveEntry]) -> Result<(), ArchiveError> {
    JarWriter::new().write(path, entries)
}

/// Manifest first, then lexicographic
fn entry_order(a: &str, b: &str) -> std::cmp::Ordering {
    let a_manifest = a == MANIFEST_PATH;
    let b_manifest = b == MANIFEST_PATH;
    b_manifest.cmp(&a_manifest).then_with(|| a.cmp(b))
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output.jar".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}
