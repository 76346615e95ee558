//! Reading jars and class directories into memory

use super::{Archive, ArchiveEntry};
use crate::error::ArchiveError;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;
use zip::ZipArchive;

/// Upper bound on the buffer reserved from an entry's declared size
const MAX_PREALLOCATION: u64 = 1 << 20;

/// Read a jar or a directory of compiled classes
pub fn read_input(path: &Path, label: &str) -> Result<Archive, ArchiveError> {
    if path.is_dir() {
        read_directory(path, label)
    } else {
        read_jar(path, label)
    }
}

/// Read every file entry of a jar; directory entries are skipped
pub fn read_jar(path: &Path, label: &str) -> Result<Archive, ArchiveError> {
    let file = File::open(path).map_err(|e| ArchiveError::read_error(path, e))?;
    let mut zip =
        ZipArchive::new(BufReader::new(file)).map_err(|e| ArchiveError::read_error(path, e))?;

    let mut entries = Vec::with_capacity(zip.len());
    for i in 0..zip.len() {
        let mut file = zip
            .by_index(i)
            .map_err(|e| ArchiveError::read_error(path, e))?;
        if file.is_dir() {
            continue;
        }
        let name = file.name().to_string();
        let mut data = Vec::with_capacity(preallocation(file.size()));
        file.read_to_end(&mut data)
            .map_err(|e| ArchiveError::read_error(path, format!("{}: {}", name, e)))?;
        entries.push(ArchiveEntry::new(name, data));
    }

    debug!("Read {} entries from {}", entries.len(), path.display());
    Ok(Archive::new(label, path, entries))
}

/// Buffer size to reserve for an entry; the header size is not trusted
fn preallocation(declared: u64) -> usize {
    declared.min(MAX_PREALLOCATION) as usize
}

/// Read every file below `root`, using `/`-separated relative paths
pub fn read_directory(root: &Path, label: &str) -> Result<Archive, ArchiveError> {
    let mut entries = Vec::new();
    collect_files(root, root, &mut entries)?;
    entries.sort_by(|a, b| a.path.cmp(&b.path));

    debug!("Read {} files from {}", entries.len(), root.display());
    Ok(Archive::new(label, root, entries))
}

fn collect_files(
    root: &Path,
    dir: &Path,
    entries: &mut Vec<ArchiveEntry>,
) -> Result<(), ArchiveError> {
    let read_dir = fs::read_dir(dir).map_err(|e| ArchiveError::read_error(dir, e))?;
    for dir_entry in read_dir {
        let dir_entry = dir_entry.map_err(|e| ArchiveError::read_error(dir, e))?;
        let path = dir_entry.path();
        if path.is_dir() {
            collect_files(root, &path, entries)?;
            continue;
        }

        let relative = path
            .strip_prefix(root)
            .map_err(|e| ArchiveError::read_error(&path, e))?;
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let data = fs::read(&path).map_err(|e| ArchiveError::read_error(&path, e))?;
        entries.push(ArchiveEntry::new(name, data));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn write_test_jar(path: &Path, files: &[(&str, &[u8])]) {
        let mut zip = ZipWriter::new(File::create(path).unwrap());
        zip.add_directory("org/", SimpleFileOptions::default()).unwrap();
        for (name, data) in files {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_read_jar_skips_directories() {
        let dir = TempDir::new().unwrap();
        let jar = dir.path().join("lib.jar");
        write_test_jar(&jar, &[("org/A.class", b"a"), ("META-INF/LICENSE.txt", b"l")]);

        let archive = read_jar(&jar, "lib").unwrap();
        assert_eq!(archive.label, "lib");
        assert_eq!(archive.len(), 2);
        assert_eq!(archive.get("org/A.class").unwrap().data, b"a");
    }

    #[test]
    fn test_preallocation_is_capped() {
        assert_eq!(preallocation(0), 0);
        assert_eq!(preallocation(4096), 4096);
        assert_eq!(preallocation(u64::MAX), MAX_PREALLOCATION as usize);
    }

    #[test]
    fn test_read_jar_entry_larger_than_preallocation() {
        let dir = TempDir::new().unwrap();
        let jar = dir.path().join("big.jar");
        let data = vec![7u8; MAX_PREALLOCATION as usize * 2 + 1];
        write_test_jar(&jar, &[("org/tukaani/xz/big.bin", &data)]);

        let archive = read_jar(&jar, "big").unwrap();
        assert_eq!(archive.get("org/tukaani/xz/big.bin").unwrap().data, data);
    }

    #[test]
    fn test_read_jar_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = read_jar(&dir.path().join("missing.jar"), "x").unwrap_err();
        assert!(matches!(err, ArchiveError::ReadError { .. }));
    }

    #[test]
    fn test_read_jar_not_a_zip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.jar");
        fs::write(&path, b"definitely not a zip").unwrap();
        assert!(read_jar(&path, "bad").is_err());
    }

    #[test]
    fn test_read_directory_uses_slash_paths() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("org/leavesmc")).unwrap();
        fs::write(dir.path().join("org/leavesmc/Main.class"), b"main").unwrap();
        fs::write(dir.path().join("app.properties"), b"k=v").unwrap();

        let archive = read_directory(dir.path(), "app").unwrap();
        let paths: Vec<&str> = archive.entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["app.properties", "org/leavesmc/Main.class"]);
    }

    #[test]
    fn test_read_input_dispatches() {
        let dir = TempDir::new().unwrap();
        let classes = dir.path().join("classes");
        fs::create_dir_all(&classes).unwrap();
        fs::write(classes.join("A.class"), b"a").unwrap();
        assert_eq!(read_input(&classes, "dir").unwrap().len(), 1);

        let jar = dir.path().join("a.jar");
        write_test_jar(&jar, &[("A.class", b"a")]);
        assert_eq!(read_input(&jar, "jar").unwrap().len(), 1);
    }
}
