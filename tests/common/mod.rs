//! Shared fixtures for integration and end-to-end tests
#![allow(dead_code)]

use jarshade::config::ShadeConfig;
use jarshade::domain::ShadeReport;
use jarshade::error::AppError;
use jarshade::orchestrator::Orchestrator;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

const TAG_UTF8: u8 = 1;
const TAG_CLASS: u8 = 7;

/// A minimal Java 21 class file: `this` extends `java/lang/Object` and
/// carries `extra` as additional UTF-8 constants.
pub fn class_bytes(this: &str, extra: &[&str]) -> Vec<u8> {
    let utf8 = |s: &str| {
        let mut v = vec![TAG_UTF8];
        v.extend_from_slice(&(s.len() as u16).to_be_bytes());
        v.extend_from_slice(s.as_bytes());
        v
    };

    let mut pool = vec![
        utf8(this),
        vec![TAG_CLASS, 0, 1],
        utf8("java/lang/Object"),
        vec![TAG_CLASS, 0, 3],
    ];
    pool.extend(extra.iter().map(|s| utf8(s)));

    let mut out = Vec::new();
    out.extend_from_slice(&0xCAFE_BABEu32.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&65u16.to_be_bytes());
    out.extend_from_slice(&(pool.len() as u16 + 1).to_be_bytes());
    for entry in pool {
        out.extend_from_slice(&entry);
    }
    // access, this, super, interfaces, fields, methods, attributes
    out.extend_from_slice(&[0x00, 0x21, 0, 2, 0, 4, 0, 0, 0, 0, 0, 0, 0, 0]);
    out
}

/// Write a jar with entries in the given order
pub fn write_test_jar(path: &Path, entries: &[(&str, &[u8])]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    for (name, data) in entries {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap();
}

/// Write files below `root`, creating directories as needed
pub fn write_classes_dir(root: &Path, files: &[(&str, &[u8])]) {
    fs::create_dir_all(root).unwrap();
    for (name, data) in files {
        let path = root.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, data).unwrap();
    }
}

/// Entry names in archive order
pub fn jar_names(path: &Path) -> Vec<String> {
    let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

/// All entries of a jar keyed by path
pub fn read_test_jar(path: &Path) -> BTreeMap<String, Vec<u8>> {
    let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut entries = BTreeMap::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i).unwrap();
        let mut data = Vec::new();
        file.read_to_end(&mut data).unwrap();
        entries.insert(file.name().to_string(), data);
    }
    entries
}

/// A local Maven repository in a temporary directory
pub struct MavenRepo {
    dir: TempDir,
}

impl MavenRepo {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    fn module_dir(&self, group: &str, artifact: &str, version: &str) -> PathBuf {
        let dir = self
            .dir
            .path()
            .join(group.replace('.', "/"))
            .join(artifact)
            .join(version);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Publish `group:artifact:version` with a jar of `entries` and a POM
    /// depending on `dependencies` (coordinates)
    pub fn publish(&self, coordinate: &str, dependencies: &[&str], entries: &[(&str, &[u8])]) {
        let parts: Vec<&str> = coordinate.split(':').collect();
        let (group, artifact, version) = (parts[0], parts[1], parts[2]);
        let dir = self.module_dir(group, artifact, version);

        write_test_jar(
            &dir.join(format!("{}-{}.jar", artifact, version)),
            entries,
        );

        let deps_xml: String = dependencies
            .iter()
            .map(|d| {
                let p: Vec<&str> = d.split(':').collect();
                format!(
                    "    <dependency>\n      <groupId>{}</groupId>\n      <artifactId>{}</artifactId>\n      <version>{}</version>\n    </dependency>\n",
                    p[0], p[1], p[2]
                )
            })
            .collect();
        let pom = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<project>\n  <modelVersion>4.0.0</modelVersion>\n  <groupId>{}</groupId>\n  <artifactId>{}</artifactId>\n  <version>{}</version>\n  <dependencies>\n{}  </dependencies>\n</project>\n",
            group, artifact, version, deps_xml
        );
        fs::write(dir.join(format!("{}-{}.pom", artifact, version)), pom).unwrap();
    }
}

/// A TOML literal string for a path
pub fn toml_path(path: &Path) -> String {
    format!("'{}'", path.display())
}

/// Parse a configuration and run it to completion
pub async fn shade(config: &str) -> Result<ShadeReport, AppError> {
    let plan = ShadeConfig::parse(config, Path::new("jarshade.toml"))?.into_plan(false)?;
    Orchestrator::new(plan).run().await
}
