//! Download cache in front of the configured repositories

use super::Repository;
use crate::domain::Coordinate;
use crate::error::ResolveError;
use sha1::{Digest, Sha1};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default cache location: `<platform cache dir>/jarshade`
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("jarshade")
}

/// Fetches coordinates through a local cache
pub struct ArtifactStore {
    cache_dir: PathBuf,
    repositories: Vec<Box<dyn Repository>>,
}

impl ArtifactStore {
    /// Create a store over `repositories`, tried in order
    pub fn new(cache_dir: impl Into<PathBuf>, repositories: Vec<Box<dyn Repository>>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            repositories,
        }
    }

    /// Names of the repositories, for error messages
    pub fn searched(&self) -> Vec<String> {
        self.repositories.iter().map(|r| r.name().to_string()).collect()
    }

    /// Cache location of a coordinate
    pub fn cache_path(&self, coordinate: &Coordinate) -> PathBuf {
        coordinate
            .layout_path()
            .split('/')
            .fold(self.cache_dir.clone(), |acc, segment| acc.join(segment))
    }

    /// Local path of `coordinate`, downloading it on a cache miss.
    ///
    /// Returns `Ok(None)` if no repository has the file. If some repository
    /// failed and none had the file, that failure is returned instead.
    pub async fn fetch(&self, coordinate: &Coordinate) -> Result<Option<PathBuf>, ResolveError> {
        let cached = self.cache_path(coordinate);
        if cached.is_file() {
            debug!("Cache hit for {}", coordinate);
            return Ok(Some(cached));
        }

        let layout = coordinate.layout_path();
        let mut last_error = None;
        for repository in &self.repositories {
            match repository.fetch(&layout).await {
                Ok(Some(data)) => {
                    self.verify_checksum(repository.as_ref(), &layout, coordinate, &data)
                        .await?;
                    store(&cached, &data)?;
                    if repository.is_remote() {
                        info!("Downloaded {} from {}", coordinate, repository.name());
                    }
                    return Ok(Some(cached));
                }
                Ok(None) => continue,
                Err(e) => {
                    warn!("{} failed for {}: {}", repository.name(), coordinate, e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }

    /// Compare against a `.sha1` sidecar when the repository publishes one
    async fn verify_checksum(
        &self,
        repository: &dyn Repository,
        layout: &str,
        coordinate: &Coordinate,
        data: &[u8],
    ) -> Result<(), ResolveError> {
        let sidecar = match repository.fetch(&format!("{}.sha1", layout)).await {
            Ok(Some(sidecar)) => sidecar,
            Ok(None) => return Ok(()),
            Err(e) => {
                debug!("No checksum for {}: {}", coordinate, e);
                return Ok(());
            }
        };

        let text = String::from_utf8_lossy(&sidecar);
        let Some(expected) = text.split_whitespace().next().map(str::to_ascii_lowercase) else {
            return Ok(());
        };
        let actual = sha1_hex(data);
        if expected != actual {
            return Err(ResolveError::ChecksumMismatch {
                coordinate: coordinate.to_string(),
                expected,
                actual,
            });
        }
        Ok(())
    }
}

/// Lowercase hex SHA-1 of `data`
pub fn sha1_hex(data: &[u8]) -> String {
    hex::encode(Sha1::digest(data))
}

fn store(path: &Path, data: &[u8]) -> Result<(), ResolveError> {
    let cache_error = |source| ResolveError::CacheWriteError {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(cache_error)?;
    }
    let tmp = path.with_extension("part");
    fs::write(&tmp, data).map_err(cache_error)?;
    fs::rename(&tmp, path).map_err(cache_error)
}
