//! Maven repository backends
//!
//! Both backends serve files by their Maven layout path. `Ok(None)` means the
//! repository does not have the file; errors are transport failures.

use super::HttpClient;
use crate::error::ResolveError;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::debug;

/// Maven Central
pub const MAVEN_CENTRAL: &str = "https://repo1.maven.org/maven2";

/// A source of Maven-layout files
#[async_trait]
pub trait Repository: Send + Sync {
    /// Display name (URL or path)
    fn name(&self) -> &str;

    /// Returns true if fetching requires network access
    fn is_remote(&self) -> bool;

    /// Fetch the file at `layout_path`
    async fn fetch(&self, layout_path: &str) -> Result<Option<Vec<u8>>, ResolveError>;
}

/// A repository served over HTTP(S)
pub struct HttpRepository {
    base_url: String,
    client: HttpClient,
}

impl HttpRepository {
    /// Create a repository rooted at `base_url`
    pub fn new(base_url: &str, client: HttpClient) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }
}

#[async_trait]
impl Repository for HttpRepository {
    fn name(&self) -> &str {
        &self.base_url
    }

    fn is_remote(&self) -> bool {
        true
    }

    async fn fetch(&self, layout_path: &str) -> Result<Option<Vec<u8>>, ResolveError> {
        let url = format!("{}/{}", self.base_url, layout_path);
        debug!("GET {}", url);
        self.client.get_bytes(&url).await
    }
}

/// A Maven-layout directory on disk, such as `~/.m2/repository`
pub struct LocalRepository {
    root: PathBuf,
    name: String,
}

impl LocalRepository {
    /// Create a repository rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            name: root.display().to_string(),
            root,
        }
    }
}

#[async_trait]
impl Repository for LocalRepository {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_remote(&self) -> bool {
        false
    }

    async fn fetch(&self, layout_path: &str) -> Result<Option<Vec<u8>>, ResolveError> {
        let path = layout_path
            .split('/')
            .fold(self.root.clone(), |acc, segment| acc.join(segment));
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ResolveError::network_error(
                path.display().to_string(),
                e.to_string(),
            )),
        }
    }
}

/// Create a repository from a URL or path.
///
/// `http://` and `https://` are remote; `file://` URLs and bare paths are local.
pub fn create_repository(location: &str, client: &HttpClient) -> Box<dyn Repository> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Box::new(HttpRepository::new(location, client.clone()))
    } else {
        let path = location.strip_prefix("file://").unwrap_or(location);
        Box::new(LocalRepository::new(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_repository_kinds() {
        let client = HttpClient::new().unwrap();
        assert!(create_repository(MAVEN_CENTRAL, &client).is_remote());
        assert!(!create_repository("file:///tmp/repo", &client).is_remote());
        assert!(!create_repository("./libs/repo", &client).is_remote());
    }

    #[test]
    fn test_http_repository_trims_trailing_slash() {
        let repo = HttpRepository::new(
            "https://repo.spongepowered.org/maven/",
            HttpClient::new().unwrap(),
        );
        assert_eq!(repo.name(), "https://repo.spongepowered.org/maven");
    }

    #[tokio::test]
    async fn test_local_repository_fetch() {
        let dir = TempDir::new().unwrap();
        let jar_dir = dir.path().join("io/sigpipe/jbsdiff/1.0");
        std::fs::create_dir_all(&jar_dir).unwrap();
        std::fs::write(jar_dir.join("jbsdiff-1.0.jar"), b"jar").unwrap();

        let repo = LocalRepository::new(dir.path());
        let found = repo
            .fetch("io/sigpipe/jbsdiff/1.0/jbsdiff-1.0.jar")
            .await
            .unwrap();
        assert_eq!(found.as_deref(), Some(&b"jar"[..]));

        let missing = repo
            .fetch("io/sigpipe/jbsdiff/2.0/jbsdiff-2.0.jar")
            .await
            .unwrap();
        assert!(missing.is_none());
    }
}
