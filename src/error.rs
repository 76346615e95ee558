//! Application error types using thiserror
//!
//! Error hierarchy:
//! - ConfigError: Invalid shade configuration or CLI options
//! - ResolveError: Dependency resolution and repository communication failures
//! - ArchiveError: Jar reading/writing and class file format problems
//! - MergeError: Conflicting entries while assembling the output jar

use std::path::PathBuf;
use thiserror::Error;

/// Exit code for configuration errors
pub const EXIT_CONFIG: u8 = 2;

/// Exit code for dependency resolution errors
pub const EXIT_RESOLVE: u8 = 3;

/// Exit code for merge conflicts
pub const EXIT_CONFLICT: u8 = 4;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Dependency resolution related errors
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Archive related errors
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// Merge related errors
    #[error(transparent)]
    Merge(#[from] MergeError),
}

impl AppError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Config(_) => EXIT_CONFIG,
            AppError::Resolve(_) => EXIT_RESOLVE,
            AppError::Merge(_) => EXIT_CONFLICT,
            AppError::Archive(_) => 1,
        }
    }
}

/// Errors related to the shade configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error
    #[error("failed to parse TOML in {path}: {message}")]
    TomlParseError { path: PathBuf, message: String },

    /// A required option was not given in the config file or on the command line
    #[error("missing required option '{name}'")]
    MissingOption { name: String },

    /// Input path does not exist
    #[error("input not found: {path}")]
    InputNotFound { path: PathBuf },

    /// Malformed Maven coordinate
    #[error("invalid coordinate '{value}': {message}")]
    InvalidCoordinate { value: String, message: String },

    /// Malformed package name in a relocation rule
    #[error("invalid package name '{value}'")]
    InvalidPackage { value: String },

    /// Malformed exclusion glob
    #[error("invalid exclusion pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Relocation destination would be matched by its own source prefix
    #[error("relocation destination '{to}' lies under its source '{from}'")]
    DestinationUnderSource { from: String, to: String },

    /// The same source prefix was declared twice with different destinations
    #[error("package '{from}' is relocated to both '{first}' and '{second}'")]
    DuplicateRelocation {
        from: String,
        first: String,
        second: String,
    },

    /// A relocation destination collides with a first-party namespace
    #[error("relocation destination '{destination}' collides with first-party entry '{entry}'")]
    NamespaceCollision { destination: String, entry: String },

    /// Dependency declaration is neither a coordinate nor a path (or both)
    #[error("invalid dependency declaration: {message}")]
    InvalidDependency { message: String },
}

/// Errors related to dependency resolution
#[derive(Error, Debug)]
pub enum ResolveError {
    /// Artifact not present in any configured repository
    #[error("could not resolve dependency '{coordinate}' (searched: {searched})")]
    MissingDependency { coordinate: String, searched: String },

    /// Network request failed
    #[error("failed to fetch {url}: {message}")]
    NetworkError { url: String, message: String },

    /// Rate limit exceeded
    #[error("rate limit exceeded for {url}")]
    RateLimitExceeded { url: String },

    /// Timeout
    #[error("timeout while fetching {url}")]
    Timeout { url: String },

    /// Downloaded artifact does not match its published checksum
    #[error("checksum mismatch for '{coordinate}': expected {expected}, got {actual}")]
    ChecksumMismatch {
        coordinate: String,
        expected: String,
        actual: String,
    },

    /// POM could not be parsed
    #[error("failed to parse POM for '{coordinate}': {message}")]
    PomParseError { coordinate: String, message: String },

    /// Parent POM chain is cyclic or too deep
    #[error("parent POM chain of '{coordinate}' is too deep")]
    ParentChainTooDeep { coordinate: String },

    /// Failed to store a downloaded file in the cache
    #[error("failed to write cache file {path}: {source}")]
    CacheWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors related to reading and writing archives
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// Failed to open or read an input archive
    #[error("failed to read archive {path}: {message}")]
    ReadError { path: PathBuf, message: String },

    /// Failed to write the output archive
    #[error("failed to write archive {path}: {message}")]
    WriteError { path: PathBuf, message: String },

    /// Class file could not be parsed
    #[error("malformed class file '{entry}' in {origin}: {message}")]
    MalformedClass {
        entry: String,
        origin: String,
        message: String,
    },

    /// Class file targets a newer runtime than allowed
    #[error("class '{entry}' in {origin} has class file version {major}, newer than release {release}")]
    UnsupportedClassVersion {
        entry: String,
        origin: String,
        major: u16,
        release: u16,
    },
}

/// Errors raised while merging archives
#[derive(Error, Debug)]
pub enum MergeError {
    /// Two inputs provide the same entry with different content
    #[error("conflicting entry '{path}': provided by both {first} and {second} with different content")]
    Conflict {
        path: String,
        first: String,
        second: String,
    },
}

impl ConfigError {
    /// Creates a new TomlParseError
    pub fn toml_parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ConfigError::TomlParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new MissingOption error
    pub fn missing_option(name: impl Into<String>) -> Self {
        ConfigError::MissingOption { name: name.into() }
    }

    /// Creates a new InvalidCoordinate error
    pub fn invalid_coordinate(value: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::InvalidCoordinate {
            value: value.into(),
            message: message.into(),
        }
    }

    /// Creates a new InvalidPackage error
    pub fn invalid_package(value: impl Into<String>) -> Self {
        ConfigError::InvalidPackage {
            value: value.into(),
        }
    }

    /// Creates a new InvalidPattern error
    pub fn invalid_pattern(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::InvalidPattern {
            pattern: pattern.into(),
            message: message.into(),
        }
    }
}

impl ResolveError {
    /// Creates a new MissingDependency error
    pub fn missing_dependency(coordinate: impl Into<String>, searched: &[String]) -> Self {
        let searched = if searched.is_empty() {
            "no repositories".to_string()
        } else {
            searched.join(", ")
        };
        ResolveError::MissingDependency {
            coordinate: coordinate.into(),
            searched,
        }
    }

    /// Creates a new NetworkError
    pub fn network_error(url: impl Into<String>, message: impl Into<String>) -> Self {
        ResolveError::NetworkError {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a new Timeout error
    pub fn timeout(url: impl Into<String>) -> Self {
        ResolveError::Timeout { url: url.into() }
    }

    /// Creates a new PomParseError
    pub fn pom_parse_error(coordinate: impl Into<String>, message: impl Into<String>) -> Self {
        ResolveError::PomParseError {
            coordinate: coordinate.into(),
            message: message.into(),
        }
    }
}

impl ArchiveError {
    /// Creates a new ReadError
    pub fn read_error(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        ArchiveError::ReadError {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Creates a new WriteError
    pub fn write_error(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        ArchiveError::WriteError {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Creates a new MalformedClass error
    pub fn malformed_class(
        entry: impl Into<String>,
        origin: impl Into<String>,
        message: impl ToString,
    ) -> Self {
        ArchiveError::MalformedClass {
            entry: entry.into(),
            origin: origin.into(),
            message: message.to_string(),
        }
    }
}

impl MergeError {
    /// Creates a new Conflict error
    pub fn conflict(
        path: impl Into<String>,
        first: impl Into<String>,
        second: impl Into<String>,
    ) -> Self {
        MergeError::Conflict {
            path: path.into(),
            first: first.into(),
            second: second.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_toml_parse() {
        let err = ConfigError::toml_parse_error("/path/to/jarshade.toml", "invalid key");
        let msg = format!("{}", err);
        assert!(msg.contains("failed to parse TOML"));
        assert!(msg.contains("invalid key"));
    }

    #[test]
    fn test_config_error_missing_option() {
        let err = ConfigError::missing_option("output");
        assert_eq!(err.to_string(), "missing required option 'output'");
    }

    #[test]
    fn test_config_error_destination_under_source() {
        let err = ConfigError::DestinationUnderSource {
            from: "org.apache".to_string(),
            to: "org.apache.shaded".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("org.apache.shaded"));
        assert!(msg.contains("lies under"));
    }

    #[test]
    fn test_resolve_error_missing_dependency() {
        let err = ResolveError::missing_dependency(
            "io.sigpipe:jbsdiff:1.0",
            &["https://repo1.maven.org/maven2".to_string()],
        );
        let msg = err.to_string();
        assert!(msg.contains("could not resolve dependency 'io.sigpipe:jbsdiff:1.0'"));
        assert!(msg.contains("repo1.maven.org"));
    }

    #[test]
    fn test_resolve_error_missing_dependency_no_repositories() {
        let err = ResolveError::missing_dependency("a:b:1", &[]);
        assert!(err.to_string().contains("no repositories"));
    }

    #[test]
    fn test_resolve_error_timeout() {
        let err = ResolveError::timeout("https://example.com/a.jar");
        let msg = format!("{}", err);
        assert!(msg.contains("timeout"));
        assert!(msg.contains("a.jar"));
    }

    #[test]
    fn test_merge_error_conflict() {
        let err = MergeError::conflict("a/B.class", "one.jar", "two.jar");
        let msg = err.to_string();
        assert!(msg.contains("conflicting entry 'a/B.class'"));
        assert!(msg.contains("one.jar"));
        assert!(msg.contains("two.jar"));
    }

    #[test]
    fn test_archive_error_malformed_class() {
        let err = ArchiveError::malformed_class("a/B.class", "lib.jar", "bad magic");
        let msg = err.to_string();
        assert!(msg.contains("malformed class file"));
        assert!(msg.contains("bad magic"));
    }

    #[test]
    fn test_exit_codes() {
        let err: AppError = ConfigError::missing_option("input").into();
        assert_eq!(err.exit_code(), EXIT_CONFIG);

        let err: AppError = ResolveError::missing_dependency("a:b:1", &[]).into();
        assert_eq!(err.exit_code(), EXIT_RESOLVE);

        let err: AppError = MergeError::conflict("x", "a", "b").into();
        assert_eq!(err.exit_code(), EXIT_CONFLICT);

        let err: AppError = ArchiveError::read_error("/missing.jar", "not found").into();
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_app_error_is_transparent() {
        let app_err: AppError = MergeError::conflict("x", "a", "b").into();
        assert!(app_err.to_string().starts_with("conflicting entry"));
    }

    #[test]
    fn test_error_debug_trait() {
        let err = ConfigError::missing_option("output");
        let debug = format!("{:?}", err);
        assert!(debug.contains("MissingOption"));
    }
}
