//! Dependency declarations and resolved artifacts

use super::Coordinate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// How a declared dependency participates in the merged artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyScope {
    /// Bundled into the output together with its transitive dependencies
    #[default]
    Implementation,
    /// Needed only at compile time; never resolved or bundled
    CompileOnly,
}

impl fmt::Display for DependencyScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencyScope::Implementation => write!(f, "implementation"),
            DependencyScope::CompileOnly => write!(f, "compile-only"),
        }
    }
}

/// A transitive module to leave out of a declaration's dependency graph.
///
/// Without a module the whole group is excluded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleExclusion {
    pub group: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
}

impl ModuleExclusion {
    /// Excludes a single module
    pub fn module(group: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            module: Some(module.into()),
        }
    }

    /// Excludes every module of a group
    pub fn group(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            module: None,
        }
    }

    /// Returns true if this exclusion removes the given module.
    ///
    /// `*` acts as a wildcard for either component, as in Maven POMs.
    pub fn matches(&self, group: &str, artifact: &str) -> bool {
        let group_ok = self.group == "*" || self.group == group;
        let module_ok = match self.module.as_deref() {
            None | Some("*") => true,
            Some(m) => m == artifact,
        };
        group_ok && module_ok
    }
}

/// Where a declared dependency comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencySource {
    /// Resolved from the configured repositories
    Maven(Coordinate),
    /// A jar on the local file system
    File(PathBuf),
}

/// A dependency as declared in the configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyDeclaration {
    pub source: DependencySource,
    pub scope: DependencyScope,
    /// Whether POM dependencies are followed
    pub transitive: bool,
    /// Transitive modules to leave out; never applies to the declared artifact itself
    pub exclusions: Vec<ModuleExclusion>,
}

impl DependencyDeclaration {
    /// Declares a bundled Maven dependency
    pub fn maven(coordinate: Coordinate) -> Self {
        Self {
            source: DependencySource::Maven(coordinate),
            scope: DependencyScope::Implementation,
            transitive: true,
            exclusions: Vec::new(),
        }
    }

    /// Declares a local jar file
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            source: DependencySource::File(path.into()),
            scope: DependencyScope::Implementation,
            transitive: false,
            exclusions: Vec::new(),
        }
    }

    /// Sets the scope (builder pattern)
    pub fn with_scope(mut self, scope: DependencyScope) -> Self {
        self.scope = scope;
        self
    }

    /// Sets whether transitive dependencies are followed (builder pattern)
    pub fn with_transitive(mut self, transitive: bool) -> Self {
        self.transitive = transitive;
        self
    }

    /// Adds an exclusion (builder pattern)
    pub fn exclude(mut self, exclusion: ModuleExclusion) -> Self {
        self.exclusions.push(exclusion);
        self
    }

    /// Returns true if this dependency ends up in the merged artifact
    pub fn is_bundled(&self) -> bool {
        self.scope == DependencyScope::Implementation
    }

    /// Human readable label used in reports and errors
    pub fn label(&self) -> String {
        match &self.source {
            DependencySource::Maven(c) => c.to_string(),
            DependencySource::File(p) => p.display().to_string(),
        }
    }
}

impl fmt::Display for DependencyDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.label(), self.scope)
    }
}

/// A dependency artifact available on disk, ready to be merged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedArtifact {
    /// Maven coordinate, absent for local file dependencies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinate: Option<Coordinate>,
    /// Location of the jar
    pub path: PathBuf,
    /// Label of the declaration that pulled this artifact in
    pub requested_by: String,
}

impl ResolvedArtifact {
    /// Label used as the origin of this artifact's entries
    pub fn label(&self) -> String {
        match &self.coordinate {
            Some(c) => c.to_string(),
            None => self.path.display().to_string(),
        }
    }
}
