//! Exclusion patterns for merged archive entries
//!
//! Patterns are globs over `/`-separated entry paths. `*` stays within one
//! path segment, `**` crosses segments. Matching looks only at the path,
//! never at entry content.

use crate::error::ConfigError;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

/// A compiled set of exclusion globs
#[derive(Debug, Clone)]
pub struct ExclusionSet {
    patterns: Vec<String>,
    set: GlobSet,
}

impl ExclusionSet {
    /// Compile a list of glob patterns
    pub fn new<I, S>(patterns: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut builder = GlobSetBuilder::new();
        let mut kept = Vec::new();

        for pattern in patterns {
            let pattern: String = pattern.into();
            let normalized = pattern.trim().trim_start_matches('/').to_string();
            if normalized.is_empty() {
                return Err(ConfigError::invalid_pattern(pattern, "empty pattern"));
            }
            let glob = GlobBuilder::new(&normalized)
                .literal_separator(true)
                .build()
                .map_err(|e| ConfigError::invalid_pattern(&pattern, e.to_string()))?;
            builder.add(glob);
            kept.push(normalized);
        }

        let set = builder
            .build()
            .map_err(|e| ConfigError::invalid_pattern(kept.join(", "), e.to_string()))?;

        Ok(Self {
            patterns: kept,
            set,
        })
    }

    /// A set that excludes nothing
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
            set: GlobSet::empty(),
        }
    }

    /// The first declared pattern matching `path`, if any
    pub fn matching_pattern(&self, path: &str) -> Option<&str> {
        self.set
            .matches(path)
            .into_iter()
            .min()
            .map(|i| self.patterns[i].as_str())
    }

    /// Returns true if `path` must be left out of the output
    pub fn is_excluded(&self, path: &str) -> bool {
        self.set.is_match(path)
    }

    /// Declared patterns, in declaration order
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Returns true if no patterns were declared
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl Default for ExclusionSet {
    fn default() -> Self {
        Self::empty()
    }
}
