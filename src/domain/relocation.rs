//! Relocation rules
//!
//! A rule moves one package namespace under another, e.g.
//! `org.apache` → `leavesclip.libs.org.apache`.

use crate::error::ConfigError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

// Dotted Java package name: segments of identifier characters
static PACKAGE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*(\.[A-Za-z_$][A-Za-z0-9_$]*)*$").unwrap()
});

/// Returns true if `value` is a dotted Java package name
pub fn is_package_name(value: &str) -> bool {
    PACKAGE_NAME.is_match(value)
}

/// A source package prefix and the destination it is moved to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelocationRule {
    /// Source package, dotted form
    pub from: String,
    /// Destination package, dotted form
    pub to: String,
}

impl RelocationRule {
    /// Creates a validated rule
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Result<Self, ConfigError> {
        let from = normalize(from.into());
        let to = normalize(to.into());

        for name in [&from, &to] {
            if !is_package_name(name) {
                return Err(ConfigError::invalid_package(name.as_str()));
            }
        }

        let rule = Self { from, to };
        if rule.to == rule.from || package_under(&rule.to, &rule.from) {
            return Err(ConfigError::DestinationUnderSource {
                from: rule.from,
                to: rule.to,
            });
        }
        Ok(rule)
    }

    /// Relocates `package` under `prefix`, the shape used by the `prefix` shorthand
    pub fn under_prefix(prefix: &str, package: &str) -> Result<Self, ConfigError> {
        let prefix = normalize(prefix.to_string());
        let package = normalize(package.to_string());
        Self::new(package.clone(), format!("{}.{}", prefix, package))
    }

    /// Source prefix in internal (slash) form
    pub fn from_path(&self) -> String {
        self.from.replace('.', "/")
    }

    /// Destination prefix in internal (slash) form
    pub fn to_path(&self) -> String {
        self.to.replace('.', "/")
    }

    /// Relocates a `/`-separated entry path when it lies under the source package
    pub fn relocate_path(&self, path: &str) -> Option<String> {
        let from = self.from_path();
        let rest = path.strip_prefix(from.as_str())?;
        if rest.is_empty() || rest.starts_with('/') {
            Some(format!("{}{}", self.to_path(), rest))
        } else {
            None
        }
    }

    /// Relocates a dotted class or package name when it lies under the source package
    pub fn relocate_class_name(&self, name: &str) -> Option<String> {
        let rest = name.strip_prefix(self.from.as_str())?;
        if rest.is_empty() || rest.starts_with('.') || rest.starts_with('$') {
            Some(format!("{}{}", self.to, rest))
        } else {
            None
        }
    }
}

impl fmt::Display for RelocationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// Accept `org/apache/` style input as well as the dotted form
fn normalize(value: String) -> String {
    value
        .trim()
        .trim_matches(|c| c == '.' || c == '/')
        .replace('/', ".")
}

/// Returns true if `inner` equals `outer` or is one of its subpackages
fn package_under(inner: &str, outer: &str) -> bool {
    inner
        .strip_prefix(outer)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
}
