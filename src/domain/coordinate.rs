//! Maven coordinates

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default artifact extension
const DEFAULT_EXTENSION: &str = "jar";

/// A fully specified Maven coordinate.
///
/// Supported formats:
/// - `group:artifact:version`
/// - `group:artifact:version:classifier`
/// - `group:artifact:version@extension`
/// - `group:artifact:version:classifier@extension`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    pub group: String,
    pub artifact: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classifier: Option<String>,
    /// File extension, `jar` unless overridden
    pub extension: String,
}

impl Coordinate {
    /// Creates a plain jar coordinate
    pub fn new(
        group: impl Into<String>,
        artifact: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
            version: version.into(),
            classifier: None,
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }

    /// Parse a coordinate string
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        let value = value.trim();
        let (body, extension) = match value.rsplit_once('@') {
            Some((body, ext)) if !ext.is_empty() => (body, ext.to_string()),
            Some(_) => {
                return Err(ConfigError::invalid_coordinate(value, "empty extension"));
            }
            None => (value, DEFAULT_EXTENSION.to_string()),
        };

        let parts: Vec<&str> = body.split(':').collect();
        if parts.iter().any(|p| p.trim().is_empty()) {
            return Err(ConfigError::invalid_coordinate(value, "empty component"));
        }

        let classifier = match parts.len() {
            3 => None,
            4 => Some(parts[3].to_string()),
            _ => {
                return Err(ConfigError::invalid_coordinate(
                    value,
                    "expected 'group:artifact:version[:classifier][@extension]'",
                ));
            }
        };

        Ok(Self {
            group: parts[0].to_string(),
            artifact: parts[1].to_string(),
            version: parts[2].to_string(),
            classifier,
            extension,
        })
    }

    /// `group:artifact`, the identity used for version conflict mediation
    pub fn module_key(&self) -> String {
        format!("{}:{}", self.group, self.artifact)
    }

    /// File name inside the repository layout
    pub fn file_name(&self) -> String {
        match &self.classifier {
            Some(c) => format!(
                "{}-{}-{}.{}",
                self.artifact, self.version, c, self.extension
            ),
            None => format!("{}-{}.{}", self.artifact, self.version, self.extension),
        }
    }

    /// Relative path in the Maven repository layout, always `/`-separated
    pub fn layout_path(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.group.replace('.', "/"),
            self.artifact,
            self.version,
            self.file_name()
        )
    }

    /// The POM that describes this coordinate
    pub fn pom(&self) -> Self {
        Self {
            classifier: None,
            extension: "pom".to_string(),
            ..self.clone()
        }
    }

    /// Same module at another version
    pub fn with_version(&self, version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            ..self.clone()
        }
    }

    /// Returns true if this coordinate points at a POM
    pub fn is_pom(&self) -> bool {
        self.extension == "pom"
    }
}

impl FromStr for Coordinate {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.version)?;
        if let Some(c) = &self.classifier {
            write!(f, ":{}", c)?;
        }
        if self.extension != DEFAULT_EXTENSION {
            write!(f, "@{}", self.extension)?;
        }
        Ok(())
    }
}
