//! POM parsing and effective model construction
//!
//! Only the parts needed for dependency resolution are modelled: coordinates,
//! `<parent>`, `<properties>`, `<dependencyManagement>` and `<dependencies>`.
//! BOM imports (`<scope>import</scope>`) are not followed.

use crate::domain::{Coordinate, ModuleExclusion};
use crate::error::ResolveError;
use quick_xml::de::from_str;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Limit for nested `${...}` expansion
const MAX_INTERPOLATION_ROUNDS: usize = 10;

/// One POM document as written
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PomDocument {
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub artifact_id: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub packaging: Option<String>,
    #[serde(default)]
    pub parent: Option<PomParent>,
    #[serde(default)]
    pub properties: Option<HashMap<String, String>>,
    #[serde(default)]
    pub dependency_management: Option<PomDependencyManagement>,
    #[serde(default)]
    pub dependencies: Option<PomDependencies>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PomParent {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct PomDependencies {
    #[serde(default, rename = "dependency")]
    pub items: Vec<PomDependency>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PomDependencyManagement {
    #[serde(default)]
    pub dependencies: Option<PomDependencies>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PomDependency {
    pub group_id: String,
    pub artifact_id: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub optional: Option<String>,
    #[serde(rename = "type", default)]
    pub dep_type: Option<String>,
    #[serde(default)]
    pub classifier: Option<String>,
    #[serde(default)]
    pub exclusions: Option<PomExclusions>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct PomExclusions {
    #[serde(default, rename = "exclusion")]
    pub items: Vec<PomExclusion>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PomExclusion {
    pub group_id: String,
    #[serde(default)]
    pub artifact_id: Option<String>,
}

impl PomDocument {
    /// Parse POM XML; `origin` names the coordinate in errors
    pub fn parse(xml: &str, origin: &str) -> Result<Self, ResolveError> {
        from_str(xml).map_err(|e| ResolveError::pom_parse_error(origin, e.to_string()))
    }

    /// Coordinate of this document's parent POM
    pub fn parent_coordinate(&self) -> Option<Coordinate> {
        self.parent
            .as_ref()
            .map(|p| Coordinate::new(&p.group_id, &p.artifact_id, &p.version).pom())
    }
}

/// A dependency edge read from an effective POM
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PomRequirement {
    pub coordinate: Coordinate,
    pub exclusions: Vec<ModuleExclusion>,
}

/// A POM merged with its parent chain
#[derive(Debug, Default)]
pub struct EffectivePom {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub packaging: String,
    properties: HashMap<String, String>,
    managed: HashMap<String, String>,
    dependencies: Vec<PomDependency>,
}

impl EffectivePom {
    /// Merge a chain of documents, child first
    pub fn from_chain(chain: Vec<PomDocument>) -> Self {
        let mut pom = EffectivePom::default();

        // Walk from the root ancestor down so children override parents
        for doc in chain.into_iter().rev() {
            let parent = doc.parent.clone();
            if let Some(group) = doc.group_id.or_else(|| parent.as_ref().map(|p| p.group_id.clone())) {
                pom.group_id = group;
            }
            if let Some(artifact) = doc.artifact_id {
                pom.artifact_id = artifact;
            }
            if let Some(version) = doc.version.or_else(|| parent.as_ref().map(|p| p.version.clone())) {
                pom.version = version;
            }
            pom.packaging = doc.packaging.unwrap_or_else(|| "jar".to_string());

            if let Some(p) = &parent {
                pom.properties
                    .insert("project.parent.version".to_string(), p.version.clone());
                pom.properties
                    .insert("project.parent.groupId".to_string(), p.group_id.clone());
            }
            pom.properties.extend(doc.properties.unwrap_or_default());

            if let Some(deps) = doc.dependency_management.and_then(|dm| dm.dependencies) {
                for managed in deps.items {
                    if managed.scope.as_deref() == Some("import") {
                        debug!(
                            "Ignoring BOM import {}:{}",
                            managed.group_id, managed.artifact_id
                        );
                        continue;
                    }
                    if let Some(version) = managed.version {
                        pom.managed.insert(
                            format!("{}:{}", managed.group_id, managed.artifact_id),
                            version,
                        );
                    }
                }
            }

            if let Some(deps) = doc.dependencies {
                pom.dependencies.extend(deps.items);
            }
        }

        for (key, value) in [
            ("project.groupId", pom.group_id.clone()),
            ("project.artifactId", pom.artifact_id.clone()),
            ("project.version", pom.version.clone()),
            ("pom.groupId", pom.group_id.clone()),
            ("pom.version", pom.version.clone()),
            ("version", pom.version.clone()),
        ] {
            pom.properties.entry(key.to_string()).or_insert(value);
        }
        pom
    }

    /// Returns true if the artifact has no jar of its own
    pub fn is_pom_only(&self) -> bool {
        self.packaging == "pom"
    }

    /// Expand `${...}` references; unknown properties are left as-is
    pub fn interpolate(&self, value: &str) -> String {
        let mut current = value.trim().to_string();
        for _ in 0..MAX_INTERPOLATION_ROUNDS {
            let Some(start) = current.find("${") else {
                break;
            };
            let Some(len) = current[start..].find('}') else {
                break;
            };
            let name = &current[start + 2..start + len];
            let Some(replacement) = self.properties.get(name) else {
                break;
            };
            current = format!(
                "{}{}{}",
                &current[..start],
                replacement,
                &current[start + len + 1..]
            );
        }
        current
    }

    /// Dependencies that end up on the runtime classpath.
    ///
    /// `compile` and `runtime` scoped, non-optional dependencies with a
    /// resolvable version, interpolated.
    pub fn runtime_requirements(&self) -> Vec<PomRequirement> {
        let mut requirements: Vec<PomRequirement> = Vec::new();

        for dep in &self.dependencies {
            let scope = dep.scope.as_deref().map(|s| self.interpolate(s));
            if !matches!(scope.as_deref(), None | Some("compile") | Some("runtime")) {
                continue;
            }
            if dep
                .optional
                .as_deref()
                .is_some_and(|o| self.interpolate(o) == "true")
            {
                continue;
            }

            let group = self.interpolate(&dep.group_id);
            let artifact = self.interpolate(&dep.artifact_id);
            let key = format!("{}:{}", group, artifact);
            let version = dep
                .version
                .as_deref()
                .or_else(|| self.managed.get(&key).map(String::as_str))
                .map(|v| self.interpolate(v));

            let Some(version) = version.filter(|v| !v.contains("${") && !v.is_empty()) else {
                warn!(
                    "No usable version for {} in {}:{}:{}; skipping",
                    key, self.group_id, self.artifact_id, self.version
                );
                continue;
            };
            let version = strip_range(&version);

            let mut coordinate = Coordinate::new(group, artifact, version);
            coordinate.classifier = dep.classifier.as_deref().map(|c| self.interpolate(c));
            match dep.dep_type.as_deref() {
                None | Some("jar") | Some("bundle") => {}
                Some("test-jar") => continue,
                Some(other) => coordinate.extension = other.to_string(),
            }

            // The last declaration of a module wins, as in Maven
            requirements.retain(|r| r.coordinate.module_key() != key);
            requirements.push(PomRequirement {
                coordinate,
                exclusions: dep
                    .exclusions
                    .iter()
                    .flat_map(|e| e.items.iter())
                    .map(|e| ModuleExclusion {
                        group: e.group_id.clone(),
                        module: e.artifact_id.clone(),
                    })
                    .collect(),
            });
        }

        requirements
    }
}

/// Reduce a hard version range like `[1.2]` or `[1.2,)` to its lower bound
fn strip_range(version: &str) -> String {
    let trimmed = version.trim();
    if !(trimmed.starts_with('[') || trimmed.starts_with('(')) {
        return trimmed.to_string();
    }
    trimmed
        .trim_matches(|c| matches!(c, '[' | ']' | '(' | ')'))
        .split(',')
        .next()
        .unwrap_or("")
        .trim()
        .to_string()
}
