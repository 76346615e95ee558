//! Shade configuration
//!
//! This module provides:
//! - `jarshade.toml` loading with paths resolved against the file's directory
//! - CLI overlays (lists extend, scalars override)
//! - Validation into a ready-to-run `ShadePlan`

use crate::cli::CliArgs;
use crate::domain::{
    Coordinate, DependencyDeclaration, DependencyScope, ExclusionSet, ModuleExclusion,
    RelocationRule,
};
use crate::error::ConfigError;
use crate::resolver::{default_cache_dir, MAVEN_CENTRAL};
use crate::shade::{MergeOptions, Relocator};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The configuration file as written
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShadeConfig {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
    pub offline: bool,
    pub relocate_primary: bool,
    pub merge_service_files: bool,
    pub target_release: Option<u16>,
    pub repositories: Vec<String>,
    pub exclude: Vec<String>,
    pub relocation: RelocationConfig,
    pub manifest: BTreeMap<String, String>,
    pub dependencies: Vec<DependencyConfig>,
}

/// `[relocation]` table
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RelocationConfig {
    /// Destination root for `packages`
    pub prefix: Option<String>,
    /// Packages moved to `<prefix>.<package>`
    pub packages: Vec<String>,
    /// Explicit source/destination pairs
    pub rules: Vec<RuleConfig>,
}

/// `[[relocation.rules]]` entry
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    pub from: String,
    pub to: String,
}

/// `[[dependencies]]` entry: exactly one of `coordinate` or `path`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DependencyConfig {
    pub coordinate: Option<String>,
    pub path: Option<PathBuf>,
    pub scope: DependencyScope,
    pub transitive: Option<bool>,
    pub exclude: Vec<ModuleExclusion>,
}

impl DependencyConfig {
    fn into_declaration(self) -> Result<DependencyDeclaration, ConfigError> {
        let declaration = match (self.coordinate, self.path) {
            (Some(coordinate), None) => DependencyDeclaration::maven(Coordinate::parse(&coordinate)?),
            (None, Some(path)) => DependencyDeclaration::file(path),
            (Some(coordinate), Some(_)) => {
                return Err(ConfigError::InvalidDependency {
                    message: format!("'{}' has both a coordinate and a path", coordinate),
                });
            }
            (None, None) => {
                return Err(ConfigError::InvalidDependency {
                    message: "dependency needs a coordinate or a path".to_string(),
                });
            }
        };

        let mut declaration = declaration.with_scope(self.scope);
        if let Some(transitive) = self.transitive {
            declaration = declaration.with_transitive(transitive);
        }
        for exclusion in self.exclude {
            declaration = declaration.exclude(exclusion);
        }
        Ok(declaration)
    }
}

/// A validated, ready-to-run shade job
#[derive(Debug, Clone)]
pub struct ShadePlan {
    pub input: PathBuf,
    pub output: PathBuf,
    pub cache_dir: PathBuf,
    pub offline: bool,
    pub repositories: Vec<String>,
    pub dependencies: Vec<DependencyDeclaration>,
    pub relocator: Relocator,
    pub merge: MergeOptions,
    pub dry_run: bool,
}

impl ShadeConfig {
    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::parse(&content, path)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse configuration text; `origin` is used in errors
    pub fn parse(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::toml_parse_error(origin, e.to_string()))
    }

    /// Make relative paths relative to `base` instead of the working directory
    fn resolve_paths(&mut self, base: &Path) {
        let paths = [&mut self.input, &mut self.output, &mut self.cache_dir]
            .into_iter()
            .chain(self.dependencies.iter_mut().map(|d| &mut d.path));
        for path in paths.flatten() {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        for repository in &mut self.repositories {
            if is_relative_local(repository) {
                *repository = base.join(&*repository).display().to_string();
            }
        }
    }

    /// Overlay command line options
    pub fn apply_cli(&mut self, args: &CliArgs) {
        if let Some(input) = &args.input {
            self.input = Some(input.clone());
        }
        if let Some(output) = &args.output {
            self.output = Some(output.clone());
        }
        if let Some(cache_dir) = &args.cache_dir {
            self.cache_dir = Some(cache_dir.clone());
        }
        if let Some(prefix) = &args.prefix {
            self.relocation.prefix = Some(prefix.clone());
        }
        if let Some(release) = args.target_release {
            self.target_release = Some(release);
        }
        self.offline |= args.offline;
        self.relocate_primary |= args.relocate_primary;
        self.merge_service_files |= args.merge_service_files;

        self.repositories.extend(args.repository.iter().cloned());
        self.exclude.extend(args.exclude.iter().cloned());
        for relocation in &args.relocate {
            match &relocation.to {
                Some(to) => self.relocation.rules.push(RuleConfig {
                    from: relocation.from.clone(),
                    to: to.clone(),
                }),
                None => self.relocation.packages.push(relocation.from.clone()),
            }
        }
        self.dependencies
            .extend(args.dependency.iter().map(|coordinate| DependencyConfig {
                coordinate: Some(coordinate.clone()),
                ..DependencyConfig::default()
            }));
        self.dependencies
            .extend(args.jar.iter().map(|path| DependencyConfig {
                path: Some(path.clone()),
                ..DependencyConfig::default()
            }));
    }

    /// Relocation rules from `packages` + `prefix` and explicit `rules`
    pub fn relocation_rules(&self) -> Result<Vec<RelocationRule>, ConfigError> {
        let mut rules = Vec::new();
        if !self.relocation.packages.is_empty() {
            let prefix = self
                .relocation
                .prefix
                .as_deref()
                .ok_or_else(|| ConfigError::missing_option("relocation.prefix"))?;
            for package in &self.relocation.packages {
                rules.push(RelocationRule::under_prefix(prefix, package)?);
            }
        }
        for rule in &self.relocation.rules {
            rules.push(RelocationRule::new(&rule.from, &rule.to)?);
        }
        Ok(rules)
    }

    /// Validate everything and produce a plan
    pub fn into_plan(self, dry_run: bool) -> Result<ShadePlan, ConfigError> {
        let relocator = Relocator::new(self.relocation_rules()?)?;
        let exclusions = ExclusionSet::new(self.exclude.iter().cloned())?;

        let input = self.input.ok_or_else(|| ConfigError::missing_option("input"))?;
        if !input.exists() {
            return Err(ConfigError::InputNotFound { path: input });
        }
        let output = self
            .output
            .ok_or_else(|| ConfigError::missing_option("output"))?;

        let dependencies = self
            .dependencies
            .into_iter()
            .map(DependencyConfig::into_declaration)
            .collect::<Result<Vec<_>, _>>()?;

        let repositories = if self.repositories.is_empty() {
            vec![MAVEN_CENTRAL.to_string()]
        } else {
            self.repositories
        };

        Ok(ShadePlan {
            input,
            output,
            cache_dir: self.cache_dir.unwrap_or_else(default_cache_dir),
            offline: self.offline,
            repositories,
            dependencies,
            relocator,
            merge: MergeOptions {
                exclusions,
                merge_service_files: self.merge_service_files,
                relocate_primary: self.relocate_primary,
                target_release: self.target_release,
                manifest_attributes: self.manifest,
            },
            dry_run,
        })
    }
}

/// A repository given as a relative directory rather than a URL
fn is_relative_local(location: &str) -> bool {
    !location.contains("://") && Path::new(location).is_relative()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const LEAVESCLIP: &str = r#"
input = "build/classes"
output = "build/libs/leavesclip.jar"
target_release = 21
repositories = ["https://repo1.maven.org/maven2", "https://repo.spongepowered.org/maven/"]
exclude = ["META-INF/LICENSE.txt", "META-INF/NOTICE.txt"]

[relocation]
prefix = "leavesclip.libs"
packages = ["org.apache", "org.tukaani", "io.sigpipe"]

[manifest]
Main-Class = "org.leavesmc.leavesclip.Leavesclip"

[[dependencies]]
coordinate = "io.sigpipe:jbsdiff:1.0"

[[dependencies]]
coordinate = "net.fabricmc:sponge-mixin:0.15.5+mixin.0.8.7"
exclude = [{ group = "com.google.code.gson", module = "gson" }]

[[dependencies]]
coordinate = "org.jetbrains:annotations:24.0.0"
scope = "compile_only"

[[dependencies]]
path = "libs/local.jar"
"#;

    fn origin() -> PathBuf {
        PathBuf::from("jarshade.toml")
    }

    #[test]
    fn test_parse_full_config() {
        let config = ShadeConfig::parse(LEAVESCLIP, &origin()).unwrap();
        assert_eq!(config.target_release, Some(21));
        assert_eq!(config.relocation.packages.len(), 3);
        assert_eq!(config.dependencies.len(), 4);
        assert_eq!(config.dependencies[2].scope, DependencyScope::CompileOnly);
        assert_eq!(
            config.manifest.get("Main-Class").map(String::as_str),
            Some("org.leavesmc.leavesclip.Leavesclip")
        );
    }

    #[test]
    fn test_relocation_rules_from_prefix() {
        let config = ShadeConfig::parse(LEAVESCLIP, &origin()).unwrap();
        let rules = config.relocation_rules().unwrap();
        let rendered: Vec<String> = rules.iter().map(|r| r.to_string()).collect();
        assert_eq!(
            rendered,
            vec![
                "org.apache -> leavesclip.libs.org.apache",
                "org.tukaani -> leavesclip.libs.org.tukaani",
                "io.sigpipe -> leavesclip.libs.io.sigpipe",
            ]
        );
    }

    #[test]
    fn test_packages_without_prefix() {
        let config = ShadeConfig::parse("[relocation]\npackages = [\"org.apache\"]\n", &origin())
            .unwrap();
        let err = config.relocation_rules().unwrap_err();
        assert!(matches!(err, ConfigError::MissingOption { ref name } if name == "relocation.prefix"));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = ShadeConfig::parse("inptu = \"x\"\n", &origin()).unwrap_err();
        assert!(matches!(err, ConfigError::TomlParseError { .. }));
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("jarshade.toml");
        fs::write(&path, LEAVESCLIP).unwrap();

        let config = ShadeConfig::load(&path).unwrap();
        assert_eq!(config.input, Some(dir.path().join("build/classes")));
        assert_eq!(
            config.dependencies[3].path,
            Some(dir.path().join("libs/local.jar"))
        );
        // URLs are left alone
        assert_eq!(config.repositories[0], "https://repo1.maven.org/maven2");
    }

    #[test]
    fn test_load_missing_file() {
        let err = ShadeConfig::load(Path::new("/nonexistent/jarshade.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }

    #[test]
    fn test_apply_cli_overrides_and_extends() {
        let mut config = ShadeConfig::parse(LEAVESCLIP, &origin()).unwrap();
        let args = CliArgs {
            output: Some(PathBuf::from("out.jar")),
            exclude: vec!["META-INF/*.SF".to_string()],
            dependency: vec!["org.tukaani:xz:1.9".to_string()],
            relocate: vec![crate::cli::RelocationArg {
                from: "com.example".to_string(),
                to: Some("shaded.example".to_string()),
            }],
            offline: true,
            ..CliArgs::default()
        };
        config.apply_cli(&args);

        assert_eq!(config.output, Some(PathBuf::from("out.jar")));
        assert_eq!(config.exclude.len(), 3);
        assert_eq!(config.dependencies.len(), 5);
        assert_eq!(config.relocation.rules.len(), 1);
        assert!(config.offline);
    }

    #[test]
    fn test_into_plan() {
        let dir = TempDir::new().unwrap();
        let config = ShadeConfig {
            input: Some(dir.path().to_path_buf()),
            output: Some(dir.path().join("out.jar")),
            exclude: vec!["META-INF/LICENSE.txt".to_string()],
            ..ShadeConfig::default()
        };
        let plan = config.into_plan(true).unwrap();
        assert!(plan.dry_run);
        assert_eq!(plan.repositories, vec![MAVEN_CENTRAL]);
        assert!(plan.relocator.is_empty());
        assert!(plan.merge.exclusions.is_excluded("META-INF/LICENSE.txt"));
    }

    #[test]
    fn test_into_plan_requires_input_and_output() {
        let err = ShadeConfig::default().into_plan(false).unwrap_err();
        assert!(matches!(err, ConfigError::MissingOption { ref name } if name == "input"));

        let dir = TempDir::new().unwrap();
        let config = ShadeConfig {
            input: Some(dir.path().to_path_buf()),
            ..ShadeConfig::default()
        };
        let err = config.into_plan(false).unwrap_err();
        assert!(matches!(err, ConfigError::MissingOption { ref name } if name == "output"));
    }

    #[test]
    fn test_into_plan_missing_input() {
        let config = ShadeConfig {
            input: Some(PathBuf::from("/nonexistent/classes")),
            output: Some(PathBuf::from("out.jar")),
            ..ShadeConfig::default()
        };
        let err = config.into_plan(false).unwrap_err();
        assert!(matches!(err, ConfigError::InputNotFound { .. }));
    }

    #[test]
    fn test_invalid_dependency_declarations() {
        let both = DependencyConfig {
            coordinate: Some("a:b:1".to_string()),
            path: Some(PathBuf::from("a.jar")),
            ..DependencyConfig::default()
        };
        assert!(matches!(
            both.into_declaration(),
            Err(ConfigError::InvalidDependency { .. })
        ));
        assert!(DependencyConfig::default().into_declaration().is_err());

        let bad = DependencyConfig {
            coordinate: Some("not-a-coordinate".to_string()),
            ..DependencyConfig::default()
        };
        assert!(matches!(
            bad.into_declaration(),
            Err(ConfigError::InvalidCoordinate { .. })
        ));
    }

    #[test]
    fn test_dependency_options() {
        let config = DependencyConfig {
            coordinate: Some("net.fabricmc:sponge-mixin:0.15.5".to_string()),
            transitive: Some(false),
            exclude: vec![ModuleExclusion::group("com.google.code.gson")],
            ..DependencyConfig::default()
        };
        let declaration = config.into_declaration().unwrap();
        assert!(!declaration.transitive);
        assert_eq!(declaration.exclusions.len(), 1);
    }
}
