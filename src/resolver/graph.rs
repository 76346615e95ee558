//! Transitive dependency resolution
//!
//! Breadth-first walk over POM dependencies starting from the declared
//! roots. When a module is reached at several versions, the highest one is
//! selected. Exclusions accumulate along each path and never remove a
//! declared root.

use super::pom::{EffectivePom, PomDocument};
use super::version::is_newer;
use super::ArtifactStore;
use crate::domain::{
    Coordinate, DependencyDeclaration, DependencySource, ModuleExclusion, ResolvedArtifact,
};
use crate::error::ResolveError;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fs;
use tracing::{debug, info, warn};

/// Maximum length of a `<parent>` chain
const MAX_PARENT_DEPTH: usize = 16;

/// Result of resolving all declarations
#[derive(Debug, Default)]
pub struct Resolution {
    /// Artifacts to bundle, in resolution order
    pub artifacts: Vec<ResolvedArtifact>,
    /// Declarations that are not bundled
    pub skipped: Vec<String>,
}

#[derive(Debug)]
struct Node {
    coordinate: Coordinate,
    exclusions: Vec<ModuleExclusion>,
    requested_by: String,
    transitive: bool,
}

/// Selection state shared across the walk
#[derive(Debug, Default)]
struct Selection {
    /// Winning coordinate per `group:artifact`
    selected: HashMap<String, Coordinate>,
    /// First declaration that reached each module
    requested_by: HashMap<String, String>,
    /// Modules and local files in first-seen order
    order: Vec<Slot>,
}

#[derive(Debug)]
enum Slot {
    Module(String),
    File(ResolvedArtifact),
}

impl Selection {
    /// Record a requested coordinate. Returns true if it is now the selected version.
    fn offer(&mut self, coordinate: &Coordinate, requested_by: &str) -> bool {
        let key = coordinate.module_key();
        match self.selected.get(&key) {
            None => {
                self.order.push(Slot::Module(key.clone()));
                self.requested_by.insert(key.clone(), requested_by.to_string());
                self.selected.insert(key, coordinate.clone());
                true
            }
            Some(current) if is_newer(&coordinate.version, &current.version) => {
                debug!(
                    "{} wins over {} for {}",
                    coordinate.version, current.version, key
                );
                self.selected.insert(key, coordinate.clone());
                true
            }
            Some(_) => false,
        }
    }

    fn is_selected(&self, coordinate: &Coordinate) -> bool {
        self.selected
            .get(&coordinate.module_key())
            .is_some_and(|c| c == coordinate)
    }
}

/// Resolves dependency declarations to files on disk
pub struct DependencyResolver {
    store: ArtifactStore,
}

impl DependencyResolver {
    /// Create a resolver backed by `store`
    pub fn new(store: ArtifactStore) -> Self {
        Self { store }
    }

    /// Resolve every declaration and its transitive closure
    pub async fn resolve(
        &self,
        declarations: &[DependencyDeclaration],
    ) -> Result<Resolution, ResolveError> {
        let mut selection = Selection::default();
        let mut skipped = Vec::new();
        let mut queue = VecDeque::new();

        for declaration in declarations {
            let label = declaration.label();
            if !declaration.is_bundled() {
                debug!("Not bundling {}", declaration);
                skipped.push(label);
                continue;
            }
            match &declaration.source {
                DependencySource::File(path) => {
                    if !path.is_file() {
                        return Err(ResolveError::missing_dependency(
                            label,
                            &["local file system".to_string()],
                        ));
                    }
                    selection.order.push(Slot::File(ResolvedArtifact {
                        coordinate: None,
                        path: path.clone(),
                        requested_by: label,
                    }));
                }
                DependencySource::Maven(coordinate) => {
                    selection.offer(coordinate, &label);
                    queue.push_back(Node {
                        coordinate: coordinate.clone(),
                        exclusions: declaration.exclusions.clone(),
                        requested_by: label,
                        transitive: declaration.transitive,
                    });
                }
            }
        }

        let mut expanded = HashSet::new();
        while let Some(node) = queue.pop_front() {
            if !node.transitive || !selection.is_selected(&node.coordinate) {
                continue;
            }
            if !expanded.insert(node.coordinate.to_string()) {
                continue;
            }

            let Some(pom) = self.load_pom(&node.coordinate).await? else {
                warn!("No POM for {}; assuming no dependencies", node.coordinate);
                continue;
            };

            for requirement in pom.runtime_requirements() {
                let dep = &requirement.coordinate;
                if let Some(exclusion) = node
                    .exclusions
                    .iter()
                    .find(|e| e.matches(&dep.group, &dep.artifact))
                {
                    debug!(
                        "Excluding {} below {} ({}:{})",
                        dep,
                        node.coordinate,
                        exclusion.group,
                        exclusion.module.as_deref().unwrap_or("*")
                    );
                    continue;
                }
                if !selection.offer(dep, &node.requested_by) {
                    continue;
                }

                let mut exclusions = node.exclusions.clone();
                exclusions.extend(requirement.exclusions.iter().cloned());
                queue.push_back(Node {
                    coordinate: requirement.coordinate.clone(),
                    exclusions,
                    requested_by: node.requested_by.clone(),
                    transitive: true,
                });
            }
        }

        let artifacts = self.download(selection).await?;
        info!(
            "Resolved {} artifacts ({} not bundled)",
            artifacts.len(),
            skipped.len()
        );
        Ok(Resolution { artifacts, skipped })
    }

    /// Fetch the jar of every selected module
    async fn download(&self, selection: Selection) -> Result<Vec<ResolvedArtifact>, ResolveError> {
        let Selection {
            mut selected,
            mut requested_by,
            order,
        } = selection;

        let mut artifacts = Vec::with_capacity(order.len());
        for slot in order {
            let key = match slot {
                Slot::File(artifact) => {
                    artifacts.push(artifact);
                    continue;
                }
                Slot::Module(key) => key,
            };
            let Some(coordinate) = selected.remove(&key) else {
                continue;
            };
            if coordinate.is_pom() {
                continue;
            }

            let Some(path) = self.store.fetch(&coordinate).await? else {
                // Modules packaged as `pom` have no jar
                if self.is_pom_only(&coordinate).await? {
                    debug!("{} has pom packaging; nothing to bundle", coordinate);
                    continue;
                }
                return Err(ResolveError::missing_dependency(
                    coordinate.to_string(),
                    &self.store.searched(),
                ));
            };

            artifacts.push(ResolvedArtifact {
                requested_by: requested_by
                    .remove(&key)
                    .unwrap_or_else(|| coordinate.to_string()),
                coordinate: Some(coordinate),
                path,
            });
        }
        Ok(artifacts)
    }

    async fn is_pom_only(&self, coordinate: &Coordinate) -> Result<bool, ResolveError> {
        Ok(self
            .load_pom(coordinate)
            .await?
            .is_some_and(|pom| pom.is_pom_only()))
    }

    /// Load a POM and its parent chain. `None` if the POM itself is missing.
    async fn load_pom(&self, coordinate: &Coordinate) -> Result<Option<EffectivePom>, ResolveError> {
        let mut chain = Vec::new();
        let mut current = coordinate.pom();

        loop {
            if chain.len() >= MAX_PARENT_DEPTH {
                return Err(ResolveError::ParentChainTooDeep {
                    coordinate: coordinate.to_string(),
                });
            }

            let Some(path) = self.store.fetch(&current).await? else {
                if chain.is_empty() {
                    return Ok(None);
                }
                warn!("Parent POM {} not found; using a partial model", current);
                break;
            };
            let xml = fs::read(&path).map_err(|e| {
                ResolveError::pom_parse_error(current.to_string(), e.to_string())
            })?;
            let document = PomDocument::parse(&String::from_utf8_lossy(&xml), &current.to_string())?;
            let parent = document.parent_coordinate();
            chain.push(document);

            match parent {
                Some(parent) => current = parent,
                None => break,
            }
        }

        Ok(Some(EffectivePom::from_chain(chain)))
    }
}
