//! Maven dependency resolution
//!
//! This module provides:
//! - HTTP client shared foundation with retry logic
//! - Remote (HTTP) and local (directory) Maven repositories
//! - A download cache with checksum verification
//! - POM parsing with parent inheritance
//! - Transitive resolution with exclusions and highest-version mediation

mod client;
mod graph;
mod pom;
mod repository;
mod store;
mod version;

pub use client::HttpClient;
pub use graph::{DependencyResolver, Resolution};
pub use pom::{EffectivePom, PomDocument, PomRequirement};
pub use repository::{
    create_repository, HttpRepository, LocalRepository, Repository, MAVEN_CENTRAL,
};
pub use store::{default_cache_dir, sha1_hex, ArtifactStore};
pub use version::{compare_versions, is_newer};

use crate::error::ResolveError;
use tracing::debug;

/// Build repositories from their locations, dropping remote ones when offline
pub fn create_repositories(
    locations: &[String],
    offline: bool,
) -> Result<Vec<Box<dyn Repository>>, ResolveError> {
    let client = HttpClient::new()?;
    Ok(locations
        .iter()
        .map(|location| create_repository(location, &client))
        .filter(|repository| {
            let keep = !(offline && repository.is_remote());
            if !keep {
                debug!("Offline: skipping {}", repository.name());
            }
            keep
        })
        .collect())
}
