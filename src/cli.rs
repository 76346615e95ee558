//! CLI argument parsing module for jarshade

use clap::{ArgAction, Parser};
use std::path::{Path, PathBuf};

/// Configuration file picked up from the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "jarshade.toml";

/// A `--relocate` value: `FROM` (moved under the prefix) or `FROM=TO`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocationArg {
    pub from: String,
    pub to: Option<String>,
}

/// Parse a relocation argument in the form `FROM[=TO]`
fn parse_relocation(s: &str) -> Result<RelocationArg, String> {
    let s = s.trim();
    let (from, to) = match s.split_once('=') {
        Some((from, to)) => (from.trim(), Some(to.trim())),
        None => (s, None),
    };
    if from.is_empty() {
        return Err(format!("missing source package in '{}'", s));
    }
    if to.is_some_and(str::is_empty) {
        return Err(format!("missing destination package in '{}'", s));
    }
    Ok(RelocationArg {
        from: from.to_string(),
        to: to.map(str::to_string),
    })
}

/// Merge a jar with its dependencies and relocate package namespaces
#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "jarshade",
    version,
    about = "Merge a jar with its dependencies and relocate package namespaces"
)]
pub struct CliArgs {
    /// Configuration file (default: ./jarshade.toml when present)
    pub config: Option<PathBuf>,

    // Inputs and outputs
    /// Compiled classes directory or jar of the primary project
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Output jar path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Maven dependency to bundle, group:artifact:version (can be specified multiple times)
    #[arg(long, action = ArgAction::Append)]
    pub dependency: Vec<String>,

    /// Local jar to bundle (can be specified multiple times)
    #[arg(long, action = ArgAction::Append)]
    pub jar: Vec<PathBuf>,

    /// Maven repository URL or directory (can be specified multiple times)
    #[arg(long, action = ArgAction::Append)]
    pub repository: Vec<String>,

    // Relocation and filtering
    /// Package to relocate, FROM or FROM=TO (can be specified multiple times)
    #[arg(long, action = ArgAction::Append, value_parser = parse_relocation)]
    pub relocate: Vec<RelocationArg>,

    /// Package prefix for relocations given without a destination
    #[arg(long)]
    pub prefix: Option<String>,

    /// Entry path glob to leave out of the output (can be specified multiple times)
    #[arg(long, action = ArgAction::Append)]
    pub exclude: Vec<String>,

    /// Also rewrite references inside the primary classes
    #[arg(long)]
    pub relocate_primary: bool,

    /// Concatenate same-named META-INF/services files instead of failing
    #[arg(long)]
    pub merge_service_files: bool,

    /// Fail on dependency classes compiled for a newer Java release
    #[arg(long)]
    pub target_release: Option<u16>,

    // Resolution
    /// Download cache directory
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Never access remote repositories
    #[arg(long)]
    pub offline: bool,

    // General options
    /// Dry run mode - resolve and merge without writing the output jar
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable quiet mode - minimal output
    #[arg(short, long)]
    pub quiet: bool,

    // Output options
    /// Output the report in JSON format
    #[arg(long)]
    pub json: bool,
}

impl CliArgs {
    /// Configuration file to load, if any
    pub fn config_path(&self) -> Option<PathBuf> {
        self.config_path_in(Path::new("."))
    }

    fn config_path_in(&self, dir: &Path) -> Option<PathBuf> {
        if let Some(path) = &self.config {
            return Some(path.clone());
        }
        let default = dir.join(DEFAULT_CONFIG_FILE);
        default.is_file().then_some(default)
    }
}
