//! Package relocation engine
//!
//! This module provides:
//! - Entry path relocation, including multi-release and service file paths
//! - Byte-level rewriting of package references in class file constants
//! - Provider list rewriting for `META-INF/services/` files
//! - First-party namespace collision checks

use crate::archive::{Archive, ArchiveEntry, SERVICES_DIR};
use crate::classfile::ClassFile;
use crate::domain::{EntryOutcome, RelocationRule};
use crate::error::{ArchiveError, ConfigError};
use tracing::trace;

/// Prefix of multi-release class directories
const VERSIONS_DIR: &str = "META-INF/versions/";

/// A rule with its search and replacement byte strings precomputed
#[derive(Debug, Clone)]
struct CompiledRule {
    rule: RelocationRule,
    from_slash: Vec<u8>,
    to_slash: Vec<u8>,
    from_dot: Vec<u8>,
    to_dot: Vec<u8>,
}

impl CompiledRule {
    fn new(rule: RelocationRule) -> Self {
        Self {
            from_slash: rule.from_path().into_bytes(),
            to_slash: rule.to_path().into_bytes(),
            from_dot: rule.from.clone().into_bytes(),
            to_dot: rule.to.clone().into_bytes(),
            rule,
        }
    }
}

/// Applies a set of relocation rules to archive entries
#[derive(Debug, Clone, Default)]
pub struct Relocator {
    /// Longest source prefix first, so nested rules win over their parents
    rules: Vec<CompiledRule>,
}

impl Relocator {
    /// Build a relocator, rejecting a source prefix mapped to two destinations
    pub fn new(rules: impl IntoIterator<Item = RelocationRule>) -> Result<Self, ConfigError> {
        let mut compiled: Vec<CompiledRule> = Vec::new();
        for rule in rules {
            if let Some(existing) = compiled.iter().find(|c| c.rule.from == rule.from) {
                if existing.rule.to == rule.to {
                    continue;
                }
                return Err(ConfigError::DuplicateRelocation {
                    from: rule.from,
                    first: existing.rule.to.clone(),
                    second: rule.to,
                });
            }
            compiled.push(CompiledRule::new(rule));
        }

        compiled.sort_by(|a, b| {
            b.rule
                .from
                .len()
                .cmp(&a.rule.from.len())
                .then_with(|| a.rule.from.cmp(&b.rule.from))
        });
        Ok(Self { rules: compiled })
    }

    /// Rules in matching order
    pub fn rules(&self) -> impl Iterator<Item = &RelocationRule> {
        self.rules.iter().map(|c| &c.rule)
    }

    /// Returns true if there is nothing to relocate
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// New location of an entry, or `None` if it stays where it is.
    ///
    /// Handles plain class and resource paths, the same paths below
    /// `META-INF/versions/N/`, and `META-INF/services/<provider interface>`.
    pub fn relocate_path(&self, path: &str) -> Option<String> {
        if let Some(service) = path.strip_prefix(SERVICES_DIR) {
            if service.is_empty() || service.contains('/') {
                return None;
            }
            return self
                .relocate_class_name(service)
                .map(|name| format!("{}{}", SERVICES_DIR, name));
        }

        if let Some((version_dir, rest)) = split_versioned(path) {
            return self
                .relocate_plain_path(rest)
                .map(|moved| format!("{}{}", version_dir, moved));
        }

        self.relocate_plain_path(path)
    }

    fn relocate_plain_path(&self, path: &str) -> Option<String> {
        self.rules.iter().find_map(|c| c.rule.relocate_path(path))
    }

    /// Relocate a dotted class name such as `org.apache.commons.io.IOUtils`
    pub fn relocate_class_name(&self, name: &str) -> Option<String> {
        self.rules.iter().find_map(|c| c.rule.relocate_class_name(name))
    }

    /// Rewrite every package reference inside a constant's bytes.
    ///
    /// A source prefix is replaced where it starts at a reference boundary
    /// and ends at a package boundary. A reference starts at the beginning
    /// of the input, after a non-name character, after the leading `/` of an
    /// absolute resource name, or after a descriptor `L`. Relocated references
    /// are preceded by the destination's last separator, which is never a
    /// boundary, so a second pass finds nothing.
    pub fn rewrite_bytes(&self, input: &[u8]) -> Option<Vec<u8>> {
        let mut out: Option<Vec<u8>> = None;
        let mut copied = 0;
        let mut i = 0;

        while i < input.len() {
            match self.match_at(input, i) {
                Some((len, replacement)) => {
                    let buf = out.get_or_insert_with(|| Vec::with_capacity(input.len() + 32));
                    buf.extend_from_slice(&input[copied..i]);
                    buf.extend_from_slice(replacement);
                    i += len;
                    copied = i;
                }
                None => i += 1,
            }
        }

        let mut buf = out?;
        buf.extend_from_slice(&input[copied..]);
        Some(buf)
    }

    fn match_at<'r>(&'r self, input: &[u8], at: usize) -> Option<(usize, &'r [u8])> {
        let rest = &input[at..];
        for c in &self.rules {
            let forms = [
                (&c.from_slash, &c.to_slash, b'/'),
                (&c.from_dot, &c.to_dot, b'.'),
            ];
            for (from, to, separator) in forms {
                if rest.starts_with(from)
                    && starts_reference(input, at, separator)
                    && ends_package(input, at + from.len(), separator)
                {
                    return Some((from.len(), to.as_slice()));
                }
            }
        }
        None
    }

    /// Relocate a whole entry.
    ///
    /// With `move_path` false only the content (and service file names,
    /// which are references rather than class locations) is relocated.
    pub fn relocate_entry(
        &self,
        entry: ArchiveEntry,
        origin: &str,
        move_path: bool,
    ) -> Result<(ArchiveEntry, EntryOutcome), ArchiveError> {
        if self.is_empty() {
            return Ok((entry, EntryOutcome::Kept));
        }

        let new_path = if move_path || entry.is_service_file() {
            self.relocate_path(&entry.path)
        } else {
            None
        };

        let new_data = if entry.is_class() {
            self.rewrite_class(&entry.data, &entry.path, origin)?
        } else if entry.is_service_file() {
            self.rewrite_service_file(&entry.data)
        } else {
            None
        };

        let outcome = if new_path.is_some() || new_data.is_some() {
            EntryOutcome::Relocated {
                path_moved: new_path.is_some(),
                content_rewritten: new_data.is_some(),
            }
        } else {
            EntryOutcome::Kept
        };

        if let Some(ref moved) = new_path {
            trace!("{} -> {}", entry.path, moved);
        }

        let ArchiveEntry { path, data } = entry;
        Ok((
            ArchiveEntry::new(new_path.unwrap_or(path), new_data.unwrap_or(data)),
            outcome,
        ))
    }

    /// Rewrite the constant pool of a class; `None` if no constant refers to a source package
    pub fn rewrite_class(
        &self,
        data: &[u8],
        entry: &str,
        origin: &str,
    ) -> Result<Option<Vec<u8>>, ArchiveError> {
        let class =
            ClassFile::parse(data).map_err(|e| ArchiveError::malformed_class(entry, origin, e))?;
        class
            .rewrite_utf8(|constant| self.rewrite_bytes(constant))
            .map_err(|e| ArchiveError::malformed_class(entry, origin, e))
    }

    /// Relocate provider class names listed in a service file, keeping comments and layout
    pub fn rewrite_service_file(&self, data: &[u8]) -> Option<Vec<u8>> {
        let text = std::str::from_utf8(data).ok()?;
        let mut changed = false;
        let mut out = String::with_capacity(text.len() + 32);

        for line in text.split_inclusive('\n') {
            let (content, comment) = match line.find('#') {
                Some(i) => line.split_at(i),
                None => (line, ""),
            };
            let provider = content.trim();
            match self.relocate_class_name(provider) {
                Some(relocated) if !provider.is_empty() => {
                    let start = content.find(provider).unwrap_or(0);
                    out.push_str(&content[..start]);
                    out.push_str(&relocated);
                    out.push_str(&content[start + provider.len()..]);
                    out.push_str(comment);
                    changed = true;
                }
                _ => out.push_str(line),
            }
        }

        changed.then(|| out.into_bytes())
    }

    /// Fail if a first-party entry already lives under a relocation destination
    pub fn check_collisions(&self, primary: &Archive) -> Result<(), ConfigError> {
        for c in &self.rules {
            let destination = c.rule.to_path();
            let nested = format!("{}/", destination);
            let hit = primary.entries.iter().find(|e| {
                let path = split_versioned(&e.path).map_or(e.path.as_str(), |(_, rest)| rest);
                path == destination || path.starts_with(&nested)
            });
            if let Some(entry) = hit {
                return Err(ConfigError::NamespaceCollision {
                    destination: c.rule.to.clone(),
                    entry: entry.path.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Split `META-INF/versions/N/rest` into (`META-INF/versions/N/`, `rest`)
fn split_versioned(path: &str) -> Option<(&str, &str)> {
    let after = path.strip_prefix(VERSIONS_DIR)?;
    let slash = after.find('/')?;
    let version = &after[..slash];
    if version.is_empty() || !version.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let split = VERSIONS_DIR.len() + slash + 1;
    Some((&path[..split], &path[split..]))
}

/// Bytes that can be part of a qualified Java name in either form
fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'$' | b'/' | b'.') || b >= 0x80
}

/// Field descriptor characters that may directly precede an object type `L`
fn is_descriptor_prefix(b: u8) -> bool {
    matches!(b, b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z')
}

fn starts_reference(input: &[u8], at: usize, separator: u8) -> bool {
    if at == 0 {
        return true;
    }
    let prev = input[at - 1];
    if !is_name_byte(prev) {
        return true;
    }
    if separator != b'/' {
        return false;
    }
    match prev {
        // Absolute resource name, as passed to Class.getResource
        b'/' => at == 1,
        // Object type in a descriptor, possibly after primitive parameters
        b'L' => {
            let primitives = input[..at - 1]
                .iter()
                .rev()
                .take_while(|&&b| is_descriptor_prefix(b))
                .count();
            let before = at - 1 - primitives;
            before == 0 || !is_name_byte(input[before - 1])
        }
        _ => false,
    }
}

fn ends_package(input: &[u8], end: usize, separator: u8) -> bool {
    match input.get(end) {
        None => true,
        Some(&b) => b == separator || b == b'$' || !is_name_byte(b),
    }
}
