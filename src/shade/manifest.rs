//! `META-INF/MANIFEST.MF` handling
//!
//! Only the main section is edited. Per-entry sections are carried over
//! verbatim after it.

use std::collections::BTreeMap;

/// Maximum line length in bytes, excluding the line break
const MAX_LINE_BYTES: usize = 72;

/// A jar manifest's main attributes plus any trailing sections
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    main: Vec<(String, String)>,
    sections: Vec<String>,
}

impl Manifest {
    /// Manifest with only `Manifest-Version` and `Created-By`
    pub fn new() -> Self {
        Self {
            main: vec![
                ("Manifest-Version".to_string(), "1.0".to_string()),
                (
                    "Created-By".to_string(),
                    format!("jarshade {}", env!("CARGO_PKG_VERSION")),
                ),
            ],
            sections: Vec::new(),
        }
    }

    /// Parse manifest bytes; malformed lines are ignored
    pub fn parse(data: &[u8]) -> Self {
        let text = String::from_utf8_lossy(data).replace("\r\n", "\n").replace('\r', "\n");

        let mut blocks: Vec<Vec<String>> = vec![Vec::new()];
        for line in text.split('\n') {
            if line.is_empty() {
                if blocks.last().is_some_and(|b| !b.is_empty()) {
                    blocks.push(Vec::new());
                }
                continue;
            }
            let Some(block) = blocks.last_mut() else {
                continue;
            };
            match (line.strip_prefix(' '), block.last_mut()) {
                (Some(continuation), Some(previous)) => previous.push_str(continuation),
                _ => block.push(line.to_string()),
            }
        }
        blocks.retain(|b| !b.is_empty());

        let mut blocks = blocks.into_iter();
        let main = blocks
            .next()
            .unwrap_or_default()
            .iter()
            .filter_map(|line| {
                let (name, value) = line.split_once(':')?;
                Some((name.trim().to_string(), value.trim_start().to_string()))
            })
            .collect();
        let sections = blocks.map(|b| b.join("\n")).collect();

        Self { main, sections }
    }

    /// Value of a main attribute, case-insensitive
    pub fn get(&self, name: &str) -> Option<&str> {
        self.main
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Set a main attribute, replacing an existing value in place
    pub fn set(&mut self, name: &str, value: &str) {
        match self.main.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
            Some(existing) => existing.1 = value.to_string(),
            None => self.main.push((name.to_string(), value.to_string())),
        }
    }

    /// Serialize with CRLF line breaks and 72-byte line wrapping
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = String::new();
        if self.get("Manifest-Version").is_none() {
            write_attribute(&mut out, "Manifest-Version", "1.0");
        }
        for (name, value) in &self.main {
            write_attribute(&mut out, name, value);
        }
        out.push_str("\r\n");

        for section in &self.sections {
            for line in section.split('\n') {
                if let Some((name, value)) = line.split_once(':') {
                    write_attribute(&mut out, name.trim(), value.trim_start());
                }
            }
            out.push_str("\r\n");
        }
        out.into_bytes()
    }
}

impl Default for Manifest {
    fn default() -> Self {
        Self::new()
    }
}

/// Produce the output manifest from the primary's manifest and configured attributes.
///
/// An existing manifest is kept byte-for-byte when there is nothing to add.
pub fn build_manifest(existing: Option<&[u8]>, attributes: &BTreeMap<String, String>) -> Vec<u8> {
    match existing {
        Some(data) if attributes.is_empty() => data.to_vec(),
        Some(data) => {
            let mut manifest = Manifest::parse(data);
            for (name, value) in attributes {
                manifest.set(name, value);
            }
            manifest.to_bytes()
        }
        None => {
            let mut manifest = Manifest::new();
            for (name, value) in attributes {
                manifest.set(name, value);
            }
            manifest.to_bytes()
        }
    }
}

fn write_attribute(out: &mut String, name: &str, value: &str) {
    let line = format!("{}: {}", name, value);
    let mut rest = line.as_str();
    let mut limit = MAX_LINE_BYTES;
    let mut first = true;

    while !rest.is_empty() {
        let mut cut = rest.len().min(limit);
        while !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        if !first {
            out.push(' ');
        }
        out.push_str(&rest[..cut]);
        out.push_str("\r\n");
        rest = &rest[cut..];
        // Continuation lines start with a space
        limit = MAX_LINE_BYTES - 1;
        first = false;
    }
}
