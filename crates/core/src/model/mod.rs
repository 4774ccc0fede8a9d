//! Core data model for parsed map files.
//!
//! Field names serialize in camelCase because downstream consumers (the web
//! dashboard and export layers) read these shapes verbatim.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// A named memory bank from the `Memory Configuration` block (e.g. FLASH, RAM).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryRegion {
    pub name: String,
    /// Origin exactly as written, including the `0x` prefix.
    #[serde(rename = "origin")]
    pub origin_hex: String,
    /// Length exactly as written, including the `0x` prefix.
    #[serde(rename = "length")]
    pub length_hex: String,
    pub length_bytes: u64,
}

/// One output or input section line from the map.
///
/// `size` is always greater than zero for sections produced by the parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    /// Dot-delimited section path (e.g. `.text.main`).
    pub name: String,
    pub address: Option<String>,
    pub size: u64,
    /// Basename of the contributing object file, if the line named one.
    pub file_path: Option<String>,
}

impl Section {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self { name: name.into(), address: None, size, file_path: None }
    }

    /// Builder-style helper to attach an address.
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Builder-style helper to attach a contributing file.
    pub fn with_file(mut self, file_path: impl Into<String>) -> Self {
        self.file_path = Some(file_path.into());
        self
    }

    pub fn region(&self) -> Region {
        Region::from_section_name(&self.name)
    }
}

/// Output of a single parse.
///
/// Invariant: `sections` is sorted by descending size, ties in scan order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedResult {
    pub memory: BTreeMap<String, MemoryRegion>,
    pub sections: Vec<Section>,
}

impl ParsedResult {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Sum of every section size.
    pub fn total_size(&self) -> u64 {
        self.sections.iter().map(|s| s.size).fold(0, u64::saturating_add)
    }

    /// Sum of section sizes whose name maps to `region`.
    pub fn region_total(&self, region: Region) -> u64 {
        self.sections
            .iter()
            .filter(|s| s.region() == region)
            .map(|s| s.size)
            .fold(0, u64::saturating_add)
    }

    /// The first `n` sections (the largest, given the sort invariant).
    pub fn top(&self, n: usize) -> &[Section] {
        &self.sections[..n.min(self.sections.len())]
    }
}

/// A group of sections sharing their first two dot-segments.
///
/// File identity is dropped on aggregation, so `file_path` is always `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedSection {
    pub name: String,
    pub address: Option<String>,
    pub size: u64,
    pub file_path: Option<String>,
    /// Number of raw sections folded into this group.
    pub subsections: usize,
}

/// Coarse memory class derived from a section name prefix.
///
/// This does not consult the parsed `MemoryRegion` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Region {
    Flash,
    Ram,
    Other,
}

impl Region {
    pub fn from_section_name(name: &str) -> Self {
        if name.starts_with(".text") || name.starts_with(".rodata") {
            Region::Flash
        } else if name.starts_with(".data") || name.starts_with(".bss") {
            Region::Ram
        } else {
            Region::Other
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Region::Flash => "FLASH",
            Region::Ram => "RAM",
            Region::Other => "OTHER",
        }
    }
}

/// Sections merged by a caller-chosen identity key, in first-seen order.
///
/// Repeated keys are summed into one entry; the first occurrence keeps its
/// address and file.
#[derive(Debug, Clone, Default)]
pub(crate) struct KeyedSections {
    order: Vec<String>,
    by_key: HashMap<String, Section>,
}

impl KeyedSections {
    pub(crate) fn build(sections: &[Section], key: impl Fn(&Section) -> String) -> Self {
        let mut keyed = Self::default();
        for section in sections {
            let k = key(section);
            match keyed.by_key.get_mut(&k) {
                Some(existing) => existing.size = existing.size.saturating_add(section.size),
                None => {
                    keyed.order.push(k.clone());
                    keyed.by_key.insert(k, section.clone());
                }
            }
        }
        keyed
    }

    pub(crate) fn get(&self, key: &str) -> Option<&Section> {
        self.by_key.get(key)
    }

    /// Keys of `self` in order, followed by keys only present in `other`.
    pub(crate) fn union_keys<'a>(&'a self, other: &'a KeyedSections) -> Vec<&'a str> {
        let mut keys: Vec<&str> = self.order.iter().map(String::as_str).collect();
        keys.extend(
            other.order.iter().filter(|k| !self.by_key.contains_key(*k)).map(String::as_str),
        );
        keys
    }
}
