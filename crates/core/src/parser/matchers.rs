use once_cell::sync::Lazy;
use regex::Regex;

use crate::format::parse_hex;
use crate::model::{MemoryRegion, Section};

use super::basename;

static MEMORY_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Z_][A-Z0-9_]*)\s+(0x[0-9a-fA-F]+)\s+(0x[0-9a-fA-F]+)")
        .expect("memory line pattern")
});

static SECTION_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\.[A-Za-z0-9_.]+)\s+(0x[0-9a-fA-F]+)\s+(0x[0-9a-fA-F]+)(?:\s+(.+?))?\s*$")
        .expect("section line pattern")
});

static WRAPPED_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\.[A-Za-z0-9_.]+\s*$").expect("wrapped name pattern"));

static CONTINUATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s+0x[0-9a-fA-F]+\s+0x[0-9a-fA-F]+").expect("continuation pattern")
});

/// A line recognized by one of the matchers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapLine {
    Memory(MemoryRegion),
    Section(Section),
}

/// Common interface for the per-shape line matchers.
pub trait LineMatcher {
    /// Returns `None` when the line does not have this matcher's shape.
    fn classify(&self, line: &str) -> Option<MapLine>;
}

/// Matches `NAME  0xORIGIN  0xLENGTH [attrs]` inside the memory configuration block.
///
/// Region names are uppercase letters and underscores, widened to also allow
/// digits after the first character (`RAM_D1`, `FLASH2`) as emitted for
/// multi-bank parts. `*default*` never matches.
#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryLineMatcher;

impl LineMatcher for MemoryLineMatcher {
    fn classify(&self, line: &str) -> Option<MapLine> {
        let caps = MEMORY_LINE.captures(line)?;
        let length_hex = caps[3].to_string();
        let length_bytes = parse_hex(&length_hex)?;
        Some(MapLine::Memory(MemoryRegion {
            name: caps[1].to_string(),
            origin_hex: caps[2].to_string(),
            length_hex,
            length_bytes,
        }))
    }
}

/// Matches `.section  0xADDRESS  0xSIZE [path]`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SectionLineMatcher;

impl SectionLineMatcher {
    /// A section name alone on its line (the toolchain wrapped a long name).
    pub fn is_wrapped_name(&self, line: &str) -> bool {
        WRAPPED_NAME.is_match(line)
    }

    /// An indented `0xADDRESS 0xSIZE ...` line following a wrapped name.
    pub fn is_continuation(&self, line: &str) -> bool {
        CONTINUATION.is_match(line)
    }
}

impl LineMatcher for SectionLineMatcher {
    fn classify(&self, line: &str) -> Option<MapLine> {
        let caps = SECTION_LINE.captures(line)?;
        let size = parse_hex(&caps[3])?;
        let file_path = caps
            .get(4)
            .map(|m| m.as_str().trim())
            // Output sections placed in RAM carry their LMA instead of a file.
            .filter(|tail| !tail.is_empty() && !tail.starts_with("load address"))
            .map(|tail| basename(tail).to_string());
        Some(MapLine::Section(Section {
            name: caps[1].to_string(),
            address: Some(caps[2].to_string()),
            size,
            file_path,
        }))
    }
}
