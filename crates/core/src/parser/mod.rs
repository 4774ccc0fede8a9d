//! Lenient GCC map-file parser.
//!
//! Parsing never fails: lines that do not match a known shape are skipped, so
//! malformed or unfamiliar input yields an empty or partial [`ParsedResult`].
//! Callers decide whether a result with zero sections is acceptable.

mod matchers;

use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;

use crate::model::{MemoryRegion, ParsedResult};

pub use matchers::{LineMatcher, MapLine, MemoryLineMatcher, SectionLineMatcher};

const MEMORY_BLOCK_MARKER: &str = "Memory Configuration";
const LINKER_SCRIPT_MARKER: &str = "Linker script";

/// Map-file parser built from two independent line matchers.
#[derive(Debug, Default)]
pub struct MapFileParser {
    memory: MemoryLineMatcher,
    section: SectionLineMatcher,
}

impl MapFileParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify a single line with either matcher.
    pub fn classify_line(&self, line: &str) -> Option<MapLine> {
        self.section.classify(line).or_else(|| self.memory.classify(line))
    }

    /// Parse raw map text into memory regions and size-sorted sections.
    pub fn parse(&self, text: &str) -> ParsedResult {
        let lines: Vec<&str> = text.lines().collect();

        let mut result = ParsedResult::default();
        for region in self.memory_regions(&lines) {
            result.memory.insert(region.name.clone(), region);
        }

        let mut sections = Vec::new();
        let mut idx = 0;
        while idx < lines.len() {
            let line = lines[idx];
            // Long section names are wrapped: name alone, numbers on the next line.
            if let Some(next) = lines.get(idx + 1) {
                if self.section.is_wrapped_name(line) && self.section.is_continuation(next) {
                    let joined = format!("{} {}", line.trim_end(), next.trim());
                    if let Some(MapLine::Section(section)) = self.section.classify(&joined) {
                        sections.push(section);
                    }
                    idx += 2;
                    continue;
                }
            }
            if let Some(MapLine::Section(section)) = self.section.classify(line) {
                sections.push(section);
            }
            idx += 1;
        }

        sections.retain(|s| s.size > 0);
        // Stable: equal sizes keep scan order.
        sections.sort_by(|a, b| b.size.cmp(&a.size));
        result.sections = sections;

        debug!(
            lines = lines.len(),
            regions = result.memory.len(),
            sections = result.sections.len(),
            "parsed map file"
        );
        result
    }

    /// Collect region lines between the memory marker and the end of its block.
    fn memory_regions(&self, lines: &[&str]) -> Vec<MemoryRegion> {
        let Some(start) = lines.iter().position(|l| l.contains(MEMORY_BLOCK_MARKER)) else {
            return Vec::new();
        };

        let mut regions = Vec::new();
        let mut in_block = false;
        for line in &lines[start + 1..] {
            if line.contains(LINKER_SCRIPT_MARKER) {
                break;
            }
            if line.trim().is_empty() {
                if in_block {
                    break;
                }
                continue;
            }
            in_block = true;
            if let Some(MapLine::Memory(region)) = self.memory.classify(line) {
                regions.push(region);
            }
        }
        regions
    }
}

/// Parse map text with a default parser.
pub fn parse_map(text: &str) -> ParsedResult {
    MapFileParser::new().parse(text)
}

/// Read a map file from disk (invalid UTF-8 is replaced, not rejected) and parse it.
pub fn parse_file(path: impl AsRef<Path>) -> io::Result<ParsedResult> {
    let bytes = fs::read(path.as_ref())?;
    Ok(parse_map(&String::from_utf8_lossy(&bytes)))
}

/// Reduce a path written by either a Unix or Windows toolchain to its final component.
pub fn basename(path: &str) -> &str {
    path.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(path)
}
