use std::collections::BTreeMap;

use anyhow::{anyhow, Result};
use mapdiff_core::aggregate::aggregate_sections;
use mapdiff_core::format::format_bytes;
use mapdiff_core::model::{AggregatedSection, MemoryRegion, Region};
use mapdiff_core::services::ComparisonService;
use serde::Serialize;

use super::report::ensure_sections;
use crate::read_map_file;

/// `parse --aggregate --json` payload: memory regions plus grouped sections.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AggregatedReport {
    memory: BTreeMap<String, MemoryRegion>,
    sections: Vec<AggregatedSection>,
}

/// Analyze a single map file and list its largest sections.
pub fn parse_command(path: &str, aggregate: bool, top: usize, json: bool) -> Result<()> {
    if top == 0 {
        return Err(anyhow!("--top must be at least 1"));
    }
    let input = read_map_file(path)?;
    let service = ComparisonService::default();
    let parsed = service.parse(&input.text);
    ensure_sections(&input, parsed.total_size())?;

    if json {
        let body = if aggregate {
            serde_json::to_string_pretty(&AggregatedReport {
                memory: parsed.memory.clone(),
                sections: aggregate_sections(&parsed.sections),
            })?
        } else {
            serde_json::to_string_pretty(&parsed)?
        };
        println!("{}", body);
        return Ok(());
    }

    println!("Map file: {}", input.path.display());
    println!("  SHA-256: {}", input.sha256);

    if parsed.memory.is_empty() {
        println!("Memory regions: none");
    } else {
        println!("Memory regions ({}):", parsed.memory.len());
        for region in parsed.memory.values() {
            println!(
                "  - {:<10} origin {}  length {} ({})",
                region.name,
                region.origin_hex,
                region.length_hex,
                format_bytes(region.length_bytes)
            );
        }
    }

    println!(
        "Totals: {} (FLASH {}, RAM {})",
        format_bytes(parsed.total_size()),
        format_bytes(parsed.region_total(Region::Flash)),
        format_bytes(parsed.region_total(Region::Ram))
    );

    if aggregate {
        let groups = aggregate_sections(&parsed.sections);
        println!("Section groups ({}), largest first:", groups.len());
        for group in groups.iter().take(top) {
            println!(
                "  - {:<32} {:>10}  {} subsection(s)",
                group.name,
                format_bytes(group.size),
                group.subsections
            );
        }
    } else {
        println!("Sections ({}), largest first:", parsed.sections.len());
        for section in parsed.top(top) {
            println!(
                "  - {:<32} {:>10}  {}  {}",
                section.name,
                format_bytes(section.size),
                section.address.as_deref().unwrap_or("-"),
                section.file_path.as_deref().unwrap_or("")
            );
        }
    }

    Ok(())
}
