use anyhow::{Context, Result};
use mapdiff_core::config::AnalysisConfig;
use mapdiff_core::diff::DiffOptions;
use mapdiff_core::format::format_bytes;
use mapdiff_core::services::{ComparisonService, DiffRequest};

use super::config::load_config;
use super::report::{ensure_sections, labelled, print_input, size_change};
use crate::read_map_file;

/// Arguments for `mapdiff diff`. `None` flags fall back to the config file.
#[derive(Debug, Clone, Default)]
pub struct DiffArgs {
    pub v1: String,
    pub v2: String,
    pub config: Option<String>,
    pub growth_threshold: Option<f64>,
    pub shrink_threshold: Option<f64>,
    pub address_shift_threshold: Option<u64>,
    pub aggregate: bool,
    pub json: bool,
}

pub fn resolve_diff_options(config: &AnalysisConfig, args: &DiffArgs) -> DiffOptions {
    let mut options = config.diff.clone();
    if let Some(pct) = args.growth_threshold {
        options.anomaly_growth_threshold = pct;
    }
    if let Some(pct) = args.shrink_threshold {
        options.anomaly_shrink_threshold = pct;
    }
    if let Some(bytes) = args.address_shift_threshold {
        options.address_shift_threshold = bytes;
    }
    options
}

/// Diff two versions of the same firmware by `name:file` identity.
pub fn diff_command(args: &DiffArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let options = resolve_diff_options(&config, args);
    let service = ComparisonService::new(config);

    let v1 = read_map_file(&args.v1)?;
    let v2 = read_map_file(&args.v2)?;

    let response = service
        .diff(&DiffRequest {
            v1: &v1.text,
            v2: &v2.text,
            aggregate: args.aggregate,
            options: Some(options),
        })
        .context("Invalid diff options")?;
    ensure_sections(&v1, response.result.summary.total_size_v1)?;
    ensure_sections(&v2, response.result.summary.total_size_v2)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    let result = &response.result;
    let summary = &result.summary;
    println!("Version diff {}", response.diff_id);
    println!("  Generated: {}", result.metadata.diffed_at.format("%Y-%m-%d %H:%M:%S UTC"));
    print_input("v1:", &v1);
    print_input("v2:", &v2);
    println!();
    println!(
        "Total:  {}",
        size_change(summary.total_size_v1, summary.total_size_v2, summary.total_size_diff)
    );
    println!(
        "Entries: {} ({} added, {} removed, {} grew, {} shrank, {} unchanged)",
        summary.total_entries,
        summary.added,
        summary.removed,
        summary.growth,
        summary.shrink,
        summary.same
    );
    println!("Address shifts: {}", summary.address_shifts);

    let changed: Vec<_> = result.memory_changes.iter().filter(|c| c.changed).collect();
    if !changed.is_empty() {
        println!();
        println!("Memory regions changed:");
        for change in changed {
            println!(
                "  - {:<10} {} -> {}",
                change.name,
                region_extent(change.origin_v1.as_deref(), change.length_bytes_v1),
                region_extent(change.origin_v2.as_deref(), change.length_bytes_v2)
            );
        }
    }

    println!();
    if result.anomalies.is_empty() {
        println!("Anomalies: none");
    } else {
        println!("Anomalies ({}):", result.anomalies.len());
        for anomaly in &result.anomalies {
            println!(
                "  - [{}] {} {}: {}",
                anomaly.severity.as_str(),
                anomaly.region.as_str(),
                labelled(&anomaly.name, anomaly.file_path.as_deref()),
                anomaly.reasons.join("; ")
            );
        }
    }

    Ok(())
}

fn region_extent(origin: Option<&str>, length: Option<u64>) -> String {
    match (origin, length) {
        (Some(origin), Some(length)) => format!("{} + {}", origin, format_bytes(length)),
        _ => "absent".to_string(),
    }
}
