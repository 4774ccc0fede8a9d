use anyhow::{Context, Result};
use mapdiff_core::compare::{CompareOptions, SectionDiff};
use mapdiff_core::config::AnalysisConfig;
use mapdiff_core::format::{format_delta, format_pct};
use mapdiff_core::services::{CompareRequest, ComparisonService};

use super::config::load_config;
use super::report::{ensure_sections, labelled, print_input, size_change};
use crate::read_map_file;

/// Arguments for `mapdiff compare`. `None` flags fall back to the config file.
#[derive(Debug, Clone, Default)]
pub struct CompareArgs {
    pub base: String,
    pub target: String,
    pub config: Option<String>,
    pub top_n: Option<usize>,
    pub threshold_pct: Option<f64>,
    pub threshold_bytes: Option<u64>,
    pub include_unchanged: bool,
    pub aggregate: bool,
    pub json: bool,
}

/// Layer command-line overrides on top of the configured compare options.
pub fn resolve_compare_options(config: &AnalysisConfig, args: &CompareArgs) -> CompareOptions {
    let mut options = config.compare.clone();
    if let Some(top_n) = args.top_n {
        options.top_n = top_n;
    }
    if let Some(pct) = args.threshold_pct {
        options.anomaly_threshold_pct = pct;
    }
    if let Some(bytes) = args.threshold_bytes {
        options.anomaly_threshold_bytes = bytes;
    }
    if args.include_unchanged {
        options.include_unchanged = true;
    }
    options
}

/// Compare a baseline map against a candidate map.
pub fn compare_command(args: &CompareArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let options = resolve_compare_options(&config, args);
    let service = ComparisonService::new(config);

    let base = read_map_file(&args.base)?;
    let target = read_map_file(&args.target)?;

    let response = service
        .compare(&CompareRequest {
            base: &base.text,
            target: &target.text,
            aggregate: args.aggregate,
            options: Some(options),
        })
        .context("Invalid compare options")?;
    ensure_sections(&base, response.result.summary.total_size_a)?;
    ensure_sections(&target, response.result.summary.total_size_b)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    let result = &response.result;
    let summary = &result.summary;
    println!("Map comparison {}", response.compare_id);
    println!("  Generated: {}", result.metadata.compared_at.format("%Y-%m-%d %H:%M:%S UTC"));
    print_input("Base:", &base);
    print_input("Target:", &target);
    println!();
    println!(
        "Total:  {}",
        size_change(summary.total_size_a, summary.total_size_b, summary.total_delta)
    );
    println!("FLASH:  {}", size_change(summary.flash_a, summary.flash_b, summary.flash_delta));
    println!("RAM:    {}", size_change(summary.ram_a, summary.ram_b, summary.ram_delta));
    println!(
        "Sections: {} added, {} removed, {} modified",
        summary.sections_added, summary.sections_removed, summary.sections_modified
    );

    print_movers("Top increases", &result.top_increases);
    print_movers("Top decreases", &result.top_decreases);

    if !result.file_groups.is_empty() {
        println!();
        println!("By file:");
        for group in &result.file_groups {
            println!(
                "  - {:<24} {} ({}) across {} section(s)",
                group.file,
                format_delta(group.delta),
                format_pct(group.delta_pct),
                group.section_count
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
                "  - [{}] {}: {}",
                anomaly.severity.as_str(),
                labelled(&anomaly.name, anomaly.file.as_deref()),
                anomaly.reasons.join("; ")
            );
        }
    }

    Ok(())
}

fn print_movers(title: &str, movers: &[SectionDiff]) {
    if movers.is_empty() {
        return;
    }
    println!();
    println!("{}:", title);
    for diff in movers {
        println!(
            "  - {:<40} {} ({}) [{}]",
            labelled(&diff.name, diff.file.as_deref()),
            format_delta(diff.delta),
            format_pct(diff.delta_pct),
            diff.status.as_str()
        );
    }
}
