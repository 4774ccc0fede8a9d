//! Summary-level comparison of two parsed map files.
//!
//! Sections are aligned by name only. The result carries per-section deltas,
//! per-file rollups, top-N movers in each direction, and coarse anomalies.

mod anomaly;

use std::cmp::Reverse;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::OptionsError;
use crate::format::{percent_change, signed_delta};
use crate::model::{KeyedSections, ParsedResult, Region};

pub use anomaly::{AnomalyTarget, CompareAnomaly};

/// Grouping key for sections that did not name a contributing file.
pub const UNKNOWN_FILE: &str = "unknown";

/// Tuning knobs for [`compare`]. Absent fields take the documented defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompareOptions {
    /// Length of each of `topIncreases` / `topDecreases`.
    pub top_n: usize,
    /// Percent change at which a modified section is flagged.
    pub anomaly_threshold_pct: f64,
    /// Byte change at which a section is flagged; also scales the other rules.
    pub anomaly_threshold_bytes: u64,
    /// Keep zero-delta sections in the section list.
    pub include_unchanged: bool,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            top_n: 20,
            anomaly_threshold_pct: 20.0,
            anomaly_threshold_bytes: 1024,
            include_unchanged: false,
        }
    }
}

impl CompareOptions {
    /// Reject values the comparer is not prepared to handle.
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.top_n == 0 {
            return Err(OptionsError::ZeroTopN);
        }
        let pct = self.anomaly_threshold_pct;
        if !pct.is_finite() || pct < 0.0 {
            return Err(OptionsError::InvalidThreshold { field: "anomalyThresholdPct", value: pct });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionStatus {
    Added,
    Removed,
    Modified,
}

impl SectionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SectionStatus::Added => "added",
            SectionStatus::Removed => "removed",
            SectionStatus::Modified => "modified",
        }
    }
}

/// Size change of one section name between the two inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionDiff {
    pub name: String,
    pub file: Option<String>,
    pub address_a: Option<String>,
    pub address_b: Option<String>,
    pub size_a: u64,
    pub size_b: u64,
    pub delta: i64,
    pub delta_pct: f64,
    pub status: SectionStatus,
}

/// Section diffs rolled up by contributing file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileGroup {
    pub file: String,
    pub size_a: u64,
    pub size_b: u64,
    pub delta: i64,
    pub delta_pct: f64,
    pub section_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareSummary {
    pub total_size_a: u64,
    pub total_size_b: u64,
    pub total_delta: i64,
    pub total_delta_pct: f64,
    pub flash_a: u64,
    pub flash_b: u64,
    pub flash_delta: i64,
    pub ram_a: u64,
    pub ram_b: u64,
    pub ram_delta: i64,
    pub sections_added: usize,
    pub sections_removed: usize,
    pub sections_modified: usize,
    pub anomaly_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareMetadata {
    pub compared_at: DateTime<Utc>,
    pub options_used: CompareOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareResult {
    pub summary: CompareSummary,
    /// Sorted by absolute delta, largest first.
    pub sections: Vec<SectionDiff>,
    /// Sorted by absolute delta, largest first.
    pub file_groups: Vec<FileGroup>,
    pub top_increases: Vec<SectionDiff>,
    pub top_decreases: Vec<SectionDiff>,
    pub anomalies: Vec<CompareAnomaly>,
    pub metadata: CompareMetadata,
}

/// Compare `a` (baseline) against `b` (candidate) at the section-name level.
///
/// A name that occurs more than once in one input (e.g. `.text.foo` split
/// across linker passes) is compared as the sum of its occurrences; the first
/// occurrence supplies the address and file.
pub fn compare(a: &ParsedResult, b: &ParsedResult, options: &CompareOptions) -> CompareResult {
    let keyed_a = KeyedSections::build(&a.sections, |s| s.name.clone());
    let keyed_b = KeyedSections::build(&b.sections, |s| s.name.clone());

    let mut sections = Vec::new();
    for name in keyed_a.union_keys(&keyed_b) {
        let sa = keyed_a.get(name);
        let sb = keyed_b.get(name);
        let size_a = sa.map_or(0, |s| s.size);
        let size_b = sb.map_or(0, |s| s.size);
        let delta = signed_delta(size_a, size_b);
        if delta == 0 && !options.include_unchanged {
            continue;
        }

        let status = if size_a == 0 {
            SectionStatus::Added
        } else if size_b == 0 {
            SectionStatus::Removed
        } else {
            SectionStatus::Modified
        };

        sections.push(SectionDiff {
            name: name.to_string(),
            file: sb.and_then(|s| s.file_path.clone()).or_else(|| sa.and_then(|s| s.file_path.clone())),
            address_a: sa.and_then(|s| s.address.clone()),
            address_b: sb.and_then(|s| s.address.clone()),
            size_a,
            size_b,
            delta,
            delta_pct: percent_change(size_a, size_b),
            status,
        });
    }
    sections.sort_by_key(|d| Reverse(d.delta.unsigned_abs()));

    let file_groups = group_by_file(&sections);

    let mut top_increases: Vec<SectionDiff> =
        sections.iter().filter(|d| d.delta > 0).cloned().collect();
    top_increases.sort_by_key(|d| Reverse(d.delta));
    top_increases.truncate(options.top_n);

    let mut top_decreases: Vec<SectionDiff> =
        sections.iter().filter(|d| d.delta < 0).cloned().collect();
    top_decreases.sort_by_key(|d| d.delta);
    top_decreases.truncate(options.top_n);

    let anomalies = anomaly::detect(&sections, &file_groups, options);

    let total_size_a = a.total_size();
    let total_size_b = b.total_size();
    let flash_a = a.region_total(Region::Flash);
    let flash_b = b.region_total(Region::Flash);
    let ram_a = a.region_total(Region::Ram);
    let ram_b = b.region_total(Region::Ram);
    let count = |status: SectionStatus| sections.iter().filter(|d| d.status == status).count();

    let summary = CompareSummary {
        total_size_a,
        total_size_b,
        total_delta: signed_delta(total_size_a, total_size_b),
        total_delta_pct: percent_change(total_size_a, total_size_b),
        flash_a,
        flash_b,
        flash_delta: signed_delta(flash_a, flash_b),
        ram_a,
        ram_b,
        ram_delta: signed_delta(ram_a, ram_b),
        sections_added: count(SectionStatus::Added),
        sections_removed: count(SectionStatus::Removed),
        sections_modified: count(SectionStatus::Modified),
        anomaly_count: anomalies.len(),
    };

    debug!(
        sections = sections.len(),
        file_groups = file_groups.len(),
        anomalies = anomalies.len(),
        "compared map files"
    );

    CompareResult {
        summary,
        sections,
        file_groups,
        top_increases,
        top_decreases,
        anomalies,
        metadata: CompareMetadata { compared_at: Utc::now(), options_used: options.clone() },
    }
}

/// Roll section diffs up by file, largest absolute delta first.
fn group_by_file(sections: &[SectionDiff]) -> Vec<FileGroup> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<FileGroup> = Vec::new();

    for diff in sections {
        let file = diff.file.as_deref().unwrap_or(UNKNOWN_FILE);
        let i = *index.entry(file).or_insert_with(|| {
            groups.push(FileGroup {
                file: file.to_string(),
                size_a: 0,
                size_b: 0,
                delta: 0,
                delta_pct: 0.0,
                section_count: 0,
            });
            groups.len() - 1
        });
        let group = &mut groups[i];
        group.size_a = group.size_a.saturating_add(diff.size_a);
        group.size_b = group.size_b.saturating_add(diff.size_b);
        group.delta = group.delta.saturating_add(diff.delta);
        group.section_count += 1;
    }

    for group in &mut groups {
        group.delta_pct = percent_change(group.size_a, group.size_b);
    }
    groups.sort_by_key(|g| Reverse(g.delta.unsigned_abs()));
    groups
}
