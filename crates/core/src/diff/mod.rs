//! Fine-grained diff between two versions of a firmware image.
//!
//! Sections are aligned by `name:filePath`, so a section that moved to a
//! different object file shows up as one removal plus one addition. Every
//! entry carries a status, a FLASH/RAM/OTHER region, and an address shift.

mod anomaly;

use std::cmp::Reverse;
use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::OptionsError;
use crate::format::{parse_hex, percent_change, signed_delta};
use crate::model::{KeyedSections, ParsedResult, Region, Section};

pub use anomaly::{DiffAnomaly, LARGE_SECTION_BYTES};

/// Thresholds for [`diff_versions`]. Absent fields take the documented defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiffOptions {
    /// Percent growth beyond which an entry is flagged.
    pub anomaly_growth_threshold: f64,
    /// Percent shrink beyond which an entry is flagged.
    pub anomaly_shrink_threshold: f64,
    /// Address movement (bytes) beyond which an entry counts as shifted.
    pub address_shift_threshold: u64,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            anomaly_growth_threshold: 10.0,
            anomaly_shrink_threshold: 10.0,
            address_shift_threshold: 0x1000,
        }
    }
}

impl DiffOptions {
    pub fn validate(&self) -> Result<(), OptionsError> {
        for (field, value) in [
            ("anomalyGrowthThreshold", self.anomaly_growth_threshold),
            ("anomalyShrinkThreshold", self.anomaly_shrink_threshold),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(OptionsError::InvalidThreshold { field, value });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffStatus {
    Added,
    Removed,
    Growth,
    Shrink,
    Same,
}

impl DiffStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DiffStatus::Added => "added",
            DiffStatus::Removed => "removed",
            DiffStatus::Growth => "growth",
            DiffStatus::Shrink => "shrink",
            DiffStatus::Same => "same",
        }
    }
}

/// One `name:filePath` identity across both versions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffEntry {
    pub key: String,
    pub name: String,
    pub file_path: Option<String>,
    pub size_v1: u64,
    pub size_v2: u64,
    pub size_diff: i64,
    pub size_diff_pct: f64,
    pub address_v1: Option<String>,
    pub address_v2: Option<String>,
    /// `address_v2 - address_v1`, when both addresses parse.
    pub address_diff: Option<i64>,
    pub address_shifted: bool,
    pub status: DiffStatus,
    pub region: Region,
}

/// Origin/length of a memory region in each version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryRegionChange {
    pub name: String,
    pub origin_v1: Option<String>,
    pub origin_v2: Option<String>,
    pub length_bytes_v1: Option<u64>,
    pub length_bytes_v2: Option<u64>,
    pub changed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffSummary {
    pub total_entries: usize,
    pub added: usize,
    pub removed: usize,
    pub growth: usize,
    pub shrink: usize,
    pub same: usize,
    pub address_shifts: usize,
    pub total_size_v1: u64,
    pub total_size_v2: u64,
    pub total_size_diff: i64,
    pub total_size_diff_pct: f64,
    pub anomaly_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffMetadata {
    pub diffed_at: DateTime<Utc>,
    pub options_used: DiffOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffResult {
    pub summary: DiffSummary,
    /// Sorted by absolute size change, largest first.
    pub diff: Vec<DiffEntry>,
    /// Sorted by severity, most severe first.
    pub anomalies: Vec<DiffAnomaly>,
    pub memory_changes: Vec<MemoryRegionChange>,
    pub metadata: DiffMetadata,
}

/// Identity used to align sections across versions.
pub fn section_key(section: &Section) -> String {
    format!("{}:{}", section.name, section.file_path.as_deref().unwrap_or(""))
}

/// Diff `v1` (old) against `v2` (new).
///
/// A `name:file` key that occurs more than once in one version is diffed as
/// the sum of its occurrences; the first occurrence supplies the address.
pub fn diff_versions(v1: &ParsedResult, v2: &ParsedResult, options: &DiffOptions) -> DiffResult {
    let keyed_v1 = KeyedSections::build(&v1.sections, section_key);
    let keyed_v2 = KeyedSections::build(&v2.sections, section_key);

    let mut entries: Vec<DiffEntry> = keyed_v1
        .union_keys(&keyed_v2)
        .into_iter()
        .map(|key| diff_entry(key, keyed_v1.get(key), keyed_v2.get(key), options))
        .collect();
    entries.sort_by_key(|e| Reverse(e.size_diff.unsigned_abs()));

    let mut anomalies: Vec<DiffAnomaly> =
        entries.iter().filter_map(|e| anomaly::evaluate(e, options)).collect();
    anomalies.sort_by_key(|a| Reverse(a.severity.rank()));

    let total_size_v1 = v1.total_size();
    let total_size_v2 = v2.total_size();
    let count = |status: DiffStatus| entries.iter().filter(|e| e.status == status).count();
    let summary = DiffSummary {
        total_entries: entries.len(),
        added: count(DiffStatus::Added),
        removed: count(DiffStatus::Removed),
        growth: count(DiffStatus::Growth),
        shrink: count(DiffStatus::Shrink),
        same: count(DiffStatus::Same),
        address_shifts: entries.iter().filter(|e| e.address_shifted).count(),
        total_size_v1,
        total_size_v2,
        total_size_diff: signed_delta(total_size_v1, total_size_v2),
        total_size_diff_pct: percent_change(total_size_v1, total_size_v2),
        anomaly_count: anomalies.len(),
    };

    debug!(entries = entries.len(), anomalies = anomalies.len(), "diffed map versions");

    DiffResult {
        summary,
        diff: entries,
        anomalies,
        memory_changes: memory_changes(v1, v2),
        metadata: DiffMetadata { diffed_at: Utc::now(), options_used: options.clone() },
    }
}

fn diff_entry(
    key: &str,
    s1: Option<&Section>,
    s2: Option<&Section>,
    options: &DiffOptions,
) -> DiffEntry {
    let size_v1 = s1.map_or(0, |s| s.size);
    let size_v2 = s2.map_or(0, |s| s.size);
    let size_diff = signed_delta(size_v1, size_v2);

    let status = match (s1, s2) {
        (None, _) => DiffStatus::Added,
        (_, None) => DiffStatus::Removed,
        _ if size_diff > 0 => DiffStatus::Growth,
        _ if size_diff < 0 => DiffStatus::Shrink,
        _ => DiffStatus::Same,
    };

    let address_v1 = s1.and_then(|s| s.address.clone());
    let address_v2 = s2.and_then(|s| s.address.clone());
    let address_diff = match (address_v1.as_deref().and_then(parse_hex), address_v2.as_deref().and_then(parse_hex)) {
        (Some(a1), Some(a2)) => Some(signed_delta(a1, a2)),
        _ => None,
    };
    let address_shifted =
        address_diff.is_some_and(|d| d.unsigned_abs() > options.address_shift_threshold);

    // Both sides share name and file by construction of the key.
    let section = s2.or(s1);
    let name = section.map(|s| s.name.clone()).unwrap_or_default();

    DiffEntry {
        key: key.to_string(),
        region: Region::from_section_name(&name),
        name,
        file_path: section.and_then(|s| s.file_path.clone()),
        size_v1,
        size_v2,
        size_diff,
        size_diff_pct: percent_change(size_v1, size_v2),
        address_v1,
        address_v2,
        address_diff,
        address_shifted,
        status,
    }
}

fn memory_changes(v1: &ParsedResult, v2: &ParsedResult) -> Vec<MemoryRegionChange> {
    let names: BTreeSet<&String> = v1.memory.keys().chain(v2.memory.keys()).collect();
    names
        .into_iter()
        .map(|name| {
            let r1 = v1.memory.get(name);
            let r2 = v2.memory.get(name);
            let origin_v1 = r1.map(|r| r.origin_hex.clone());
            let origin_v2 = r2.map(|r| r.origin_hex.clone());
            let length_bytes_v1 = r1.map(|r| r.length_bytes);
            let length_bytes_v2 = r2.map(|r| r.length_bytes);
            let changed = origin_v1.as_deref().and_then(parse_hex)
                != origin_v2.as_deref().and_then(parse_hex)
                || length_bytes_v1 != length_bytes_v2;
            MemoryRegionChange {
                name: name.clone(),
                origin_v1,
                origin_v2,
                length_bytes_v1,
                length_bytes_v2,
                changed,
            }
        })
        .collect()
}
