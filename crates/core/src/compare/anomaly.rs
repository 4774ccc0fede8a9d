use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

use crate::format::CompareSeverity;

use super::{CompareOptions, FileGroup, SectionDiff, SectionStatus, UNKNOWN_FILE};

/// More than this many small increases in one file suggests fragmentation.
const SMALL_INCREASE_LIMIT: usize = 5;

/// What an anomaly was raised against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnomalyTarget {
    Section,
    FileGroup,
    Pattern,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareAnomaly {
    #[serde(rename = "type")]
    pub target: AnomalyTarget,
    /// Section name, file name, or pattern (e.g. `.bss*`).
    pub name: String,
    pub file: Option<String>,
    pub delta: i64,
    pub reasons: Vec<String>,
    pub severity: CompareSeverity,
}

/// Run the section, file-group, and `.bss` passes; highest severity first.
pub(super) fn detect(
    sections: &[SectionDiff],
    groups: &[FileGroup],
    options: &CompareOptions,
) -> Vec<CompareAnomaly> {
    let mut anomalies: Vec<CompareAnomaly> = sections
        .iter()
        .filter_map(|d| section_anomaly(d, options))
        .chain(groups.iter().filter_map(|g| file_group_anomaly(g, sections, options)))
        .collect();
    anomalies.extend(bss_growth(sections, options));

    anomalies.sort_by_key(|a| (Reverse(a.severity.rank()), Reverse(a.delta.unsigned_abs())));
    anomalies
}

fn section_anomaly(diff: &SectionDiff, options: &CompareOptions) -> Option<CompareAnomaly> {
    if diff.delta == 0 {
        return None;
    }
    let bytes = options.anomaly_threshold_bytes;
    let abs_delta = diff.delta.unsigned_abs();
    let mut reasons = Vec::new();

    if diff.delta_pct.abs() >= options.anomaly_threshold_pct {
        reasons.push(format!(
            "Size changed by {:.2}% (threshold {}%)",
            diff.delta_pct, options.anomaly_threshold_pct
        ));
    }
    if abs_delta >= bytes {
        reasons.push(format!("Size changed by {} bytes (threshold {} bytes)", diff.delta, bytes));
    }
    if diff.status == SectionStatus::Added && diff.size_b > bytes.saturating_mul(2) {
        reasons.push(format!("New section added with {} bytes", diff.size_b));
    }
    if diff.status == SectionStatus::Removed && diff.size_a > bytes.saturating_mul(2) {
        reasons.push(format!("Section removed ({} bytes freed)", diff.size_a));
    }

    if reasons.is_empty() {
        return None;
    }
    let severity = if abs_delta > bytes.saturating_mul(10) {
        CompareSeverity::High
    } else {
        CompareSeverity::Medium
    };
    Some(CompareAnomaly {
        target: AnomalyTarget::Section,
        name: diff.name.clone(),
        file: diff.file.clone(),
        delta: diff.delta,
        reasons,
        severity,
    })
}

fn file_group_anomaly(
    group: &FileGroup,
    sections: &[SectionDiff],
    options: &CompareOptions,
) -> Option<CompareAnomaly> {
    let bytes = options.anomaly_threshold_bytes;
    let mut reasons = Vec::new();

    let small_increases = sections
        .iter()
        .filter(|d| d.file.as_deref().unwrap_or(UNKNOWN_FILE) == group.file)
        .filter(|d| d.delta > 0 && d.delta.unsigned_abs() < bytes)
        .count();
    if small_increases > SMALL_INCREASE_LIMIT {
        reasons.push(format!(
            "{small_increases} small increases (< {bytes} bytes each), possible fragmentation"
        ));
    }

    let abs_delta = group.delta.unsigned_abs();
    if abs_delta > bytes.saturating_mul(5) {
        reasons.push(format!("File changed by {} bytes across {} sections", group.delta, group.section_count));
    }

    if reasons.is_empty() {
        return None;
    }
    let severity = if abs_delta > bytes.saturating_mul(20) {
        CompareSeverity::High
    } else {
        CompareSeverity::Low
    };
    Some(CompareAnomaly {
        target: AnomalyTarget::FileGroup,
        name: group.file.clone(),
        file: Some(group.file.clone()),
        delta: group.delta,
        reasons,
        severity,
    })
}

fn bss_growth(sections: &[SectionDiff], options: &CompareOptions) -> Option<CompareAnomaly> {
    let total = sections
        .iter()
        .filter(|d| d.name.starts_with(".bss"))
        .map(|d| d.delta)
        .fold(0i64, i64::saturating_add);
    let limit = options.anomaly_threshold_bytes.saturating_mul(5);
    if total <= 0 || total.unsigned_abs() <= limit {
        return None;
    }
    Some(CompareAnomaly {
        target: AnomalyTarget::Pattern,
        name: ".bss*".to_string(),
        file: None,
        delta: total,
        reasons: vec![format!(".bss sections grew by {total} bytes in total (limit {limit} bytes)")],
        severity: CompareSeverity::Medium,
    })
}
