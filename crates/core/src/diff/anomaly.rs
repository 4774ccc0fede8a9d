use serde::{Deserialize, Serialize};

use crate::format::DiffSeverity;
use crate::model::Region;

use super::{DiffEntry, DiffOptions, DiffStatus};

/// Size above which an added or removed section is flagged.
///
/// Fixed rather than derived from [`DiffOptions`]; the summary comparer's
/// equivalent rule scales with its configurable byte threshold.
pub const LARGE_SECTION_BYTES: u64 = 1024;

/// Added/removed entries above this size are critical rather than high.
const CRITICAL_ADD_REMOVE_BYTES: u64 = 10 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffAnomaly {
    pub key: String,
    pub name: String,
    pub file_path: Option<String>,
    pub status: DiffStatus,
    pub region: Region,
    pub size_diff: i64,
    pub size_diff_pct: f64,
    pub reasons: Vec<String>,
    pub severity: DiffSeverity,
}

/// Collect every reason that applies to `entry`; `None` when nothing does.
pub(super) fn evaluate(entry: &DiffEntry, options: &DiffOptions) -> Option<DiffAnomaly> {
    let mut reasons = Vec::new();

    if entry.status == DiffStatus::Added && entry.size_v2 > LARGE_SECTION_BYTES {
        reasons.push(format!("New section ({} bytes)", entry.size_v2));
    }
    if entry.status == DiffStatus::Removed && entry.size_v1 > LARGE_SECTION_BYTES {
        reasons.push(format!("Section removed ({} bytes)", entry.size_v1));
    }
    if entry.status == DiffStatus::Growth && entry.size_diff_pct > options.anomaly_growth_threshold {
        reasons.push(format!(
            "Grew by {:.2}% (threshold {}%)",
            entry.size_diff_pct, options.anomaly_growth_threshold
        ));
    }
    if entry.status == DiffStatus::Shrink
        && entry.size_diff_pct.abs() > options.anomaly_shrink_threshold
    {
        reasons.push(format!(
            "Shrank by {:.2}% (threshold {}%)",
            entry.size_diff_pct.abs(),
            options.anomaly_shrink_threshold
        ));
    }
    if entry.address_shifted {
        if let Some(shift) = entry.address_diff {
            let sign = if shift < 0 { "-" } else { "+" };
            reasons.push(format!("Address shifted by {sign}{:#x}", shift.unsigned_abs()));
        }
    }

    if reasons.is_empty() {
        return None;
    }
    Some(DiffAnomaly {
        key: entry.key.clone(),
        name: entry.name.clone(),
        file_path: entry.file_path.clone(),
        status: entry.status,
        region: entry.region,
        size_diff: entry.size_diff,
        size_diff_pct: entry.size_diff_pct,
        reasons,
        severity: severity(entry),
    })
}

/// Grade by absolute size for additions/removals, by percent otherwise.
pub fn severity(entry: &DiffEntry) -> DiffSeverity {
    match entry.status {
        DiffStatus::Added | DiffStatus::Removed => {
            if entry.size_diff.unsigned_abs() > CRITICAL_ADD_REMOVE_BYTES {
                DiffSeverity::Critical
            } else {
                DiffSeverity::High
            }
        }
        _ => {
            let pct = entry.size_diff_pct.abs();
            if pct > 50.0 {
                DiffSeverity::Critical
            } else if pct > 25.0 {
                DiffSeverity::High
            } else if pct > 10.0 {
                DiffSeverity::Medium
            } else {
                DiffSeverity::Low
            }
        }
    }
}
