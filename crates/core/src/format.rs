//! Shared numeric and formatting helpers used by the parser and both comparers.

use serde::{Deserialize, Serialize};

/// Parse a base-16 field as written in a map file (`0x0800_0000` style, prefix optional).
///
/// Returns `None` for empty input or non-hex characters.
pub fn parse_hex(text: &str) -> Option<u64> {
    let trimmed = text.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if digits.is_empty() {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percentage change from `before` to `after`, rounded to two decimals.
///
/// A zero baseline yields 100 when something appeared and 0 when both sides are empty.
pub fn percent_change(before: u64, after: u64) -> f64 {
    if before == 0 {
        return if after > 0 { 100.0 } else { 0.0 };
    }
    let delta = after as f64 - before as f64;
    round2(delta / before as f64 * 100.0)
}

/// Signed difference `after - before`, saturating at the `i64` bounds.
///
/// Map files from 64-bit targets carry addresses above `i64::MAX`.
pub fn signed_delta(before: u64, after: u64) -> i64 {
    let delta = i128::from(after) - i128::from(before);
    i64::try_from(delta).unwrap_or(if delta < 0 { i64::MIN } else { i64::MAX })
}

/// Human-readable byte count (`512 B`, `1.50 KB`, `2.00 MB`).
pub fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let b = bytes as f64;
    if b >= MB {
        format!("{:.2} MB", b / MB)
    } else if b >= KB {
        format!("{:.2} KB", b / KB)
    } else {
        format!("{bytes} B")
    }
}

/// Byte delta with an explicit sign (`+200 B`, `-1.00 KB`, `0 B`).
pub fn format_delta(delta: i64) -> String {
    let sign = match delta.signum() {
        1 => "+",
        -1 => "-",
        _ => "",
    };
    format!("{sign}{}", format_bytes(delta.unsigned_abs()))
}

/// Percentage with sign and two decimals (`+20.00%`).
pub fn format_pct(pct: f64) -> String {
    if pct > 0.0 {
        format!("+{pct:.2}%")
    } else {
        format!("{pct:.2}%")
    }
}

/// Severity scale used by the summary comparer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareSeverity {
    Low,
    Medium,
    High,
}

impl CompareSeverity {
    pub fn rank(self) -> u8 {
        match self {
            CompareSeverity::Low => 1,
            CompareSeverity::Medium => 2,
            CompareSeverity::High => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CompareSeverity::Low => "low",
            CompareSeverity::Medium => "medium",
            CompareSeverity::High => "high",
        }
    }
}

/// Severity scale used by the version differ. Deliberately separate from
/// [`CompareSeverity`]: the two reports grade on different vocabularies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl DiffSeverity {
    pub fn rank(self) -> u8 {
        match self {
            DiffSeverity::Low => 1,
            DiffSeverity::Medium => 2,
            DiffSeverity::High => 3,
            DiffSeverity::Critical => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DiffSeverity::Low => "low",
            DiffSeverity::Medium => "medium",
            DiffSeverity::High => "high",
            DiffSeverity::Critical => "critical",
        }
    }
}
