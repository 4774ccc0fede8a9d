//! Human-readable rendering shared by the report commands.

use anyhow::{anyhow, Result};
use mapdiff_core::format::{format_bytes, format_delta, format_pct, percent_change};

use crate::{short_hash, MapInput};

/// Reject input that contains no sections at all.
///
/// The parser drops zero-size sections, so a zero total means nothing was recognized.
pub fn ensure_sections(input: &MapInput, total_size: u64) -> Result<()> {
    if total_size == 0 {
        return Err(anyhow!(
            "No sections found in {} (is this a GCC linker map file?)",
            input.path.display()
        ));
    }
    Ok(())
}

pub fn print_input(label: &str, input: &MapInput) {
    println!("  {:<8}{} (sha256 {})", label, input.path.display(), short_hash(&input.sha256));
}

/// `16.56 KB -> 50.44 KB (+33.88 KB, +204.55%)`
pub fn size_change(before: u64, after: u64, delta: i64) -> String {
    format!(
        "{} -> {} ({}, {})",
        format_bytes(before),
        format_bytes(after),
        format_delta(delta),
        format_pct(percent_change(before, after))
    )
}

/// Section name with its contributing file, when known.
pub fn labelled(name: &str, file: Option<&str>) -> String {
    match file {
        Some(file) => format!("{} ({})", name, file),
        None => name.to_string(),
    }
}
