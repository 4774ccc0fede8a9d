use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tracing::debug;
use tracing_subscriber::EnvFilter;

pub mod commands;

/// Environment variable holding a `tracing` filter directive (e.g. `mapdiff_core=debug`).
pub const LOG_ENV: &str = "MAPDIFF_LOG";

/// Install the stderr log subscriber.
///
/// `--verbose` forces `debug`; otherwise `MAPDIFF_LOG` is honored, defaulting to `warn`.
pub fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    // A second init (e.g. in tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// A map file loaded from disk, with the hash used to identify the build.
#[derive(Debug, Clone)]
pub struct MapInput {
    pub path: PathBuf,
    pub text: String,
    pub sha256: String,
}

/// Read a map file. Invalid UTF-8 is replaced rather than rejected.
pub fn read_map_file(path: &str) -> Result<MapInput> {
    let path = PathBuf::from(path);
    let bytes =
        fs::read(&path).with_context(|| format!("Failed to read map file: {}", path.display()))?;
    let sha256 = sha256_bytes(&bytes);
    let text = String::from_utf8_lossy(&bytes).into_owned();
    debug!(path = %path.display(), bytes = bytes.len(), sha256 = %sha256, "read map file");
    Ok(MapInput { path, text, sha256 })
}

/// SHA-256 of a byte slice as lowercase hex.
pub fn sha256_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// First 12 hex digits, enough to tell builds apart in a report header.
pub fn short_hash(hash: &str) -> &str {
    &hash[..hash.len().min(12)]
}
