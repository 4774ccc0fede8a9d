use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use mapdiff_core::config::{AnalysisConfig, DEFAULT_CONFIG_FILE};

/// Load the analysis config at `path`, or the built-in defaults when no file was given.
pub fn load_config(path: Option<&str>) -> Result<AnalysisConfig> {
    match path {
        Some(path) => AnalysisConfig::load(path)
            .with_context(|| format!("Failed to load config file: {}", path)),
        None => Ok(AnalysisConfig::default()),
    }
}

/// Write a config file holding every default so users have something to edit.
pub fn init_config_command(path: Option<&str>, force: bool) -> Result<()> {
    let path = Path::new(path.unwrap_or(DEFAULT_CONFIG_FILE));
    if path.exists() && !force {
        return Err(anyhow!(
            "Config file already exists at {} (use --force to overwrite)",
            path.display()
        ));
    }

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
    let config = AnalysisConfig::default();
    let body = match ext.as_str() {
        "json" => serde_json::to_string_pretty(&config)?,
        "yaml" | "yml" => config.to_yaml().context("Failed to serialize default config")?,
        other => return Err(anyhow!("Unsupported config format '{}': use .yaml, .yml or .json", other)),
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(path, body)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;

    println!("Wrote default config to {}", path.display());
    Ok(())
}
