use anyhow::Result;
use clap::{Parser, Subcommand};
use mapdiff::commands::{
    compare_command, diff_command, init_config_command, parse_command, CompareArgs, DiffArgs,
};
use mapdiff::init_tracing;

/// Linker map-file size analyzer.
///
/// This CLI is a thin wrapper around `mapdiff-core` (exposed in code as `mapdiff_core`).
/// Parsing, comparison, and anomaly rules all live in the library so other
/// frontends produce identical reports.
#[derive(Parser, Debug)]
#[command(
    name = "mapdiff",
    version,
    about = "Analyze and compare GCC linker map files",
    long_about = None
)]
struct Cli {
    /// Log at debug level (otherwise MAPDIFF_LOG, default `warn`).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a single map file and list memory regions and the largest sections.
    Parse {
        /// Path to the `.map` file.
        file: String,

        /// Group subsections (e.g. `.text.foo.bar` and `.text.foo.baz` into `.text.foo`).
        #[arg(long)]
        aggregate: bool,

        /// Number of sections to list in human output.
        #[arg(long, default_value_t = 20)]
        top: usize,

        /// Emit JSON instead of human-readable output.
        #[arg(long)]
        json: bool,
    },

    /// Compare a baseline map against a candidate build by section name.
    ///
    /// Reports totals per region, the largest movers, per-file rollups and anomalies.
    Compare {
        /// Baseline map file.
        base: String,

        /// Candidate map file.
        target: String,

        /// Config file (.yaml/.yml/.json) supplying default thresholds.
        #[arg(long)]
        config: Option<String>,

        /// Length of the top increase/decrease lists.
        #[arg(long)]
        top_n: Option<usize>,

        /// Percent change that flags a modified section.
        #[arg(long)]
        threshold_pct: Option<f64>,

        /// Byte change that flags a section.
        #[arg(long)]
        threshold_bytes: Option<u64>,

        /// Keep sections whose size did not change.
        #[arg(long)]
        include_unchanged: bool,

        /// Group subsections before comparing.
        #[arg(long)]
        aggregate: bool,

        #[arg(long)]
        json: bool,
    },

    /// Diff two versions of the same firmware, matching sections by name and file.
    Diff {
        /// Older map file.
        v1: String,

        /// Newer map file.
        v2: String,

        #[arg(long)]
        config: Option<String>,

        /// Percent growth beyond which a section is flagged.
        #[arg(long)]
        growth_threshold: Option<f64>,

        /// Percent shrink beyond which a section is flagged.
        #[arg(long)]
        shrink_threshold: Option<f64>,

        /// Address movement in bytes beyond which a section counts as shifted.
        #[arg(long)]
        address_shift_threshold: Option<u64>,

        #[arg(long)]
        aggregate: bool,

        #[arg(long)]
        json: bool,
    },

    /// Write a config file with every default threshold.
    InitConfig {
        /// Destination; the extension picks the format. Defaults to `mapdiff.yaml`.
        #[arg(long)]
        path: Option<String>,

        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Parse { file, aggregate, top, json } => {
            parse_command(&file, aggregate, top, json)?
        }
        Command::Compare {
            base,
            target,
            config,
            top_n,
            threshold_pct,
            threshold_bytes,
            include_unchanged,
            aggregate,
            json,
        } => compare_command(&CompareArgs {
            base,
            target,
            config,
            top_n,
            threshold_pct,
            threshold_bytes,
            include_unchanged,
            aggregate,
            json,
        })?,
        Command::Diff {
            v1,
            v2,
            config,
            growth_threshold,
            shrink_threshold,
            address_shift_threshold,
            aggregate,
            json,
        } => diff_command(&DiffArgs {
            v1,
            v2,
            config,
            growth_threshold,
            shrink_threshold,
            address_shift_threshold,
            aggregate,
            json,
        })?,
        Command::InitConfig { path, force } => init_config_command(path.as_deref(), force)?,
    }

    Ok(())
}
