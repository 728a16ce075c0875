mod pics;
mod requirements;
mod validate;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use matter_model::SchemaRegistry;
use matter_pics::RemapRules;
use std::path::{Path, PathBuf, MAIN_SEPARATOR_STR};

#[derive(Parser)]
#[command(
    name = "matter-conformance",
    about = "Check Matter devices against their own declarations and device-type requirements"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Check that a device's declared lists match what it actually serves
    ValidateDevice {
        /// Recorded wildcard read (.json, .yml/.yaml)
        #[arg(long)]
        snapshot: PathBuf,

        /// JSON cluster schema overriding or extending the built-in one
        #[arg(long)]
        cluster_schema: Option<PathBuf>,
    },

    /// Check a device against the requirements of its device types
    ValidateDeviceTypes {
        /// Directory of device-type requirement files (*.json)
        #[arg(long)]
        device_type_data: PathBuf,

        /// Recorded wildcard read (.json, .yml/.yaml)
        #[arg(long)]
        snapshot: PathBuf,

        /// Skip requirement files that fail to parse
        #[arg(long)]
        lenient: bool,
    },

    /// Annotate PICS templates from a device's capability tree
    GeneratePics {
        /// Cluster metadata JSON (ClusterIdentifiers)
        #[arg(long)]
        cluster_data: PathBuf,

        /// Directory holding the PICS XML templates
        #[arg(long)]
        pics_template: PathBuf,

        /// Output directory; emptied before the run
        #[arg(long)]
        pics_output: PathBuf,

        /// Recorded wildcard read (.json, .yml/.yaml)
        #[arg(long)]
        snapshot: PathBuf,

        /// Cluster name to template file mapping
        #[arg(long, value_enum, default_value_t = Remap::Generator)]
        remap: Remap,
    },

    /// List the support value of every PICS item in a directory
    PicsReport {
        /// Directory of PICS XML files
        dir: PathBuf,
    },

    /// Validate device-type requirement files
    CheckRequirements {
        /// Directory of requirement files (*.json)
        dir: PathBuf,

        /// Suppress individual issue output
        #[arg(short, long)]
        quiet: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Remap {
    Generator,
    DeviceMapper,
}

impl From<Remap> for RemapRules {
    fn from(remap: Remap) -> Self {
        match remap {
            Remap::Generator => RemapRules::Generator,
            Remap::DeviceMapper => RemapRules::DeviceMapper,
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();
}

/// Append a trailing separator to a directory argument if it has none.
fn ensure_trailing_separator(dir: &Path) -> PathBuf {
    let text = dir.to_string_lossy();
    if text.is_empty() || text.ends_with(MAIN_SEPARATOR_STR) || text.ends_with('/') {
        dir.to_path_buf()
    } else {
        PathBuf::from(format!("{text}{MAIN_SEPARATOR_STR}"))
    }
}

fn load_schema(override_path: Option<&Path>) -> Result<SchemaRegistry> {
    let mut registry = SchemaRegistry::builtin();
    if let Some(path) = override_path {
        let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let extra = SchemaRegistry::from_json(&text)
            .with_context(|| format!("parsing cluster schema from {}", path.display()))?;
        log::info!("{} cluster schemas from {}", extra.len(), path.display());
        registry.merge(extra);
    }
    Ok(registry)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::ValidateDevice {
            snapshot,
            cluster_schema,
        } => {
            let schema = load_schema(cluster_schema.as_deref())?;
            validate::run_validate_device(&snapshot, &schema)
        }

        Command::ValidateDeviceTypes {
            device_type_data,
            snapshot,
            lenient,
        } => validate::run_validate_device_types(&ensure_trailing_separator(&device_type_data), &snapshot, lenient),

        Command::GeneratePics {
            cluster_data,
            pics_template,
            pics_output,
            snapshot,
            remap,
        } => pics::run_generate_pics(
            &cluster_data,
            &ensure_trailing_separator(&pics_template),
            &ensure_trailing_separator(&pics_output),
            &snapshot,
            remap.into(),
        ),

        Command::PicsReport { dir } => pics::run_pics_report(&ensure_trailing_separator(&dir)),

        Command::CheckRequirements { dir, quiet } => {
            requirements::run_check_requirements(&ensure_trailing_separator(&dir), quiet)
        }
    }
}
