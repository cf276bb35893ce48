//! vmsnap - print the disk chain a virtual machine is currently running on.
//!
//! Given a machine descriptor (`.vmx`), finds the active hard disk and the
//! ancestry of snapshot disks beneath it, then prints the file names as one
//! space-separated line, base image first by default.
//!
//! # Execution Flow
//!
//! 1. Parse arguments and initialize logging (stderr, optional rotating file)
//! 2. Load `vmsnap.yaml` (or `--config`), apply command line overrides
//! 3. Resolve the chain via [`ChainResolver`]
//! 4. Print the chain, or `VARNAME='chain'` with `--set`
//!
//! # Exit Codes
//!
//! 0 on success, 1 for setup failures, and 2-9 per [`vmsnap::ChainErrorKind`].

use anyhow::Result;
use camino::Utf8PathBuf;
use clap::Parser;
use vmsnap::models::{ChainOrder, FallbackMode, GroupingPolicy};
use vmsnap::{APP_NAME, ChainError, ChainResolver, ConfigManager, VERSION};

#[derive(Parser, Debug)]
#[command(
    name = "vmsnap",
    version,
    about = "Parse vmx and vmsd to get snapshot disks",
    arg_required_else_help = true
)]
struct Cli {
    /// Machine descriptor (.vmx) to resolve
    vmx_path: Utf8PathBuf,

    /// Print VARNAME='<chain>' instead of the bare chain
    #[arg(long, value_name = "VARNAME")]
    set: Option<String>,

    /// Also print the parsed snapshot table
    #[arg(long)]
    list: bool,

    /// Settings file (defaults to ./vmsnap.yaml when present)
    #[arg(long, value_name = "FILE")]
    config: Option<Utf8PathBuf>,

    /// Behaviour when no .vmsd file exists
    #[arg(long, value_enum)]
    fallback: Option<FallbackMode>,

    /// Order of the printed chain
    #[arg(long, value_enum)]
    order: Option<ChainOrder>,

    /// How snapshot entry lines are grouped into records
    #[arg(long, value_enum)]
    grouping: Option<GroupingPolicy>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Also write logs to daily-rotated files in this directory
    #[arg(long, value_name = "DIR")]
    log_dir: Option<Utf8PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    let guard = match vmsnap::logging::setup_logging(cli.log_dir.as_deref(), APP_NAME, cli.debug)
    {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{:#}", e);
            std::process::exit(1);
        }
    };

    tracing::debug!("Starting {} v{}", APP_NAME, VERSION);

    if let Err(e) = run(&cli) {
        let code = e
            .downcast_ref::<ChainError>()
            .map(|err| err.kind().exit_code())
            .unwrap_or(1);
        tracing::error!("{:#}", e);
        // Flush the file appender before exiting.
        drop(guard);
        std::process::exit(code);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let manager = cli
        .config
        .as_deref()
        .map(ConfigManager::new)
        .unwrap_or_default();
    let mut config = manager.load()?;

    if let Some(fallback) = cli.fallback {
        config.resolution.fallback = fallback;
    }
    if let Some(order) = cli.order {
        config.resolution.order = order;
    }
    if let Some(grouping) = cli.grouping {
        config.snapshots.grouping = grouping;
    }

    if let Some(var) = &cli.set {
        if !is_variable_name(var) {
            return Err(ChainError::BadArgument(format!("invalid variable name: {}", var)).into());
        }
    }

    let resolver = ChainResolver::new(config);
    let resolution = resolver.resolve(&cli.vmx_path)?;

    if cli.list {
        match &resolution.table {
            Some(table) => {
                for record in &table.records {
                    println!("{}", record);
                }
                println!("current: {}", table.current_uid);
            }
            None => println!("no snapshot metadata ({})", resolution.strategy),
        }
    }

    let rendered = resolver.render(&resolution)?;
    match &cli.set {
        Some(var) => println!("{}={}", var, shell_quote(&rendered)),
        None => println!("{}", rendered),
    }
    Ok(())
}

fn is_variable_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Single-quote `value` for POSIX shells.
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
