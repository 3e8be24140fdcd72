//! erd-layout CLI entry point.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use std::str::FromStr;

use clap::Parser;
use log::{LevelFilter, debug, error, info};
use thiserror::Error;

use erd_layout::{LayoutConfig, LayoutEngine, LayoutError, ParsedSchema};

/// Compute an automatic layout for an ER diagram schema
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the schema JSON document
    #[arg(help = "Path to the input schema (JSON)")]
    input: PathBuf,

    /// Path to the output layout JSON (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Pretty-print the layout JSON
    #[arg(long)]
    pretty: bool,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("Failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("Failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("Failed to parse TOML configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Invalid schema JSON: {0}")]
    Schema(serde_json::Error),

    #[error("Failed to serialize layout: {0}")]
    Output(serde_json::Error),

    #[error(transparent)]
    Layout(#[from] LayoutError),
}

fn read(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Layout options live either at the top level of the file or under `[layout]`.
fn load_config(path: Option<&Path>) -> Result<LayoutConfig, CliError> {
    let Some(path) = path else {
        debug!("No configuration file given, using defaults");
        return Ok(LayoutConfig::default());
    };
    info!(path = path.display().to_string(); "Loading configuration");

    let mut table: toml::Table = toml::from_str(&read(path)?)?;
    let config: LayoutConfig = match table.remove("layout") {
        Some(section) => section.try_into()?,
        None => toml::Value::Table(table).try_into()?,
    };
    Ok(config)
}

fn run(args: &Args) -> Result<(), CliError> {
    info!(input_path = args.input.display().to_string(); "Processing schema");

    let config = load_config(args.config.as_deref())?;
    let schema = ParsedSchema::from_json(&read(&args.input)?).map_err(CliError::Schema)?;

    let layout = LayoutEngine::new(config).layout(&schema)?;
    let json = layout.to_json(args.pretty).map_err(CliError::Output)?;

    match &args.output {
        Some(path) => {
            fs::write(path, json).map_err(|source| CliError::Write {
                path: path.clone(),
                source,
            })?;
            info!(output_file = path.display().to_string(); "Layout written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn main() {
    let args = Args::parse();

    let log_level = LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!("Invalid log level: {}. Using 'warn' instead.", args.log_level);
        LevelFilter::Warn
    });
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();

    debug!(args:?; "Parsed arguments");

    if let Err(err) = run(&args) {
        error!("{err}");
        process::exit(1);
    }
}
