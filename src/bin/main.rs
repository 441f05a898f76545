//! bqcompile CLI - Compile query descriptors to BigQuery SQL
//!
//! Usage:
//!   bqcompile compile <targets.json> [--dataset <name>] [--output <format>]
//!   bqcompile validate <targets.json>
//!   bqcompile escape <text> [--quote]
//!
//! Examples:
//!   bqcompile compile panel.json
//!   bqcompile compile dashboard.json --dataset metrics --output verbose
//!   bqcompile escape "O'Brien"

use bqcompile::cache::CompileCache;
use bqcompile::compiler::CompileOptions;
use bqcompile::config::Settings;
use bqcompile::model::QueryDescriptor;
use bqcompile::sql::{escape_literal, quote_literal};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "bqcompile")]
#[command(about = "bqcompile - Compile time-series query descriptors to BigQuery SQL")]
#[command(version)]
struct Cli {
    /// Path to a bqcompile.toml (defaults to the standard search locations)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile one target or an array of targets to SQL
    Compile {
        /// Path to the JSON file
        file: PathBuf,

        /// Dataset for targets that do not set one
        #[arg(short, long)]
        dataset: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "sql")]
        output: OutputFormat,
    },

    /// Check that every target compiles without printing SQL
    Validate {
        /// Path to the JSON file
        file: PathBuf,
    },

    /// Escape text for use inside a single-quoted SQL literal
    Escape {
        /// Text to escape
        text: String,

        /// Wrap the escaped text in single quotes
        #[arg(short, long)]
        quote: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Output SQL only
    Sql,
    /// Output SQL with comments
    Verbose,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    };
    let settings = match settings {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(&settings);

    match cli.command {
        Commands::Compile {
            file,
            dataset,
            output,
        } => cmd_compile(&settings, file, dataset, output),
        Commands::Validate { file } => cmd_validate(&settings, file),
        Commands::Escape { text, quote } => {
            println!("{}", escape_text(&text, quote));
            ExitCode::SUCCESS
        }
    }
}

fn init_logging(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// A file holds either a single target or an array of them.
fn read_targets(file: &Path) -> Result<Vec<QueryDescriptor>, String> {
    let source = fs::read_to_string(file)
        .map_err(|e| format!("Error reading file '{}': {}", file.display(), e))?;
    let parse_error = |e: serde_json::Error| format!("Error parsing '{}': {}", file.display(), e);

    match serde_json::from_str::<Value>(&source).map_err(parse_error)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(parse_error))
            .collect(),
        single => Ok(vec![serde_json::from_value(single).map_err(parse_error)?]),
    }
}

fn escape_text(text: &str, quote: bool) -> String {
    if quote {
        quote_literal(text)
    } else {
        escape_literal(text)
    }
}

/// Fill `dataset` into every target that does not name its own.
fn apply_default_dataset(targets: &mut [QueryDescriptor], dataset: &str) {
    for target in targets.iter_mut().filter(|t| t.dataset.is_none()) {
        target.dataset = Some(dataset.to_string());
    }
}

/// Compile errors for builder targets, one line each. Raw targets are skipped.
fn validate_targets(targets: &[QueryDescriptor], options: &CompileOptions) -> Vec<String> {
    targets
        .iter()
        .enumerate()
        .filter(|(_, t)| !t.raw_query)
        .filter_map(|(i, t)| {
            bqcompile::compile(t, options)
                .err()
                .map(|e| format!("target {}: {}", i, e))
        })
        .collect()
}

fn cmd_compile(
    settings: &Settings,
    file: PathBuf,
    dataset: Option<String>,
    output: OutputFormat,
) -> ExitCode {
    let mut targets = match read_targets(&file) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let default_dataset = match dataset {
        Some(d) => Some(d),
        None => match settings.compiler.resolved_default_dataset() {
            Ok(d) => d,
            Err(e) => {
                eprintln!("Error resolving default dataset: {}", e);
                return ExitCode::FAILURE;
            }
        },
    };
    if let Some(default_dataset) = &default_dataset {
        apply_default_dataset(&mut targets, default_dataset);
    }

    let options = settings.compiler.compile_options();
    let mut cache = CompileCache::new(settings.cache.effective_capacity());
    let mut failed = false;

    for (index, target) in targets.iter().enumerate() {
        match cache.render(target, &options) {
            Ok(sql) => match output {
                OutputFormat::Sql => {
                    println!("{}", sql);
                }
                OutputFormat::Verbose => {
                    println!("-- bqcompile");
                    println!("-- Source: {} [{}]", file.display(), index);
                    println!(
                        "-- Mode: {}",
                        if target.raw_query { "raw" } else { "builder" }
                    );
                    println!();
                    println!("{}", sql);
                    println!();
                }
            },
            Err(e) => {
                eprintln!("Compilation error in target {}: {}", index, e);
                failed = true;
            }
        }
    }

    let stats = cache.stats();
    tracing::debug!(hits = stats.hits, misses = stats.misses, "compile cache");

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn cmd_validate(settings: &Settings, file: PathBuf) -> ExitCode {
    let targets = match read_targets(&file) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let errors = validate_targets(&targets, &settings.compiler.compile_options());
    if !errors.is_empty() {
        eprintln!("Validation errors:");
        for err in &errors {
            eprintln!("  {}", err);
        }
        return ExitCode::FAILURE;
    }

    println!("OK: {} target(s) in {} are valid", targets.len(), file.display());
    ExitCode::SUCCESS
}
