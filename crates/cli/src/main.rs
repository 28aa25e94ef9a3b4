// Neatify CLI
//
// Design Decision: Use clap derive for ergonomic argument parsing.
// Design Decision: Support text/json/yaml output formats for scripting.
// Design Decision: Every command runs on the worker pool, never inline.

mod commands;
mod output;
mod preset;
mod telemetry;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use neatify_dispatcher::{PoolConfig, WorkerPool};

use commands::batch::BatchOperation;
use commands::{FormatArgs, MinifyArgs};
use preset::{PresetBook, DEFAULT_PRESET_ID};
use telemetry::{init_telemetry, TelemetryConfig};

#[derive(Parser)]
#[command(name = "neatify")]
#[command(about = "Neatify CLI - Format and minify HTML, JSON and YAML on a worker pool")]
#[command(version)]
pub struct Cli {
    /// Number of pool workers
    #[arg(long, env = "NEATIFY_WORKERS", default_value = "2", global = true)]
    pub workers: usize,

    /// Output format
    #[arg(long, short, default_value = "text", value_parser = ["text", "json", "yaml"], global = true)]
    pub output: String,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Preset to take options from
    #[arg(long, default_value = DEFAULT_PRESET_ID, global = true)]
    pub preset: String,

    /// YAML or JSON file with extra presets
    #[arg(long, env = "NEATIFY_PRESETS", global = true)]
    pub presets: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Pretty-print a file or stdin
    Format {
        /// Input file (stdin if omitted or `-`)
        file: Option<PathBuf>,

        #[command(flatten)]
        options: FormatArgs,
    },

    /// Minify HTML from a file or stdin
    Minify {
        /// Input file (stdin if omitted or `-`)
        file: Option<PathBuf>,

        #[command(flatten)]
        options: MinifyArgs,
    },

    /// Run one operation over many files concurrently
    Batch {
        /// Operation to run
        #[arg(value_enum)]
        operation: BatchOperation,

        /// Files to process
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Rewrite each file in place instead of printing
        #[arg(long)]
        write: bool,

        #[command(flatten)]
        format: FormatArgs,

        #[command(flatten)]
        minify: MinifyArgs,
    },

    /// Start the pool and ping every worker
    WarmUp,

    /// List available presets
    Presets,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_telemetry(
        TelemetryConfig::from_env().with_default_filter(TelemetryConfig::default_filter(cli.quiet)),
    );

    let output_format = output::OutputFormat::parse(&cli.output);
    let book = PresetBook::load(cli.presets.as_deref())?;
    let preset = book.get(&cli.preset)?;

    let pool = WorkerPool::new(PoolConfig::new(cli.workers));

    let result = match cli.command {
        Commands::Format { file, options } => {
            commands::format::run(&pool, preset, output_format, cli.quiet, file, options).await
        }
        Commands::Minify { file, options } => {
            commands::minify::run(&pool, preset, output_format, cli.quiet, file, options).await
        }
        Commands::Batch {
            operation,
            files,
            write,
            format,
            minify,
        } => {
            commands::batch::run(
                &pool,
                preset,
                output_format,
                cli.quiet,
                operation,
                files,
                write,
                format,
                minify,
            )
            .await
        }
        Commands::WarmUp => commands::warm::run(&pool, output_format).await,
        Commands::Presets => commands::presets::run(&book, output_format),
    };

    pool.dispose();
    result
}
