//! Command-line interface for syncer.
//!
//! Walks the source directory, hashes every file and prints one line per
//! entry. The sync and copy modes are accepted but do not transfer anything
//! yet; the output is the scan both modes start from.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use syncer::{CancellationToken, HashAlgorithm, SyncerBuilder, SyncerOptions, output, recurse};

const EXIT_INTERRUPTED: u8 = 130;

/// syncer — concurrent directory scanner for synchronization
#[derive(Debug, Parser)]
#[command(name = "syncer", version, about, long_about = None)]
struct Cli {
    /// Source directory to scan
    src: PathBuf,

    /// Destination directory (reserved for sync/copy)
    #[arg(short, long)]
    dest: Option<PathBuf>,

    /// Operation mode
    #[arg(short, long, value_enum, default_value_t = Mode::Sync)]
    mode: Mode,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// Pretty JSON output
    #[arg(short, long)]
    pretty: bool,

    /// Hash algorithm
    #[arg(long, value_enum, default_value_t = Algorithm::Sha256)]
    algorithm: Algorithm,

    /// Maximum number of directories walked at once (unbounded if not set)
    #[arg(short = 'j', long)]
    max_concurrency: Option<usize>,

    /// Skip hidden files and directories
    #[arg(long)]
    no_hidden: bool,

    /// Exclude patterns (can be repeated)
    #[arg(short = 'x', long = "exclude")]
    exclude: Vec<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// How the destination is brought in line with the source.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Synchronize directories, accounting for differences between them
    Sync,
    /// Copy files from source to destination regardless of differences
    Copy,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Text,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Algorithm {
    Sha256,
    #[value(name = "sha512-256")]
    Sha512_256,
}

impl Cli {
    fn options(&self) -> SyncerOptions {
        let algorithm = match self.algorithm {
            Algorithm::Sha256 => HashAlgorithm::Sha256,
            Algorithm::Sha512_256 => HashAlgorithm::Sha512_256,
        };
        let builder = SyncerBuilder::new(&self.src)
            .algorithm(algorithm)
            .include_hidden(!self.no_hidden)
            .exclude(self.exclude.clone());
        let builder = match self.max_concurrency {
            Some(limit) => builder.max_concurrency(limit),
            None => builder.unbounded(),
        };
        builder.build()
    }

    fn output_format(&self) -> output::OutputFormat {
        match self.format {
            Format::Json => output::OutputFormat::Json,
            Format::Text => output::OutputFormat::Text,
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            #[cfg(feature = "logging")]
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    setup_logging(cli.verbose);

    #[cfg(feature = "logging")]
    tracing::debug!(?cli, "Parsed options");

    match cli.mode {
        Mode::Sync | Mode::Copy => {
            #[cfg(feature = "logging")]
            tracing::info!(
                mode = ?cli.mode,
                dest = ?cli.dest,
                "Scanning source; transfer is not performed in this mode"
            );
        }
    }

    let token = CancellationToken::new();
    let handler_token = token.clone();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, shutting down...");
        handler_token.cancel();
    })
    .context("Failed to set signal handler")?;

    let stream = recurse(cli.options(), &token)
        .with_context(|| format!("Cannot scan {}", cli.src.display()))?;

    let failures = output::write_stream(
        stream,
        cli.output_format(),
        cli.pretty,
        io::stdout().lock(),
        io::stderr(),
    )
    .context("Failed to write output")?;

    if token.is_cancelled() {
        #[cfg(feature = "logging")]
        tracing::info!("Walk was interrupted before completion");
        return Ok(ExitCode::from(EXIT_INTERRUPTED));
    }
    if failures > 0 {
        #[cfg(feature = "logging")]
        tracing::info!(errors = failures, "Walk completed with errors");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(feature = "logging")]
fn setup_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("syncer=debug,warn")
    } else {
        EnvFilter::new("syncer=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
