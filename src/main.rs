//! sbom-ingest: SBOM ingestion and normalization engine.
//!
//! Parses CycloneDX and SPDX documents into one canonical component and
//! vulnerability model.

use anyhow::Result;
use clap::{Parser, Subcommand};
use sbom_ingest::cli;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Build long version string with format support info
const fn build_long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        "\n\nSupported SBOM Formats:",
        "\n  CycloneDX: 1.4, 1.5, 1.6 (JSON, XML)",
        "\n  SPDX:      2.2, 2.3 (JSON)"
    )
}

#[derive(Parser)]
#[command(name = "sbom-ingest")]
#[command(version, long_version = build_long_version())]
#[command(about = "SBOM ingestion and normalization engine", long_about = None)]
#[command(after_help = "EXIT CODES:
    0  Success / document valid
    1  Parse failure or validation failure

EXAMPLES:
    # Detect the format of a document
    sbom-ingest detect sbom.json

    # Parse to the canonical JSON model
    sbom-ingest parse sbom.cdx.json --pretty > normalized.json

    # Conformance check in CI
    sbom-ingest validate sbom.spdx.json")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect the SBOM format of a file
    Detect {
        /// Path to the SBOM file
        file: PathBuf,
    },

    /// Parse a file into the canonical component/vulnerability model
    Parse {
        /// Path to the SBOM file
        file: PathBuf,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Run spec-conformance checks and print the violation report
    Validate {
        /// Path to the SBOM file
        file: PathBuf,

        /// Pretty-print the JSON report
        #[arg(long)]
        pretty: bool,
    },

    /// Print the JSON Schema of the canonical parse result
    Schema,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    let exit_code = match cli.command {
        Commands::Detect { file } => {
            cli::run_detect(&file)?;
            0
        }
        Commands::Parse { file, pretty } => cli::run_parse(&file, pretty)?,
        Commands::Validate { file, pretty } => cli::run_validate(&file, pretty)?,
        Commands::Schema => {
            cli::run_schema()?;
            0
        }
    };

    if exit_code != 0 {
        std::process::exit(exit_code);
    }
    Ok(())
}
