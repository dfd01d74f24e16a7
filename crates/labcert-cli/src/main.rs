//! LabCert CLI
//!
//! Reads a standard and a sample as exported by the laboratory data store
//! and prints:
//! - the certificate view model consumed by the print renderer
//! - the certificate's validation block
//! - a CSV listing of samples

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use labcert_engine::{samples_csv, sign_with_length, CertificateAssembler, Sample, Standard};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod output;

use output::OutputFormat;

/// LabCert CLI application
#[derive(Parser)]
#[command(name = "labcert")]
#[command(about = "LabCert - materials testing certificates", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "LABCERT_CONFIG")]
    config: Option<String>,

    /// Output format (json, text)
    #[arg(short, long, default_value = "json")]
    output: OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Build the certificate for a sample
    Certificate {
        /// Standard JSON file
        #[arg(long)]
        standard: PathBuf,

        /// Sample JSON file
        #[arg(long)]
        sample: PathBuf,
    },

    /// Print the validation block of a sample (not a cryptographic signature)
    Sign {
        /// Sample JSON file
        #[arg(long)]
        sample: PathBuf,
    },

    /// Export a JSON array of samples as CSV (always CSV; ignores --output)
    Export {
        /// Samples JSON file
        #[arg(long)]
        samples: PathBuf,
    },

    /// Show the effective configuration (TOML with --output text)
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    let config = config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Certificate { standard, sample } => {
            let standard: Standard = read_json(&standard)?;
            let sample: Sample = read_json(&sample)?;
            let certificate = CertificateAssembler::new(config)?.assemble(&standard, &sample)?;
            output::print_certificate(&certificate, cli.output)
        }
        Commands::Sign { sample } => {
            let sample: Sample = read_json(&sample)?;
            let block = sign_with_length(&sample, &config.company, config.signature_length);
            output::print_signature(&block, cli.output)
        }
        Commands::Export { samples } => {
            let samples: Vec<Sample> = read_json(&samples)?;
            println!("{}", samples_csv(&samples));
            Ok(())
        }
        Commands::Config => output::print_config(&config, cli.output),
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parsing {}", path.display()))
}
