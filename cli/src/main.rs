#![deny(missing_docs)]

//! # refbundle CLI
//!
//! Command Line Interface for the reference bundler.
//!
//! Supported Commands:
//! - `bundle`: Resolves every `$ref` reachable from a document into one `$defs` container.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::error::CliResult;

mod bundle;
mod error;

#[derive(Parser, Debug)]
#[clap(author, version, about = "JSON Schema / OpenAPI $ref bundler")]
struct Cli {
    /// Log at debug level regardless of `RUST_LOG`.
    #[clap(long, short, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Bundle a document into a self-contained schema.
    Bundle(bundle::BundleArgs),
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Bundle(args) => bundle::execute(args)?,
    }

    Ok(())
}
