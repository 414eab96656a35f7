#![deny(missing_docs)]

//! # CLI Errors
//!
//! Error types for the CLI crate.

use derive_more::{Display, From};
use refbundle_core::{BuildError, BundleError, LoadError};

/// Main error enum for CLI operations.
#[derive(Debug, Display, From)]
pub enum CliError {
    /// IO Error wrapper.
    #[display("IO Error: {}", _0)]
    Io(std::io::Error),

    /// An input, document or config file could not be parsed.
    #[display("Parse Error: {}", _0)]
    Parse(LoadError),

    /// The resolver could not be built.
    #[display("Invalid document set: {}", _0)]
    Build(BuildError),

    /// Bundling failed.
    #[display("Bundle Error: {}", _0)]
    Bundle(BundleError),

    /// General failure message.
    #[display("Operation failed: {}", _0)]
    General(String),
}

/// Manual implementation of the standard Error trait.
///
/// `General(String)` holds no source error, so `source()` is left at its default.
impl std::error::Error for CliError {}

/// Result type alias.
pub type CliResult<T> = Result<T, CliError>;
