//! Error handling for the rollpack CLI.
//!
//! Library errors are wrapped in [`CliError::Bundler`]; a bundle that ran and
//! failed is [`CliError::BundleFailed`] so the binary can exit non-zero
//! without treating it as a crash.

mod diagnostic;

use thiserror::Error;

pub use diagnostic::cli_error_to_miette;

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error raised by rollpack-bundler before or after bundling
    #[error(transparent)]
    Bundler(#[from] rollpack_bundler::Error),

    /// The bundler ran and reported a failure
    #[error("Bundle failed: {0}")]
    BundleFailed(rollpack_bundler::BundleFailure),

    /// Invalid command-line arguments or options
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// I/O errors from file system operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File watcher could not be started
    #[error("File watcher error: {0}")]
    Watch(String),
}

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;
