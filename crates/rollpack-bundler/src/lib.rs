#![cfg_attr(docsrs, feature(doc_cfg))]

//! # rollpack-bundler
//!
//! Packages a library entry point into several module formats with Rolldown
//! and keeps the package manifest's entry-point fields in sync with the
//! generated artifacts.
//!
//! ## Quick Start
//!
//! ```no_run
//! use rollpack_bundler::{BundleOptions, Orchestrator};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let options = BundleOptions::new(
//!     "libs/ui/src/index.ts",
//!     "dist/libs/ui",
//!     "libs/ui/package.json",
//!     "libs/ui/tsconfig.json",
//! );
//!
//! let orchestrator = Orchestrator::native(".");
//! let outcome = orchestrator.run(&options).await?;
//! assert!(outcome.success());
//! # Ok(()) }
//! ```
//!
//! ## Collaborators
//!
//! The [`Orchestrator`] never touches the filesystem or the bundler directly.
//! It talks to a [`ManifestStore`], a [`BundleEngine`] and a [`ProjectGraph`],
//! all passed in through [`Collaborators`], so any of them can be replaced
//! with a fake in tests.

use std::path::PathBuf;

pub mod engine;
pub mod format;
pub mod manifest;
pub mod options;
pub mod orchestrator;
pub mod project;
pub mod spec;
pub mod watch;

pub use engine::{BundleEngine, BundleFailure, BundleResult, EngineRequest, RolldownEngine};
pub use format::ModuleFormat;
pub use manifest::{FsManifestStore, Manifest, ManifestPatch, ManifestStore};
pub use options::BundleOptions;
pub use orchestrator::{
    BuildOutcome, BuildState, Collaborators, CycleReport, Orchestrator, WatchHandle,
};
pub use project::{ProjectGraph, WorkspaceRoot};
pub use spec::{BundleSpec, build_specs};
pub use watch::{ChannelTrigger, FileWatcher, RebuildTrigger, TriggerSender};

// Logging utilities (optional, enabled with "logging" feature)
#[cfg(feature = "logging")]
#[cfg_attr(docsrs, doc(cfg(feature = "logging")))]
pub mod logging;

#[cfg(feature = "logging")]
#[cfg_attr(docsrs, doc(cfg(feature = "logging")))]
pub use logging::{LogLevel, init_logging, init_logging_from_env};

/// Error types for rollpack-bundler operations.
///
/// Bundle failures reported by the engine are not errors: they come back as
/// [`BuildOutcome::Failed`]. Everything here is either a configuration
/// problem detected before the engine runs, or a manifest write that failed
/// after a successful bundle.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required option was empty or absent.
    #[error("Missing required option: {0}")]
    MissingOption(&'static str),

    /// A configured path does not resolve inside the project source root.
    #[error("Invalid path {}: {reason}", .path.display())]
    InvalidPath { path: PathBuf, reason: String },

    /// The target manifest does not exist.
    #[error("Package manifest not found: {}", .0.display())]
    ManifestNotFound(PathBuf),

    /// The target manifest exists but cannot be used.
    #[error("Invalid package manifest {}: {reason}", .path.display())]
    InvalidManifest { path: PathBuf, reason: String },

    /// Writing the manifest failed after the bundle itself succeeded.
    #[error("Failed to write package manifest {}: {source}", .path.display())]
    ManifestWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The project graph has no source root for the project.
    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    /// File watcher could not be started.
    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for rollpack-bundler operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether this error was raised before the bundling engine was invoked.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::MissingOption(_)
                | Error::InvalidPath { .. }
                | Error::ManifestNotFound(_)
                | Error::InvalidManifest { .. }
                | Error::ProjectNotFound(_)
        )
    }
}

impl miette::Diagnostic for Error {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        Some(Box::new(match self {
            Error::MissingOption(_) => "MISSING_OPTION",
            Error::InvalidPath { .. } => "INVALID_PATH",
            Error::ManifestNotFound(_) => "MANIFEST_NOT_FOUND",
            Error::InvalidManifest { .. } => "INVALID_MANIFEST",
            Error::ManifestWrite { .. } => "MANIFEST_WRITE_FAILURE",
            Error::ProjectNotFound(_) => "PROJECT_NOT_FOUND",
            Error::Watch(_) => "WATCH_ERROR",
            Error::Io(_) => "IO_ERROR",
            Error::Json(_) => "JSON_ERROR",
        }))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            Error::MissingOption(field) => Some(Box::new(format!(
                "Set '{}' in rollpack.json or pass it on the command line.",
                field
            ))),
            Error::InvalidPath { .. } => Some(Box::new(
                "Entry file and package manifest must live inside the project source root.",
            )),
            Error::ManifestNotFound(path) => Some(Box::new(format!(
                "Create {} with at least a \"name\" field before packaging.",
                path.display()
            ))),
            Error::InvalidManifest { .. } => Some(Box::new(
                "The manifest must be a JSON object with a string \"name\" field.",
            )),
            Error::ManifestWrite { .. } => Some(Box::new(
                "Bundles were written but the manifest still points at the previous artifacts. \
                 Check permissions and disk space, then re-run.",
            )),
            _ => None,
        }
    }
}
