//! Bundling engine contract.
//!
//! The orchestrator hands the engine every [`BundleSpec`] of an invocation in
//! a single [`EngineRequest`] and gets back exactly one [`BundleResult`].
//! Engine errors never escape as `Err` or panics: they are folded into
//! [`BundleResult::Failure`] with the cause kept for diagnostics.

pub(crate) mod output;
mod rolldown;
mod tsconfig;

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::spec::BundleSpec;

pub use self::rolldown::RolldownEngine;
pub use self::tsconfig::read_path_aliases;

/// Everything the engine needs for one logical build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineRequest {
    /// One [`BundleSpec`] per format; all share the same input
    pub specs: Vec<BundleSpec>,
    /// Type-check configuration shared by all formats
    pub ts_config: PathBuf,
    /// Directory module resolution starts from
    pub cwd: PathBuf,
    /// Global names for externals in UMD output
    pub globals: BTreeMap<String, String>,
}

/// Outcome of one engine call across all requested formats.
///
/// There is no partial success: one failing format fails the whole call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleResult {
    Success,
    Failure(BundleFailure),
}

impl BundleResult {
    pub fn is_success(&self) -> bool {
        matches!(self, BundleResult::Success)
    }

    pub fn failure(message: impl Into<String>) -> Self {
        BundleResult::Failure(BundleFailure::new(message))
    }
}

/// Opaque cause of a failed bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleFailure {
    pub message: String,
    /// Individual diagnostics reported by the engine, if any
    pub diagnostics: Vec<String>,
}

impl BundleFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            diagnostics: Vec::new(),
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: Vec<String>) -> Self {
        self.diagnostics = diagnostics;
        self
    }
}

impl std::fmt::Display for BundleFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        for diagnostic in &self.diagnostics {
            write!(f, "\n  {}", diagnostic)?;
        }
        Ok(())
    }
}

/// Bundling engine.
///
/// Implementations must treat the request as one atomic unit: either every
/// format is produced or the call reports [`BundleResult::Failure`].
#[async_trait]
pub trait BundleEngine: Send + Sync {
    async fn bundle(&self, request: &EngineRequest) -> BundleResult;
}
