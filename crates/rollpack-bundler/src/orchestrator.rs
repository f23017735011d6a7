//! Build orchestration.
//!
//! One build cycle goes through the same steps whether it is a one-shot
//! [`Orchestrator::run`] or a cycle of a [`Orchestrator::watch`] session:
//!
//! 1. validate options and resolve the project source root
//! 2. read the package manifest once and derive the bundle specs from it
//! 3. call the engine once for all formats
//! 4. on success patch the manifest snapshot from step 2 and write it back
//!
//! Configuration problems surface as `Err` before the engine runs. A failed
//! bundle is a normal [`BuildOutcome::Failed`], not an error.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::engine::{BundleEngine, BundleFailure, BundleResult, EngineRequest, RolldownEngine};
use crate::manifest::{FsManifestStore, Manifest, ManifestPatch, ManifestStore};
use crate::options::BundleOptions;
use crate::project::{ProjectGraph, WorkspaceRoot, absolute_root};
use crate::spec::{build_specs, resolve_under};
use crate::watch::RebuildTrigger;
use crate::{Error, Result};

/// The services an [`Orchestrator`] delegates to.
#[derive(Clone)]
pub struct Collaborators {
    pub manifests: Arc<dyn ManifestStore>,
    pub engine: Arc<dyn BundleEngine>,
    pub projects: Arc<dyn ProjectGraph>,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

/// Result of one build cycle that got as far as the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// All formats were written and the manifest was updated.
    Succeeded,
    /// The engine failed; the manifest was left untouched.
    Failed(BundleFailure),
}

impl BuildOutcome {
    pub fn success(&self) -> bool {
        matches!(self, BuildOutcome::Succeeded)
    }

    pub fn failure(&self) -> Option<&BundleFailure> {
        match self {
            BuildOutcome::Failed(failure) => Some(failure),
            BuildOutcome::Succeeded => None,
        }
    }
}

/// Lifecycle of an orchestrator session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    Idle,
    Building,
    Succeeded,
    Failed,
    Stopped,
}

/// Report of one cycle in a watch session.
#[derive(Debug)]
pub struct CycleReport {
    /// 1-based cycle number
    pub cycle: u64,
    pub result: Result<BuildOutcome>,
}

impl CycleReport {
    pub fn success(&self) -> bool {
        self.result.as_ref().is_ok_and(BuildOutcome::success)
    }
}

/// Everything resolved for a cycle before the engine is called.
struct PreparedBuild {
    manifest_path: PathBuf,
    manifest: Manifest,
    patch: ManifestPatch,
    request: EngineRequest,
}

/// Drives build cycles through the collaborators.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    collaborators: Collaborators,
}

impl Orchestrator {
    pub fn new(collaborators: Collaborators) -> Self {
        Self { collaborators }
    }

    /// Filesystem manifests, Rolldown, and a fixed workspace root.
    pub fn native(workspace_root: impl Into<PathBuf>) -> Self {
        Self::new(Collaborators {
            manifests: Arc::new(FsManifestStore::new()),
            engine: Arc::new(RolldownEngine::new()),
            projects: Arc::new(WorkspaceRoot::new(workspace_root)),
        })
    }

    /// Run a single build cycle.
    ///
    /// # Errors
    ///
    /// - configuration errors (see [`Error::is_configuration`]); the engine
    ///   is not invoked
    /// - [`Error::ManifestWrite`] when bundling succeeded but the manifest
    ///   could not be written
    pub async fn run(&self, options: &BundleOptions) -> Result<BuildOutcome> {
        let prepared = self.prepare(options).await?;
        let result = self.collaborators.engine.bundle(&prepared.request).await;
        self.finish(prepared, result).await
    }

    /// Start a watch session.
    ///
    /// The first cycle runs immediately; every item from `trigger` starts
    /// another one. Each cycle re-reads the manifest, so edits to it between
    /// cycles are picked up. The session ends when the trigger is exhausted
    /// or the handle is stopped or dropped.
    ///
    /// # Errors
    ///
    /// Fails up front on invalid options, or when called outside a Tokio
    /// runtime. Later configuration errors are reported per cycle.
    pub fn watch(
        &self,
        options: BundleOptions,
        trigger: impl RebuildTrigger + 'static,
    ) -> Result<WatchHandle> {
        options.validate()?;
        let runtime = tokio::runtime::Handle::try_current().map_err(std::io::Error::other)?;

        let (report_tx, report_rx) = mpsc::unbounded_channel();
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (state_tx, state_rx) = watch::channel(BuildState::Idle);

        let session = WatchSession {
            orchestrator: self.clone(),
            options,
            reports: report_tx,
            cancel: cancel_rx,
            state: state_tx,
        };
        let task = runtime.spawn(session.run(trigger));

        Ok(WatchHandle {
            reports: report_rx,
            cancel: cancel_tx,
            state: state_rx,
            task: Some(task),
        })
    }

    async fn prepare(&self, options: &BundleOptions) -> Result<PreparedBuild> {
        options.validate()?;

        let project_name = options.resolved_project_name();
        let source_root = absolute_root(&self.collaborators.projects.source_root(&project_name)?);
        let manifest_path = resolve_under(&source_root, &options.project)?;

        tracing::debug!(
            project = %project_name,
            manifest = %manifest_path.display(),
            "Reading package manifest"
        );
        let manifest = self.collaborators.manifests.read(&manifest_path).await?;

        let specs = build_specs(options, &source_root, &manifest)?;
        let package_name = manifest.require_name(&manifest_path)?;
        let patch = ManifestPatch::compute(package_name, &options.entry_file);

        let request = EngineRequest {
            specs,
            ts_config: source_root.join(&options.ts_config),
            cwd: source_root,
            globals: options.globals.clone(),
        };

        Ok(PreparedBuild {
            manifest_path,
            manifest,
            patch,
            request,
        })
    }

    async fn finish(&self, prepared: PreparedBuild, result: BundleResult) -> Result<BuildOutcome> {
        match result {
            BundleResult::Success => {
                let updated = prepared.manifest.apply(&prepared.patch);
                if let Err(e) = self
                    .collaborators
                    .manifests
                    .write(&prepared.manifest_path, &updated)
                    .await
                {
                    tracing::error!(
                        manifest = %prepared.manifest_path.display(),
                        error = %e,
                        "Bundle succeeded but manifest write failed."
                    );
                    return Err(e);
                }

                tracing::info!(
                    formats = prepared.request.specs.len(),
                    manifest = %prepared.manifest_path.display(),
                    "Bundle complete."
                );
                Ok(BuildOutcome::Succeeded)
            }
            BundleResult::Failure(failure) => {
                tracing::error!(cause = %failure, "Bundle failed.");
                Ok(BuildOutcome::Failed(failure))
            }
        }
    }
}

/// State owned by the background task of a watch session.
struct WatchSession {
    orchestrator: Orchestrator,
    options: BundleOptions,
    reports: mpsc::UnboundedSender<CycleReport>,
    cancel: watch::Receiver<bool>,
    state: watch::Sender<BuildState>,
}

impl WatchSession {
    async fn run<T: RebuildTrigger>(mut self, mut trigger: T) {
        let mut cycle = 0u64;

        loop {
            if self.is_cancelled() {
                break;
            }

            cycle += 1;
            self.state.send_replace(BuildState::Building);

            let Some(result) = self.run_cycle().await else {
                tracing::debug!(cycle, "Watch cycle cancelled");
                break;
            };

            let next_state = if result.as_ref().is_ok_and(BuildOutcome::success) {
                BuildState::Succeeded
            } else {
                BuildState::Failed
            };
            self.state.send_replace(next_state);

            if let Err(e) = &result {
                tracing::warn!(cycle, error = %e, "Watch cycle did not reach the bundler");
            }
            if self.reports.send(CycleReport { cycle, result }).is_err() {
                break;
            }

            let change = tokio::select! {
                biased;
                _ = cancelled(&mut self.cancel) => None,
                change = trigger.next_change() => change,
            };
            match change {
                Some(path) => tracing::info!(path = %path.display(), "Change detected, rebuilding"),
                None => break,
            }
        }

        self.state.send_replace(BuildState::Stopped);
        tracing::debug!(cycles = cycle, "Watch session stopped");
    }

    /// One cycle; `None` if cancelled before the engine returned.
    ///
    /// Only preparation and the engine call race cancellation. Once the
    /// engine has produced a result the manifest write runs to completion.
    async fn run_cycle(&mut self) -> Option<Result<BuildOutcome>> {
        let orchestrator = &self.orchestrator;
        let options = &self.options;

        let bundled = async {
            let prepared = orchestrator.prepare(options).await?;
            let result = orchestrator
                .collaborators
                .engine
                .bundle(&prepared.request)
                .await;
            Ok::<_, Error>((prepared, result))
        };

        let bundled = tokio::select! {
            biased;
            _ = cancelled(&mut self.cancel) => return None,
            bundled = bundled => bundled,
        };

        Some(match bundled {
            Ok((prepared, result)) => orchestrator.finish(prepared, result).await,
            Err(e) => Err(e),
        })
    }

    fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }
}

/// Resolves once the session has been asked to stop or its handle is gone.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    let _ = cancel.wait_for(|stopped| *stopped).await;
}

/// Handle to a running watch session.
///
/// Dropping the handle stops the session.
#[derive(Debug)]
pub struct WatchHandle {
    reports: mpsc::UnboundedReceiver<CycleReport>,
    cancel: watch::Sender<bool>,
    state: watch::Receiver<BuildState>,
    task: Option<JoinHandle<()>>,
}

impl WatchHandle {
    /// Next cycle report; `None` once the session has ended.
    pub async fn next(&mut self) -> Option<CycleReport> {
        self.reports.recv().await
    }

    pub fn state(&self) -> BuildState {
        *self.state.borrow()
    }

    /// Stop the session and wait for it to wind down.
    ///
    /// An in-flight engine call is abandoned. A manifest write that already
    /// started is allowed to finish, and no further cycle starts.
    pub async fn stop(mut self) {
        self.cancel.send_replace(true);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Watch session ended abnormally");
            }
        }
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.cancel.send_replace(true);
    }
}
