//! `rollpack package`: bundle a library and update its manifest.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rollpack_bundler::{BuildOutcome, BundleOptions, CycleReport, FileWatcher, Orchestrator, WorkspaceRoot};

use crate::cli::PackageArgs;
use crate::config;
use crate::error::{CliError, Result};
use crate::ui;

/// Quiet period before a burst of file changes triggers a rebuild.
const DEBOUNCE: Duration = Duration::from_millis(100);

/// Execute the package command.
///
/// 1. Resolve the workspace root (`--cwd` or discovery)
/// 2. Load options (CLI > Env > File > Defaults)
/// 3. Run once, or keep rebuilding until Ctrl+C with `--watch`
pub async fn execute(args: PackageArgs) -> Result<()> {
    let root = resolve_workspace_root(args.cwd.as_deref())?;
    let options = config::load_options(&args, &root)?;
    options.validate()?;

    tracing::debug!(root = %root.display(), "Using workspace root");
    let orchestrator = Orchestrator::native(root.clone());

    if options.watch {
        watch(&orchestrator, options, &root).await
    } else {
        run_once(&orchestrator, &options).await
    }
}

async fn run_once(orchestrator: &Orchestrator, options: &BundleOptions) -> Result<()> {
    let start = Instant::now();

    match orchestrator.run(options).await? {
        BuildOutcome::Succeeded => {
            ui::success(&format!(
                "Packaged {} in {}",
                options.project.display(),
                ui::format_duration(start.elapsed())
            ));
            Ok(())
        }
        BuildOutcome::Failed(failure) => Err(CliError::BundleFailed(failure)),
    }
}

async fn watch(orchestrator: &Orchestrator, options: BundleOptions, root: &Path) -> Result<()> {
    let ignore = vec![root.join(&options.output_path), root.join(&options.project)];
    let watcher = FileWatcher::new(root, ignore, DEBOUNCE)
        .map_err(|e| CliError::Watch(e.to_string()))?;

    ui::info(&format!("Watching for changes in: {}", watcher.root().display()));
    ui::info("Press Ctrl+C to stop");

    let mut handle = orchestrator.watch(options, watcher)?;

    loop {
        tokio::select! {
            report = handle.next() => match report {
                Some(report) => print_report(&report),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                ui::info("Stopping watch...");
                break;
            }
        }
    }

    handle.stop().await;
    ui::success("Watch stopped");
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReportLevel {
    Success,
    Warning,
    Error,
}

/// Configuration errors only skip the cycle, so they are warnings; the
/// session keeps waiting for the next change.
fn describe_report(report: &CycleReport) -> (ReportLevel, String) {
    match &report.result {
        Ok(BuildOutcome::Succeeded) => (
            ReportLevel::Success,
            format!("Build #{} packaged", report.cycle),
        ),
        Ok(BuildOutcome::Failed(failure)) => (
            ReportLevel::Error,
            format!("Build #{} failed: {}", report.cycle, failure),
        ),
        Err(e) if e.is_configuration() => (
            ReportLevel::Warning,
            format!("Build #{} skipped: {}", report.cycle, e),
        ),
        Err(e) => (ReportLevel::Error, format!("Build #{}: {}", report.cycle, e)),
    }
}

fn print_report(report: &CycleReport) {
    let (level, message) = describe_report(report);
    match level {
        ReportLevel::Success => ui::success(&message),
        ReportLevel::Warning => ui::warning(&message),
        ReportLevel::Error => ui::error(&message),
    }
}

/// `--cwd` when given (must be a directory), else the workspace enclosing
/// the current directory.
fn resolve_workspace_root(explicit: Option<&Path>) -> Result<PathBuf> {
    let current_dir = std::env::current_dir()?;

    let Some(cwd) = explicit else {
        return Ok(WorkspaceRoot::discover(&current_dir).root().to_path_buf());
    };

    let absolute = if cwd.is_absolute() {
        cwd.to_path_buf()
    } else {
        current_dir.join(cwd)
    };

    if !absolute.is_dir() {
        return Err(CliError::InvalidArgument(format!(
            "Specified --cwd is not a directory: {}",
            absolute.display()
        )));
    }

    Ok(absolute)
}
