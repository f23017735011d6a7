//! Writing generated bundles to disk.
//!
//! All formats of one invocation are generated in memory first and written
//! together: every file goes to a `.tmp` sibling, and only once all of them
//! exist are they renamed into place. If anything fails the temp files are
//! removed and previously published bundles stay as they were.
//!
//! The write runs on its own task, so dropping the engine future (a stopped
//! watch session) never interrupts it halfway through the renames.

use std::path::{Path, PathBuf};

use path_clean::PathClean;
use rolldown::BundleOutput;
use rolldown_common::Output;

use super::BundleFailure;

/// A file produced by the engine, waiting to be written.
#[derive(Debug)]
pub(crate) struct PendingFile {
    pub path: PathBuf,
    pub content: Vec<u8>,
}

/// Collect every chunk and asset of `output` under `dir`.
pub(crate) fn collect_files(
    output: &BundleOutput,
    dir: &Path,
) -> Result<Vec<PendingFile>, BundleFailure> {
    let mut files = Vec::with_capacity(output.assets.len());

    for item in &output.assets {
        let (filename, content) = match item {
            Output::Chunk(chunk) => (chunk.filename.as_str(), chunk.code.as_bytes().to_vec()),
            Output::Asset(asset) => (asset.filename.as_str(), asset.source.as_bytes().to_vec()),
        };

        files.push(PendingFile {
            path: validate_output_path(dir, filename)?,
            content,
        });
    }

    Ok(files)
}

/// Reject generated file names that would land outside the output directory.
fn validate_output_path(base_dir: &Path, filename: &str) -> Result<PathBuf, BundleFailure> {
    if filename.contains('\0') {
        return Err(BundleFailure::new("Output filename contains null byte"));
    }

    let full_path = base_dir.join(Path::new(filename).clean()).clean();

    if !full_path.starts_with(base_dir) {
        return Err(BundleFailure::new(format!(
            "Output '{}' escapes output directory '{}'",
            filename,
            base_dir.display()
        )));
    }

    Ok(full_path)
}

/// Write `files` on a detached task and wait for it.
///
/// Once started the commit always runs to completion, even if the caller
/// stops waiting. Returns the number of files written.
pub(crate) async fn commit_files(files: Vec<PendingFile>) -> Result<usize, BundleFailure> {
    let task = tokio::spawn(async move {
        write_files_atomic(&files).await?;
        Ok::<_, BundleFailure>(files.len())
    });

    task.await
        .map_err(|e| BundleFailure::new(format!("Bundle write task failed: {}", e)))?
}

/// Write all files with a two-phase commit.
pub(crate) async fn write_files_atomic(files: &[PendingFile]) -> Result<(), BundleFailure> {
    let mut temp_files: Vec<(PathBuf, &Path)> = Vec::with_capacity(files.len());

    // Phase 1: write temporaries
    for file in files {
        if let Some(parent) = file.path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                cleanup_temp_files(&temp_files).await;
                return Err(BundleFailure::new(format!(
                    "Failed to create directory '{}': {}",
                    parent.display(),
                    e
                )));
            }
        }

        let temp_path = temp_path_for(&file.path);
        if let Err(e) = tokio::fs::write(&temp_path, &file.content).await {
            cleanup_temp_files(&temp_files).await;
            return Err(BundleFailure::new(format!(
                "Failed to write temporary file '{}': {}",
                temp_path.display(),
                e
            )));
        }

        temp_files.push((temp_path, file.path.as_path()));
    }

    // Phase 2: rename into place
    for (temp_path, target_path) in &temp_files {
        if let Err(e) = tokio::fs::rename(temp_path, target_path).await {
            cleanup_temp_files(&temp_files).await;
            return Err(BundleFailure::new(format!(
                "Failed to rename '{}' to '{}': {}",
                temp_path.display(),
                target_path.display(),
                e
            )));
        }
    }

    Ok(())
}

/// Sibling `<name>.tmp` path used while writing `target`.
pub(crate) fn temp_path_for(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    target.with_file_name(name)
}

async fn cleanup_temp_files(temp_files: &[(PathBuf, &Path)]) {
    for (temp_path, _) in temp_files {
        remove_temp_file(temp_path).await;
    }
}

/// Best-effort removal; we are already failing, so errors are only logged.
pub(crate) async fn remove_temp_file(temp_path: &Path) {
    if tokio::fs::try_exists(temp_path).await.unwrap_or(false) {
        if let Err(e) = tokio::fs::remove_file(temp_path).await {
            tracing::warn!(
                path = %temp_path.display(),
                error = %e,
                "Failed to clean up temporary file"
            );
        }
    }
}
