//! Rebuild triggers for watch sessions.
//!
//! A [`RebuildTrigger`] yields one item per rebuild the orchestrator should
//! run. Returning `None` ends the session.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::{Error, Result};

/// Directory names that never trigger a rebuild.
const IGNORED_DIRS: &[&str] = &["node_modules"];

/// Source of rebuild requests.
#[async_trait]
pub trait RebuildTrigger: Send {
    /// Wait for the next change; `None` when no more changes will come.
    async fn next_change(&mut self) -> Option<PathBuf>;
}

/// Recursive filesystem watcher with debouncing.
///
/// Bursts of events (an editor saving several files, a branch switch) are
/// folded into a single rebuild: after the first relevant event, further
/// events are drained until the tree has been quiet for the debounce window.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<PathBuf>,
    root: PathBuf,
    debounce: Duration,
}

impl FileWatcher {
    /// Watch `root` recursively.
    ///
    /// `ignore` lists paths (files or directories) whose changes are dropped,
    /// typically the output directory and the package manifest the
    /// orchestrator writes back.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if `root` does not exist, or [`Error::Watch`] if
    /// the platform watcher cannot be started.
    pub fn new(root: impl Into<PathBuf>, ignore: Vec<PathBuf>, debounce: Duration) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("watch root is not a directory: {}", root.display()),
            )));
        }

        let (tx, rx) = mpsc::channel(100);
        let filter_root = root.clone();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!(error = %e, "File watcher error");
                    return;
                }
            };

            if !matches!(
                event.kind,
                EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
            ) {
                return;
            }

            for path in event.paths {
                if should_ignore(&path, &filter_root, &ignore) {
                    continue;
                }
                // A full channel already guarantees a pending rebuild
                let _ = tx.try_send(path);
            }
        })?;

        watcher.watch(&root, RecursiveMode::Recursive)?;
        tracing::debug!(root = %root.display(), "Watching for changes");

        Ok(Self {
            _watcher: watcher,
            rx,
            root,
            debounce,
        })
    }

    /// Root directory being watched.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl RebuildTrigger for FileWatcher {
    async fn next_change(&mut self) -> Option<PathBuf> {
        let first = self.rx.recv().await?;

        let mut drained = 0usize;
        while let Ok(Some(_)) = tokio::time::timeout(self.debounce, self.rx.recv()).await {
            drained += 1;
        }

        tracing::debug!(path = %first.display(), coalesced = drained, "Change detected");
        Some(first)
    }
}

/// Whether a change at `path` should be dropped.
fn should_ignore(path: &Path, root: &Path, ignore: &[PathBuf]) -> bool {
    let Ok(rel_path) = path.strip_prefix(root) else {
        return true;
    };

    if ignore.iter().any(|ignored| path.starts_with(ignored)) {
        return true;
    }

    // Atomic writes go through `<name>.tmp` siblings
    if path.extension().is_some_and(|ext| ext == "tmp") {
        return true;
    }

    rel_path.components().any(|component| {
        component.as_os_str().to_str().is_some_and(|name| {
            IGNORED_DIRS.contains(&name) || (name.starts_with('.') && name != "." && name != "..")
        })
    })
}

/// Programmatic trigger fed through a channel.
///
/// The session ends once every [`TriggerSender`] has been dropped.
pub struct ChannelTrigger {
    rx: mpsc::UnboundedReceiver<PathBuf>,
}

impl ChannelTrigger {
    pub fn new() -> (TriggerSender, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (TriggerSender { tx }, Self { rx })
    }
}

#[async_trait]
impl RebuildTrigger for ChannelTrigger {
    async fn next_change(&mut self) -> Option<PathBuf> {
        self.rx.recv().await
    }
}

/// Handle used to request rebuilds from a [`ChannelTrigger`].
#[derive(Debug, Clone)]
pub struct TriggerSender {
    tx: mpsc::UnboundedSender<PathBuf>,
}

impl TriggerSender {
    /// Request a rebuild. Returns `false` once the session is gone.
    pub fn trigger(&self, path: impl Into<PathBuf>) -> bool {
        self.tx.send(path.into()).is_ok()
    }
}
