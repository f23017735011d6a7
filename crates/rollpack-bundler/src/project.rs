//! Project graph lookup.
//!
//! The orchestrator only needs one thing from the workspace: the directory a
//! project's relative paths are resolved against.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use path_clean::PathClean;

use crate::{Error, Result};

/// Files that mark the root of a workspace, checked in order at each level.
const WORKSPACE_MARKERS: &[&str] = &[
    "nx.json",
    "workspace.json",
    "angular.json",
    "pnpm-workspace.yaml",
];

/// Source of project source roots.
pub trait ProjectGraph: Send + Sync {
    /// Directory that relative option paths of `project` resolve against.
    fn source_root(&self, project: &str) -> Result<PathBuf>;
}

/// A single workspace directory shared by every project.
///
/// Individual projects can be pinned to their own root with
/// [`WorkspaceRoot::with_project`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceRoot {
    root: PathBuf,
    projects: BTreeMap<String, PathBuf>,
}

impl WorkspaceRoot {
    /// Relative roots are made absolute against the current directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: absolute_root(&root.into()),
            projects: BTreeMap::new(),
        }
    }

    /// Walk up from `start` to the nearest workspace root.
    ///
    /// Workspace markers win over a bare `package.json`: the closest
    /// directory holding a marker is used, otherwise the closest holding a
    /// `package.json`, otherwise `start` itself.
    pub fn discover(start: impl AsRef<Path>) -> Self {
        let start = absolute_root(start.as_ref());

        let marked = start
            .ancestors()
            .find(|dir| WORKSPACE_MARKERS.iter().any(|m| dir.join(m).is_file()));

        let root = marked
            .or_else(|| {
                start
                    .ancestors()
                    .find(|dir| dir.join("package.json").is_file())
            })
            .unwrap_or(&start)
            .to_path_buf();

        tracing::debug!(root = %root.display(), "Discovered workspace root");
        Self::new(root)
    }

    /// Pin `project` to its own source root.
    ///
    /// Relative roots are taken relative to the workspace root.
    pub fn with_project(mut self, project: impl Into<String>, root: impl AsRef<Path>) -> Self {
        let root = self.root.join(root.as_ref()).clean();
        self.projects.insert(project.into(), root);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// `root` made absolute and cleaned.
///
/// A cleaned relative root such as `.` would never prefix the paths joined
/// onto it, so containment checks need the absolute form.
pub(crate) fn absolute_root(root: &Path) -> PathBuf {
    std::path::absolute(root)
        .unwrap_or_else(|_| root.to_path_buf())
        .clean()
}

impl ProjectGraph for WorkspaceRoot {
    fn source_root(&self, project: &str) -> Result<PathBuf> {
        if project.is_empty() {
            return Err(Error::ProjectNotFound(project.to_string()));
        }

        Ok(self
            .projects
            .get(project)
            .cloned()
            .unwrap_or_else(|| self.root.clone()))
    }
}
