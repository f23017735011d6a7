//! Package manifest reading, patching and writing.
//!
//! The manifest is read once per build cycle, before bundling, because the
//! output file names are derived from the declared package name. After a
//! successful bundle the entry-point fields are patched onto that snapshot and
//! the result is written back in one atomic operation.

use std::path::Path;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::engine::output::{remove_temp_file, temp_path_for};
use crate::format::ModuleFormat;
use crate::{Error, Result};

/// Parsed package manifest.
///
/// Field order is preserved so a rewritten manifest only differs from the
/// original in the patched fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Manifest {
    fields: Map<String, Value>,
}

impl Manifest {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Parse a manifest from JSON text.
    pub fn parse(path: &Path, content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content).map_err(|e| Error::InvalidManifest {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        match value {
            Value::Object(fields) => Ok(Self { fields }),
            _ => Err(Error::InvalidManifest {
                path: path.to_path_buf(),
                reason: "expected a JSON object".to_string(),
            }),
        }
    }

    /// Declared package name, if any.
    pub fn name(&self) -> Option<&str> {
        self.fields.get("name").and_then(Value::as_str)
    }

    /// Declared package name, or a configuration error when absent.
    pub fn require_name(&self, path: &Path) -> Result<&str> {
        self.name()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| Error::InvalidManifest {
                path: path.to_path_buf(),
                reason: "missing \"name\" field".to_string(),
            })
    }

    /// Names listed under `dependencies` and `peerDependencies`.
    pub fn dependencies(&self) -> Vec<String> {
        ["dependencies", "peerDependencies"]
            .iter()
            .filter_map(|key| self.fields.get(*key).and_then(Value::as_object))
            .flat_map(|deps| deps.keys().cloned())
            .collect()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Copy of this manifest with the patch applied.
    ///
    /// Existing `main`/`module`/`typings` keys keep their position; new ones
    /// are appended.
    pub fn apply(&self, patch: &ManifestPatch) -> Manifest {
        let mut fields = self.fields.clone();
        fields.insert("main".to_string(), Value::String(patch.main.clone()));
        fields.insert("module".to_string(), Value::String(patch.module.clone()));
        fields.insert("typings".to_string(), Value::String(patch.typings.clone()));
        Manifest { fields }
    }

    /// Pretty-printed JSON with a trailing newline.
    pub fn to_pretty_json(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(&self.fields)?;
        json.push('\n');
        Ok(json)
    }
}

impl From<Value> for Manifest {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self { fields },
            _ => Self::default(),
        }
    }
}

/// Entry-point fields written after a successful bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestPatch {
    /// UMD bundle, relative to the package root
    pub main: String,
    /// ESM bundle, relative to the package root
    pub module: String,
    /// Declaration file named after the entry file
    pub typings: String,
}

impl ManifestPatch {
    pub fn compute(package_name: &str, entry_file: &Path) -> Self {
        let stem = output_file_stem(package_name);
        let entry_stem = entry_file
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("index");

        Self {
            main: format!("./{}{}", stem, ModuleFormat::Umd.suffix()),
            module: format!("./{}{}", stem, ModuleFormat::Esm.suffix()),
            typings: format!("./{}.d.ts", entry_stem),
        }
    }
}

/// File stem shared by all bundles of a package.
///
/// `@scope/name` becomes `scope-name` so the result is a single path segment.
pub fn output_file_stem(package_name: &str) -> String {
    package_name.trim_start_matches('@').replace('/', "-")
}

/// Storage for package manifests.
#[async_trait]
pub trait ManifestStore: Send + Sync {
    /// Read the manifest at `path`.
    ///
    /// A missing file is [`Error::ManifestNotFound`]; unparsable content is
    /// [`Error::InvalidManifest`].
    async fn read(&self, path: &Path) -> Result<Manifest>;

    /// Replace the manifest at `path`.
    ///
    /// Failures are reported as [`Error::ManifestWrite`].
    async fn write(&self, path: &Path, manifest: &Manifest) -> Result<()>;
}

/// Filesystem-backed manifest store.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsManifestStore;

impl FsManifestStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ManifestStore for FsManifestStore {
    async fn read(&self, path: &Path) -> Result<Manifest> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::ManifestNotFound(path.to_path_buf()));
            }
            Err(e) => {
                return Err(Error::InvalidManifest {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
            }
        };

        Manifest::parse(path, &content)
    }

    async fn write(&self, path: &Path, manifest: &Manifest) -> Result<()> {
        let json = manifest.to_pretty_json()?;
        write_atomic(path, json.as_bytes())
            .await
            .map_err(|source| Error::ManifestWrite {
                path: path.to_path_buf(),
                source,
            })
    }
}

/// Write to a sibling temp file, then rename over the target.
///
/// Readers never observe a partially written manifest.
pub(crate) async fn write_atomic(target: &Path, content: &[u8]) -> std::io::Result<()> {
    let temp_path = temp_path_for(target);

    if let Err(e) = tokio::fs::write(&temp_path, content).await {
        remove_temp_file(&temp_path).await;
        return Err(e);
    }

    if let Err(e) = tokio::fs::rename(&temp_path, target).await {
        remove_temp_file(&temp_path).await;
        return Err(e);
    }

    Ok(())
}
