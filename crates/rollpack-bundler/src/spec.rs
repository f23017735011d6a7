//! Derivation of per-format bundle specifications.

use std::path::{Path, PathBuf};

use path_clean::PathClean;

use crate::format::{ModuleFormat, resolve_formats};
use crate::manifest::{Manifest, output_file_stem};
use crate::options::BundleOptions;
use crate::project::absolute_root;
use crate::{Error, Result};

/// Declarative description of one output bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleSpec {
    pub format: ModuleFormat,
    /// Entry module, shared by every spec of an invocation
    pub input: PathBuf,
    /// Bundle file to produce; unique per format
    pub output_file: PathBuf,
    /// Global name the UMD wrapper assigns the exports to
    pub output_name: String,
    pub sourcemap: bool,
    pub external: Vec<String>,
}

impl BundleSpec {
    /// File name of the output bundle (e.g. `example.esm.js`).
    pub fn output_file_name(&self) -> &str {
        self.output_file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    /// Directory the output bundle is written to.
    pub fn output_dir(&self) -> &Path {
        self.output_file.parent().unwrap_or_else(|| Path::new("."))
    }
}

/// Build one spec per output format.
///
/// Pure: the manifest has already been read by the caller. Only paths are
/// computed here; whether the entry file exists is left to the engine.
///
/// # Errors
///
/// - [`Error::InvalidPath`] if the entry or manifest escapes `source_root`
/// - [`Error::InvalidManifest`] if the manifest has no package name
pub fn build_specs(
    options: &BundleOptions,
    source_root: &Path,
    manifest: &Manifest,
) -> Result<Vec<BundleSpec>> {
    let source_root = absolute_root(source_root);

    let input = resolve_under(&source_root, &options.entry_file)?;
    let manifest_path = resolve_under(&source_root, &options.project)?;
    let output_dir = source_root.join(&options.output_path).clean();

    let package_name = manifest.require_name(&manifest_path)?;
    let stem = output_file_stem(package_name);
    let output_name = umd_global_name(package_name);
    let external = collect_externals(options, manifest);

    let specs = resolve_formats(&options.formats)
        .into_iter()
        .map(|format| BundleSpec {
            format,
            input: input.clone(),
            output_file: output_dir.join(format!("{}{}", stem, format.suffix())),
            output_name: output_name.clone(),
            sourcemap: options.source_map,
            external: external.clone(),
        })
        .collect();

    Ok(specs)
}

/// Resolve `path` against `root`, rejecting anything that lands outside it.
pub(crate) fn resolve_under(root: &Path, path: &Path) -> Result<PathBuf> {
    let resolved = if path.is_absolute() {
        path.to_path_buf().clean()
    } else {
        root.join(path).clean()
    };

    if !resolved.starts_with(root) {
        return Err(Error::InvalidPath {
            path: path.to_path_buf(),
            reason: format!("resolves outside the source root {}", root.display()),
        });
    }

    Ok(resolved)
}

/// Explicit externals plus the manifest's runtime and peer dependencies.
fn collect_externals(options: &BundleOptions, manifest: &Manifest) -> Vec<String> {
    let mut external: Vec<String> = options
        .external
        .iter()
        .cloned()
        .chain(manifest.dependencies())
        .collect();
    external.sort();
    external.dedup();
    external
}

/// PascalCase global name for the UMD wrapper, scope removed.
///
/// `@acme/ui-kit` becomes `UiKit`.
pub fn umd_global_name(package_name: &str) -> String {
    let unscoped = package_name.rsplit('/').next().unwrap_or(package_name);

    let mut name: String = unscoped
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();

    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }

    name
}
